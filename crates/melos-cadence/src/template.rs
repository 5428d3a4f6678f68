//! Template text substitution
//!
//! Two passes run over template text before it is sent: `%TOKEN%`
//! placeholder substitution and `import` address rewriting. Both read from
//! a [`Lookup`], which may be a plain map, a closure or a [`Layered`] pair
//! of either.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use melos_primitives::Address;

/// Source of replacement text keyed by token or contract name
pub trait Lookup {
    /// Replacement for `key`, if any
    fn lookup(&self, key: &str) -> Option<String>;
}

impl<K, V, S> Lookup for HashMap<K, V, S>
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<str>,
    S: BuildHasher,
{
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| v.as_ref().to_string())
    }
}

impl<K, V> Lookup for BTreeMap<K, V>
where
    K: Borrow<str> + Ord,
    V: AsRef<str>,
{
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| v.as_ref().to_string())
    }
}

impl<F> Lookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// Two lookups, the primary consulted first
#[derive(Clone, Copy)]
pub struct Layered<'a> {
    primary: &'a dyn Lookup,
    fallback: &'a dyn Lookup,
}

impl<'a> Layered<'a> {
    /// Layer `primary` over `fallback`
    pub fn new(primary: &'a dyn Lookup, fallback: &'a dyn Lookup) -> Self {
        Self { primary, fallback }
    }
}

impl Lookup for Layered<'_> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.primary
            .lookup(key)
            .or_else(|| self.fallback.lookup(key))
    }
}

/// Placeholder token names used by the marketplace templates
pub mod tokens {
    /// NFT contract name
    pub const NFT_NAME: &str = "NFT_NAME";
    /// NFT contract address
    pub const NFT_ADDRESS: &str = "NFT_ADDRESS";
    /// NFT provider capability path
    pub const NFT_PROVIDER_PRIVATE_PATH: &str = "NFT_PROVIDER_PRIVATE_PATH";
    /// NFT collection public path
    pub const NFT_PUBLIC_PATH: &str = "NFT_PUBLIC_PATH";
    /// NFT collection storage path
    pub const NFT_STORAGE_PATH: &str = "NFT_STORAGE_PATH";
    /// Fungible token contract name
    pub const FT_NAME: &str = "FT_NAME";
    /// Fungible token receiver path
    pub const FT_RECEIVER: &str = "FT_RECEIVER";
    /// Fungible token contract address
    pub const FT_ADDRESS: &str = "FT_ADDRESS";
    /// Fungible token vault storage path
    pub const FT_STORAGE_PATH: &str = "FT_STORAGE_PATH";
    /// Extra imports for admin templates
    pub const ADMIN_IMPORTS: &str = "ADMIN_IMPORTS";
    /// Admin capability handles
    pub const ADMIN_HANDLES: &str = "ADMIN_HANDLES";
    /// Contract field declarations
    pub const SELF_VARS: &str = "SELF_VARS";
    /// Contract field initialization
    pub const SELF_VARS_INIT: &str = "SELF_VARS_INIT";
    /// Generic import block
    pub const IMPORTS: &str = "IMPORTS";
    /// Link target type
    pub const LINK_TARGET: &str = "LINK_TARGET";
    /// Link target path
    pub const TARGET_PATH: &str = "TARGET_PATH";
    /// Capability path
    pub const CAPABILITY_PATH: &str = "CAPABILITY_PATH";

    /// Every documented token
    pub const ALL: [&str; 17] = [
        NFT_NAME,
        NFT_ADDRESS,
        NFT_PROVIDER_PRIVATE_PATH,
        NFT_PUBLIC_PATH,
        NFT_STORAGE_PATH,
        FT_NAME,
        FT_RECEIVER,
        FT_ADDRESS,
        FT_STORAGE_PATH,
        ADMIN_IMPORTS,
        ADMIN_HANDLES,
        SELF_VARS,
        SELF_VARS_INIT,
        IMPORTS,
        LINK_TARGET,
        TARGET_PATH,
        CAPABILITY_PATH,
    ];
}

/// Replace every `%KEY%` whose key resolves.
///
/// Keys are case-sensitive runs of ASCII letters, digits and `_`.
/// Unresolved tokens are left as they are and replacement text is not
/// scanned again.
pub fn apply_placeholders(template: &str, replacements: &impl Lookup) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let key_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        let closed = key_len > 0 && after[key_len..].starts_with('%');
        if !closed {
            out.push('%');
            rest = after;
            continue;
        }

        let key = &after[..key_len];
        match replacements.lookup(key) {
            Some(value) => {
                out.push_str(&value);
                rest = &after[key_len + 1..];
            }
            None => {
                // the closing % may open the next token
                out.push('%');
                out.push_str(key);
                rest = &after[key_len..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Rewrite `import` statements using `addresses`.
///
/// For `import Name from X` the contract name is looked up first, then the
/// `from` token (as written, then without a `0x` prefix or quotes).
/// `import "Name"` becomes `import Name from <address>` when `Name`
/// resolves. Imports that resolve to nothing are left unmodified.
pub fn rewrite_imports(code: &str, addresses: &impl Lookup) -> String {
    code.split_inclusive('\n')
        .map(|line| rewrite_import_line(line, addresses).unwrap_or_else(|| line.to_string()))
        .collect()
}

fn rewrite_import_line(line: &str, addresses: &impl Lookup) -> Option<String> {
    let indent_len = line.len() - line.trim_start().len();
    let (indent, body) = line.split_at(indent_len);
    let stmt = body.strip_prefix("import")?;
    if !stmt.starts_with(|c: char| c.is_whitespace() || c == '"') {
        return None;
    }

    let content_len = stmt.trim_end().len();
    let (stmt, line_end) = stmt.split_at(content_len);
    let stmt = stmt.trim_start();

    if let Some(quoted) = stmt.strip_prefix('"') {
        let close = quoted.find('"')?;
        let (name, rest) = (&quoted[..close], &quoted[close + 1..]);
        let address = addresses.lookup(name)?;
        return Some(format!(
            "{}import {} from {}{}{}",
            indent,
            name,
            normalize_address(&address),
            rest,
            line_end
        ));
    }

    let from_at = find_from(stmt)?;
    let names = stmt[..from_at].trim();
    // only the address token is replaced; trailing comments survive
    let after = stmt[from_at + "from".len()..].trim_start();
    let token_len = match after.strip_prefix('"') {
        Some(quoted) => quoted.find('"').map(|close| close + 2),
        None => after.find(char::is_whitespace),
    };
    let (target, rest) = after.split_at(token_len.unwrap_or(after.len()));
    let first_name = names.split(',').next()?.trim();

    let address = addresses
        .lookup(first_name)
        .or_else(|| addresses.lookup(target))
        .or_else(|| {
            let bare = target
                .strip_prefix("0x")
                .unwrap_or(target)
                .trim_matches('"');
            addresses.lookup(bare)
        })?;

    Some(format!(
        "{}import {} from {}{}{}",
        indent,
        names,
        normalize_address(&address),
        rest,
        line_end
    ))
}

/// Byte offset of the ` from ` keyword
fn find_from(stmt: &str) -> Option<usize> {
    let bytes = stmt.as_bytes();
    stmt.match_indices("from").map(|(idx, _)| idx).find(|&idx| {
        let before = idx == 0 || bytes[idx - 1].is_ascii_whitespace();
        let after = bytes
            .get(idx + 4)
            .map(|b| b.is_ascii_whitespace())
            .unwrap_or(false);
        before && after
    })
}

/// Well-formed addresses are printed canonically, anything else verbatim
fn normalize_address(text: &str) -> String {
    match Address::from_hex(text) {
        Ok(address) => address.to_hex(),
        Err(_) => text.to_string(),
    }
}
