//! Template signature introspection
//!
//! Only the narrow signature patterns are recognized: the transaction
//! parameter list and its `prepare` signers, a script's `main` parameters,
//! or a contract's name and `init` parameters. The source is normalized
//! first (comments removed, whitespace runs collapsed to one space).

use crate::types::TypeDescriptor;

/// What kind of code a template holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Read-only query with a `main` function
    Script,
    /// Signed state-mutating transaction
    Transaction,
    /// Contract declaration
    Contract,
    /// None of the recognized signatures
    Unknown,
}

/// A declared parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredArg {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub ty: TypeDescriptor,
}

/// Signature facts derived from a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInfo {
    /// Template kind
    pub kind: TemplateKind,
    /// Number of `prepare` signers (0 for scripts, 1 for contracts)
    pub signer_count: usize,
    /// Parameters in declaration order
    pub declared_args: Vec<DeclaredArg>,
    /// Declared contract name, for contracts
    pub contract_name: Option<String>,
}

impl TemplateInfo {
    fn unknown() -> Self {
        TemplateInfo {
            kind: TemplateKind::Unknown,
            signer_count: 0,
            declared_args: Vec::new(),
            contract_name: None,
        }
    }
}

/// Introspect a template's signature
pub fn introspect(template: &str) -> TemplateInfo {
    let code = normalize(template);

    if let Some(info) = transaction_signature(&code) {
        return info;
    }
    if let Some(info) = script_signature(&code) {
        return info;
    }
    if let Some(info) = contract_signature(&code) {
        return info;
    }
    TemplateInfo::unknown()
}

fn transaction_signature(code: &str) -> Option<TemplateInfo> {
    let at = find_keyword(code, "transaction", 0)?;
    let rest = after_spaces(code, at + "transaction".len());

    let (declared_args, body_from) = match code[rest..].chars().next()? {
        '(' => {
            let (inner, end) = balanced(code, rest)?;
            (parse_params(inner), end)
        }
        '{' => (Vec::new(), rest),
        _ => return None,
    };

    let signer_count = find_keyword(code, "prepare", body_from)
        .and_then(|p| {
            let open = after_spaces(code, p + "prepare".len());
            if code[open..].starts_with('(') {
                balanced(code, open).map(|(inner, _)| split_top_level(inner, ',').len())
            } else {
                None
            }
        })
        .unwrap_or(0);

    Some(TemplateInfo {
        kind: TemplateKind::Transaction,
        signer_count,
        declared_args,
        contract_name: None,
    })
}

fn script_signature(code: &str) -> Option<TemplateInfo> {
    let mut from = 0;
    while let Some(at) = find_keyword(code, "fun", from) {
        from = at + "fun".len();
        let name_at = after_spaces(code, from);
        if !starts_with_word(&code[name_at..], "main") {
            continue;
        }
        let open = after_spaces(code, name_at + "main".len());
        if !code[open..].starts_with('(') {
            continue;
        }
        let (inner, _) = balanced(code, open)?;
        return Some(TemplateInfo {
            kind: TemplateKind::Script,
            signer_count: 0,
            declared_args: parse_params(inner),
            contract_name: None,
        });
    }
    None
}

fn contract_signature(code: &str) -> Option<TemplateInfo> {
    let at = find_keyword(code, "contract", 0)?;
    let mut name_at = after_spaces(code, at + "contract".len());
    if starts_with_word(&code[name_at..], "interface") {
        name_at = after_spaces(code, name_at + "interface".len());
    }
    let name = take_identifier(&code[name_at..]);
    if name.is_empty() {
        return None;
    }

    let declared_args = find_keyword(code, "init", name_at + name.len())
        .and_then(|p| {
            let open = after_spaces(code, p + "init".len());
            if code[open..].starts_with('(') {
                balanced(code, open).map(|(inner, _)| parse_params(inner))
            } else {
                None
            }
        })
        .unwrap_or_default();

    Some(TemplateInfo {
        kind: TemplateKind::Contract,
        signer_count: 1,
        declared_args,
        contract_name: Some(name.to_string()),
    })
}

/// Split a parameter list on commas not nested in `[]`, `{}`, `()` or `<>`.
///
/// Blank entries are dropped, so an empty list yields no parameters.
pub fn split_top_level(list: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, c) in list.char_indices() {
        match c {
            '[' | '{' | '(' | '<' => depth += 1,
            ']' | '}' | ')' | '>' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&list[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Parse `label name: Type` entries
fn parse_params(list: &str) -> Vec<DeclaredArg> {
    split_top_level(list, ',')
        .into_iter()
        .filter_map(|entry| {
            let colon = entry.find(':')?;
            let name = entry[..colon].split_whitespace().last()?.to_string();
            let ty = TypeDescriptor::classify(&entry[colon + 1..]);
            Some(DeclaredArg { name, ty })
        })
        .collect()
}

/// Remove comments and collapse whitespace runs to single spaces
fn normalize(code: &str) -> String {
    collapse_whitespace(&strip_comments(code))
}

/// Remove `//` line comments and (nested) `/* */` block comments, leaving
/// string literals intact
pub(crate) fn strip_comments(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut chars = code.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut depth = 1;
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    match (prev, skipped) {
                        ('/', '*') => {
                            depth += 1;
                            prev = '\0';
                            continue;
                        }
                        ('*', '/') => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            prev = '\0';
                            continue;
                        }
                        _ => {}
                    }
                    prev = skipped;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

fn collapse_whitespace(code: &str) -> String {
    code.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Find `word` at or after `from` with identifier boundaries on both sides
fn find_keyword(code: &str, word: &str, from: usize) -> Option<usize> {
    let mut search = from;
    while search <= code.len() {
        let found = search + code.get(search..)?.find(word)?;
        let before_ok = code[..found]
            .chars()
            .next_back()
            .map_or(true, |c| !is_ident_char(c));
        let after_ok = code[found + word.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_ident_char(c));
        if before_ok && after_ok {
            return Some(found);
        }
        search = found + word.len();
    }
    None
}

fn starts_with_word(text: &str, word: &str) -> bool {
    text.starts_with(word)
        && text[word.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_ident_char(c))
}

fn take_identifier(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|(_, c)| !is_ident_char(*c))
        .map_or(text.len(), |(idx, _)| idx);
    &text[..end]
}

fn after_spaces(code: &str, from: usize) -> usize {
    code[from..]
        .char_indices()
        .find(|(_, c)| *c != ' ')
        .map_or(code.len(), |(idx, _)| from + idx)
}

/// Given the index of an opening `(`, return the enclosed text and the
/// index just past the matching `)`
fn balanced(code: &str, open: usize) -> Option<(&str, usize)> {
    let mut depth = 0i32;
    for (idx, c) in code[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let close = open + idx;
                    return Some((&code[open + 1..close], close + 1));
                }
            }
            _ => {}
        }
    }
    None
}
