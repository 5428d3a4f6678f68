//! Type descriptor classification
//!
//! A declared parameter type such as `UInt64`, `[String]`,
//! `{Address: UFix64}` or `Address?` is classified into exactly one
//! [`TypeKind`]. Container element types are kept as text and classified
//! on demand, so a descriptor is cheap to build for every call.

use std::fmt;

/// Classified kind of a type descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// `Int`, `UInt`, `Word` families, any bit width
    BasicNumeric,
    /// `Fix64`, `UFix64`
    FixedPoint,
    /// `String`
    String,
    /// `Character`
    Character,
    /// `Bool`
    Bool,
    /// `Address`
    Address,
    /// `Path` and its domain-specific variants
    Path,
    /// `[T]` or `[T; N]`
    Array {
        /// Element type text
        element: String,
    },
    /// `{K: V}`
    Dictionary {
        /// Key type text
        key: String,
        /// Value type text
        value: String,
    },
    /// Well-formed text naming a type with no resolution rule
    Unsupported,
    /// Empty descriptor
    Invalid,
}

/// A classified type descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    optional: bool,
}

const NUMERIC_PREFIXES: [&str; 3] = ["UInt", "Int", "Word"];
const FIXED_POINT: [&str; 2] = ["Fix64", "UFix64"];
const PATH_TYPES: [&str; 5] = [
    "Path",
    "StoragePath",
    "PublicPath",
    "PrivatePath",
    "CapabilityPath",
];

impl TypeDescriptor {
    /// Classify type text.
    ///
    /// Whitespace is ignored and a single trailing `?` marks the type as
    /// optional. Containers are recognized before basic types.
    pub fn classify(text: &str) -> Self {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let (name, optional) = match compact.strip_suffix('?') {
            Some(inner) => (inner.to_string(), true),
            None => (compact, false),
        };

        let kind = classify_kind(&name);
        TypeDescriptor {
            name,
            kind,
            optional,
        }
    }

    /// Type text without the optional marker
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Classified kind
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Whether the declared type carries a `?` suffix
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether this is an array or dictionary
    pub fn is_container(&self) -> bool {
        matches!(self.kind, TypeKind::Array { .. } | TypeKind::Dictionary { .. })
    }

    /// Whether resolution has a rule for this kind
    pub fn is_supported(&self) -> bool {
        !matches!(self.kind, TypeKind::Unsupported | TypeKind::Invalid)
    }

    /// The same type with the optional marker removed
    pub fn non_optional(&self) -> Self {
        TypeDescriptor {
            optional: false,
            ..self.clone()
        }
    }

    /// Element type of an array
    pub fn element(&self) -> Option<TypeDescriptor> {
        match &self.kind {
            TypeKind::Array { element } => Some(TypeDescriptor::classify(element)),
            _ => None,
        }
    }

    /// Key and value types of a dictionary
    pub fn key_value(&self) -> Option<(TypeDescriptor, TypeDescriptor)> {
        match &self.kind {
            TypeKind::Dictionary { key, value } => Some((
                TypeDescriptor::classify(key),
                TypeDescriptor::classify(value),
            )),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "{}?", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

fn classify_kind(name: &str) -> TypeKind {
    if name.is_empty() {
        return TypeKind::Invalid;
    }

    if let Some(inner) = name.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        // [T; N] is a constant-sized array of T
        let element = split_top_level_once(inner, ';')
            .map(|(element, _)| element)
            .unwrap_or(inner);
        if element.is_empty() {
            return TypeKind::Unsupported;
        }
        return TypeKind::Array {
            element: element.to_string(),
        };
    }

    if let Some(inner) = name.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        return match split_top_level_once(inner, ':') {
            Some((key, value)) if !key.is_empty() && !value.is_empty() => TypeKind::Dictionary {
                key: key.to_string(),
                value: value.to_string(),
            },
            _ => TypeKind::Unsupported,
        };
    }

    if FIXED_POINT.contains(&name) {
        return TypeKind::FixedPoint;
    }

    for prefix in NUMERIC_PREFIXES {
        if let Some(width) = name.strip_prefix(prefix) {
            if width.chars().all(|c| c.is_ascii_digit()) {
                return TypeKind::BasicNumeric;
            }
        }
    }

    match name {
        "String" => TypeKind::String,
        "Character" => TypeKind::Character,
        "Bool" => TypeKind::Bool,
        "Address" => TypeKind::Address,
        _ if PATH_TYPES.contains(&name) => TypeKind::Path,
        _ => TypeKind::Unsupported,
    }
}

/// Split at the first `sep` not nested inside `[]`, `{}`, `()` or `<>`
fn split_top_level_once(text: &str, sep: char) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    for (idx, c) in text.char_indices() {
        match c {
            '[' | '{' | '(' | '<' => depth += 1,
            ']' | '}' | ')' | '>' => depth -= 1,
            c if c == sep && depth == 0 => {
                return Some((&text[..idx], &text[idx + c.len_utf8()..]));
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_numeric() {
        for name in ["Int", "UInt", "Int8", "UInt64", "Int256", "Word8", "Word64"] {
            assert_eq!(TypeDescriptor::classify(name).kind(), &TypeKind::BasicNumeric, "{}", name);
        }
        assert_eq!(TypeDescriptor::classify("Integer").kind(), &TypeKind::Unsupported);
    }

    #[test]
    fn test_classify_fixed_point() {
        assert_eq!(TypeDescriptor::classify("UFix64").kind(), &TypeKind::FixedPoint);
        assert_eq!(TypeDescriptor::classify("Fix64").kind(), &TypeKind::FixedPoint);
    }

    #[test]
    fn test_classify_simple() {
        assert_eq!(TypeDescriptor::classify("String").kind(), &TypeKind::String);
        assert_eq!(TypeDescriptor::classify("Character").kind(), &TypeKind::Character);
        assert_eq!(TypeDescriptor::classify("Bool").kind(), &TypeKind::Bool);
        assert_eq!(TypeDescriptor::classify("Address").kind(), &TypeKind::Address);
        assert_eq!(TypeDescriptor::classify("Path").kind(), &TypeKind::Path);
        assert_eq!(TypeDescriptor::classify("StoragePath").kind(), &TypeKind::Path);
    }

    #[test]
    fn test_classify_optional() {
        let ty = TypeDescriptor::classify("Address?");
        assert!(ty.is_optional());
        assert_eq!(ty.kind(), &TypeKind::Address);
        assert_eq!(ty.name(), "Address");
        assert_eq!(ty.to_string(), "Address?");
        assert!(!ty.non_optional().is_optional());
    }

    #[test]
    fn test_classify_array() {
        let ty = TypeDescriptor::classify("[String]");
        assert_eq!(
            ty.kind(),
            &TypeKind::Array {
                element: "String".to_string()
            }
        );
        assert_eq!(ty.element().unwrap().kind(), &TypeKind::String);

        let sized = TypeDescriptor::classify("[UInt8; 4]");
        assert_eq!(sized.element().unwrap().name(), "UInt8");
    }

    #[test]
    fn test_classify_dictionary() {
        let ty = TypeDescriptor::classify("{Address: UFix64}");
        let (key, value) = ty.key_value().unwrap();
        assert_eq!(key.kind(), &TypeKind::Address);
        assert_eq!(value.kind(), &TypeKind::FixedPoint);
    }

    #[test]
    fn test_classify_nested_split_on_unbracketed_colon() {
        let ty = TypeDescriptor::classify("{String: {UInt64: [Address]}}");
        let (key, value) = ty.key_value().unwrap();
        assert_eq!(key.name(), "String");
        assert_eq!(value.name(), "{UInt64:[Address]}");
        let (inner_key, inner_value) = value.key_value().unwrap();
        assert_eq!(inner_key.kind(), &TypeKind::BasicNumeric);
        assert!(inner_value.is_container());
    }

    #[test]
    fn test_container_before_basic() {
        // An array of optionals is an array, not an optional
        let ty = TypeDescriptor::classify("[UInt64?]");
        assert!(!ty.is_optional());
        assert!(ty.element().unwrap().is_optional());

        let ty = TypeDescriptor::classify("[{String: UFix64}]");
        assert!(ty.is_container());
        assert!(ty.element().unwrap().is_container());
    }

    #[test]
    fn test_classify_invalid_and_unsupported() {
        assert_eq!(TypeDescriptor::classify("").kind(), &TypeKind::Invalid);
        assert_eq!(TypeDescriptor::classify("  ").kind(), &TypeKind::Invalid);
        assert!(!TypeDescriptor::classify("").is_supported());
        assert_eq!(
            TypeDescriptor::classify("@MelosNFT.NFT").kind(),
            &TypeKind::Unsupported
        );
        assert_eq!(TypeDescriptor::classify("{String}").kind(), &TypeKind::Unsupported);
    }
}
