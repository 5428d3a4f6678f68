//! Resolved argument values and their JSON-Cadence wire encoding

use std::fmt;
use std::str::FromStr;

use melos_primitives::Address;
use serde_json::{json, Value};

use crate::types::TypeDescriptor;
use crate::CadenceError;

/// Path domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathDomain {
    /// `/public/...`
    Public,
    /// `/private/...`
    Private,
    /// `/storage/...`
    Storage,
}

impl PathDomain {
    /// Domain name as it appears in a path literal
    pub fn as_str(&self) -> &'static str {
        match self {
            PathDomain::Public => "public",
            PathDomain::Private => "private",
            PathDomain::Storage => "storage",
        }
    }
}

impl FromStr for PathDomain {
    type Err = CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(PathDomain::Public),
            "private" => Ok(PathDomain::Private),
            "storage" => Ok(PathDomain::Storage),
            other => Err(CadenceError::PathFormat(format!(
                "unknown path domain '{}', expected public, private or storage",
                other
            ))),
        }
    }
}

impl fmt::Display for PathDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Cadence value ready for wire encoding.
///
/// Every variant knows its own wire type, so nested values encode without
/// consulting the declared type again.
#[derive(Debug, Clone, PartialEq)]
pub enum CadenceValue {
    /// `nil`, or a present optional
    Optional(Option<Box<CadenceValue>>),
    /// Integer of the named type, as a decimal string
    Int {
        /// Wire type name, e.g. `UInt64`
        ty: String,
        /// Decimal digits, optionally signed
        value: String,
    },
    /// Fixed-point number with exactly 8 fractional digits
    Fix {
        /// `Fix64` or `UFix64`
        ty: String,
        /// Decimal string
        value: String,
    },
    /// `String`
    String(String),
    /// `Character`
    Character(String),
    /// `Bool`
    Bool(bool),
    /// `Address`
    Address(Address),
    /// `Path`
    Path {
        /// Path domain
        domain: PathDomain,
        /// Identifier within the domain
        identifier: String,
    },
    /// Array of values
    Array(Vec<CadenceValue>),
    /// Ordered key/value entries
    Dictionary(Vec<(CadenceValue, CadenceValue)>),
}

impl CadenceValue {
    /// The `nil` value
    pub fn nil() -> Self {
        CadenceValue::Optional(None)
    }

    /// Wrap a value as a present optional
    pub fn some(inner: CadenceValue) -> Self {
        CadenceValue::Optional(Some(Box::new(inner)))
    }

    /// Wire type name
    pub fn type_name(&self) -> &str {
        match self {
            CadenceValue::Optional(_) => "Optional",
            CadenceValue::Int { ty, .. } | CadenceValue::Fix { ty, .. } => ty,
            CadenceValue::String(_) => "String",
            CadenceValue::Character(_) => "Character",
            CadenceValue::Bool(_) => "Bool",
            CadenceValue::Address(_) => "Address",
            CadenceValue::Path { .. } => "Path",
            CadenceValue::Array(_) => "Array",
            CadenceValue::Dictionary(_) => "Dictionary",
        }
    }

    /// JSON-Cadence encoding
    pub fn to_json(&self) -> Value {
        let value = match self {
            CadenceValue::Optional(None) => Value::Null,
            CadenceValue::Optional(Some(inner)) => inner.to_json(),
            CadenceValue::Int { value, .. } | CadenceValue::Fix { value, .. } => {
                Value::String(value.clone())
            }
            CadenceValue::String(s) | CadenceValue::Character(s) => Value::String(s.clone()),
            CadenceValue::Bool(b) => Value::Bool(*b),
            CadenceValue::Address(addr) => Value::String(addr.to_hex()),
            CadenceValue::Path { domain, identifier } => json!({
                "domain": domain.as_str(),
                "identifier": identifier,
            }),
            CadenceValue::Array(items) => Value::Array(items.iter().map(|v| v.to_json()).collect()),
            CadenceValue::Dictionary(entries) => Value::Array(
                entries
                    .iter()
                    .map(|(k, v)| json!({ "key": k.to_json(), "value": v.to_json() }))
                    .collect(),
            ),
        };
        json!({ "type": self.type_name(), "value": value })
    }
}

/// A resolved argument: the declared type and its wire value
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// Declared type
    pub ty: TypeDescriptor,
    /// Resolved value
    pub value: CadenceValue,
}

impl Argument {
    /// Pair a type with a resolved value
    pub fn new(ty: TypeDescriptor, value: CadenceValue) -> Self {
        Self { ty, value }
    }

    /// JSON-Cadence encoding of the value
    pub fn to_json(&self) -> Value {
        self.value.to_json()
    }

    /// Bytes sent on the wire (compact JSON text)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_json().to_string().into_bytes()
    }
}
