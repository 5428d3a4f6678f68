//! JSON-Cadence response decoding
//!
//! Script results and event payloads arrive as `{"type", "value"}` trees.
//! [`decode`] flattens them into plain JSON: small integers become numbers,
//! wide integers and fixed-point values stay strings so no precision is
//! lost, and composites become objects keyed by field name.

use serde_json::{Map, Value};

use crate::CadenceError;

/// Integer types that always fit in a JSON number
const SMALL_INTS: [&str; 9] = [
    "Int8", "Int16", "Int32", "UInt8", "UInt16", "UInt32", "Word8", "Word16", "Word32",
];

const COMPOSITES: [&str; 5] = ["Struct", "Resource", "Event", "Contract", "Enum"];

/// Decode a JSON-Cadence value into plain JSON
pub fn decode(value: &Value) -> Result<Value, CadenceError> {
    let ty = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| CadenceError::Decode(format!("missing 'type' in {}", value)))?;
    let inner = value.get("value").unwrap_or(&Value::Null);

    match ty {
        "Void" => Ok(Value::Null),
        "Optional" => match inner {
            Value::Null => Ok(Value::Null),
            other => decode(other),
        },
        "Bool" | "String" | "Character" | "Address" => Ok(inner.clone()),
        "Fix64" | "UFix64" => Ok(Value::String(expect_str(ty, inner)?.to_string())),
        t if SMALL_INTS.contains(&t) => {
            let text = expect_str(ty, inner)?;
            text.parse::<i64>()
                .map(Value::from)
                .map_err(|e| CadenceError::Decode(format!("{} '{}': {}", ty, text, e)))
        }
        t if is_wide_int(t) => Ok(Value::String(expect_str(ty, inner)?.to_string())),
        "Array" => expect_array(ty, inner)?
            .iter()
            .map(decode)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        "Dictionary" => decode_dictionary(inner),
        t if COMPOSITES.contains(&t) => decode_composite(inner),
        "Path" => Ok(decode_path(inner)),
        "Type" => Ok(static_type(inner, "staticType")),
        "Function" => Ok(static_type(inner, "functionType")),
        "InclusiveRange" => decode_range(inner),
        "Capability" => decode_capability(inner),
        other => Err(CadenceError::Decode(format!("unknown value type '{}'", other))),
    }
}

/// Parse response text and decode it
pub fn decode_str(text: &str) -> Result<Value, CadenceError> {
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| CadenceError::Decode(format!("invalid JSON-Cadence: {}", e)))?;
    decode(&value)
}

fn is_wide_int(ty: &str) -> bool {
    ["UInt", "Int", "Word"].iter().any(|prefix| {
        ty.strip_prefix(prefix)
            .map(|width| width.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false)
    })
}

fn decode_dictionary(inner: &Value) -> Result<Value, CadenceError> {
    let mut out = Map::new();
    for entry in expect_array("Dictionary", inner)? {
        let key = entry
            .get("key")
            .ok_or_else(|| CadenceError::Decode("dictionary entry without key".to_string()))?;
        let value = entry
            .get("value")
            .ok_or_else(|| CadenceError::Decode("dictionary entry without value".to_string()))?;

        let key = match decode(key)? {
            Value::String(s) => s,
            other => other.to_string(),
        };
        out.insert(key, decode(value)?);
    }
    Ok(Value::Object(out))
}

fn decode_composite(inner: &Value) -> Result<Value, CadenceError> {
    let fields = inner
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| CadenceError::Decode(format!("composite without fields: {}", inner)))?;

    let mut out = Map::new();
    for field in fields {
        let name = field
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| CadenceError::Decode("composite field without name".to_string()))?;
        let value = field.get("value").unwrap_or(&Value::Null);
        out.insert(name.to_string(), decode(value)?);
    }
    Ok(Value::Object(out))
}

fn decode_path(inner: &Value) -> Value {
    let mut out = Map::new();
    out.insert("domain".into(), inner.get("domain").cloned().unwrap_or(Value::Null));
    out.insert(
        "identifier".into(),
        inner.get("identifier").cloned().unwrap_or(Value::Null),
    );
    Value::Object(out)
}

/// Older nodes send static types as a string, newer ones as an object
fn static_type(inner: &Value, field: &str) -> Value {
    match inner.get(field) {
        Some(Value::String(s)) => Value::String(s.clone()),
        Some(Value::Object(t)) => t
            .get("typeID")
            .cloned()
            .unwrap_or_else(|| Value::Object(t.clone())),
        _ => Value::Null,
    }
}

fn decode_range(inner: &Value) -> Result<Value, CadenceError> {
    let mut out = Map::new();
    for bound in ["start", "end", "step"] {
        let value = inner
            .get(bound)
            .ok_or_else(|| CadenceError::Decode(format!("InclusiveRange without {}", bound)))?;
        out.insert(bound.to_string(), decode(value)?);
    }
    Ok(Value::Object(out))
}

fn decode_capability(inner: &Value) -> Result<Value, CadenceError> {
    let mut out = Map::new();
    let path = match inner.get("path") {
        Some(p) if p.get("type").is_some() => decode(p)?,
        Some(p) => p.clone(),
        None => Value::Null,
    };
    out.insert("path".into(), path);
    out.insert("address".into(), inner.get("address").cloned().unwrap_or(Value::Null));
    out.insert(
        "borrowType".into(),
        match inner.get("borrowType") {
            Some(Value::Object(t)) => t.get("typeID").cloned().unwrap_or(Value::Null),
            Some(other) => other.clone(),
            None => Value::Null,
        },
    );
    Ok(Value::Object(out))
}

fn expect_str<'a>(ty: &str, inner: &'a Value) -> Result<&'a str, CadenceError> {
    inner
        .as_str()
        .ok_or_else(|| CadenceError::Decode(format!("{} value must be a string, got {}", ty, inner)))
}

fn expect_array<'a>(ty: &str, inner: &'a Value) -> Result<&'a Vec<Value>, CadenceError> {
    inner
        .as_array()
        .ok_or_else(|| CadenceError::Decode(format!("{} value must be an array, got {}", ty, inner)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_scalars() {
        assert_eq!(decode(&json!({"type": "UInt8", "value": "7"})).unwrap(), json!(7));
        assert_eq!(decode(&json!({"type": "Int32", "value": "-3"})).unwrap(), json!(-3));
        assert_eq!(
            decode(&json!({"type": "UInt64", "value": "18446744073709551615"})).unwrap(),
            json!("18446744073709551615")
        );
        assert_eq!(
            decode(&json!({"type": "UFix64", "value": "12.50000000"})).unwrap(),
            json!("12.50000000")
        );
        assert_eq!(decode(&json!({"type": "Bool", "value": true})).unwrap(), json!(true));
        assert_eq!(
            decode(&json!({"type": "Address", "value": "0xf8d6e0586b0a20c7"})).unwrap(),
            json!("0xf8d6e0586b0a20c7")
        );
        assert_eq!(decode(&json!({"type": "Void"})).unwrap(), Value::Null);
    }

    #[test]
    fn test_decode_optional() {
        assert_eq!(decode(&json!({"type": "Optional", "value": null})).unwrap(), Value::Null);
        assert_eq!(
            decode(&json!({"type": "Optional", "value": {"type": "String", "value": "x"}})).unwrap(),
            json!("x")
        );
    }

    #[test]
    fn test_decode_containers() {
        let raw = json!({"type": "Dictionary", "value": [
            {"key": {"type": "UInt64", "value": "1"},
             "value": {"type": "Array", "value": [{"type": "String", "value": "a"}]}}
        ]});
        assert_eq!(decode(&raw).unwrap(), json!({"1": ["a"]}));
    }

    #[test]
    fn test_decode_composite() {
        let raw = json!({"type": "Struct", "value": {
            "id": "A.f8d6e0586b0a20c7.MelosMarketplace.ListingDetails",
            "fields": [
                {"name": "listingId", "value": {"type": "UInt64", "value": "9"}},
                {"name": "price", "value": {"type": "UFix64", "value": "1.00000000"}}
            ]
        }});
        assert_eq!(decode(&raw).unwrap(), json!({"listingId": "9", "price": "1.00000000"}));
    }

    #[test]
    fn test_decode_path_type_and_capability() {
        assert_eq!(
            decode(&json!({"type": "Path", "value": {"domain": "public", "identifier": "x"}})).unwrap(),
            json!({"domain": "public", "identifier": "x"})
        );
        assert_eq!(
            decode(&json!({"type": "Type", "value": {"staticType": {"kind": "Resource", "typeID": "A.01.NFT"}}}))
                .unwrap(),
            json!("A.01.NFT")
        );
        let cap = decode(&json!({"type": "Capability", "value": {
            "path": {"type": "Path", "value": {"domain": "public", "identifier": "c"}},
            "address": "0x01cf0e2f2f715450",
            "borrowType": "&{NonFungibleToken.CollectionPublic}"
        }}))
        .unwrap();
        assert_eq!(cap["path"]["identifier"], json!("c"));
        assert_eq!(cap["address"], json!("0x01cf0e2f2f715450"));
    }

    #[test]
    fn test_decode_range_and_function() {
        let range = json!({"type": "InclusiveRange", "value": {
            "start": {"type": "UInt64", "value": "1"},
            "end": {"type": "UInt64", "value": "10"},
            "step": {"type": "UInt64", "value": "3"}
        }});
        assert_eq!(decode(&range).unwrap(), json!({"start": "1", "end": "10", "step": "3"}));

        let function = json!({"type": "Function", "value": {
            "functionType": {"kind": "Function", "typeID": "fun(String):Int", "parameters": []}
        }});
        assert_eq!(decode(&function).unwrap(), json!("fun(String):Int"));

        let incomplete = json!({"type": "InclusiveRange", "value": {"start": {"type": "Int", "value": "0"}}});
        assert!(matches!(decode(&incomplete), Err(CadenceError::Decode(_))));
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode(&json!({"value": 1})), Err(CadenceError::Decode(_))));
        assert!(matches!(
            decode(&json!({"type": "Mystery", "value": 1})),
            Err(CadenceError::Decode(_))
        ));
        assert!(matches!(decode_str("not json"), Err(CadenceError::Decode(_))));
    }

    #[test]
    fn test_decode_str_trims_newline() {
        assert_eq!(decode_str("{\"type\":\"Int\",\"value\":\"5\"}\n").unwrap(), json!("5"));
    }
}
