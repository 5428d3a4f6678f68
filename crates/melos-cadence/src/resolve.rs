//! Type-directed argument resolution
//!
//! Raw caller values (`serde_json::Value`) are checked against a declared
//! [`TypeDescriptor`] and normalized into [`CadenceValue`]s. Containers are
//! resolved element by element, so a fixed-point value nested in a
//! dictionary inside an array is formatted the same way as a top-level one.

use std::fmt;
use std::sync::Arc;

use melos_primitives::Address;
use serde_json::Value;

use crate::introspect::{introspect, DeclaredArg};
use crate::types::{TypeDescriptor, TypeKind};
use crate::value::{Argument, CadenceValue, PathDomain};
use crate::CadenceError;

/// Rewrites a `(type, value)` pair before built-in resolution
pub trait ArgumentPlugin: Send + Sync {
    /// Plugin name, used in logs
    fn name(&self) -> &str;

    /// Transform the pair. Returning it unchanged is a no-op.
    fn transform(
        &self,
        ty: TypeDescriptor,
        value: Value,
    ) -> Result<(TypeDescriptor, Value), CadenceError>;
}

/// Resolves raw values against declared types.
///
/// Plugins run in registration order on every value, nested ones included.
#[derive(Clone, Default)]
pub struct ArgumentResolver {
    plugins: Vec<Arc<dyn ArgumentPlugin>>,
}

impl fmt::Debug for ArgumentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("ArgumentResolver")
            .field("plugins", &names)
            .finish()
    }
}

impl ArgumentResolver {
    /// Resolver without plugins
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin to the chain
    pub fn with_plugin(mut self, plugin: impl ArgumentPlugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Append a shared plugin to the chain
    pub fn with_shared_plugin(mut self, plugin: Arc<dyn ArgumentPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Number of registered plugins
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Resolve one value against a declared type
    pub fn resolve(&self, ty: &TypeDescriptor, raw: &Value) -> Result<Argument, CadenceError> {
        let (ty, raw) = self.run_plugins(ty.clone(), raw.clone())?;
        let value = self.resolve_value(&ty, &raw)?;
        Ok(Argument::new(ty, value))
    }

    /// Resolve values positionally against declared parameters.
    ///
    /// Fails with [`CadenceError::Arity`] when fewer values than parameters
    /// are given. Surplus values are ignored.
    pub fn resolve_all(
        &self,
        declared: &[DeclaredArg],
        raw: &[Value],
    ) -> Result<Vec<Argument>, CadenceError> {
        if raw.len() < declared.len() {
            return Err(CadenceError::Arity {
                expected: declared.len(),
                got: raw.len(),
            });
        }
        if raw.len() > declared.len() {
            tracing::debug!(
                declared = declared.len(),
                supplied = raw.len(),
                "ignoring surplus argument values"
            );
        }

        declared
            .iter()
            .zip(raw)
            .map(|(param, value)| {
                self.resolve(&param.ty, value)
                    .map_err(|e| annotate(e, &param.name))
            })
            .collect()
    }

    /// Introspect `template` and resolve `raw` against its parameters
    pub fn resolve_template(
        &self,
        template: &str,
        raw: &[Value],
    ) -> Result<Vec<Argument>, CadenceError> {
        let info = introspect(template);
        self.resolve_all(&info.declared_args, raw)
    }

    fn run_plugins(
        &self,
        ty: TypeDescriptor,
        raw: Value,
    ) -> Result<(TypeDescriptor, Value), CadenceError> {
        self.plugins
            .iter()
            .try_fold((ty, raw), |(ty, raw), plugin| plugin.transform(ty, raw))
    }

    fn resolve_nested(&self, ty: &TypeDescriptor, raw: &Value) -> Result<CadenceValue, CadenceError> {
        let (ty, raw) = self.run_plugins(ty.clone(), raw.clone())?;
        self.resolve_value(&ty, &raw)
    }

    fn resolve_value(&self, ty: &TypeDescriptor, raw: &Value) -> Result<CadenceValue, CadenceError> {
        if ty.is_optional() {
            return match raw {
                Value::Null => Ok(CadenceValue::nil()),
                _ => Ok(CadenceValue::some(self.resolve_value(&ty.non_optional(), raw)?)),
            };
        }

        match ty.kind() {
            TypeKind::BasicNumeric => resolve_integer(ty.name(), raw),
            TypeKind::FixedPoint => resolve_fixed(ty.name(), raw),
            TypeKind::String => Ok(CadenceValue::String(expect_str(ty, raw)?.to_string())),
            TypeKind::Character => Ok(CadenceValue::Character(expect_str(ty, raw)?.to_string())),
            TypeKind::Bool => match raw {
                Value::Bool(b) => Ok(CadenceValue::Bool(*b)),
                other => Err(mismatch(ty, other)),
            },
            TypeKind::Address => resolve_address(raw),
            TypeKind::Path => resolve_path(ty.name(), raw),
            TypeKind::Array { .. } => self.resolve_array(ty, raw),
            TypeKind::Dictionary { .. } => self.resolve_dictionary(ty, raw),
            TypeKind::Unsupported => Err(CadenceError::Resolution(format!(
                "unsupported type '{}'",
                ty
            ))),
            TypeKind::Invalid => Err(CadenceError::Type("empty type descriptor".to_string())),
        }
    }

    fn resolve_array(&self, ty: &TypeDescriptor, raw: &Value) -> Result<CadenceValue, CadenceError> {
        let element = ty
            .element()
            .ok_or_else(|| CadenceError::Type(format!("'{}' is not an array type", ty)))?;
        let items = raw.as_array().ok_or_else(|| mismatch(ty, raw))?;

        items
            .iter()
            .map(|item| self.resolve_nested(&element, item))
            .collect::<Result<Vec<_>, _>>()
            .map(CadenceValue::Array)
    }

    fn resolve_dictionary(
        &self,
        ty: &TypeDescriptor,
        raw: &Value,
    ) -> Result<CadenceValue, CadenceError> {
        let (key_ty, value_ty) = ty
            .key_value()
            .ok_or_else(|| CadenceError::Type(format!("'{}' is not a dictionary type", ty)))?;

        let raw_entries: Vec<(Value, &Value)> = match raw {
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| (Value::String(k.clone()), v))
                .collect(),
            Value::Array(pairs) => pairs
                .iter()
                .map(|pair| dictionary_pair(ty, pair))
                .collect::<Result<_, _>>()?,
            other => return Err(mismatch(ty, other)),
        };

        raw_entries
            .into_iter()
            .map(|(key, value)| {
                Ok((
                    self.resolve_nested(&key_ty, &key)?,
                    self.resolve_nested(&value_ty, value)?,
                ))
            })
            .collect::<Result<Vec<_>, CadenceError>>()
            .map(CadenceValue::Dictionary)
    }
}

/// Accepts `{"key": k, "value": v}` or `[k, v]`
fn dictionary_pair<'a>(
    ty: &TypeDescriptor,
    pair: &'a Value,
) -> Result<(Value, &'a Value), CadenceError> {
    match pair {
        Value::Object(entry) => match (entry.get("key"), entry.get("value")) {
            (Some(k), Some(v)) => Ok((k.clone(), v)),
            _ => Err(mismatch(ty, pair)),
        },
        Value::Array(kv) if kv.len() == 2 => Ok((kv[0].clone(), &kv[1])),
        other => Err(mismatch(ty, other)),
    }
}

fn resolve_integer(name: &str, raw: &Value) -> Result<CadenceValue, CadenceError> {
    let digits = match raw {
        Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
        Value::String(s) => canonical_integer(s.trim()).ok_or_else(|| {
            CadenceError::Type(format!("expected an integer for {}, got '{}'", name, s))
        })?,
        other => {
            return Err(CadenceError::Type(format!(
                "expected an integer for {}, got {}",
                name, other
            )))
        }
    };

    let unsigned = name.starts_with("UInt") || name.starts_with("Word");
    if unsigned && digits.starts_with('-') {
        return Err(CadenceError::Type(format!(
            "negative value {} for unsigned type {}",
            digits, name
        )));
    }

    Ok(CadenceValue::Int {
        ty: name.to_string(),
        value: digits,
    })
}

/// `-?[0-9]+` with redundant leading zeros removed
fn canonical_integer(s: &str) -> Option<String> {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.strip_prefix('+').unwrap_or(s)),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        return Some("0".to_string());
    }
    Some(format!("{}{}", sign, trimmed))
}

fn resolve_fixed(name: &str, raw: &Value) -> Result<CadenceValue, CadenceError> {
    let formatted = match raw {
        Value::Null => return Ok(CadenceValue::nil()),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => format!("{}.00000000", i),
            (_, Some(u), _) => format!("{}.00000000", u),
            (_, _, Some(f)) if f.is_finite() => format!("{:.8}", f),
            _ => return Err(fixed_error(raw)),
        },
        Value::String(s) => format_fixed_str(s.trim()).ok_or_else(|| fixed_error(raw))?,
        other => return Err(fixed_error(other)),
    };

    if name == "UFix64" && formatted.starts_with('-') {
        return Err(CadenceError::Type(format!(
            "negative value {} for UFix64",
            formatted
        )));
    }

    Ok(CadenceValue::Fix {
        ty: name.to_string(),
        value: formatted,
    })
}

/// Plain decimals with up to 8 fractional digits are padded exactly;
/// anything else that parses as a float is rounded to 8 places.
fn format_fixed_str(s: &str) -> Option<String> {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    let int_digits = int_part.strip_prefix('-').unwrap_or(int_part);
    let plain = !int_digits.is_empty()
        && int_digits.chars().all(|c| c.is_ascii_digit())
        && frac_part.chars().all(|c| c.is_ascii_digit())
        && frac_part.len() <= 8;
    if plain {
        return Some(format!("{}.{:0<8}", int_part, frac_part));
    }

    let parsed: f64 = s.parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    Some(format!("{:.8}", parsed))
}

fn fixed_error(raw: &Value) -> CadenceError {
    CadenceError::Type(format!("expected proper value for fixed type, got {}", raw))
}

fn resolve_address(raw: &Value) -> Result<CadenceValue, CadenceError> {
    let text = raw
        .as_str()
        .ok_or_else(|| CadenceError::AddressFormat(format!("expected address string, got {}", raw)))?;
    Address::from_hex(text)
        .map(CadenceValue::Address)
        .map_err(|e| CadenceError::AddressFormat(format!("'{}': {}", text, e)))
}

fn resolve_path(name: &str, raw: &Value) -> Result<CadenceValue, CadenceError> {
    let (domain, identifier) = match raw {
        Value::String(s) => {
            let rest = s.strip_prefix('/').ok_or_else(|| {
                CadenceError::PathFormat(format!("path '{}' must start with '/'", s))
            })?;
            let segments: Vec<&str> = rest.split('/').collect();
            match segments.as_slice() {
                [domain, identifier] if !identifier.is_empty() => {
                    (domain.parse::<PathDomain>()?, identifier.to_string())
                }
                _ => {
                    return Err(CadenceError::PathFormat(format!(
                        "path '{}' must be /<domain>/<identifier>",
                        s
                    )))
                }
            }
        }
        Value::Object(map) => match (
            map.get("domain").and_then(Value::as_str),
            map.get("identifier").and_then(Value::as_str),
        ) {
            (Some(domain), Some(identifier)) if !identifier.is_empty() => {
                (domain.parse::<PathDomain>()?, identifier.to_string())
            }
            _ => {
                return Err(CadenceError::PathFormat(format!(
                    "expected {{domain, identifier}}, got {}",
                    raw
                )))
            }
        },
        other => {
            return Err(CadenceError::PathFormat(format!(
                "expected path string, got {}",
                other
            )))
        }
    };

    let allowed = match name {
        "StoragePath" => matches!(domain, PathDomain::Storage),
        "PublicPath" => matches!(domain, PathDomain::Public),
        "PrivatePath" => matches!(domain, PathDomain::Private),
        "CapabilityPath" => !matches!(domain, PathDomain::Storage),
        _ => true,
    };
    if !allowed {
        return Err(CadenceError::PathFormat(format!(
            "{} cannot live in the {} domain",
            name, domain
        )));
    }

    Ok(CadenceValue::Path { domain, identifier })
}

fn expect_str<'a>(ty: &TypeDescriptor, raw: &'a Value) -> Result<&'a str, CadenceError> {
    raw.as_str().ok_or_else(|| mismatch(ty, raw))
}

fn mismatch(ty: &TypeDescriptor, raw: &Value) -> CadenceError {
    CadenceError::Type(format!("value {} does not match type {}", raw, ty))
}

fn annotate(error: CadenceError, param: &str) -> CadenceError {
    match error {
        CadenceError::Type(m) => CadenceError::Type(format!("argument '{}': {}", param, m)),
        CadenceError::AddressFormat(m) => {
            CadenceError::AddressFormat(format!("argument '{}': {}", param, m))
        }
        CadenceError::PathFormat(m) => {
            CadenceError::PathFormat(format!("argument '{}': {}", param, m))
        }
        CadenceError::Resolution(m) => {
            CadenceError::Resolution(format!("argument '{}': {}", param, m))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(ty: &str, raw: Value) -> Result<CadenceValue, CadenceError> {
        ArgumentResolver::new()
            .resolve(&TypeDescriptor::classify(ty), &raw)
            .map(|arg| arg.value)
    }

    #[test]
    fn test_integer_from_number_and_string() {
        assert_eq!(
            resolve("UInt64", json!(42)).unwrap().to_json(),
            json!({"type": "UInt64", "value": "42"})
        );
        assert_eq!(
            resolve("Int", json!("-007")).unwrap().to_json(),
            json!({"type": "Int", "value": "-7"})
        );
        assert_eq!(
            resolve("UInt256", json!("115792089237316195423570985008687907853269984665640564039457584007913129639935"))
                .unwrap()
                .to_json()["value"],
            json!("115792089237316195423570985008687907853269984665640564039457584007913129639935")
        );
    }

    #[test]
    fn test_integer_rejects_bad_input() {
        assert!(matches!(resolve("UInt64", json!(1.5)), Err(CadenceError::Type(_))));
        assert!(matches!(resolve("UInt64", json!("abc")), Err(CadenceError::Type(_))));
        assert!(matches!(resolve("UInt8", json!(-1)), Err(CadenceError::Type(_))));
        assert!(matches!(resolve("Int8", json!(true)), Err(CadenceError::Type(_))));
    }

    #[test]
    fn test_fixed_point_formatting() {
        let cases = [
            (json!(5), "5.00000000"),
            (json!(0.2), "0.20000000"),
            (json!("12.5"), "12.50000000"),
            (json!("3"), "3.00000000"),
            (json!("1e2"), "100.00000000"),
            (json!("92233720368.54775807"), "92233720368.54775807"),
        ];
        for (raw, expected) in cases {
            assert_eq!(
                resolve("UFix64", raw.clone()).unwrap(),
                CadenceValue::Fix {
                    ty: "UFix64".into(),
                    value: expected.into()
                },
                "{}",
                raw
            );
        }
        assert_eq!(
            resolve("Fix64", json!(-1.25)).unwrap().to_json()["value"],
            json!("-1.25000000")
        );
    }

    #[test]
    fn test_fixed_point_null_passes_through() {
        assert_eq!(resolve("UFix64", Value::Null).unwrap(), CadenceValue::nil());
    }

    #[test]
    fn test_fixed_point_rejects_garbage() {
        match resolve("UFix64", json!("ten")) {
            Err(CadenceError::Type(msg)) => {
                assert!(msg.contains("expected proper value for fixed type"))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(resolve("UFix64", json!(-1)).is_err());
        assert!(resolve("UFix64", json!([1])).is_err());
    }

    #[test]
    fn test_address_prefix_and_case() {
        let a = resolve("Address", json!("0xABCDEF0123456789")).unwrap();
        let b = resolve("Address", json!("abcdef0123456789")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_json()["value"], json!("0xabcdef0123456789"));
    }

    #[test]
    fn test_address_malformed() {
        assert!(matches!(resolve("Address", json!("0x01")), Err(CadenceError::AddressFormat(_))));
        assert!(matches!(
            resolve("Address", json!("0xzzzzzzzzzzzzzzzz")),
            Err(CadenceError::AddressFormat(_))
        ));
        assert!(matches!(resolve("Address", json!(7)), Err(CadenceError::AddressFormat(_))));
    }

    #[test]
    fn test_path() {
        assert_eq!(
            resolve("Path", json!("/public/flowTokenReceiver")).unwrap(),
            CadenceValue::Path {
                domain: PathDomain::Public,
                identifier: "flowTokenReceiver".into()
            }
        );
        assert!(matches!(resolve("Path", json!("public/x")), Err(CadenceError::PathFormat(_))));
        assert!(matches!(resolve("Path", json!("/temp/x")), Err(CadenceError::PathFormat(_))));
        assert!(matches!(resolve("Path", json!("/storage/a/b")), Err(CadenceError::PathFormat(_))));
        assert!(matches!(
            resolve("StoragePath", json!("/public/x")),
            Err(CadenceError::PathFormat(_))
        ));
        assert!(resolve("Path", json!({"domain": "storage", "identifier": "vault"})).is_ok());
    }

    #[test]
    fn test_optional() {
        assert_eq!(resolve("Address?", Value::Null).unwrap(), CadenceValue::nil());
        assert_eq!(
            resolve("String?", json!("x")).unwrap().to_json(),
            json!({"type": "Optional", "value": {"type": "String", "value": "x"}})
        );
    }

    #[test]
    fn test_primitive_array() {
        assert_eq!(
            resolve("[UInt64]", json!([1, 2])).unwrap().to_json(),
            json!({"type": "Array", "value": [
                {"type": "UInt64", "value": "1"},
                {"type": "UInt64", "value": "2"}
            ]})
        );
        assert!(matches!(resolve("[UInt64]", json!(1)), Err(CadenceError::Type(_))));
    }

    #[test]
    fn test_array_of_dictionaries() {
        let value = resolve("[{String:UFix64}]", json!([{"a": 1.5}])).unwrap();
        assert_eq!(
            value.to_json(),
            json!({"type": "Array", "value": [
                {"type": "Dictionary", "value": [
                    {"key": {"type": "String", "value": "a"},
                     "value": {"type": "UFix64", "value": "1.50000000"}}
                ]}
            ]})
        );
    }

    #[test]
    fn test_dictionary_numeric_keys_and_order() {
        let value = resolve("{UInt64: Address}", json!({
            "10": "0xf8d6e0586b0a20c7",
            "2": "01cf0e2f2f715450"
        }))
        .unwrap();
        match value {
            CadenceValue::Dictionary(entries) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].0, CadenceValue::Int { ty: "UInt64".into(), value: "10".into() });
                assert_eq!(entries[1].0, CadenceValue::Int { ty: "UInt64".into(), value: "2".into() });
            }
            other => panic!("expected dictionary, got {:?}", other),
        }
    }

    #[test]
    fn test_dictionary_pair_forms() {
        let from_objects = resolve(
            "{Address: UFix64}",
            json!([{"key": "0xf8d6e0586b0a20c7", "value": 0.05}]),
        )
        .unwrap();
        let from_tuples = resolve("{Address: UFix64}", json!([["0xf8d6e0586b0a20c7", 0.05]])).unwrap();
        assert_eq!(from_objects, from_tuples);
        assert!(resolve("{Address: UFix64}", json!([["only-one"]])).is_err());
    }

    #[test]
    fn test_unsupported_type_fails() {
        assert!(matches!(
            resolve("@MelosNFT.NFT", json!(1)),
            Err(CadenceError::Resolution(_))
        ));
        assert!(matches!(resolve("", json!(1)), Err(CadenceError::Type(_))));
    }

    #[test]
    fn test_resolve_all_arity() {
        let declared = vec![
            DeclaredArg { name: "a".into(), ty: TypeDescriptor::classify("UInt64") },
            DeclaredArg { name: "b".into(), ty: TypeDescriptor::classify("UFix64") },
        ];
        let resolver = ArgumentResolver::new();

        assert_eq!(
            resolver.resolve_all(&declared, &[json!(1)]).unwrap_err(),
            CadenceError::Arity { expected: 2, got: 1 }
        );
        assert_eq!(resolver.resolve_all(&declared, &[json!(1), json!(2)]).unwrap().len(), 2);
        // surplus values are ignored
        assert_eq!(
            resolver
                .resolve_all(&declared, &[json!(1), json!(2), json!("extra")])
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_resolve_all_names_failing_argument() {
        let declared = vec![DeclaredArg {
            name: "recipient".into(),
            ty: TypeDescriptor::classify("Address"),
        }];
        let err = ArgumentResolver::new()
            .resolve_all(&declared, &[json!("nope")])
            .unwrap_err();
        assert!(err.to_string().contains("recipient"));
    }

    struct NamedAccounts;

    impl ArgumentPlugin for NamedAccounts {
        fn name(&self) -> &str {
            "named-accounts"
        }

        fn transform(
            &self,
            ty: TypeDescriptor,
            value: Value,
        ) -> Result<(TypeDescriptor, Value), CadenceError> {
            if ty.kind() == &TypeKind::Address && value == json!("alice") {
                return Ok((ty, json!("0x01cf0e2f2f715450")));
            }
            Ok((ty, value))
        }
    }

    struct Retype;

    impl ArgumentPlugin for Retype {
        fn name(&self) -> &str {
            "retype"
        }

        fn transform(
            &self,
            ty: TypeDescriptor,
            value: Value,
        ) -> Result<(TypeDescriptor, Value), CadenceError> {
            if ty.name() == "ListingID" {
                return Ok((TypeDescriptor::classify("UInt64"), value));
            }
            Ok((ty, value))
        }
    }

    #[test]
    fn test_plugins_run_in_order_and_nested() {
        let resolver = ArgumentResolver::new()
            .with_plugin(Retype)
            .with_plugin(NamedAccounts);
        assert_eq!(resolver.plugin_count(), 2);

        let arg = resolver
            .resolve(&TypeDescriptor::classify("ListingID"), &json!(3))
            .unwrap();
        assert_eq!(arg.ty.name(), "UInt64");

        let arg = resolver
            .resolve(&TypeDescriptor::classify("[Address]"), &json!(["alice"]))
            .unwrap();
        assert_eq!(
            arg.to_json()["value"][0]["value"],
            json!("0x01cf0e2f2f715450")
        );
        assert!(format!("{:?}", resolver).contains("named-accounts"));
    }
}
