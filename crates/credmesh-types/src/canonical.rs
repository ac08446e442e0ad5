//! The canonical serializer (C1, spec §4.1).
//!
//! Every hash and signature in the system is computed over the byte
//! sequence produced by [`to_canonical_bytes`]. This is the single most
//! load-bearing module in the workspace: invariant 1 and 2 of spec §8
//! (canonical determinism, hash stability) hold only if every caller goes
//! through here instead of `serde_json::to_vec`/`to_string` directly.
//!
//! Rules implemented (all mandatory, spec §4.1):
//! - object keys sorted alphabetically at every nesting depth
//! - compact separators (`,` and `:`, no whitespace)
//! - integers stay integers; floats normalize to the shortest round-trip
//!   form, with a trailing `.0` collapsed to a bare integer (`3.0` -> `3`)
//! - booleans/nulls lowercase; strings are UTF-8, NFC-normalized
//! - arrays are emitted in the order given (callers use `BTreeSet`/sorted
//!   `Vec` upstream when set semantics are required)

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

/// Serializes `value` to its canonical JSON byte form.
///
/// Returns an error only if `value` cannot be represented as `serde_json`
/// JSON at all (e.g. a `NaN` float, a non-string map key that doesn't
/// round-trip). Callers that hash a structure containing a `hash` field
/// must blank that field to `""` themselves before calling this function;
/// see [`canonical_hash_with_blanked_field`] for the common case.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CanonicalError> {
    let v = serde_json::to_value(value).map_err(|e| CanonicalError::Serialize(e.to_string()))?;
    let mut out = String::new();
    write_canonical(&v, &mut out)?;
    Ok(out.into_bytes())
}

/// As [`to_canonical_bytes`] but returns a `String`.
pub fn to_canonical_string<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    Ok(String::from_utf8(to_canonical_bytes(value)?).expect("canonical output is always UTF-8"))
}

/// SHA-256 of arbitrary UTF-8 text, prefixed `"sha256:"`. This is the *only*
/// other hashing surface besides [`canonical_hash`] — implementations MUST
/// NOT hash raw non-canonical bytes directly, or determinism silently
/// breaks.
pub fn sha256_text(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Canonicalizes `value` and hashes the result. Equivalent to
/// `sha256_text(&to_canonical_string(value)?)`.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    Ok(sha256_text(&to_canonical_string(value)?))
}

/// Hashes `value` (a `serde_json::Value`) after blanking the named field to
/// `""`, matching the "when hashing a structure containing a `hash` field,
/// set that field to the empty string before serializing, then write the
/// computed digest back" rule (§4.1). Used by the ABP, authority ledger,
/// and seal builders.
pub fn canonical_hash_with_blanked_field(
    mut value: Value,
    field: &str,
) -> Result<String, CanonicalError> {
    if let Some(obj) = value.as_object_mut() {
        obj.insert(field.to_string(), Value::String(String::new()));
    }
    let mut out = String::new();
    write_canonical(&value, &mut out)?;
    Ok(sha256_text(&out))
}

#[derive(Debug, thiserror::Error)]
pub enum CanonicalError {
    #[error("failed to serialize value: {0}")]
    Serialize(String),
    #[error("non-finite float cannot be canonicalized")]
    NonFiniteFloat,
    #[error("object key is not valid after NFC normalization")]
    InvalidKey,
}

fn write_canonical(v: &Value, out: &mut String) -> Result<(), CanonicalError> {
    match v {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(n, out)?,
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                // Safe: key came from map.keys().
                write_canonical(map.get(*key).expect("key from map.keys()"), out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn write_number(n: &serde_json::Number, out: &mut String) -> Result<(), CanonicalError> {
    if let Some(i) = n.as_i64() {
        out.push_str(&i.to_string());
        return Ok(());
    }
    if let Some(u) = n.as_u64() {
        out.push_str(&u.to_string());
        return Ok(());
    }
    let f = n.as_f64().ok_or(CanonicalError::NonFiniteFloat)?;
    if !f.is_finite() {
        return Err(CanonicalError::NonFiniteFloat);
    }
    if f.fract() == 0.0 && f.abs() < 1e15 {
        // "3.0" -> "3"
        out.push_str(&format!("{}", f as i64));
    } else {
        // Shortest round-trip representation; Rust's default float Display
        // already produces the shortest string that parses back exactly.
        out.push_str(&format!("{}", f));
    }
    Ok(())
}

fn write_string(s: &str, out: &mut String) {
    let normalized: String = s.nfc().collect();
    out.push('"');
    for c in normalized.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}
