//! Pluggable validation capabilities injected into store backends.
//!
//! Both traits return a plain human-readable reason on failure; the caller
//! wraps it into an [`Error::InvalidArgument`](crate::Error) with the right
//! subject.

use serde_json::Value;

/// Decides whether a string is an acceptable record id.
pub trait RecordIdValidator: Send + Sync {
  fn validate(&self, record_id: &str) -> Result<(), String>;
}

/// Accepts 1–255 bytes of `[A-Za-z0-9._:@-]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRecordIdValidator;

impl DefaultRecordIdValidator {
  pub const MAX_LEN: usize = 255;
}

impl RecordIdValidator for DefaultRecordIdValidator {
  fn validate(&self, record_id: &str) -> Result<(), String> {
    if record_id.len() > Self::MAX_LEN {
      return Err(format!("longer than {} bytes", Self::MAX_LEN));
    }
    match record_id.char_indices().find(|(_, c)| {
      !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '@' | '-'))
    }) {
      Some((pos, c)) => Err(format!("unexpected character {c:?} at position {pos}")),
      None => Ok(()),
    }
  }
}

/// JSON-Schema support: compiling a schema and checking a payload against it.
pub trait SchemaValidator: Send + Sync {
  /// Check that `schema` is itself a usable schema.
  fn check_schema(&self, schema: &Value) -> Result<(), String>;

  /// Check `data` against `schema`, reporting the first violation.
  fn validate(&self, schema: &Value, data: &Value) -> Result<(), String>;
}

/// [`SchemaValidator`] backed by the `jsonschema` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

impl SchemaValidator for JsonSchemaValidator {
  fn check_schema(&self, schema: &Value) -> Result<(), String> {
    jsonschema::validator_for(schema)
      .map(|_| ())
      .map_err(|e| e.to_string())
  }

  fn validate(&self, schema: &Value, data: &Value) -> Result<(), String> {
    let validator = jsonschema::validator_for(schema).map_err(|e| e.to_string())?;
    match validator.iter_errors(data).next() {
      Some(violation) => {
        let path = violation.instance_path.to_string();
        if path.is_empty() {
          Err(violation.to_string())
        } else {
          Err(format!("{path}: {violation}"))
        }
      }
      None => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn record_ids() {
    let v = DefaultRecordIdValidator;
    assert!(v.validate("user:42").is_ok());
    assert!(v.validate("a.b_c-d@e").is_ok());
    assert!(v.validate(&"x".repeat(255)).is_ok());
    assert!(v.validate(&"x".repeat(256)).is_err());
    let err = v.validate("has space").unwrap_err();
    assert!(err.contains("position 3"), "{err}");
    assert!(v.validate("a/b").is_err());
  }

  #[test]
  fn schema_accepts_and_rejects() {
    let schema = json!({
      "type": "object",
      "required": ["name"],
      "properties": { "name": { "type": "string" }, "age": { "type": "integer" } }
    });
    let v = JsonSchemaValidator;
    assert!(v.check_schema(&schema).is_ok());
    assert!(v.validate(&schema, &json!({"name": "ada", "age": 36})).is_ok());

    let err = v.validate(&schema, &json!({"name": "ada", "age": "old"})).unwrap_err();
    assert!(err.starts_with("/age"), "{err}");
    assert!(v.validate(&schema, &json!({"age": 1})).is_err());
  }

  #[test]
  fn broken_schema_is_reported() {
    let v = JsonSchemaValidator;
    assert!(v.check_schema(&json!({"type": "no-such-type"})).is_err());
  }
}
