//! # Validator Module
//!
//! Parameter validation runs after a successful match and before the
//! pipeline. It is deliberately outside the routing core: a rejected value is
//! a 400-class failure, distinct from 404/405 routing outcomes.
//!
//! [`JsonSchemaValidator`] coerces each raw string according to the declared
//! schema's `type` and checks it with the schema compiled at registration:
//!
//! ```rust,ignore
//! api.get("/pets/:id", get_pet)?
//!     .param_schema("id", json!({ "type": "integer", "minimum": 1 }))?;
//! let dispatcher = Dispatcher::new(api.build()?).with_validator(JsonSchemaValidator);
//! ```

use serde_json::{Number, Value};
use std::fmt;
use std::sync::Arc;

use crate::router::{ParamSchema, Route};

/// A rejected parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub param: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid parameter '{}': {}", self.param, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Checks the raw values bound by a matched route's own pattern.
///
/// Values bound by enclosing mount prefixes are not passed in: a schema
/// declared on the route only ever applies to the route's segments.
pub trait ParamValidator: Send + Sync {
    fn validate(&self, route: &Route, params: &[(Arc<str>, String)]) -> Result<(), ValidationError>;
}

/// Validates parameters against the JSON schemas declared on the route.
///
/// Parameters without a declared schema, and declared parameters that were
/// not bound (an absent optional segment), are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

impl ParamValidator for JsonSchemaValidator {
    fn validate(&self, route: &Route, params: &[(Arc<str>, String)]) -> Result<(), ValidationError> {
        for (name, schema) in route.param_schemas() {
            let Some(raw) = params
                .iter()
                .rfind(|(k, _)| k.as_ref() == name)
                .map(|(_, v)| v.as_str())
            else {
                continue;
            };
            let value = coerce(schema, raw).map_err(|message| ValidationError {
                param: name.to_string(),
                message,
            })?;
            if !schema.is_valid(&value) {
                return Err(ValidationError {
                    param: name.to_string(),
                    message: format!("value '{raw}' does not satisfy schema {}", schema.schema()),
                });
            }
        }
        Ok(())
    }
}

/// Convert a raw path value into the JSON type its schema declares.
pub fn coerce(schema: &ParamSchema, raw: &str) -> Result<Value, String> {
    match schema.schema().get("type").and_then(Value::as_str) {
        Some("integer") => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("expected integer, got '{raw}'")),
        Some("number") => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("expected number, got '{raw}'")),
        Some("boolean") => match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(format!("expected boolean, got '{raw}'")),
        },
        _ => Ok(Value::String(raw.to_string())),
    }
}
