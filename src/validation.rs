//! Request validation
//!
//! Bodies are checked against an ordered list of rules. Every rule runs; the
//! messages of all failing rules are joined, in declaration order, into one
//! `InvalidInput` error.

use serde_json::Value;

use crate::error::{ConfkvError, Result};

/// Entry key that would shadow the record's own version field
pub const RESERVED_KEY: &str = "version";

const MESSAGE_PREFIX: &str = "Invalid input data.";

/// One named check on a top-level body field
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub field: &'static str,
    pub message: &'static str,
    check: fn(Option<&Value>) -> bool,
}

impl Rule {
    pub fn passes(&self, body: &Value) -> bool {
        (self.check)(body.get(self.field))
    }
}

pub const CLIENT_RULE: Rule = Rule {
    field: "client",
    message: "Client name has to be provided - type: string",
    check: is_string,
};

pub const VERSION_RULE: Rule = Rule {
    field: "version",
    message: "Proper version has to be provided - type: number",
    check: is_version,
};

pub const KEY_RULE: Rule = Rule {
    field: "key",
    message: "Proper key parameter for config change has to be provided - type: string",
    check: is_entry_key,
};

pub const VALUE_RULE: Rule = Rule {
    field: "value",
    message: "Proper value parameter for config change has to be provided - type: string",
    check: is_string,
};

/// Rules for body-addressed operations (`POST /config`, `PATCH /config`)
pub const VERSIONED_CHANGE_RULES: [Rule; 4] = [CLIENT_RULE, VERSION_RULE, KEY_RULE, VALUE_RULE];

/// Rules for path-addressed operations (`/config/{client}/{version}`)
pub const CHANGE_RULES: [Rule; 2] = [KEY_RULE, VALUE_RULE];

/// Run every rule and fail with all violations at once
pub fn check(body: &Value, rules: &[Rule]) -> Result<()> {
    let violations: Vec<&str> = rules
        .iter()
        .filter(|rule| !rule.passes(body))
        .map(|rule| rule.message)
        .collect();

    if violations.is_empty() {
        return Ok(());
    }
    Err(ConfkvError::InvalidInput(format!(
        "{} {}",
        MESSAGE_PREFIX,
        violations.join(". ")
    )))
}

fn is_string(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(_)))
}

fn is_version(value: Option<&Value>) -> bool {
    value.and_then(version_of).is_some()
}

fn is_entry_key(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if !s.is_empty() && s != RESERVED_KEY)
}

/// A usable version: a non-zero integral JSON number
fn version_of(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    let version = number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })?;
    (version != 0).then_some(version)
}

/// Version taken from a URL path segment
///
/// Accepts the same integral values as a body version, written as an integer
/// (`109`) or an integral decimal (`109.0`).
pub fn parse_path_version(segment: &str) -> Option<i64> {
    let segment = segment.trim();
    segment.parse::<i64>().ok().or_else(|| {
        segment
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn string_field(body: &Value, field: &str) -> Result<String> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ConfkvError::InvalidInput(format!("{} missing {}", MESSAGE_PREFIX, field)))
}

/// A single key/value change to a record's entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChange {
    pub key: String,
    pub value: String,
}

impl ConfigChange {
    /// Validate a `{key, value}` body
    pub fn from_body(body: &Value) -> Result<Self> {
        check(body, &CHANGE_RULES)?;
        Ok(Self {
            key: string_field(body, KEY_RULE.field)?,
            value: string_field(body, VALUE_RULE.field)?,
        })
    }
}

/// A change addressed by the body's own (client, version)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedChange {
    pub client: String,
    pub version: i64,
    pub change: ConfigChange,
}

impl VersionedChange {
    /// Validate a `{client, version, key, value}` body
    pub fn from_body(body: &Value) -> Result<Self> {
        check(body, &VERSIONED_CHANGE_RULES)?;
        let version = body
            .get(VERSION_RULE.field)
            .and_then(version_of)
            .ok_or_else(|| ConfkvError::InvalidInput(format!("{} missing version", MESSAGE_PREFIX)))?;

        Ok(Self {
            client: string_field(body, CLIENT_RULE.field)?,
            version,
            change: ConfigChange {
                key: string_field(body, KEY_RULE.field)?,
                value: string_field(body, VALUE_RULE.field)?,
            },
        })
    }
}
