//! Validator keywords read from JSDoc tags.

use crate::error::{bail_generate, Result};
use crate::initializer::json_number;
use crate::jsdoc::{split_first_word, JsDoc, JsDocTag};
use crate::metadata::{Validator, Validators};
use serde_json::Value;

const FLAG_TAGS: &[&str] = &[
    "isString",
    "isBoolean",
    "isInt",
    "isLong",
    "isFloat",
    "isDouble",
    "isDate",
    "isDateTime",
    "isArray",
    "uniqueItems",
];

const NUMERIC_TAGS: &[&str] = &[
    "minimum",
    "maximum",
    "minLength",
    "maxLength",
    "minItems",
    "maxItems",
];

const STRING_TAGS: &[&str] = &["pattern", "minDate", "maxDate"];

/// Validators declared on a property or model.
pub fn property_validators(doc: Option<&JsDoc>) -> Result<Validators> {
    match doc {
        Some(doc) => collect(&doc.tags),
        None => Ok(Validators::new()),
    }
}

/// Validators for `parameter`, declared on the method as `@tag parameter value`.
pub fn parameter_validators(doc: Option<&JsDoc>, parameter: &str) -> Result<Validators> {
    match doc {
        Some(doc) => collect(&doc.parameter_tags(parameter)),
        None => Ok(Validators::new()),
    }
}

fn collect(tags: &[JsDocTag]) -> Result<Validators> {
    let mut validators = Validators::new();
    for tag in tags {
        let name = tag.name.as_str();
        let comment = tag.comment.as_deref().unwrap_or("");

        let validator = if FLAG_TAGS.contains(&name) {
            Validator {
                value: None,
                error_msg: non_empty(comment),
            }
        } else if NUMERIC_TAGS.contains(&name) {
            let (raw, message) = split_first_word(comment);
            let Ok(number) = raw.parse::<f64>() else {
                bail_generate!("@{} requires a numeric value, found '{}'", name, raw);
            };
            Validator {
                value: Some(json_number(number)),
                error_msg: non_empty(message),
            }
        } else if STRING_TAGS.contains(&name) {
            let (raw, message) = split_first_word(comment);
            if raw.is_empty() {
                bail_generate!("@{} requires a value", name);
            }
            Validator {
                value: Some(Value::String(raw.to_string())),
                error_msg: non_empty(message),
            }
        } else {
            continue;
        };
        validators.insert(name.to_string(), validator);
    }
    Ok(validators)
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
