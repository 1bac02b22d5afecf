//! Static evaluation of initializers and example values.
//!
//! Only literal expressions are evaluated; nothing in the analyzed program is
//! ever executed.

use crate::ast::{Expr, Literal};
use crate::error::{bail_generate, Result};
use crate::metadata::Type;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Number, Value};

/// Evaluates a literal expression. `undefined` evaluates to `None`.
pub fn evaluate(expr: &Expr) -> Result<Option<Value>> {
    let value = match expr {
        Expr::String(s) => Value::String(s.clone()),
        Expr::Number(n) => json_number(*n),
        Expr::Bool(b) => Value::Bool(*b),
        Expr::Null => Value::Null,
        Expr::Undefined => return Ok(None),
        Expr::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| Ok(evaluate(item)?.unwrap_or(Value::Null)))
                .collect::<Result<Vec<_>>>()?,
        ),
        Expr::Object(entries) => {
            let mut map = Map::new();
            for (key, value) in entries {
                if let Some(value) = evaluate(value)? {
                    map.insert(key.clone(), value);
                }
            }
            Value::Object(map)
        }
        Expr::New {
            constructor,
            arguments,
        } if constructor == "Date" => match arguments.as_slice() {
            [Expr::String(s)] => Value::String(s.clone()),
            [Expr::Number(millis)] => Value::String(format_datetime(timestamp(*millis, expr)?)),
            _ => bail_generate!("Unable to statically evaluate '{}'", expr.describe()),
        },
        other => bail_generate!("Unable to statically evaluate '{}'", other.describe()),
    };
    Ok(Some(value))
}

/// Coerces an evaluated value against the type it initializes.
pub fn coerce(value: Value, ty: &Type) -> Result<Value> {
    match (ty, &value) {
        (_, Value::Null) => Ok(value),
        (Type::Integer | Type::Long, Value::Number(n)) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 => Ok(json_number(f)),
            _ => bail_generate!("Default value {} is not an integer", value),
        },
        (Type::Double | Type::Float, Value::Number(_)) => Ok(value),
        (Type::String, Value::String(_)) => Ok(value),
        (Type::Boolean, Value::Bool(_)) => Ok(value),
        (Type::Date, Value::String(s)) => Ok(Value::String(
            parse_datetime(s)?.format("%Y-%m-%d").to_string(),
        )),
        (Type::Datetime, Value::String(s)) => Ok(Value::String(format_datetime(parse_datetime(s)?))),
        (Type::Enum { enums }, _) => {
            if enums.contains(&value) {
                Ok(value)
            } else {
                bail_generate!("Default value {} is not one of the enum values", value)
            }
        }
        (Type::Array { element_type }, Value::Array(items)) => Ok(Value::Array(
            items
                .iter()
                .cloned()
                .map(|item| coerce(item, element_type))
                .collect::<Result<Vec<_>>>()?,
        )),
        (Type::Any | Type::Object | Type::RefObject { .. } | Type::RefEnum { .. }, _) => Ok(value),
        _ => bail_generate!(
            "Default value {} does not match type '{}'",
            value,
            ty.data_type()
        ),
    }
}

/// Evaluates `expr` and coerces the result against `ty`.
pub fn default_value(expr: &Expr, ty: &Type) -> Result<Option<Value>> {
    match evaluate(expr)? {
        Some(value) => Ok(Some(coerce(value, ty)?)),
        None => Ok(None),
    }
}

/// JSON value of a literal type.
pub fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::String(s) => Value::String(s.clone()),
        Literal::Number(n) => json_number(*n),
        Literal::Boolean(b) => Value::Bool(*b),
    }
}

/// Whole numbers become JSON integers (`404`, not `404.0`).
pub fn json_number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn timestamp(millis: f64, expr: &Expr) -> Result<DateTime<Utc>> {
    match Utc.timestamp_millis_opt(millis as i64).single() {
        Some(datetime) => Ok(datetime),
        None => bail_generate!("Invalid date '{}'", expr.describe()),
    }
}

fn parse_datetime(text: &str) -> Result<DateTime<Utc>> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Ok(datetime.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    bail_generate!("Invalid date '{}'", text)
}

fn format_datetime(datetime: DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_evaluate_nested_literals() {
        let expr = Expr::Object(vec![
            ("id".to_string(), Expr::Number(1.0)),
            ("ratio".to_string(), Expr::Number(0.5)),
            (
                "tags".to_string(),
                Expr::Array(vec![Expr::String("a".into()), Expr::Bool(false)]),
            ),
            ("skipped".to_string(), Expr::Undefined),
        ]);

        assert_eq!(
            evaluate(&expr).unwrap(),
            Some(json!({ "id": 1, "ratio": 0.5, "tags": ["a", false] }))
        );
        assert_eq!(evaluate(&Expr::Undefined).unwrap(), None);
    }

    #[test]
    fn test_evaluate_rejects_non_literals() {
        let err = evaluate(&Expr::Identifier("DEFAULT_LIMIT".into())).unwrap_err();
        assert_eq!(err.message(), "Unable to statically evaluate 'DEFAULT_LIMIT'");

        let now = Expr::New {
            constructor: "Date".into(),
            arguments: vec![],
        };
        assert!(evaluate(&now).is_err());
    }

    #[test]
    fn test_coerce_integers_and_dates() {
        assert_eq!(coerce(json!(10), &Type::Integer).unwrap(), json!(10));
        assert!(coerce(json!(1.5), &Type::Long).is_err());
        assert_eq!(
            coerce(json!("2018-01-04T00:00:00Z"), &Type::Date).unwrap(),
            json!("2018-01-04")
        );
        assert_eq!(
            coerce(json!("2018-01-04"), &Type::Datetime).unwrap(),
            json!("2018-01-04T00:00:00.000Z")
        );
        assert!(coerce(json!("not a date"), &Type::Date).is_err());
    }

    #[test]
    fn test_coerce_enum_and_array() {
        let status = Type::Enum {
            enums: vec![json!("active"), json!("inactive")],
        };
        assert_eq!(coerce(json!("active"), &status).unwrap(), json!("active"));
        assert!(coerce(json!("deleted"), &status).is_err());

        let numbers = Type::array(Type::Integer);
        assert_eq!(coerce(json!([1, 2]), &numbers).unwrap(), json!([1, 2]));
        assert!(coerce(json!("x"), &Type::Boolean).is_err());
    }

    #[test]
    fn test_new_date_with_timestamp() {
        let expr = Expr::New {
            constructor: "Date".into(),
            arguments: vec![Expr::Number(0.0)],
        };
        assert_eq!(
            evaluate(&expr).unwrap(),
            Some(json!("1970-01-01T00:00:00.000Z"))
        );
    }
}
