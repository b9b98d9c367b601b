use crate::schema::ScalarType;
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde_json::{Number, Value};

/// Current/original pair for primitive and schema-less fields.
/// `None` is an unset value and is omitted from output; `Some(Null)` is an
/// explicit null.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScalarCell {
    scalar: Option<ScalarType>,
    value: Option<Value>,
    original: Option<Value>,
}

impl ScalarCell {
    /// `scalar` is `None` for mixed fields, which accept any value as is.
    pub fn new(scalar: Option<ScalarType>, default: Option<Value>) -> Self {
        let initial = default.and_then(|value| match scalar {
            Some(scalar) => coerce(scalar, value),
            None => Some(value),
        });
        ScalarCell {
            scalar,
            original: initial.clone(),
            value: initial,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn original(&self) -> Option<&Value> {
        self.original.as_ref()
    }

    pub fn assign(&mut self, value: Value) -> bool {
        let coerced = match self.scalar {
            Some(scalar) => coerce(scalar, value),
            None => Some(value),
        };
        match coerced {
            Some(value) => {
                self.value = Some(value);
                true
            }
            None => false,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.value != self.original
    }

    pub fn commit(&mut self) {
        self.original = self.value.clone();
    }
}

/// Convert `value` into the representation of `scalar`. Returns `None` when
/// the value has no sensible conversion. Null passes through for every type.
pub fn coerce(scalar: ScalarType, value: Value) -> Option<Value> {
    if value.is_null() {
        return Some(value);
    }

    let coerced = match scalar {
        ScalarType::String => match value {
            Value::String(_) => Some(value),
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        ScalarType::Number => match value {
            Value::Number(_) => Some(value),
            Value::String(s) => parse_number(s.trim()),
            _ => None,
        },
        ScalarType::Integer => match &value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
            Value::Number(n) => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| Value::from(f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
            _ => None,
        },
        ScalarType::Boolean => match &value {
            Value::Bool(_) => Some(value.clone()),
            Value::String(s) => match s.trim() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(Value::Bool(true)),
                Some(0) => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
        ScalarType::Date => match &value {
            Value::String(s) => parse_date(s.trim()),
            _ => None,
        },
        ScalarType::Datetime => match &value {
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| format_datetime(dt.with_timezone(&Utc))),
            Value::Number(n) => n
                .as_i64()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
                .map(format_datetime),
            _ => None,
        },
    };

    if coerced.is_none() {
        log::debug!("cannot coerce value to {}", scalar.tag());
    }
    coerced
}

fn parse_number(s: &str) -> Option<Value> {
    if let Ok(int) = s.parse::<i64>() {
        return Some(Value::from(int));
    }
    s.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn parse_date(s: &str) -> Option<Value> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))?;
    Some(Value::String(date.format("%Y-%m-%d").to_string()))
}

fn format_datetime(dt: DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}
