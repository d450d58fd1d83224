//! Conversion of stored JSON values into a requested [`SettingType`]
//!
//! Every function in this module is total:
//! each combination of source value and target type produces a value, none of them fails.
//! Some of these conversions are lossy (e.g. a non-numeric string becomes `0`).

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

/// The logical types a setting can be read as
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    /// [`TypedValue::String`]
    String,
    /// [`TypedValue::Integer`]
    Integer,
    /// [`TypedValue::Float`]
    Float,
    /// [`TypedValue::Boolean`]
    Boolean,
    /// [`TypedValue::Array`]
    Array,
    /// [`TypedValue::Object`]
    Object,
}

/// A setting's value after being coerced into a [`SettingType`]
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum TypedValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Array(Vec<Value>),
    Object(Map<String, Value>),
}

impl SettingType {
    /// The type's lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            SettingType::String => "string",
            SettingType::Integer => "integer",
            SettingType::Float => "float",
            SettingType::Boolean => "boolean",
            SettingType::Array => "array",
            SettingType::Object => "object",
        }
    }
}

impl fmt::Display for SettingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by [`SettingType::from_str`]
#[derive(Error, Debug)]
#[error("Unknown setting type '{0}'")]
pub struct UnknownSettingType(pub String);

impl FromStr for SettingType {
    type Err = UnknownSettingType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "string" => SettingType::String,
            "integer" => SettingType::Integer,
            "float" => SettingType::Float,
            "boolean" => SettingType::Boolean,
            "array" => SettingType::Array,
            "object" => SettingType::Object,
            _ => return Err(UnknownSettingType(s.to_string())),
        })
    }
}

impl TypedValue {
    /// The [`SettingType`] this value has
    pub fn setting_type(&self) -> SettingType {
        match self {
            TypedValue::String(_) => SettingType::String,
            TypedValue::Integer(_) => SettingType::Integer,
            TypedValue::Float(_) => SettingType::Float,
            TypedValue::Boolean(_) => SettingType::Boolean,
            TypedValue::Array(_) => SettingType::Array,
            TypedValue::Object(_) => SettingType::Object,
        }
    }
}

impl From<TypedValue> for Value {
    fn from(value: TypedValue) -> Self {
        match value {
            TypedValue::String(string) => Value::String(string),
            TypedValue::Integer(integer) => Value::from(integer),
            TypedValue::Float(float) => Value::from(float),
            TypedValue::Boolean(boolean) => Value::Bool(boolean),
            TypedValue::Array(array) => Value::Array(array),
            TypedValue::Object(object) => Value::Object(object),
        }
    }
}

/// Coerces `value` into `setting_type`
pub fn coerce(value: &Value, setting_type: SettingType) -> TypedValue {
    match setting_type {
        SettingType::String => TypedValue::String(to_string(value)),
        SettingType::Integer => TypedValue::Integer(to_integer(value)),
        SettingType::Float => TypedValue::Float(to_float(value)),
        SettingType::Boolean => TypedValue::Boolean(to_boolean(value)),
        SettingType::Array => TypedValue::Array(to_array(value)),
        SettingType::Object => TypedValue::Object(to_object(value)),
    }
}

/// Converts a value into its natural string representation
///
/// Arrays and objects are rendered as compact JSON.
pub fn to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(boolean) => boolean.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(string) => string.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Converts a value into an integer
///
/// Floats are truncated towards zero and saturate at the integer bounds.
/// Strings use their leading numeric prefix (`"3.7"` is `3`) or `0` if there is none.
pub fn to_integer(value: &Value) -> i64 {
    match value {
        Value::Null => 0,
        Value::Bool(boolean) => i64::from(*boolean),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                integer
            } else if number.as_u64().is_some() {
                i64::MAX
            } else {
                // `as` truncates, saturates and maps NaN to 0
                number.as_f64().unwrap_or_default() as i64
            }
        }
        Value::String(string) => match numeric_prefix(string) {
            Some(NumericPrefix::Integer(digits)) => digits
                .parse::<i64>()
                .unwrap_or_else(|_| digits.parse::<f64>().unwrap_or_default() as i64),
            Some(NumericPrefix::Float(digits)) => digits.parse::<f64>().unwrap_or_default() as i64,
            None => 0,
        },
        Value::Array(array) => i64::from(!array.is_empty()),
        Value::Object(object) => i64::from(!object.is_empty()),
    }
}

/// Converts a value into a float
///
/// Strings use their leading numeric prefix or `0.0` if there is none.
pub fn to_float(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(boolean) => f64::from(u8::from(*boolean)),
        Value::Number(number) => number.as_f64().unwrap_or_default(),
        Value::String(string) => match numeric_prefix(string) {
            Some(NumericPrefix::Integer(digits) | NumericPrefix::Float(digits)) => {
                digits.parse::<f64>().unwrap_or_default()
            }
            None => 0.0,
        },
        Value::Array(array) => f64::from(u8::from(!array.is_empty())),
        Value::Object(object) => f64::from(u8::from(!object.is_empty())),
    }
}

/// Converts a value into a boolean using its truthiness
///
/// `null`, `false`, `0`, `""`, `"0"` and empty collections are false.
/// Note that `"0.0"` is true, strings are not interpreted as numbers.
pub fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(boolean) => *boolean,
        Value::Number(number) => match number.as_f64() {
            Some(float) => float != 0.0,
            None => true,
        },
        Value::String(string) => !(string.is_empty() || string == "0"),
        Value::Array(array) => !array.is_empty(),
        Value::Object(object) => !object.is_empty(),
    }
}

/// Converts a value into an array
///
/// Objects are reduced to their values, scalars are wrapped and `null` becomes empty.
pub fn to_array(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(array) => array.clone(),
        Value::Object(object) => object.values().cloned().collect(),
        scalar => vec![scalar.clone()],
    }
}

/// Converts a value into an object
///
/// Arrays are keyed by their stringified index,
/// scalars are stored under the field `"scalar"` and `null` becomes empty.
pub fn to_object(value: &Value) -> Map<String, Value> {
    match value {
        Value::Null => Map::new(),
        Value::Object(object) => object.clone(),
        Value::Array(array) => array
            .iter()
            .enumerate()
            .map(|(index, value)| (index.to_string(), value.clone()))
            .collect(),
        scalar => {
            let mut object = Map::new();
            object.insert("scalar".to_string(), scalar.clone());
            object
        }
    }
}

/// The leading number of a string
enum NumericPrefix<'a> {
    /// Only an optional sign and digits
    Integer(&'a str),
    /// Contains a fraction or an exponent
    Float(&'a str),
}

/// Finds the longest prefix of `string` which is a decimal number
///
/// Leading whitespace is skipped.
fn numeric_prefix(string: &str) -> Option<NumericPrefix<'_>> {
    let string = string.trim_start();
    let bytes = string.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let integer_digits = count_digits(&bytes[end..]);
    end += integer_digits;

    let mut fraction_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction_digits = count_digits(&bytes[end + 1..]);
        if integer_digits > 0 || fraction_digits > 0 {
            end += 1 + fraction_digits;
        }
    }

    if integer_digits == 0 && fraction_digits == 0 {
        return None;
    }
    let mut is_float = fraction_digits > 0 || string[..end].ends_with('.');

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent_end = end + 1;
        if matches!(bytes.get(exponent_end), Some(b'+' | b'-')) {
            exponent_end += 1;
        }
        let exponent_digits = count_digits(&bytes[exponent_end..]);
        if exponent_digits > 0 {
            end = exponent_end + exponent_digits;
            is_float = true;
        }
    }

    let prefix = string[..end].trim_end_matches('.');
    Some(if is_float {
        NumericPrefix::Float(prefix)
    } else {
        NumericPrefix::Integer(prefix)
    })
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|byte| byte.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn integer_from_scalars() {
        assert_eq!(to_integer(&json!(true)), 1);
        assert_eq!(to_integer(&json!(false)), 0);
        assert_eq!(to_integer(&json!(null)), 0);
        assert_eq!(to_integer(&json!(-7)), -7);
        assert_eq!(to_integer(&json!(3.99)), 3);
        assert_eq!(to_integer(&json!(-3.99)), -3);
        assert_eq!(to_integer(&json!(u64::MAX)), i64::MAX);
    }

    #[test]
    fn integer_from_strings() {
        assert_eq!(to_integer(&json!("3.7")), 3);
        assert_eq!(to_integer(&json!("42")), 42);
        assert_eq!(to_integer(&json!("  12abc")), 12);
        assert_eq!(to_integer(&json!("-5")), -5);
        assert_eq!(to_integer(&json!("1e3")), 1000);
        assert_eq!(to_integer(&json!("abc")), 0);
        assert_eq!(to_integer(&json!("")), 0);
        assert_eq!(to_integer(&json!(".")), 0);
        assert_eq!(to_integer(&json!(".5")), 0);
        assert_eq!(to_integer(&json!("99999999999999999999")), i64::MAX);
    }

    #[test]
    fn integer_from_collections() {
        assert_eq!(to_integer(&json!([1, 2])), 1);
        assert_eq!(to_integer(&json!([])), 0);
        assert_eq!(to_integer(&json!({"a": 1})), 1);
        assert_eq!(to_integer(&json!({})), 0);
    }

    #[test]
    fn float_conversions() {
        assert_eq!(to_float(&json!(1.1)), 1.1);
        assert_eq!(to_float(&json!(2)), 2.0);
        assert_eq!(to_float(&json!("2.5kg")), 2.5);
        assert_eq!(to_float(&json!("5.")), 5.0);
        assert_eq!(to_float(&json!("1.5e2")), 150.0);
        assert_eq!(to_float(&json!("2e")), 2.0);
        assert_eq!(to_float(&json!("nope")), 0.0);
        assert_eq!(to_float(&json!(true)), 1.0);
    }

    #[test]
    fn boolean_truthiness() {
        assert!(!to_boolean(&json!("0")));
        assert!(to_boolean(&json!("0.0")));
        assert!(!to_boolean(&json!("")));
        assert!(to_boolean(&json!("false")));
        assert!(!to_boolean(&json!(0)));
        assert!(!to_boolean(&json!(0.0)));
        assert!(to_boolean(&json!(-1)));
        assert!(!to_boolean(&json!([])));
        assert!(to_boolean(&json!([0])));
        assert!(!to_boolean(&json!({})));
        assert!(!to_boolean(&json!(null)));
    }

    #[test]
    fn string_representations() {
        assert_eq!(to_string(&json!("dark")), "dark");
        assert_eq!(to_string(&json!(42)), "42");
        assert_eq!(to_string(&json!(1.5)), "1.5");
        assert_eq!(to_string(&json!(true)), "true");
        assert_eq!(to_string(&json!(null)), "");
        assert_eq!(to_string(&json!([1, "a"])), r#"[1,"a"]"#);
    }

    #[test]
    fn array_conversions() {
        assert_eq!(to_array(&json!([1, 2])), vec![json!(1), json!(2)]);
        assert_eq!(to_array(&json!("x")), vec![json!("x")]);
        assert_eq!(to_array(&json!(null)), Vec::<Value>::new());

        let values = to_array(&json!({"a": 1, "b": 2}));
        assert_eq!(values.len(), 2);
        assert!(values.contains(&json!(1)));
        assert!(values.contains(&json!(2)));
    }

    #[test]
    fn object_conversions() {
        assert_eq!(
            Value::Object(to_object(&json!({"foo": "bar"}))),
            json!({"foo": "bar"})
        );
        assert_eq!(
            Value::Object(to_object(&json!(["a", "b"]))),
            json!({"0": "a", "1": "b"})
        );
        assert_eq!(Value::Object(to_object(&json!(5))), json!({"scalar": 5}));
        assert!(to_object(&json!(null)).is_empty());
    }

    #[test]
    fn coerce_matches_requested_type() {
        let values = [
            json!(null),
            json!(true),
            json!(1),
            json!(-2.5),
            json!("text"),
            json!([1, 2]),
            json!({"k": "v"}),
        ];
        let types = [
            SettingType::String,
            SettingType::Integer,
            SettingType::Float,
            SettingType::Boolean,
            SettingType::Array,
            SettingType::Object,
        ];
        for value in &values {
            for setting_type in types {
                assert_eq!(coerce(value, setting_type).setting_type(), setting_type);
            }
        }
    }

    #[test]
    fn setting_type_names() {
        for name in ["string", "integer", "float", "boolean", "array", "object"] {
            let setting_type: SettingType = name.parse().unwrap();
            assert_eq!(setting_type.to_string(), name);
        }
        assert!("double".parse::<SettingType>().is_err());
    }
}
