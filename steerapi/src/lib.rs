mod record;
mod schema;

pub use record::*;
pub use schema::*;

/// Tolerant field readers for records written by older or foreign producers.
/// Every function here is total: a value of the wrong shape degrades to the
/// field's default instead of failing the whole record.
pub(crate) mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string<'a, D: Deserializer<'a>>(deserializer: D) -> Result<String, D::Error> {
        Ok(to_string(Value::deserialize(deserializer)?))
    }

    pub fn opt_string<'a, D: Deserializer<'a>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => None,
            v => Some(to_string(v)),
        })
    }

    pub fn port<'a, D: Deserializer<'a>>(deserializer: D) -> Result<i64, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .unwrap_or(0),
            Value::String(s) => leading_integer(&s).unwrap_or(0),
            _ => 0,
        })
    }

    pub fn list<'a, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'a>,
        T: DeserializeOwned + Default,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .map(|v| serde_json::from_value(v).unwrap_or_default())
                .collect(),
            _ => vec![],
        })
    }

    pub fn object<'a, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'a>,
        T: DeserializeOwned + Default,
    {
        Ok(serde_json::from_value(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    fn to_string(v: Value) -> String {
        match v {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        }
    }

    // "8080abc" reads as 8080, "abc" as nothing
    fn leading_integer(s: &str) -> Option<i64> {
        let s = s.trim_start();
        let (sign, digits) = match s.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, s.strip_prefix('+').unwrap_or(s)),
        };
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        digits[..end].parse::<i64>().ok().map(|n| sign * n)
    }

    #[test]
    fn test_leading_integer() {
        assert_eq!(leading_integer("8080"), Some(8080));
        assert_eq!(leading_integer("  3128 "), Some(3128));
        assert_eq!(leading_integer("1080abc"), Some(1080));
        assert_eq!(leading_integer("-5"), Some(-5));
        assert_eq!(leading_integer("abc"), None);
        assert_eq!(leading_integer(""), None);
    }
}
