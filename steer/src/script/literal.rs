use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a value as a JavaScript literal.
///
/// JSON is valid JavaScript except for the raw line separators U+2028 and
/// U+2029, which older engines reject inside string literals.
pub fn to_js_literal<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    if !json.contains(|c: char| c == '\u{2028}' || c == '\u{2029}') {
        return Ok(json);
    }
    Ok(json
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029"))
}

pub fn from_js_literal<T: DeserializeOwned>(literal: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(literal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_line_separators() {
        let s = "a\u{2028}b\u{2029}c";
        let lit = to_js_literal(s).unwrap();
        assert_eq!(lit, r#""a\u2028b\u2029c""#);
        assert_eq!(from_js_literal::<String>(&lit).unwrap(), s);
    }

    #[test]
    fn test_hostile_strings() {
        let value = json!({
            "pattern": "\"quoted\" \\ back\\slash */ </script> \n\t",
            "name": "ünïcødé 🚀",
            "empty": "",
        });
        let lit = to_js_literal(&value).unwrap();
        assert!(!lit.contains('\n'));
        assert_eq!(from_js_literal::<serde_json::Value>(&lit).unwrap(), value);
    }
}
