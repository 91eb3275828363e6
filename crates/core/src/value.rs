use serde::{Deserialize, Serialize};

/// A single attribute value: string, number, or empty.
///
/// Serialized untagged, so `null`, `3`, and `"x"` all round-trip through JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl Value {
    /// Missing, empty-string, and NaN values are all "empty".
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(s) => s.is_empty(),
            Value::Number(n) => n.is_nan(),
        }
    }

    /// Coerce to a finite number, if possible.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Number(_) => None,
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            Value::Empty => None,
        }
    }

    /// String form. Empty and NaN collapse to `""`.
    pub fn to_text(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Text(s) => s.clone(),
            Value::Number(n) if n.is_nan() => String::new(),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Empty)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_semantics() {
        assert!(Value::Empty.is_empty());
        assert!(Value::from("").is_empty());
        assert!(Value::Number(f64::NAN).is_empty());
        assert!(!Value::from(0).is_empty());
        assert_eq!(Value::Number(f64::NAN).to_text(), "");
        assert_eq!(Value::Empty.to_text(), "");
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::from(" 4.5 ").to_number(), Some(4.5));
        assert_eq!(Value::from("abc").to_number(), None);
        assert_eq!(Value::from("").to_number(), None);
        assert_eq!(Value::Number(f64::INFINITY).to_number(), None);
        assert_eq!(Value::from("inf").to_number(), None);
        assert_eq!(Value::from(3).to_number(), Some(3.0));
    }

    #[test]
    fn test_text_formatting() {
        assert_eq!(Value::from(4).to_text(), "4");
        assert_eq!(Value::from(-2.5).to_text(), "-2.5");
        assert_eq!(Value::from("x").to_string(), "x");
    }

    #[test]
    fn test_json_untagged() {
        let values: Vec<Value> = serde_json::from_str(r#"[1, "a", null]"#).unwrap();
        assert_eq!(values, vec![Value::from(1), Value::from("a"), Value::Empty]);
        assert_eq!(serde_json::to_string(&values).unwrap(), r#"[1.0,"a",null]"#);
    }
}
