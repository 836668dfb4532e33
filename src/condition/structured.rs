// SPDX-License-Identifier: MIT

use super::operator::Operator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A condition built in the visual editor rather than typed as an expression.
///
/// ```yaml
/// field: user.balance
/// operator: greater
/// value: 100
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Condition {
    /// Variable path resolved like an identifier (`user.balance`)
    pub field: String,
    pub operator: Operator,
    /// Right-hand literal; ignored by `is_empty` / `is_not_empty`
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
            case_sensitive: false,
        }
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_with_alias() {
        let yaml = r#"
field: user.balance
operator: ">="
value: 100
"#;
        let condition: Condition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(condition.field, "user.balance");
        assert_eq!(condition.operator, Operator::GreaterOrEqual);
        assert_eq!(condition.value, json!(100));
        assert!(!condition.case_sensitive);
    }

    #[test]
    fn test_unknown_operator_fails_to_load() {
        let result: Result<Condition, _> =
            serde_json::from_value(json!({"field": "a", "operator": "between"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_serializes_canonical_operator() {
        let condition = Condition::new("phone", Operator::IsEmpty, Value::Null);
        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["operator"], json!("is_empty"));
    }
}
