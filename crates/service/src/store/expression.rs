use std::collections::HashMap;

use models::Patch;
use serde_json::Value;

/// One `SET #fN = :vN` clause of an update.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    /// Name placeholder, e.g. `#f0`.
    pub name: String,
    /// Value placeholder, e.g. `:v0`.
    pub value_ref: String,
    /// Real attribute name the name placeholder stands for.
    pub field: String,
    pub value: Value,
}

/// Parameterized partial-update expression.
///
/// Field names and values only ever appear behind placeholders; the
/// expression text itself is built from positional indexes, so client input
/// cannot reach the backend's expression grammar.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateExpression {
    assignments: Vec<Assignment>,
}

#[derive(Debug, Default)]
pub struct UpdateExpressionBuilder {
    assignments: Vec<Assignment>,
}

impl UpdateExpressionBuilder {
    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        let idx = self.assignments.len();
        self.assignments.push(Assignment {
            name: format!("#f{idx}"),
            value_ref: format!(":v{idx}"),
            field: field.into(),
            value,
        });
        self
    }

    pub fn build(self) -> UpdateExpression {
        UpdateExpression { assignments: self.assignments }
    }
}

impl UpdateExpression {
    pub fn builder() -> UpdateExpressionBuilder {
        UpdateExpressionBuilder::default()
    }

    /// One assignment per patch field, in the patch's iteration order.
    pub fn from_patch(patch: &Patch) -> Self {
        patch
            .fields()
            .iter()
            .fold(Self::builder(), |b, (field, value)| b.set(field.clone(), value.clone()))
            .build()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// `SET #f0 = :v0, #f1 = :v1`
    pub fn expression(&self) -> String {
        let clauses: Vec<String> = self
            .assignments
            .iter()
            .map(|a| format!("{} = {}", a.name, a.value_ref))
            .collect();
        format!("SET {}", clauses.join(", "))
    }

    /// Name placeholder → attribute name.
    pub fn names(&self) -> HashMap<String, String> {
        self.assignments.iter().map(|a| (a.name.clone(), a.field.clone())).collect()
    }

    /// Value placeholder → value, in assignment order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.assignments.iter().map(|a| (a.value_ref.as_str(), &a.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_positional_placeholders() {
        let expr = UpdateExpression::builder()
            .set("name", json!("widget"))
            .set("count", json!(3))
            .build();
        assert_eq!(expr.expression(), "SET #f0 = :v0, #f1 = :v1");
        assert_eq!(expr.names().get("#f0").map(String::as_str), Some("name"));
        assert_eq!(expr.names().get("#f1").map(String::as_str), Some("count"));
        let values: Vec<_> = expr.values().collect();
        assert_eq!(values, vec![(":v0", &json!("widget")), (":v1", &json!(3))]);
    }

    #[test]
    fn field_names_never_reach_expression_text() {
        let patch = Patch::from_value(json!({"size = :v0 REMOVE x": 1, "status": "open"})).unwrap();
        let expr = UpdateExpression::from_patch(&patch);
        let text = expr.expression();
        assert!(!text.contains("REMOVE"));
        assert!(!text.contains("status"));
        assert_eq!(expr.assignments().len(), 2);
    }

    #[test]
    fn from_patch_is_deterministic_and_unique() {
        let patch = Patch::from_value(json!({"b": 1, "a": 2, "c": 3})).unwrap();
        let first = UpdateExpression::from_patch(&patch);
        let second = UpdateExpression::from_patch(&patch);
        assert_eq!(first, second);

        let names: std::collections::HashSet<_> = first.assignments().iter().map(|a| &a.name).collect();
        let values: std::collections::HashSet<_> = first.values().map(|(k, _)| k).collect();
        assert_eq!(names.len(), 3);
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn reserved_words_are_aliased() {
        // `size` and `status` are DynamoDB reserved words
        let patch = Patch::from_value(json!({"size": 1})).unwrap();
        let expr = UpdateExpression::from_patch(&patch);
        assert_eq!(expr.expression(), "SET #f0 = :v0");
        assert_eq!(expr.names()["#f0"], "size");
    }

    #[test]
    fn empty_patch_yields_empty_expression() {
        let expr = UpdateExpression::from_patch(&Patch::default());
        assert!(expr.is_empty());
    }
}
