//! Wire types shared with the prioritization service.
//!
//! Outbound tasks are plain JSON values so that bulk-pasted objects pass
//! through untouched; inbound records are typed only as far as the client
//! needs to display them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Largest integer a browser JSON encoder writes without an exponent or loss.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A task authored through the form, before submission.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskInput {
    pub title: String,
    pub due_date: String,
    /// NaN when the field was empty or not numeric.
    pub estimated_hours: f64,
    pub importance: f64,
    pub dependencies: Vec<String>,
}

impl TaskInput {
    pub fn to_json(&self) -> Value {
        json!({
            "title": self.title,
            "due_date": self.due_date,
            "estimated_hours": js_number(self.estimated_hours),
            "importance": js_number(self.importance),
            "dependencies": self.dependencies,
        })
    }
}

/// Encode a number the way `JSON.stringify` does: integral values without a
/// fractional part, non-finite values as `null`.
pub fn js_number(value: f64) -> Value {
    if !value.is_finite() {
        return Value::Null;
    }
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        return Value::from(value as i64);
    }
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// A task annotated by the service with a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTask {
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub due_date: Value,
    #[serde(default)]
    pub estimated_hours: Value,
    #[serde(default)]
    pub importance: Value,
    pub score: f64,
    #[serde(default)]
    pub explanation: Option<String>,
    /// Heuristic that produced a suggestion.
    #[serde(default)]
    pub strategy: Option<String>,
    /// Everything else the service sends (`id`, `dependencies`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeResponse {
    pub tasks: Vec<RankedTask>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestResponse {
    #[serde(default)]
    pub suggestions: Option<Vec<RankedTask>>,
    #[serde(default)]
    pub based_on: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_number_encoding() {
        assert_eq!(js_number(3.0), json!(3));
        assert_eq!(js_number(-2.0), json!(-2));
        assert_eq!(js_number(2.5), json!(2.5));
        assert_eq!(js_number(f64::NAN), Value::Null);
        assert_eq!(js_number(f64::INFINITY), Value::Null);
        assert_eq!(js_number(-0.0), json!(0));
    }

    #[test]
    fn test_task_input_json_shape() {
        let task = TaskInput {
            title: "Write report".into(),
            due_date: "2024-05-01".into(),
            estimated_hours: 3.0,
            importance: f64::NAN,
            dependencies: vec!["a".into(), "b".into()],
        };
        assert_eq!(
            task.to_json(),
            json!({
                "title": "Write report",
                "due_date": "2024-05-01",
                "estimated_hours": 3,
                "importance": null,
                "dependencies": ["a", "b"],
            })
        );
    }

    #[test]
    fn test_ranked_task_keeps_unknown_fields() {
        let task: RankedTask = serde_json::from_value(json!({
            "id": 7,
            "title": "Fix critical bug",
            "due_date": "2024-05-03",
            "estimated_hours": 2,
            "importance": 10,
            "dependencies": [],
            "score": 47.0,
            "explanation": "Strategy: Smart Balance",
        }))
        .unwrap();
        assert_eq!(task.title, json!("Fix critical bug"));
        assert_eq!(task.score, 47.0);
        assert_eq!(task.extra.get("id"), Some(&json!(7)));
        assert!(task.strategy.is_none());
    }

    #[test]
    fn test_ranked_task_requires_score() {
        let result = serde_json::from_value::<RankedTask>(json!({ "title": "no score" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_suggest_response_tolerates_missing_list() {
        let resp: SuggestResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.suggestions.is_none());
        assert!(resp.based_on.is_none());

        let resp: SuggestResponse =
            serde_json::from_value(json!({ "suggestions": null, "based_on": "history" })).unwrap();
        assert!(resp.suggestions.is_none());
        assert_eq!(resp.based_on.as_deref(), Some("history"));
    }
}
