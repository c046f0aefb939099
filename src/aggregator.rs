use crate::model::TaskInput;
use serde_json::Value;
use thiserror::Error;

/// Why the form and bulk field could not produce a candidate set.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    /// Neither a valid form task nor any bulk task.
    #[error("Please fill form or paste JSON")]
    NoInput,
    /// Bulk text is not JSON, or not a JSON array.
    #[error("{0}")]
    MalformedJson(String),
}

/// Raw form fields exactly as typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskForm {
    pub title: String,
    pub due_date: String,
    pub estimated_hours: String,
    pub importance: String,
    /// Comma-separated dependency titles.
    pub dependencies: String,
}

impl TaskForm {
    /// The form task, or `None` unless both title and due date are filled in.
    pub fn to_task(&self) -> Option<TaskInput> {
        let title = self.title.trim();
        let due_date = self.due_date.trim();
        if title.is_empty() || due_date.is_empty() {
            return None;
        }

        let deps = self.dependencies.trim();
        let dependencies = if deps.is_empty() {
            Vec::new()
        } else {
            deps.split(',').map(|s| s.trim().to_string()).collect()
        };

        Some(TaskInput {
            title: title.to_string(),
            due_date: due_date.to_string(),
            estimated_hours: parse_number(&self.estimated_hours),
            importance: parse_number(&self.importance),
            dependencies,
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// NaN for empty or non-numeric text; the service decides what to do with it.
fn parse_number(raw: &str) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return f64::NAN;
    }
    raw.parse::<f64>().unwrap_or(f64::NAN)
}

/// Merge the form task and the bulk JSON array into `[form?, ...bulk]`.
pub fn build_candidate_set(form: &TaskForm, bulk_json: &str) -> Result<Vec<Value>, InputError> {
    let form_task = form.to_task();
    let raw = bulk_json.trim();

    if form_task.is_none() && raw.is_empty() {
        return Err(InputError::NoInput);
    }

    let mut tasks = Vec::new();
    if let Some(task) = form_task {
        tasks.push(task.to_json());
    }

    if !raw.is_empty() {
        let parsed: Value =
            serde_json::from_str(raw).map_err(|e| InputError::MalformedJson(e.to_string()))?;
        match parsed {
            Value::Array(items) => tasks.extend(items),
            _ => {
                return Err(InputError::MalformedJson(
                    "JSON must be an array".to_string(),
                ))
            }
        }
    }

    if tasks.is_empty() {
        return Err(InputError::NoInput);
    }
    Ok(tasks)
}
