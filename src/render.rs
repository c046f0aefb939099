//! Result rendering: projects ranked/suggested tasks into a `ListView`.
//!
//! A `ListView` stands in for a list container plus its empty-state
//! placeholder. Every render replaces the container contents, so repeated
//! runs never accumulate entries.

use crate::model::RankedTask;
use serde_json::Value;

const MISSING: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListVariant {
    Results,
    /// Also shows the strategy that produced each entry.
    Suggestions,
}

/// One rendered list item.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayEntry {
    pub title: String,
    pub due_date: String,
    pub estimated_hours: String,
    pub importance: String,
    pub explanation: String,
    /// Always exactly one decimal place.
    pub score: String,
    pub strategy: Option<String>,
}

impl DisplayEntry {
    fn from_task(task: &RankedTask, variant: ListVariant) -> Self {
        let strategy = match variant {
            ListVariant::Results => None,
            ListVariant::Suggestions => {
                Some(task.strategy.clone().unwrap_or_else(|| MISSING.to_string()))
            }
        };
        Self {
            title: display_value(&task.title),
            due_date: display_value(&task.due_date),
            estimated_hours: display_value(&task.estimated_hours),
            importance: display_value(&task.importance),
            explanation: task.explanation.clone().unwrap_or_default(),
            score: to_fixed_1(task.score),
            strategy,
        }
    }

    /// `2024-05-01 • Effort 3h • Importance 2`
    pub fn meta_line(&self) -> String {
        format!(
            "{} • Effort {}h • Importance {}",
            self.due_date, self.estimated_hours, self.importance
        )
    }

    pub fn score_badge(&self) -> String {
        format!("Score: {}", self.score)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    entries: Vec<DisplayEntry>,
    placeholder_visible: bool,
}

impl Default for ListView {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            placeholder_visible: true,
        }
    }
}

impl ListView {
    pub fn entries(&self) -> &[DisplayEntry] {
        &self.entries
    }

    pub fn placeholder_visible(&self) -> bool {
        self.placeholder_visible
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Blank the list independently of any workflow.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.placeholder_visible = true;
    }
}

/// Replace the list contents with `items`, in service order.
pub fn render(list: &mut ListView, items: &[RankedTask], variant: ListVariant) {
    list.entries.clear();
    if items.is_empty() {
        list.placeholder_visible = true;
        return;
    }
    list.placeholder_visible = false;
    list.entries
        .extend(items.iter().map(|task| DisplayEntry::from_task(task, variant)));
}

/// Text lines for non-interactive output.
pub fn plain_lines(list: &ListView, placeholder: &str) -> Vec<String> {
    if list.placeholder_visible() {
        return vec![placeholder.to_string()];
    }
    let mut lines = Vec::with_capacity(list.len() * 3);
    for (i, entry) in list.entries().iter().enumerate() {
        lines.push(format!("{}. {}  [{}]", i + 1, entry.title, entry.score_badge()));
        lines.push(format!("   {}", entry.meta_line()));
        if let Some(strategy) = &entry.strategy {
            lines.push(format!("   Strategy: {}", strategy));
        }
        if !entry.explanation.is_empty() {
            lines.push(format!("   {}", entry.explanation));
        }
    }
    lines
}

/// Number formatting as a browser template would print it: `3`, `2.5`.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    format!("{}", value)
}

/// One decimal place, with exact ties rounded away from zero (`12.25` is
/// `12.3`) the way a browser's `toFixed(1)` does. Other values already
/// round to the nearest representable decimal.
pub fn to_fixed_1(value: f64) -> String {
    if !value.is_finite() {
        return format_number(value);
    }
    let magnitude = value.abs();
    let scaled = magnitude * 10.0;
    // The product must be exact, or 2.65 (really 2.6499...) would look like a tie.
    let exact = magnitude.mul_add(10.0, -scaled) == 0.0;
    if exact && scaled.fract() == 0.5 {
        let n = scaled.ceil() as u64;
        let sign = if value < 0.0 { "-" } else { "" };
        return format!("{}{}.{}", sign, n / 10, n % 10);
    }
    format!("{:.1}", value)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => MISSING.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format_number(f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
