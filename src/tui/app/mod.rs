mod input;
mod rendering;

use crate::aggregator::TaskForm;
use crate::config::ServiceConfig;
use crate::workflow::{Completion, Controller, Operation, PendingCall, Session};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const EXIT_PROMPT: &str = "Analysis results are visible. Are you sure you want to leave?";

/// Focusable controls, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    DueDate,
    EstimatedHours,
    Importance,
    Dependencies,
    BulkJson,
    AnalyzeStrategy,
    SuggestStrategy,
}

impl Field {
    const ORDER: [Field; 8] = [
        Field::Title,
        Field::DueDate,
        Field::EstimatedHours,
        Field::Importance,
        Field::Dependencies,
        Field::BulkJson,
        Field::AnalyzeStrategy,
        Field::SuggestStrategy,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let len = Self::ORDER.len();
        Self::ORDER[(self.index() + len - 1) % len]
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::DueDate => "Due date",
            Field::EstimatedHours => "Est. hours",
            Field::Importance => "Importance",
            Field::Dependencies => "Depends on",
            Field::BulkJson => "Bulk JSON",
            Field::AnalyzeStrategy => "Strategy",
            Field::SuggestStrategy => "Suggest by",
        }
    }

    pub fn is_strategy(self) -> bool {
        matches!(self, Field::AnalyzeStrategy | Field::SuggestStrategy)
    }
}

pub struct App {
    pub controller: Arc<Controller>,
    pub session: Session,
    pub form: TaskForm,
    pub bulk_json: String,
    pub focus: Field,
    pub strategies: Vec<String>,
    pub default_strategy: usize,
    pub analyze_strategy: usize,
    pub suggest_strategy: usize,
    pub clear_actions: bool,
    /// Showing the leave-confirmation prompt.
    pub confirm_exit: bool,
    pub base_url: String,
    completion_tx: mpsc::UnboundedSender<Completion>,
    pub completion_rx: mpsc::UnboundedReceiver<Completion>,
}

impl App {
    pub fn new(controller: Arc<Controller>, service: &ServiceConfig) -> Self {
        let strategies = service.strategy_choices();
        let default_strategy = strategies
            .iter()
            .position(|s| s == &service.default_strategy)
            .unwrap_or(0);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let base_url = controller.base_url().to_string();
        Self {
            controller,
            session: Session::new(),
            form: TaskForm::default(),
            bulk_json: String::new(),
            focus: Field::Title,
            strategies,
            default_strategy,
            analyze_strategy: default_strategy,
            suggest_strategy: default_strategy,
            clear_actions: service.supports_clear_actions,
            confirm_exit: false,
            base_url,
            completion_tx,
            completion_rx,
        }
    }

    pub fn strategy(&self, operation: Operation) -> &str {
        let idx = match operation {
            Operation::Analyze => self.analyze_strategy,
            Operation::Suggest => self.suggest_strategy,
        };
        self.strategies.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn trigger_analyze(&mut self) {
        let strategy = self.strategy(Operation::Analyze).to_string();
        if let Some(call) =
            self.controller
                .start_analyze(&mut self.session, &self.form, &self.bulk_json, &strategy)
        {
            self.spawn(call);
        }
    }

    pub fn trigger_suggest(&mut self) {
        let strategy = self.strategy(Operation::Suggest).to_string();
        let call = self.controller.start_suggest(&mut self.session, &strategy);
        self.spawn(call);
    }

    fn spawn(&self, call: PendingCall) {
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(call.await);
        });
    }

    pub fn handle_completion(&mut self, completion: Completion) {
        self.session.apply(completion);
    }

    /// Blank the form and bulk field; restore the default strategy.
    pub fn clear_form(&mut self) {
        self.form.clear();
        self.bulk_json.clear();
        self.analyze_strategy = self.default_strategy;
        self.focus = Field::Title;
    }

    /// Returns `true` when the app may exit right away.
    pub fn request_quit(&mut self) -> bool {
        if self.session.needs_exit_confirmation() {
            self.confirm_exit = true;
            return false;
        }
        true
    }

    pub(super) fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Title => Some(&mut self.form.title),
            Field::DueDate => Some(&mut self.form.due_date),
            Field::EstimatedHours => Some(&mut self.form.estimated_hours),
            Field::Importance => Some(&mut self.form.importance),
            Field::Dependencies => Some(&mut self.form.dependencies),
            Field::BulkJson => Some(&mut self.bulk_json),
            Field::AnalyzeStrategy | Field::SuggestStrategy => None,
        }
    }

    pub(super) fn field_value(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.form.title,
            Field::DueDate => &self.form.due_date,
            Field::EstimatedHours => &self.form.estimated_hours,
            Field::Importance => &self.form.importance,
            Field::Dependencies => &self.form.dependencies,
            Field::BulkJson => &self.bulk_json,
            Field::AnalyzeStrategy => self.strategy(Operation::Analyze),
            Field::SuggestStrategy => self.strategy(Operation::Suggest),
        }
    }

    pub(super) fn cycle_strategy(&mut self, forward: bool) {
        let len = self.strategies.len();
        if len == 0 {
            return;
        }
        let slot = match self.focus {
            Field::AnalyzeStrategy => &mut self.analyze_strategy,
            Field::SuggestStrategy => &mut self.suggest_strategy,
            _ => return,
        };
        *slot = if forward {
            (*slot + 1) % len
        } else {
            (*slot + len - 1) % len
        };
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::client::ServiceClient;
    use crate::model::RankedTask;
    use crate::render::{render, ListVariant};

    pub(crate) fn test_app(service: ServiceConfig) -> App {
        let client = ServiceClient::new(&service).unwrap();
        App::new(Arc::new(Controller::new(client)), &service)
    }

    #[test]
    fn test_field_order_wraps() {
        assert_eq!(Field::Title.next(), Field::DueDate);
        assert_eq!(Field::SuggestStrategy.next(), Field::Title);
        assert_eq!(Field::Title.prev(), Field::SuggestStrategy);
    }

    #[test]
    fn test_default_strategy_selected() {
        let mut service = ServiceConfig::default();
        service.default_strategy = "high_impact".into();
        let app = test_app(service);
        assert_eq!(app.strategy(Operation::Analyze), "high_impact");
        assert_eq!(app.strategy(Operation::Suggest), "high_impact");
    }

    #[test]
    fn test_clear_form_resets_strategy() {
        let mut app = test_app(ServiceConfig::default());
        app.form.title = "x".into();
        app.bulk_json = "[]".into();
        app.focus = Field::AnalyzeStrategy;
        app.cycle_strategy(true);
        assert_eq!(app.strategy(Operation::Analyze), "fastest_wins");

        app.clear_form();
        assert_eq!(app.form, TaskForm::default());
        assert!(app.bulk_json.is_empty());
        assert_eq!(app.strategy(Operation::Analyze), "smart_balance");
    }

    #[test]
    fn test_quit_asks_only_with_results() {
        let mut app = test_app(ServiceConfig::default());
        assert!(app.request_quit());

        let task: RankedTask =
            serde_json::from_value(serde_json::json!({ "title": "a", "score": 1.0 })).unwrap();
        render(&mut app.session.results, &[task], ListVariant::Results);
        assert!(!app.request_quit());
        assert!(app.confirm_exit);
    }

    #[tokio::test]
    async fn test_invalid_input_never_spawns() {
        let mut app = test_app(ServiceConfig::default());
        app.trigger_analyze();
        assert_eq!(app.session.status.text, "Please fill form or paste JSON");
        assert!(app.completion_rx.try_recv().is_err());
    }
}
