//! Remote workflow controller: the analyze and suggest request cycles.
//!
//! Each operation owns an [`OperationState`]. Starting an invocation bumps the
//! operation's sequence number and cancels the previous invocation's token;
//! a [`Completion`] is only applied when it carries the latest sequence
//! number, so a stale response never overwrites a fresher one. Analyze and
//! suggest are independent of each other.
//!
//! The network half of an invocation is a plain future ([`PendingCall`]) that
//! never touches [`Session`]; the caller decides where it runs and feeds the
//! resulting [`Completion`] back through [`Session::apply`].

use crate::aggregator::{build_candidate_set, InputError, TaskForm};
use crate::client::{ServiceClient, ServiceError};
use crate::model::RankedTask;
use crate::render::{render, ListVariant, ListView};
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const NO_SUGGESTIONS: &str = "No suggestions found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Analyze,
    Suggest,
}

impl Operation {
    fn running_message(self) -> &'static str {
        match self {
            Operation::Analyze => "Analyzing...",
            Operation::Suggest => "Fetching suggestions...",
        }
    }

    fn failure_prefix(self) -> &'static str {
        match self {
            Operation::Analyze => "Analyze failed: ",
            Operation::Suggest => "Suggest failed: ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// The user-visible status line. Empty at start-up.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OperationState {
    pub phase: Phase,
    pub message: String,
    /// Sequence number of the latest invocation.
    pub seq: u64,
    cancel: Option<CancellationToken>,
}

/// Handle for one in-flight invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub operation: Operation,
    pub seq: u64,
    pub token: CancellationToken,
}

#[derive(Debug, Clone)]
pub enum CompletionResult {
    Analyzed(Vec<RankedTask>),
    Suggested {
        items: Vec<RankedTask>,
        based_on: Option<String>,
    },
    Failed(String),
    /// Cancelled before the response arrived.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub operation: Operation,
    pub seq: u64,
    pub result: CompletionResult,
}

pub type PendingCall = BoxFuture<'static, Completion>;

/// Everything the front end displays.
#[derive(Debug, Default)]
pub struct Session {
    pub status: StatusLine,
    pub analyze: OperationState,
    pub suggest: OperationState,
    pub results: ListView,
    pub suggestions: ListView,
    /// Provenance string from the last accepted suggest response.
    pub based_on: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, operation: Operation) -> &OperationState {
        match operation {
            Operation::Analyze => &self.analyze,
            Operation::Suggest => &self.suggest,
        }
    }

    fn state_mut(&mut self, operation: Operation) -> &mut OperationState {
        match operation {
            Operation::Analyze => &mut self.analyze,
            Operation::Suggest => &mut self.suggest,
        }
    }

    /// Enter `Running` for a new invocation, superseding any previous one.
    pub fn begin(&mut self, operation: Operation) -> Invocation {
        let state = self.state_mut(operation);
        if let Some(previous) = state.cancel.take() {
            previous.cancel();
        }
        state.seq += 1;
        let token = CancellationToken::new();
        state.cancel = Some(token.clone());
        let seq = state.seq;
        self.transition(operation, Phase::Running, operation.running_message(), false);
        Invocation {
            operation,
            seq,
            token,
        }
    }

    /// Fail an invocation that never reached the network.
    fn fail_local(&mut self, invocation: &Invocation, message: String) {
        if self.is_current(invocation.operation, invocation.seq) {
            self.state_mut(invocation.operation).cancel = None;
            self.transition(invocation.operation, Phase::Failed, &message, true);
        }
    }

    fn is_current(&self, operation: Operation, seq: u64) -> bool {
        self.state(operation).seq == seq
    }

    /// Apply a completion. Returns `false` when it was stale or superseded.
    pub fn apply(&mut self, completion: Completion) -> bool {
        let Completion {
            operation,
            seq,
            result,
        } = completion;

        if matches!(result, CompletionResult::Superseded) || !self.is_current(operation, seq) {
            debug!("Discarding stale {:?} completion #{}", operation, seq);
            return false;
        }
        self.state_mut(operation).cancel = None;

        match result {
            CompletionResult::Analyzed(tasks) => {
                info!("Analysis complete: {} tasks", tasks.len());
                self.transition(operation, Phase::Succeeded, "Analysis complete.", false);
                render(&mut self.results, &tasks, ListVariant::Results);
            }
            CompletionResult::Suggested { items, based_on } => {
                if items.is_empty() {
                    self.transition(operation, Phase::Failed, NO_SUGGESTIONS, true);
                    return true;
                }
                info!("Suggestions loaded: {}", items.len());
                self.transition(operation, Phase::Succeeded, "Suggestions loaded.", false);
                self.based_on = based_on;
                render(&mut self.suggestions, &items, ListVariant::Suggestions);
            }
            CompletionResult::Failed(message) => {
                warn!("{:?} failed: {}", operation, message);
                let text = format!("{}{}", operation.failure_prefix(), message);
                self.transition(operation, Phase::Failed, &text, true);
            }
            CompletionResult::Superseded => return false,
        }
        true
    }

    fn transition(&mut self, operation: Operation, phase: Phase, message: &str, is_error: bool) {
        let state = self.state_mut(operation);
        state.phase = phase;
        state.message = message.to_string();
        self.status = StatusLine {
            text: message.to_string(),
            is_error,
        };
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
    }

    pub fn clear_suggestions(&mut self) {
        self.suggestions.clear();
        self.based_on = None;
    }

    /// Leaving should be confirmed while analysis results are on screen.
    pub fn needs_exit_confirmation(&self) -> bool {
        !self.results.is_empty()
    }
}

/// Drives both workflows against one service.
pub struct Controller {
    client: Arc<ServiceClient>,
}

impl Controller {
    pub fn new(client: ServiceClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    /// Start an analyze invocation. Returns `None` when the input was rejected
    /// locally and no request is needed.
    pub fn start_analyze(
        &self,
        session: &mut Session,
        form: &TaskForm,
        bulk_json: &str,
        strategy: &str,
    ) -> Option<PendingCall> {
        let invocation = session.begin(Operation::Analyze);

        let tasks = match build_candidate_set(form, bulk_json) {
            Ok(tasks) => tasks,
            Err(InputError::NoInput) => {
                session.fail_local(&invocation, InputError::NoInput.to_string());
                return None;
            }
            Err(InputError::MalformedJson(msg)) => {
                session.fail_local(&invocation, format!("JSON Error: {}", msg));
                return None;
            }
        };

        info!(
            "Analyze #{}: {} tasks, strategy {}",
            invocation.seq,
            tasks.len(),
            strategy
        );
        Some(Box::pin(analyze_call(
            self.client.clone(),
            invocation,
            tasks,
            strategy.to_string(),
        )))
    }

    pub fn start_suggest(&self, session: &mut Session, strategy: &str) -> PendingCall {
        let invocation = session.begin(Operation::Suggest);
        info!("Suggest #{}: strategy {}", invocation.seq, strategy);
        Box::pin(suggest_call(
            self.client.clone(),
            invocation,
            strategy.to_string(),
        ))
    }

    /// Run one analyze cycle to completion.
    pub async fn run_analyze(
        &self,
        session: &mut Session,
        form: &TaskForm,
        bulk_json: &str,
        strategy: &str,
    ) {
        if let Some(call) = self.start_analyze(session, form, bulk_json, strategy) {
            let completion = call.await;
            session.apply(completion);
        }
    }

    /// Run one suggest cycle to completion.
    pub async fn run_suggest(&self, session: &mut Session, strategy: &str) {
        let completion = self.start_suggest(session, strategy).await;
        session.apply(completion);
    }
}

async fn analyze_call(
    client: Arc<ServiceClient>,
    invocation: Invocation,
    tasks: Vec<Value>,
    strategy: String,
) -> Completion {
    let result = tokio::select! {
        biased;
        _ = invocation.token.cancelled() => CompletionResult::Superseded,
        res = client.analyze(&tasks, &strategy) => match res {
            Ok(ranked) => CompletionResult::Analyzed(ranked),
            Err(e) => CompletionResult::Failed(failure_message(&e)),
        },
    };
    Completion {
        operation: invocation.operation,
        seq: invocation.seq,
        result,
    }
}

async fn suggest_call(
    client: Arc<ServiceClient>,
    invocation: Invocation,
    strategy: String,
) -> Completion {
    let result = tokio::select! {
        biased;
        _ = invocation.token.cancelled() => CompletionResult::Superseded,
        res = client.suggest(&strategy) => match res {
            Ok(resp) => CompletionResult::Suggested {
                items: resp.suggestions.unwrap_or_default(),
                based_on: resp.based_on,
            },
            Err(e) => CompletionResult::Failed(failure_message(&e)),
        },
    };
    Completion {
        operation: invocation.operation,
        seq: invocation.seq,
        result,
    }
}

fn failure_message(err: &ServiceError) -> String {
    if let ServiceError::Rejected { status, .. } = err {
        debug!("Service rejected request with status {}", status);
    }
    err.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{service_config, FakeService};
    use axum::http::StatusCode;
    use serde_json::json;

    fn report_form() -> TaskForm {
        TaskForm {
            title: "Write report".into(),
            due_date: "2024-05-01".into(),
            estimated_hours: "3".into(),
            importance: "2".into(),
            dependencies: String::new(),
        }
    }

    fn ranked(title: &str, score: f64) -> RankedTask {
        serde_json::from_value(json!({
            "title": title,
            "due_date": "2024-05-01",
            "estimated_hours": 2,
            "importance": 5,
            "score": score,
        }))
        .unwrap()
    }

    async fn controller_for(svc: &FakeService) -> Controller {
        let base = svc.spawn().await;
        Controller::new(ServiceClient::new(&service_config(&base)).unwrap())
    }

    #[tokio::test]
    async fn test_analyze_scenario_exact_body() {
        let svc = FakeService::new();
        svc.reply_analyze(
            StatusCode::OK,
            json!({ "tasks": [{
                "id": 1, "title": "Write report", "due_date": "2024-05-01",
                "estimated_hours": 3, "importance": 2, "dependencies": [],
                "score": 14.0, "explanation": "Strategy: Smart Balance",
            }]}),
        );
        let controller = controller_for(&svc).await;
        let mut session = Session::new();

        controller
            .run_analyze(&mut session, &report_form(), "", "smart_balance")
            .await;

        let calls = svc.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].body,
            Some(json!([{
                "title": "Write report",
                "due_date": "2024-05-01",
                "estimated_hours": 3,
                "importance": 2,
                "dependencies": [],
            }]))
        );
        assert_eq!(calls[0].query.get("strategy").map(String::as_str), Some("smart_balance"));

        assert_eq!(session.status.text, "Analysis complete.");
        assert!(!session.status.is_error);
        assert_eq!(session.analyze.phase, Phase::Succeeded);
        assert_eq!(session.results.len(), 1);
        assert_eq!(session.results.entries()[0].score, "14.0");
        assert!(session.needs_exit_confirmation());
    }

    #[tokio::test]
    async fn test_analyze_non_array_makes_no_request() {
        let svc = FakeService::new();
        let controller = controller_for(&svc).await;
        let mut session = Session::new();

        controller
            .run_analyze(&mut session, &TaskForm::default(), r#"{"title":"x"}"#, "smart_balance")
            .await;

        assert!(svc.calls().is_empty());
        assert_eq!(session.analyze.phase, Phase::Failed);
        assert!(session.status.is_error);
        assert!(session.status.text.contains("must be an array"));
        assert_eq!(session.status.text, "JSON Error: JSON must be an array");
    }

    #[tokio::test]
    async fn test_analyze_parse_failure_makes_no_request() {
        let svc = FakeService::new();
        let controller = controller_for(&svc).await;
        let mut session = Session::new();
        let parser_msg = serde_json::from_str::<Value>("[1,").unwrap_err().to_string();

        controller
            .run_analyze(&mut session, &report_form(), "[1,", "smart_balance")
            .await;

        assert!(svc.calls().is_empty());
        assert!(session.status.is_error);
        assert!(session.status.text.starts_with("JSON Error: "));
        assert!(session.status.text.contains(&parser_msg));
    }

    #[tokio::test]
    async fn test_analyze_no_input_makes_no_request() {
        let svc = FakeService::new();
        let controller = controller_for(&svc).await;
        let mut session = Session::new();

        controller
            .run_analyze(&mut session, &TaskForm::default(), "  ", "smart_balance")
            .await;

        assert!(svc.calls().is_empty());
        assert_eq!(session.status.text, "Please fill form or paste JSON");
        assert!(session.status.is_error);
        assert_eq!(session.analyze.phase, Phase::Failed);
    }

    #[tokio::test]
    async fn test_analyze_rejection_keeps_previous_results() {
        let svc = FakeService::new();
        let controller = controller_for(&svc).await;
        let mut session = Session::new();
        render(
            &mut session.results,
            &[ranked("earlier", 3.0)],
            ListVariant::Results,
        );

        svc.reply_analyze(
            StatusCode::BAD_REQUEST,
            json!({ "error": "Title and due_date are required fields." }),
        );
        controller
            .run_analyze(&mut session, &report_form(), "", "smart_balance")
            .await;

        assert_eq!(
            session.status.text,
            "Analyze failed: Title and due_date are required fields."
        );
        assert!(session.status.is_error);
        assert_eq!(session.results.len(), 1);
        assert_eq!(session.results.entries()[0].title, "earlier");
    }

    #[tokio::test]
    async fn test_analyze_transport_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let controller =
            Controller::new(ServiceClient::new(&service_config(&format!("http://{addr}"))).unwrap());
        let mut session = Session::new();

        controller
            .run_analyze(&mut session, &report_form(), "", "smart_balance")
            .await;

        assert!(session.status.text.starts_with("Analyze failed: "));
        assert!(session.status.is_error);
        assert!(session.results.is_empty());
    }

    #[tokio::test]
    async fn test_suggest_empty_leaves_list_untouched() {
        let svc = FakeService::new();
        let controller = controller_for(&svc).await;
        let mut session = Session::new();
        render(
            &mut session.suggestions,
            &[ranked("kept", 9.0)],
            ListVariant::Suggestions,
        );
        let before = session.suggestions.clone();

        svc.reply_suggest(StatusCode::OK, json!({ "suggestions": [] }));
        controller.run_suggest(&mut session, "smart_balance").await;

        assert_eq!(session.status.text, "No suggestions found.");
        assert!(session.status.is_error);
        assert_eq!(session.suggest.phase, Phase::Failed);
        assert_eq!(session.suggestions, before);
    }

    #[tokio::test]
    async fn test_suggest_absent_list_is_empty_result() {
        let svc = FakeService::new();
        let controller = controller_for(&svc).await;
        let mut session = Session::new();

        svc.reply_suggest(StatusCode::OK, json!({}));
        controller.run_suggest(&mut session, "smart_balance").await;

        assert_eq!(session.status.text, "No suggestions found.");
        assert!(session.suggestions.placeholder_visible());
    }

    #[tokio::test]
    async fn test_suggest_success_renders_with_provenance() {
        let svc = FakeService::new();
        svc.reply_suggest(
            StatusCode::OK,
            json!({
                "suggestions": [
                    { "title": "Fix critical bug", "score": 57.0, "strategy": "smart_balance" },
                    { "title": "Update documentation", "score": 20.5 },
                ],
                "based_on": "3 stored tasks",
            }),
        );
        let controller = controller_for(&svc).await;
        let mut session = Session::new();

        controller.run_suggest(&mut session, "deadline_driven").await;

        let calls = svc.calls();
        assert_eq!(calls[0].path, "suggest");
        assert_eq!(
            calls[0].query.get("strategy").map(String::as_str),
            Some("deadline_driven")
        );
        assert_eq!(session.status.text, "Suggestions loaded.");
        assert_eq!(session.suggest.phase, Phase::Succeeded);
        assert_eq!(session.based_on.as_deref(), Some("3 stored tasks"));
        assert_eq!(session.suggestions.len(), 2);
        assert_eq!(
            session.suggestions.entries()[0].strategy.as_deref(),
            Some("smart_balance")
        );
        // Suggest never touches the analysis results.
        assert!(session.results.is_empty());
    }

    #[tokio::test]
    async fn test_suggest_rejection_without_message() {
        let svc = FakeService::new();
        svc.reply_suggest(StatusCode::BAD_REQUEST, json!({ "detail": "nope" }));
        let controller = controller_for(&svc).await;
        let mut session = Session::new();

        controller.run_suggest(&mut session, "smart_balance").await;
        assert_eq!(session.status.text, "Suggest failed: Server Error");
    }

    #[tokio::test]
    async fn test_newer_invocation_cancels_older() {
        let svc = FakeService::new();
        svc.reply_suggest(StatusCode::OK, json!({ "suggestions": [{ "title": "new", "score": 1.0 }] }));
        let controller = controller_for(&svc).await;
        let mut session = Session::new();

        let first = controller.start_suggest(&mut session, "smart_balance");
        let second = controller.start_suggest(&mut session, "smart_balance");

        let stale = first.await;
        assert!(matches!(stale.result, CompletionResult::Superseded));
        assert!(!session.apply(stale));
        assert_eq!(session.suggest.phase, Phase::Running);

        let fresh = second.await;
        assert!(session.apply(fresh));
        assert_eq!(session.suggestions.entries()[0].title, "new");
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let mut session = Session::new();
        let first = session.begin(Operation::Analyze);
        let second = session.begin(Operation::Analyze);
        assert!(first.token.is_cancelled());
        assert!(!second.token.is_cancelled());

        // The fresher response lands first.
        assert!(session.apply(Completion {
            operation: Operation::Analyze,
            seq: second.seq,
            result: CompletionResult::Analyzed(vec![ranked("fresh", 2.0)]),
        }));
        // The older one resolves late and must not overwrite it.
        assert!(!session.apply(Completion {
            operation: Operation::Analyze,
            seq: first.seq,
            result: CompletionResult::Analyzed(vec![ranked("stale", 1.0)]),
        }));

        assert_eq!(session.results.entries()[0].title, "fresh");
        assert_eq!(session.status.text, "Analysis complete.");
    }

    #[test]
    fn test_operations_are_independent() {
        let mut session = Session::new();
        let analyze = session.begin(Operation::Analyze);
        let _suggest = session.begin(Operation::Suggest);
        assert!(!analyze.token.is_cancelled());
        assert_eq!(session.status.text, "Fetching suggestions...");

        assert!(session.apply(Completion {
            operation: Operation::Analyze,
            seq: analyze.seq,
            result: CompletionResult::Failed("boom".into()),
        }));
        assert_eq!(session.analyze.phase, Phase::Failed);
        assert_eq!(session.suggest.phase, Phase::Running);
        assert_eq!(session.status.text, "Analyze failed: boom");
    }

    #[test]
    fn test_status_starts_empty() {
        let session = Session::new();
        assert_eq!(session.status, StatusLine::default());
        assert_eq!(session.analyze.phase, Phase::Idle);
        assert_eq!(session.suggest.phase, Phase::Idle);
        assert!(session.results.placeholder_visible());
        assert!(!session.needs_exit_confirmation());
    }

    #[test]
    fn test_clear_lists_independently() {
        let mut session = Session::new();
        render(&mut session.results, &[ranked("a", 1.0)], ListVariant::Results);
        render(&mut session.suggestions, &[ranked("b", 1.0)], ListVariant::Suggestions);
        session.based_on = Some("history".into());

        session.clear_suggestions();
        assert!(session.suggestions.is_empty());
        assert!(session.based_on.is_none());
        assert_eq!(session.results.len(), 1);

        session.clear_results();
        assert!(session.results.is_empty());
        assert!(!session.needs_exit_confirmation());
    }
}
