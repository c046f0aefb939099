use crate::aggregator::TaskForm;
use crate::render::{plain_lines, ListView};
use crate::workflow::{Controller, Phase, Session};
use anyhow::{Context, Result};
use std::path::Path;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Analyze inputs as given on the command line.
pub struct AnalyzeArgs {
    pub form: TaskForm,
    pub json: Option<String>,
    pub json_file: Option<std::path::PathBuf>,
    pub strategy: String,
}

/// Bulk text comes from `--json` or `--json-file`; neither means blank.
fn bulk_text(json: Option<String>, json_file: Option<&Path>) -> Result<String> {
    match (json, json_file) {
        (Some(_), Some(_)) => anyhow::bail!("Use either --json or --json-file, not both"),
        (Some(text), None) => Ok(text),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        (None, None) => Ok(String::new()),
    }
}

/// Run one analyze cycle and print the outcome. Returns `false` on failure.
pub async fn analyze(controller: &Controller, args: AnalyzeArgs) -> Result<bool> {
    let bulk = bulk_text(args.json, args.json_file.as_deref())?;
    let mut session = Session::new();
    controller
        .run_analyze(&mut session, &args.form, &bulk, &args.strategy)
        .await;

    print_status(&session);
    let ok = session.analyze.phase == Phase::Succeeded;
    if ok {
        print_list(&session.results, "No tasks returned.");
    }
    Ok(ok)
}

/// Run one suggest cycle and print the outcome. Returns `false` on failure.
pub async fn suggest(controller: &Controller, strategy: &str) -> Result<bool> {
    let mut session = Session::new();
    controller.run_suggest(&mut session, strategy).await;

    print_status(&session);
    let ok = session.suggest.phase == Phase::Succeeded;
    if ok {
        if let Some(based_on) = &session.based_on {
            println!("{DIM}Based on: {based_on}{RESET}");
        }
        print_list(&session.suggestions, "No suggestions found.");
    }
    Ok(ok)
}

fn print_status(session: &Session) {
    let status = &session.status;
    if status.is_error {
        eprintln!("{RED}{}{RESET}", status.text);
    } else {
        println!("{GREEN}{}{RESET}", status.text);
    }
}

fn print_list(list: &ListView, placeholder: &str) {
    for line in plain_lines(list, placeholder) {
        println!("{line}");
    }
}
