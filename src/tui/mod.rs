pub mod app;

use crate::config::ServiceConfig;
use crate::workflow::Controller;
use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures_util::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub async fn run_tui(controller: Controller, service: &ServiceConfig) -> Result<()> {
    let mut app = app::App::new(Arc::new(controller), service);
    let mut terminal = setup_terminal()?;
    info!("Terminal UI started against {}", service.base_url);

    let result = event_loop(&mut terminal, &mut app).await;
    restore_terminal(terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut app::App,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut event_stream = EventStream::new();

    loop {
        // Apply finished calls before drawing.
        while let Ok(completion) = app.completion_rx.try_recv() {
            app.handle_completion(completion);
        }

        terminal.draw(|f| app.render(f))?;

        tokio::select! {
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if app.handle_key(key)? {
                            return Ok(());
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(()),
                }
            }
            Some(completion) = app.completion_rx.recv() => {
                app.handle_completion(completion);
            }
            _ = tokio::time::sleep(tick_rate) => {}
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
