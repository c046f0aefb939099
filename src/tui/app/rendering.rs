use super::{App, Field, EXIT_PROMPT};
use crate::render::{DisplayEntry, ListView};
use crate::workflow::{OperationState, Phase};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};

const HELP: &str = "Tab/↑↓ move · ←→ strategy · ^R analyze · ^G suggest · Esc quit";
const CLEAR_HELP: &str = " · ^L clear form · ^X clear results · ^Y clear suggestions";

impl App {
    pub fn render(&self, f: &mut ratatui::Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(2)])
            .split(f.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(42), Constraint::Percentage(58)])
            .split(rows[0]);

        let lists = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(columns[1]);

        self.render_form(f, columns[0]);
        let results_title = list_title("Ranked tasks", &self.session.analyze);
        render_list(
            f,
            lists[0],
            &results_title,
            &self.session.results,
            "No results yet. Fill the form or paste JSON, then ^R.",
        );
        let suggest_name = match &self.session.based_on {
            Some(based_on) => format!("Suggestions, based on {based_on}"),
            None => "Suggestions".to_string(),
        };
        let suggest_title = list_title(&suggest_name, &self.session.suggest);
        render_list(
            f,
            lists[1],
            &suggest_title,
            &self.session.suggestions,
            "No suggestions yet. Press ^G.",
        );
        self.render_status(f, rows[1]);

        if self.confirm_exit {
            render_exit_prompt(f);
        }
    }

    fn render_form(&self, f: &mut ratatui::Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Task ")
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(3),
                Constraint::Length(2),
            ])
            .split(inner);

        let single_line = [
            Field::Title,
            Field::DueDate,
            Field::EstimatedHours,
            Field::Importance,
            Field::Dependencies,
        ];
        let lines: Vec<Line<'static>> = single_line
            .iter()
            .map(|field| self.field_line(*field))
            .collect();
        f.render_widget(Paragraph::new(lines), parts[0]);

        let focused = self.focus == Field::BulkJson;
        let mut bulk_text = self.bulk_json.clone();
        if focused {
            bulk_text.push('▏');
        }
        let bulk = Paragraph::new(Text::from(bulk_text))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .title(" Bulk JSON (array of tasks) ")
                    .border_style(focus_style(focused)),
            );
        f.render_widget(bulk, parts[1]);

        let selectors = vec![
            self.field_line(Field::AnalyzeStrategy),
            self.field_line(Field::SuggestStrategy),
        ];
        f.render_widget(Paragraph::new(selectors), parts[2]);
    }

    fn field_line(&self, field: Field) -> Line<'static> {
        let focused = self.focus == field;
        let marker = if focused { "> " } else { "  " };
        let value = self.field_value(field).to_string();
        let value = if field.is_strategy() {
            format!("‹ {} ›", value)
        } else if focused {
            format!("{}▏", value)
        } else {
            value
        };
        Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Cyan)),
            Span::styled(format!("{:<11}", field.label()), focus_style(focused)),
            Span::styled(value, Style::default().fg(Color::White)),
        ])
    }

    fn render_status(&self, f: &mut ratatui::Frame, area: Rect) {
        let status = &self.session.status;
        let status_style = if status.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let mut help = HELP.to_string();
        if self.clear_actions {
            help.push_str(CLEAR_HELP);
        }
        let lines = vec![
            Line::from(vec![
                Span::styled(
                    format!(" {} ", self.base_url),
                    Style::default().fg(Color::Black).bg(Color::Cyan),
                ),
                Span::raw("  "),
                Span::styled(status.text.clone(), status_style),
            ]),
            Line::from(Span::styled(help, Style::default().fg(Color::DarkGray))),
        ];
        f.render_widget(Paragraph::new(lines), area);
    }
}

/// Block title, with the operation's progress message while it runs.
fn list_title(name: &str, state: &OperationState) -> String {
    if state.phase == Phase::Running {
        format!(" {} · {} ", name, state.message)
    } else {
        format!(" {} ", name)
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn render_list(f: &mut ratatui::Frame, area: Rect, title: &str, list: &ListView, placeholder: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .border_style(Style::default().fg(Color::DarkGray));

    if list.placeholder_visible() {
        let empty = Paragraph::new(Span::styled(
            placeholder.to_string(),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))
        .wrap(Wrap { trim: true })
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = list
        .entries()
        .iter()
        .map(|entry| ListItem::new(entry_lines(entry)))
        .collect();
    f.render_widget(List::new(items).block(block), area);
}

/// Title and score badge, meta line, optional strategy, explanation.
pub(crate) fn entry_lines(entry: &DisplayEntry) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                entry.title.clone(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format!(" {} ", entry.score_badge()),
                Style::default().fg(Color::Black).bg(Color::Green),
            ),
        ]),
        Line::from(Span::styled(
            format!("  {}", entry.meta_line()),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    if let Some(strategy) = &entry.strategy {
        lines.push(Line::from(Span::styled(
            format!("  Strategy: {}", strategy),
            Style::default().fg(Color::Magenta),
        )));
    }
    lines.push(Line::from(Span::styled(
        format!("  {}", entry.explanation),
        Style::default().fg(Color::Gray),
    )));
    lines
}

fn render_exit_prompt(f: &mut ratatui::Frame) {
    let area = f.area();
    let width = area.width.min(EXIT_PROMPT.len() as u16 + 4);
    let height = area.height.min(4);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };
    let prompt = Paragraph::new(vec![
        Line::from(EXIT_PROMPT),
        Line::from(Span::styled(
            "y / Enter to leave, n / Esc to stay",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(Clear, popup);
    f.render_widget(prompt, popup);
}
