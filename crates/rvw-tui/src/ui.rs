//! UI rendering for the TUI.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};
use rvw_core::model::{Review, MAX_RATING};

use crate::app::{App, InputMode};
use crate::theme;

/// Draw the entire UI
pub fn draw(frame: &mut Frame, app: &mut App) {
    let search_height = u16::from(app.input_mode == InputMode::Search) * 3;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),             // Header
            Constraint::Min(5),                // Main content
            Constraint::Length(search_height), // Search prompt
            Constraint::Length(1),             // Status bar
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);
    draw_main_content(frame, app, chunks[1]);
    if app.input_mode == InputMode::Search {
        draw_search_prompt(frame, app, chunks[2]);
    }
    draw_status_bar(frame, app, chunks[3]);

    if app.show_help {
        draw_help_popup(frame);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(
            " rvw ",
            Style::default()
                .fg(theme::FOCUSED)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("Reviews  "),
    ];

    if let Some(keywords) = &app.search {
        spans.push(indicator(format!("search: {}", keywords.join(" "))));
    } else {
        spans.push(Span::styled(
            format!("page {}/{}", app.page, app.total_pages.max(1)),
            Style::default().fg(theme::DIM),
        ));
        if let Some(min) = app.min_rating {
            spans.push(indicator(format!("min {min}★")));
        }
        if app.sort_by_rating {
            spans.push(indicator("sort: rating".to_string()));
        }
        if app.sort_by_date {
            spans.push(indicator("sort: date".to_string()));
        }
    }
    spans.push(Span::styled(
        format!("  {} matching", app.total),
        Style::default().fg(theme::DIM),
    ));

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(theme::DIM)),
    );
    frame.render_widget(header, area);
}

fn indicator(text: String) -> Span<'static> {
    Span::styled(format!("  [{text}]"), Style::default().fg(theme::ACTIVE))
}

fn draw_main_content(frame: &mut Frame, app: &mut App, area: Rect) {
    if app.show_detail {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);
        draw_table(frame, app, chunks[0]);
        draw_detail(frame, app, chunks[1]);
    } else {
        draw_table(frame, app, area);
    }
}

fn draw_table(frame: &mut Frame, app: &mut App, area: Rect) {
    let header = Row::new(["ID", "Rating", "Date", "Author", "Title"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .reviews
        .iter()
        .map(|review| {
            Row::new(vec![
                Cell::from(review.id().to_string()).style(Style::default().fg(theme::DIM)),
                Cell::from(stars(review.rating()))
                    .style(Style::default().fg(theme::rating_color(review.rating()))),
                Cell::from(review.reviewed_date().to_string()),
                Cell::from(review.author().unwrap_or("-").to_string()),
                Cell::from(review.title().unwrap_or("").to_string()),
            ])
        })
        .collect();

    let title = if app.is_loading() {
        " Reviews (loading) "
    } else {
        " Reviews "
    };
    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(10),
            Constraint::Percentage(25),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(styled_block(title, !app.show_detail || app.input_mode == InputMode::Normal))
    .row_highlight_style(
        Style::default()
            .bg(theme::SELECTED_BG)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn draw_detail(frame: &mut Frame, app: &App, area: Rect) {
    let block = styled_block(" Detail ", false);
    let Some(review) = app.selected_review() else {
        let empty = Paragraph::new(Span::styled(
            "No review selected",
            Style::default().fg(theme::DIM),
        ))
        .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let detail = Paragraph::new(detail_lines(review))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(detail, area);
}

fn detail_lines(review: &Review) -> Vec<Line<'_>> {
    let label = |name: &'static str| Span::styled(format!("{name:<9}"), Style::default().fg(theme::DIM));
    let mut when = review.reviewed_date().to_string();
    if let Some(time) = review.reviewed_time() {
        when.push(' ');
        when.push_str(&time.to_string());
    }

    let mut lines = vec![
        Line::from(Span::styled(
            review.title().unwrap_or("(untitled)"),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            stars(review.rating()),
            Style::default().fg(theme::rating_color(review.rating())),
        )),
        Line::from(""),
        Line::from(vec![label("id"), Span::raw(review.id().to_string())]),
        Line::from(vec![label("author"), Span::raw(review.author().unwrap_or("-"))]),
        Line::from(vec![label("product"), Span::raw(review.product_name().unwrap_or("-"))]),
        Line::from(vec![label("source"), Span::raw(review.source().unwrap_or("-"))]),
        Line::from(vec![label("date"), Span::raw(when)]),
        Line::from(""),
    ];
    lines.extend(review.text().unwrap_or("").lines().map(Line::from));
    lines
}

fn draw_search_prompt(frame: &mut Frame, app: &App, area: Rect) {
    let prompt = Paragraph::new(Line::from(vec![
        Span::styled("/ ", Style::default().fg(theme::ACTIVE)),
        Span::raw(app.search_input.as_str()),
        Span::styled("█", Style::default().fg(theme::DIM)),
    ]))
    .block(styled_block(" Search keywords ", true));
    frame.render_widget(prompt, area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let hints = get_context_hints(app);

    let mut spans = Vec::new();
    for (i, (action, key)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", Style::default().fg(theme::STATUS_BAR)));
        }
        spans.push(Span::styled(
            format!("{action}: "),
            Style::default().fg(theme::STATUS_BAR),
        ));
        spans.push(Span::styled(
            *key,
            Style::default()
                .fg(theme::STATUS_BAR)
                .add_modifier(Modifier::BOLD),
        ));
    }

    if let Some(msg) = &app.status_message {
        spans.push(Span::styled(format!("  [{msg}]"), Style::default().fg(theme::DIM)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Get context-sensitive key hints
fn get_context_hints(app: &App) -> Vec<(&'static str, &'static str)> {
    match app.input_mode {
        InputMode::Search => vec![("Search", "Enter"), ("Cancel", "Esc")],
        InputMode::Normal if app.search.is_some() => vec![
            ("Navigate", "j/k"),
            ("New search", "/"),
            ("Back to list", "Esc"),
            ("Help", "?"),
        ],
        InputMode::Normal => vec![
            ("Navigate", "j/k"),
            ("Page", "n/p"),
            ("Sort", "d/r"),
            ("Min rating", "m"),
            ("Search", "/"),
            ("Help", "?"),
        ],
    }
}

fn draw_help_popup(frame: &mut Frame) {
    let area = centered_rect(50, 70, frame.area());

    frame.render_widget(Clear, area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(text, Style::default().add_modifier(Modifier::BOLD)))
    };
    let help_text = vec![
        heading("Navigation"),
        Line::from("  j/↓        Move down"),
        Line::from("  k/↑        Move up"),
        Line::from("  g          Go to top"),
        Line::from("  G          Go to bottom"),
        Line::from("  n/→/PgDn   Next page"),
        Line::from("  p/←/PgUp   Previous page"),
        Line::from(""),
        heading("Filters"),
        Line::from("  d          Toggle newest first"),
        Line::from("  r          Toggle highest rated first"),
        Line::from("  m          Cycle minimum rating"),
        Line::from("  /          Search keywords"),
        Line::from("  Esc        Clear search"),
        Line::from(""),
        heading("General"),
        Line::from("  Enter      Toggle detail pane"),
        Line::from("  R          Refresh"),
        Line::from("  ?          Toggle help"),
        Line::from("  q          Quit"),
        Line::from("  Ctrl+Z     Suspend"),
    ];

    let help = Paragraph::new(help_text).block(styled_block(" Help ", true));
    frame.render_widget(help, area);
}

/// Create a styled block with border
fn styled_block(title: &str, is_focused: bool) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(theme::BORDER_TYPE)
        .border_style(if is_focused {
            Style::default().fg(theme::FOCUSED)
        } else {
            Style::default()
        })
}

/// Create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// `★★★☆☆` for a rating of 3.
fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(MAX_RATING));
    let empty = usize::from(MAX_RATING) - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{update, Message};
    use crate::loader::{LoadReply, Loaded};
    use chrono::NaiveDate;
    use ratatui::{backend::TestBackend, Terminal};
    use rvw_core::core::ReviewPage;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(ratatui::buffer::Cell::symbol).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn loaded_app() -> App {
        let mut app = App::new();
        let request = app.take_request().unwrap();
        let date = NaiveDate::from_ymd_opt(2023, 4, 5).unwrap();
        let review = Review::builder(42, date, 4)
            .author(Some("Jane"))
            .title(Some("Solid widget"))
            .text(Some("Works as advertised."))
            .build()
            .unwrap();
        update(
            &mut app,
            Message::Loaded(LoadReply {
                id: request.id,
                result: Ok(Loaded::Page(ReviewPage {
                    reviews: vec![review],
                    total: 1,
                    page: 1,
                    page_size: 25,
                    total_pages: 1,
                })),
            }),
        );
        app
    }

    #[test]
    fn test_stars() {
        assert_eq!(stars(3), "★★★☆☆");
        assert_eq!(stars(5), "★★★★★");
    }

    #[test]
    fn test_draw_table_and_detail() {
        let mut app = loaded_app();
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| draw(frame, &mut app)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Solid widget"));
        assert!(text.contains("Works as advertised."));
        assert!(text.contains("1 matching"));
    }

    #[test]
    fn test_draw_help_and_search_prompt() {
        let mut app = loaded_app();
        update(&mut app, Message::StartSearch);
        update(&mut app, Message::SearchInput('x'));
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| draw(frame, &mut app)).unwrap();
        assert!(buffer_text(&terminal).contains("Search keywords"));

        update(&mut app, Message::CancelSearch);
        update(&mut app, Message::ToggleHelp);
        terminal.draw(|frame| draw(frame, &mut app)).unwrap();
        assert!(buffer_text(&terminal).contains("Cycle minimum rating"));
    }
}
