use ratatui::{
    Frame,
    layout::{Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{
    controller::SessionState,
    notify::{Notification, Placement, Severity},
    store::Direction,
};

const FORM_WIDTH: u16 = 44;
const MAX_CELL_WIDTH: usize = 28;
const TOAST_WIDTH: u16 = 48;

pub(crate) struct Header {
    pub label: String,
    pub direction: Option<Direction>,
}

pub(crate) struct FieldLine {
    pub label: String,
    pub value: String,
    pub error: Option<String>,
    pub focused: bool,
}

pub(crate) enum OverlayRender<'a> {
    Columns {
        entries: Vec<(String, bool)>,
        selected: usize,
    },
    Filter {
        buffer: &'a str,
    },
}

/// Everything one frame shows.
pub(crate) struct Screen<'a> {
    pub title: &'a str,
    pub headers: Vec<Header>,
    /// Cells of each row plus whether it is the selected record.
    pub rows: Vec<(Vec<String>, bool)>,
    pub cursor: Option<usize>,
    pub column: usize,
    pub page: usize,
    pub page_count: usize,
    pub total: usize,
    pub filter: &'a str,
    pub fields: Vec<FieldLine>,
    pub state: SessionState,
    pub save_enabled: bool,
    pub dirty: bool,
    pub url: &'a str,
    pub status: &'a str,
    pub help: Option<String>,
    pub toast: Option<&'a Notification>,
    pub overlay: Option<OverlayRender<'a>>,
}

pub(crate) fn draw(frame: &mut Frame<'_>, screen: &Screen<'_>) {
    let footer_height = if screen.help.is_some() { 4 } else { 2 };
    let rows = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(footer_height)])
        .split(frame.area());
    let body = Layout::default()
        .direction(LayoutDirection::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(FORM_WIDTH)])
        .split(rows[0]);

    render_grid(frame, body[0], screen);
    render_form(frame, body[1], screen);
    render_footer(frame, rows[1], screen);

    match &screen.overlay {
        Some(OverlayRender::Columns { entries, selected }) => {
            render_column_menu(frame, entries, *selected)
        }
        Some(OverlayRender::Filter { buffer }) => render_filter_prompt(frame, buffer),
        None => {}
    }
    if let Some(note) = screen.toast {
        render_toast(frame, note);
    }
}

fn render_grid(frame: &mut Frame<'_>, area: Rect, screen: &Screen<'_>) {
    let widths = column_widths(screen);
    let header = Row::new(screen.headers.iter().enumerate().map(|(index, header)| {
        let arrow = match header.direction {
            Some(Direction::Ascending) => " ▲",
            Some(Direction::Descending) => " ▼",
            None => "",
        };
        let mut style = Style::default().add_modifier(Modifier::BOLD);
        if screen.cursor.is_some() && index == screen.column {
            style = style.fg(Color::Yellow);
        }
        Cell::from(format!("{}{arrow}", header.label)).style(style)
    }));
    let body = screen.rows.iter().map(|(cells, selected)| {
        let row = Row::new(
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| Cell::from(truncate(cell, *width as usize))),
        );
        if *selected {
            row.style(Style::default().fg(Color::Cyan))
        } else {
            row
        }
    });
    let mut title = format!(
        " {}s · page {}/{} · {} rows ",
        screen.title,
        screen.page + 1,
        screen.page_count,
        screen.total
    );
    if !screen.filter.is_empty() {
        title.push_str(&format!("· filter \"{}\" ", screen.filter));
    }
    let border = if screen.cursor.is_some() {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let table = Table::new(body, widths.iter().map(|width| Constraint::Length(*width)))
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = TableState::default();
    state.select(screen.cursor);
    frame.render_stateful_widget(table, area, &mut state);
}

fn column_widths(screen: &Screen<'_>) -> Vec<u16> {
    screen
        .headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            let widest = screen
                .rows
                .iter()
                .filter_map(|(cells, _)| cells.get(index))
                .map(|cell| cell.width())
                .max()
                .unwrap_or(0);
            (widest.max(header.label.width() + 2).min(MAX_CELL_WIDTH)) as u16
        })
        .collect()
}

/// Cut `text` to `width` terminal columns, marking the cut with an ellipsis.
fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width + 1 > width {
            break;
        }
        used += ch_width;
        out.push(ch);
    }
    out.push('…');
    out
}

fn render_form(frame: &mut Frame<'_>, area: Rect, screen: &Screen<'_>) {
    let mut lines = Vec::with_capacity(screen.fields.len() * 3 + 2);
    for field in &screen.fields {
        let label_style = if field.focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(Span::styled(field.label.clone(), label_style)));
        let cursor = if field.focused { "▏" } else { "" };
        lines.push(Line::from(format!("  {}{cursor}", field.value)));
        if let Some(error) = &field.error {
            lines.push(Line::from(Span::styled(
                format!("  ! {error}"),
                Style::default().fg(Color::Red),
            )));
        }
    }
    lines.push(Line::default());
    let save_style = if screen.save_enabled {
        Style::default().fg(Color::Black).bg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    lines.push(Line::from(vec![
        Span::styled(" Save ", save_style),
        Span::raw("  "),
        Span::styled(" Cancel ", Style::default().fg(Color::Gray)),
    ]));

    let marker = if screen.dirty { " *" } else { "" };
    let title = match screen.state {
        SessionState::New => format!(" New {}{marker} ", screen.title),
        SessionState::Editing => format!(" Edit {}{marker} ", screen.title),
        SessionState::Saving => " Saving… ".to_string(),
    };
    let border = if screen.cursor.is_none() {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let form = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(form, area);
}

fn render_footer(frame: &mut Frame<'_>, area: Rect, screen: &Screen<'_>) {
    let mut lines = vec![Line::from(vec![
        Span::styled(screen.url.to_string(), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::raw(screen.status.to_string()),
    ])];
    if let Some(help) = &screen.help {
        lines.push(Line::from(Span::styled(
            help.clone(),
            Style::default().fg(Color::Yellow),
        )));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

fn render_column_menu(frame: &mut Frame<'_>, entries: &[(String, bool)], selected: usize) {
    let width = entries
        .iter()
        .map(|(label, _)| label.width())
        .max()
        .unwrap_or(10) as u16
        + 10;
    let height = (entries.len() as u16 + 2).min(frame.area().height);
    let area = popup_rect(frame.area(), width, height);
    frame.render_widget(Clear, area);
    let items: Vec<ListItem<'_>> = entries
        .iter()
        .map(|(label, visible)| {
            ListItem::new(format!("[{}] {label}", if *visible { "x" } else { " " }))
        })
        .collect();
    let mut state = ListState::default();
    state.select(Some(selected.min(entries.len().saturating_sub(1))));
    let list = List::new(items)
        .block(Block::default().title(" Columns ").borders(Borders::ALL))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .highlight_symbol("» ");
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_filter_prompt(frame: &mut Frame<'_>, buffer: &str) {
    let area = popup_rect(frame.area(), TOAST_WIDTH, 3);
    frame.render_widget(Clear, area);
    let prompt = Paragraph::new(format!("{buffer}▏"))
        .block(Block::default().title(" Filter ").borders(Borders::ALL));
    frame.render_widget(prompt, area);
}

fn render_toast(frame: &mut Frame<'_>, note: &Notification) {
    let screen = frame.area();
    let width = TOAST_WIDTH.min(screen.width.saturating_sub(2)).max(8);
    let lines = textwrap::wrap(&note.message, usize::from(width.saturating_sub(4)));
    let height = (lines.len() as u16 + 2).min(screen.height);
    let area = match note.placement {
        Placement::Middle => popup_rect(screen, width, height),
        Placement::BottomStart => Rect::new(
            screen.x + 1,
            screen.bottom().saturating_sub(height + 1),
            width,
            height,
        )
        .intersection(screen),
    };
    let color = match note.severity {
        Severity::Info => Color::Green,
        Severity::Error => Color::Red,
    };
    frame.render_widget(Clear, area);
    let text: Vec<Line<'_>> = lines.into_iter().map(|line| Line::from(line.into_owned())).collect();
    let toast = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color)),
    );
    frame.render_widget(toast, area);
}

fn popup_rect(area: Rect, width: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(LayoutDirection::Horizontal)
        .constraints([
            Constraint::Length(vertical[1].width.saturating_sub(width) / 2),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);
    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};

    fn screen<'a>(toast: Option<&'a Notification>) -> Screen<'a> {
        Screen {
            title: "person",
            headers: vec![
                Header {
                    label: "First Name".into(),
                    direction: Some(Direction::Ascending),
                },
                Header {
                    label: "Email".into(),
                    direction: None,
                },
            ],
            rows: vec![(vec!["Ada".into(), "ada@example.com".into()], true)],
            cursor: Some(0),
            column: 0,
            page: 0,
            page_count: 1,
            total: 1,
            filter: "",
            fields: vec![FieldLine {
                label: "First Name *".into(),
                value: "Ada".into(),
                error: Some("too short".into()),
                focused: false,
            }],
            state: SessionState::Editing,
            save_enabled: false,
            dirty: false,
            url: "/master-detail/1/edit",
            status: "Ready",
            help: Some("Ctrl+S save".into()),
            toast,
            overlay: None,
        }
    }

    fn rendered(screen: &Screen<'_>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| draw(frame, screen)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn draws_grid_form_and_footer() {
        let text = rendered(&screen(None));
        assert!(text.contains("First Name ▲"));
        assert!(text.contains("ada@example.com"));
        assert!(text.contains("Edit person"));
        assert!(text.contains("! too short"));
        assert!(text.contains("/master-detail/1/edit"));
    }

    #[test]
    fn toasts_wrap_long_messages() {
        let note = Notification::conflict();
        let text = rendered(&screen(Some(&note)));
        assert!(text.contains("Error updating the data."));
        assert!(text.contains("changes."));
    }

    #[test]
    fn truncate_respects_display_width() {
        assert_eq!(truncate("Lovelace", 20), "Lovelace");
        assert_eq!(truncate("Lovelace", 5), "Love…");
        assert_eq!(truncate("日本語テキスト", 7), "日本語…");
    }
}
