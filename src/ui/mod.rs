use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use regex::Regex;
use unicode_width::UnicodeWidthStr;

use crate::api::Note;
use crate::app::form::{FieldEditor, FormField, FormState};
use crate::app::state::{ActiveSurface, ControllerState, Notification};
use crate::config::ThemeMode;
use crate::highlight::{match_ranges, regex_for_term};

pub mod markdown;
pub mod theme;

pub use theme::Palette;

const CURSOR: char = '▌';
const PREVIEW_LINES: usize = 2;
const TOAST_MAX_WIDTH: u16 = 50;

/// Everything one frame needs, borrowed from the app for the duration of a
/// draw call.
pub struct Screen<'a> {
    pub state: &'a ControllerState,
    pub form: Option<&'a FormState>,
    pub search_focused: bool,
    pub theme: ThemeMode,
    pub viewer_scroll: u16,
}

pub fn draw_app(frame: &mut Frame, screen: &Screen<'_>, list_state: &mut ListState) {
    let palette = Palette::for_mode(screen.theme);
    let area = frame.size();
    frame.render_widget(Block::default().style(palette.base()), area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    render_search_bar(frame, screen, &palette, vertical[0]);
    render_note_list(frame, screen, &palette, vertical[1], list_state);
    frame.render_widget(
        Paragraph::new(build_status_line(screen, &palette)),
        vertical[2],
    );

    match &screen.state.surface {
        ActiveSurface::Form { editing } => {
            if let Some(form) = screen.form {
                render_form(frame, form, editing.is_some(), screen.state.saving, &palette);
            }
        }
        ActiveSurface::Viewer { note } => {
            render_viewer(frame, note, screen.viewer_scroll, &palette);
        }
        ActiveSurface::None => {}
    }
    if screen.state.pending_delete.is_some() {
        render_delete_confirm(frame, screen.state, &palette);
    }
    if let Some(notification) = &screen.state.notification {
        render_toast(frame, notification, &palette, vertical[1]);
    }
}

fn render_search_bar(frame: &mut Frame, screen: &Screen<'_>, palette: &Palette, area: Rect) {
    let term = &screen.state.search.term;
    let line = if screen.search_focused {
        Line::from(format!("{term}{CURSOR}"))
    } else if term.is_empty() {
        Line::from(Span::styled(
            "Press / to search title, text and tags",
            palette.muted(),
        ))
    } else {
        Line::from(term.clone())
    };
    let paragraph = Paragraph::new(line).block(
        Block::default()
            .title("Search")
            .borders(Borders::ALL)
            .border_style(palette.border(screen.search_focused)),
    );
    frame.render_widget(paragraph, area);
}

fn render_note_list(
    frame: &mut Frame,
    screen: &Screen<'_>,
    palette: &Palette,
    area: Rect,
    list_state: &mut ListState,
) {
    let state = screen.state;
    let block = Block::default()
        .title(format!("Notes ({})", state.notes.len()))
        .borders(Borders::ALL)
        .border_style(palette.border(!screen.search_focused && state.surface.is_none()));

    if let Some(error) = &state.error {
        let paragraph = Paragraph::new(Span::styled(
            error.clone(),
            Style::default()
                .fg(palette.error)
                .add_modifier(Modifier::BOLD),
        ))
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    if state.notes.is_empty() {
        let message = if state.loading {
            "Loading notes…".to_string()
        } else if !state.search.debounced.is_empty() {
            format!("No notes match \"{}\".", state.search.debounced)
        } else {
            "No notes yet. Press `a` to create one.".to_string()
        };
        let paragraph = Paragraph::new(Span::styled(message, palette.muted()))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let regex = regex_for_term(&state.search.debounced);
    let items: Vec<ListItem> = state
        .notes
        .iter()
        .map(|note| ListItem::new(note_card(note, regex.as_ref(), palette)))
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(palette.selection)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, area, list_state);
}

fn note_card(note: &Note, regex: Option<&Regex>, palette: &Palette) -> Vec<Line<'static>> {
    let match_style = palette.match_style();
    let mut lines = vec![
        Line::from(highlight_spans(
            &note.title,
            regex,
            match_style,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("Updated {}", note.updated_label()),
            palette.muted(),
        )),
    ];
    if let Some(tags) = render_tag_line(&note.display_tags(), regex, palette) {
        lines.push(tags);
    }
    let preview: Vec<&str> = note
        .text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(PREVIEW_LINES)
        .collect();
    if preview.is_empty() {
        lines.push(Line::from(Span::styled(
            markdown::EMPTY_BODY,
            palette.muted().add_modifier(Modifier::ITALIC),
        )));
    } else {
        for line in preview {
            lines.push(Line::from(highlight_spans(
                line,
                regex,
                match_style,
                Style::default(),
            )));
        }
    }
    lines.push(Line::default());
    lines
}

fn highlight_spans(
    text: &str,
    regex: Option<&Regex>,
    highlight_style: Style,
    base_style: Style,
) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut last = 0;
    for range in match_ranges(regex, text) {
        if range.start > last {
            spans.push(Span::styled(text[last..range.start].to_string(), base_style));
        }
        spans.push(Span::styled(text[range.clone()].to_string(), highlight_style));
        last = range.end;
    }
    if last < text.len() || spans.is_empty() {
        spans.push(Span::styled(text[last..].to_string(), base_style));
    }
    spans
}

fn render_tag_line(
    tags: &[String],
    regex: Option<&Regex>,
    palette: &Palette,
) -> Option<Line<'static>> {
    if tags.is_empty() {
        return None;
    }
    let base_style = Style::default().fg(palette.tag);
    let mut spans = Vec::new();
    for (idx, tag) in tags.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw(" "));
        }
        spans.extend(highlight_spans(
            &format!("#{tag}"),
            regex,
            palette.match_style(),
            base_style,
        ));
    }
    Some(Line::from(spans))
}

fn build_status_line(screen: &Screen<'_>, palette: &Palette) -> Line<'static> {
    let state = screen.state;
    let mut spans = Vec::new();
    if state.saving {
        spans.push(Span::styled("Saving… ", Style::default().fg(palette.info)));
    } else if state.loading {
        spans.push(Span::styled("Loading… ", Style::default().fg(palette.info)));
    }
    let hints = match state.surface {
        ActiveSurface::Form { .. } => "Ctrl-S save • Tab next field • Ctrl-P preview • Esc cancel",
        ActiveSurface::Viewer { .. } => "e edit • d delete • j/k scroll • Esc close",
        ActiveSurface::None if screen.search_focused => "Enter done • Esc clear",
        ActiveSurface::None => {
            "/ search • a new • Enter view • e edit • d delete • r refresh • t theme • q quit"
        }
    };
    spans.push(Span::styled(hints, palette.muted()));
    spans.push(Span::styled(
        format!("  [{}]", screen.theme),
        palette.muted(),
    ));
    Line::from(spans)
}

fn render_form(frame: &mut Frame, form: &FormState, editing: bool, saving: bool, palette: &Palette) {
    let area = centered_rect(70, 80, frame.size());
    frame.render_widget(Clear, area);
    let title = if editing { "Edit Note" } else { "Create Note" };
    let mode = if form.preview { "Preview" } else { "Write" };
    let outer = Block::default()
        .title(format!("{title} [{mode}]"))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .style(palette.base());
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(inner);

    render_field(frame, form, FormField::Title, palette, rows[0]);
    if form.preview {
        let paragraph = Paragraph::new(Text::from(markdown::render_markdown(
            form.text.value(),
            palette,
        )))
        .block(
            Block::default()
                .title("Preview")
                .borders(Borders::ALL)
                .border_style(palette.border(false)),
        )
        .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, rows[1]);
    } else {
        render_field(frame, form, FormField::Text, palette, rows[1]);
    }
    render_field(frame, form, FormField::Tags, palette, rows[2]);

    let hint = if saving {
        Span::styled("Saving…", Style::default().fg(palette.info))
    } else {
        Span::styled(
            "Ctrl-S save • Tab/Shift-Tab switch field • Ctrl-P write/preview • Esc cancel",
            palette.muted(),
        )
    };
    frame.render_widget(Paragraph::new(Line::from(hint)), rows[3]);
}

fn render_field(
    frame: &mut Frame,
    form: &FormState,
    field: FormField,
    palette: &Palette,
    area: Rect,
) {
    let editor = match field {
        FormField::Title => &form.title,
        FormField::Text => &form.text,
        FormField::Tags => &form.tags,
    };
    let focused = form.focus == field;
    let lines = field_lines(editor, focused);
    let visible = area.height.saturating_sub(2) as usize;
    let cursor_row = editor.split_at_cursor().0.matches('\n').count();
    let scroll = if visible == 0 {
        0
    } else {
        cursor_row.saturating_sub(visible - 1)
    };
    let paragraph = Paragraph::new(Text::from(lines))
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0))
        .block(
            Block::default()
                .title(field.label())
                .borders(Borders::ALL)
                .border_style(palette.border(focused)),
        );
    frame.render_widget(paragraph, area);
}

fn field_lines(editor: &FieldEditor, focused: bool) -> Vec<Line<'static>> {
    let text = if focused {
        let (before, after) = editor.split_at_cursor();
        format!("{before}{CURSOR}{after}")
    } else {
        editor.value().to_string()
    };
    text.split('\n')
        .map(|line| Line::from(line.to_string()))
        .collect()
}

fn render_viewer(frame: &mut Frame, note: &Note, scroll: u16, palette: &Palette) {
    let area = centered_rect(70, 80, frame.size());
    frame.render_widget(Clear, area);
    let mut lines = Vec::new();
    if let Some(tags) = render_tag_line(&note.display_tags(), None, palette) {
        lines.push(tags);
    }
    lines.push(Line::from(Span::styled(
        format!("Updated {}", note.updated_label()),
        palette.muted(),
    )));
    lines.push(Line::default());
    lines.extend(markdown::render_markdown(&note.text, palette));

    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .title(Span::styled(
                    note.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent))
                .style(palette.base()),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_delete_confirm(frame: &mut Frame, state: &ControllerState, palette: &Palette) {
    let Some(pending) = &state.pending_delete else {
        return;
    };
    let title = state
        .find_note(&pending.id)
        .or_else(|| state.surface.viewed_note())
        .map(|note| note.title.clone())
        .unwrap_or_else(|| format!("note {}", pending.id));
    let area = centered_rect(50, 25, frame.size());
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(
            "Delete this note?",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(title),
        Line::default(),
        Line::from(Span::styled("y/Enter delete • n/Esc keep", palette.muted())),
    ])
    .block(
        Block::default()
            .title("Confirm")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.error))
            .style(palette.base()),
    )
    .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_toast(frame: &mut Frame, notification: &Notification, palette: &Palette, anchor: Rect) {
    let title = notification.severity.to_string();
    let content = notification.message.width().max(title.width()) + 4;
    let width = u16::try_from(content)
        .unwrap_or(u16::MAX)
        .clamp(20, TOAST_MAX_WIDTH)
        .min(anchor.width);
    let height = 3.min(anchor.height);
    if width < 4 || height < 3 {
        return;
    }
    let area = Rect {
        x: anchor.x + anchor.width - width,
        y: anchor.y + anchor.height - height,
        width,
        height,
    };
    let colour = palette.severity(notification.severity);
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(Span::styled(
        notification.message.clone(),
        Style::default().fg(colour),
    ))
    .block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colour))
            .style(palette.base()),
    );
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
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
        .split(vertical[1])[1]
}
