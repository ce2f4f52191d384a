use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use super::theme::Palette;

pub const EMPTY_BODY: &str = "No content";

/// Renders a note body as styled terminal lines.
pub fn render_markdown(source: &str, palette: &Palette) -> Vec<Line<'static>> {
    if source.trim().is_empty() {
        return vec![Line::from(Span::styled(
            EMPTY_BODY,
            palette.muted().add_modifier(Modifier::ITALIC),
        ))];
    }
    let mut renderer = Renderer::new(palette);
    for event in Parser::new_ext(source, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS)
    {
        renderer.event(event);
    }
    renderer.finish()
}

struct Renderer<'p> {
    palette: &'p Palette,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<Option<u64>>,
    in_code_block: bool,
}

impl<'p> Renderer<'p> {
    fn new(palette: &'p Palette) -> Self {
        Self {
            palette,
            lines: Vec::new(),
            current: Vec::new(),
            styles: Vec::new(),
            lists: Vec::new(),
            in_code_block: false,
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) if self.in_code_block => {
                let style = self.code_style();
                for line in text.lines() {
                    self.lines
                        .push(Line::from(Span::styled(format!("  {line}"), style)));
                }
            }
            Event::Text(text) => self.push_text(text.into_string()),
            Event::Code(code) => {
                let style = self.code_style();
                self.current.push(Span::styled(code.into_string(), style));
            }
            Event::SoftBreak => self.push_text(" ".to_string()),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.lines
                    .push(Line::from(Span::styled("─".repeat(24), self.palette.muted())));
                self.blank();
            }
            Event::TaskListMarker(done) => {
                let marker = if done { "[x] " } else { "[ ] " };
                self.current
                    .push(Span::styled(marker, self.palette.muted()));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                let mut style = Style::default()
                    .fg(self.palette.accent)
                    .add_modifier(Modifier::BOLD);
                if level == HeadingLevel::H1 {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                self.styles.push(style);
            }
            Tag::Emphasis => self
                .styles
                .push(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self
                .styles
                .push(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self
                .styles
                .push(Style::default().add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { .. } => self.styles.push(
                Style::default()
                    .fg(self.palette.accent)
                    .add_modifier(Modifier::UNDERLINED),
            ),
            Tag::CodeBlock(_) => {
                self.flush();
                self.in_code_block = true;
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let bullet = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let label = format!("{number}. ");
                        *number += 1;
                        label
                    }
                    _ => "• ".to_string(),
                };
                self.current.push(Span::styled(
                    format!("{}{bullet}", "  ".repeat(depth)),
                    self.palette.muted(),
                ));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.styles.pop();
                self.flush();
                self.blank();
            }
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.styles.pop();
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.blank();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => self.flush(),
            _ => {}
        }
    }

    fn push_text(&mut self, text: String) {
        let style = self
            .styles
            .iter()
            .fold(Style::default(), |acc, style| acc.patch(*style));
        self.current.push(Span::styled(text, style));
    }

    fn code_style(&self) -> Style {
        Style::default().fg(self.palette.tag)
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|line| !line.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeMode;

    fn plain(lines: &[Line<'static>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    fn palette() -> Palette {
        Palette::for_mode(ThemeMode::Light)
    }

    #[test]
    fn empty_body_shows_placeholder() {
        let lines = render_markdown("  \n", &palette());
        assert_eq!(plain(&lines), vec![EMPTY_BODY]);
    }

    #[test]
    fn headings_and_paragraphs_are_separated() {
        let lines = render_markdown("# Plan\n\nSome *em* text\nwrapped", &palette());
        assert_eq!(plain(&lines), vec!["Plan", "", "Some em text wrapped"]);
        let heading = &lines[0].spans[0];
        assert!(heading.style.add_modifier.contains(Modifier::BOLD));
        let emphasis = &lines[2].spans[1];
        assert_eq!(emphasis.content.as_ref(), "em");
        assert!(emphasis.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn lists_get_bullets_and_numbers() {
        let bullets = render_markdown("- milk\n- eggs", &palette());
        assert_eq!(plain(&bullets), vec!["• milk", "• eggs"]);

        let numbered = render_markdown("3. third\n4. fourth", &palette());
        assert_eq!(plain(&numbered), vec!["3. third", "4. fourth"]);
    }

    #[test]
    fn code_blocks_are_indented() {
        let lines = render_markdown("```\nlet x = 1;\nx + 1\n```", &palette());
        assert_eq!(plain(&lines), vec!["  let x = 1;", "  x + 1"]);
    }
}
