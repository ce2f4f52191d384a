use unicode_segmentation::UnicodeSegmentation;

use crate::api::{Note, NoteDraft};

/// Single text buffer with a byte cursor that always sits on a grapheme
/// boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldEditor {
    buffer: String,
    cursor: usize,
    multiline: bool,
}

impl FieldEditor {
    pub fn single_line(value: impl Into<String>) -> Self {
        Self::with_value(value.into(), false)
    }

    pub fn multi_line(value: impl Into<String>) -> Self {
        Self::with_value(value.into(), true)
    }

    fn with_value(buffer: String, multiline: bool) -> Self {
        let cursor = buffer.len();
        Self {
            buffer,
            cursor,
            multiline,
        }
    }

    pub fn value(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        if ch == '\n' {
            return self.insert_newline();
        }
        self.buffer.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        true
    }

    /// Ignored on single-line fields.
    pub fn insert_newline(&mut self) -> bool {
        if !self.multiline {
            return false;
        }
        self.buffer.insert(self.cursor, '\n');
        self.cursor += 1;
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_grapheme_boundary(&self.buffer, self.cursor);
        self.buffer.drain(prev..self.cursor);
        self.cursor = prev;
        true
    }

    pub fn delete(&mut self) -> bool {
        let next = next_grapheme_boundary(&self.buffer, self.cursor);
        if next == self.cursor {
            return false;
        }
        self.buffer.drain(self.cursor..next);
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_grapheme_boundary(&self.buffer, self.cursor);
        true
    }

    pub fn move_right(&mut self) -> bool {
        let next = next_grapheme_boundary(&self.buffer, self.cursor);
        if next == self.cursor {
            return false;
        }
        self.cursor = next;
        true
    }

    pub fn move_home(&mut self) -> bool {
        let start = line_start(&self.buffer, self.cursor);
        if start == self.cursor {
            return false;
        }
        self.cursor = start;
        true
    }

    pub fn move_end(&mut self) -> bool {
        let end = line_end(&self.buffer, self.cursor);
        if end == self.cursor {
            return false;
        }
        self.cursor = end;
        true
    }

    /// Buffer split at the cursor, for drawing a cursor marker in between.
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.buffer.split_at(self.cursor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Title,
    Text,
    Tags,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Title => FormField::Text,
            FormField::Text => FormField::Tags,
            FormField::Tags => FormField::Title,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            FormField::Title => FormField::Tags,
            FormField::Text => FormField::Title,
            FormField::Tags => FormField::Text,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Text => "Text",
            FormField::Tags => "Tags (comma separated)",
        }
    }
}

/// Field values of an open form. Seeded from the note being edited and
/// thrown away when the form closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub title: FieldEditor,
    pub text: FieldEditor,
    pub tags: FieldEditor,
    pub focus: FormField,
    pub preview: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self::blank()
    }
}

impl FormState {
    pub fn blank() -> Self {
        Self::seeded("", "", "")
    }

    pub fn from_note(note: &Note) -> Self {
        Self::seeded(&note.title, &note.text, &note.tags)
    }

    fn seeded(title: &str, text: &str, tags: &str) -> Self {
        Self {
            title: FieldEditor::single_line(title),
            text: FieldEditor::multi_line(text),
            tags: FieldEditor::single_line(tags),
            focus: FormField::Title,
            preview: false,
        }
    }

    pub fn focused(&self) -> &FieldEditor {
        match self.focus {
            FormField::Title => &self.title,
            FormField::Text => &self.text,
            FormField::Tags => &self.tags,
        }
    }

    pub fn focused_mut(&mut self) -> &mut FieldEditor {
        match self.focus {
            FormField::Title => &mut self.title,
            FormField::Text => &mut self.text,
            FormField::Tags => &mut self.tags,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.previous();
    }

    pub fn toggle_preview(&mut self) {
        self.preview = !self.preview;
    }

    pub fn draft(&self) -> NoteDraft {
        NoteDraft::new(self.title.value(), self.text.value(), self.tags.value())
    }
}

fn prev_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[..cursor]
        .grapheme_indices(true)
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .graphemes(true)
        .next()
        .map(|grapheme| cursor + grapheme.len())
        .unwrap_or(text.len())
}

fn line_start(text: &str, cursor: usize) -> usize {
    text[..cursor].rfind('\n').map(|idx| idx + 1).unwrap_or(0)
}

fn line_end(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .find('\n')
        .map(|idx| cursor + idx)
        .unwrap_or(text.len())
}
