//! Line editor: the in-progress typed line plus submission history.
//!
//! History is one append-only sequence with a browse index and a saved
//! draft, not a pair of stacks: walking older/newer moves the index, and
//! walking past the newest entry leaves history mode and restores whatever
//! was being typed when browsing began.

/// The edit line and its history.
#[derive(Debug, Default)]
pub struct LineEditor {
    /// The string currently being composed.
    edit: String,
    /// Previously submitted lines, oldest first.
    history: Vec<String>,
    /// Index into `history` while browsing; `None` when editing normally.
    browse: Option<usize>,
    /// The edit line saved when browsing began.
    draft: String,
}

impl LineEditor {
    /// Creates an empty editor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current edit line text.
    pub fn text(&self) -> &str {
        &self.edit
    }

    /// Cursor column: always the character length of the edit line.
    pub fn cursor_col(&self) -> usize {
        self.edit.chars().count()
    }

    /// Appends a character to the edit line.
    pub fn insert_char(&mut self, c: char) {
        self.edit.push(c);
    }

    /// Removes the last character; no-op on an empty line.
    pub fn backspace(&mut self) {
        self.edit.pop();
    }

    /// Recalls the next older history entry; no-op when there is none.
    pub fn history_older(&mut self) {
        match self.browse {
            None => {
                if self.history.is_empty() {
                    return;
                }
                self.draft = std::mem::take(&mut self.edit);
                let index = self.history.len() - 1;
                self.browse = Some(index);
                self.edit = self.history[index].clone();
            }
            Some(0) => {}
            Some(index) => {
                self.browse = Some(index - 1);
                self.edit = self.history[index - 1].clone();
            }
        }
    }

    /// Recalls the next newer history entry. Walking past the newest entry
    /// leaves history mode and restores the saved draft.
    pub fn history_newer(&mut self) {
        match self.browse {
            None => {}
            Some(index) if index + 1 < self.history.len() => {
                self.browse = Some(index + 1);
                self.edit = self.history[index + 1].clone();
            }
            Some(_) => {
                self.browse = None;
                self.edit = std::mem::take(&mut self.draft);
            }
        }
    }

    /// Takes the edit line, records it in history, resets the editor, and
    /// returns the submitted text (possibly empty).
    pub fn submit(&mut self) -> String {
        self.browse = None;
        self.draft.clear();
        let text = std::mem::take(&mut self.edit);
        self.history.push(text.clone());
        text
    }

    /// Whether a history entry is currently recalled.
    pub fn browsing(&self) -> bool {
        self.browse.is_some()
    }
}
