//! Append-only, paginated scrollback buffer.
//!
//! Raw text is retained per logical append and re-wrapped whenever the
//! viewport width changes, so resizing never freezes history at a stale
//! width. The visible window is always exactly `viewport_height` rows,
//! blank-padded past the end of the stored lines.

use proto::{DisplayLine, StyleTag};

/// Rows of overlap kept between pages when paging up/down.
pub const SCROLL_OVERLAP_ROWS: usize = 2;

/// One logical line as appended, before wrapping.
#[derive(Debug, Clone)]
struct LogicalLine {
    text: String,
    style: StyleTag,
}

/// Paginated store of rendered output lines with a visible window.
#[derive(Debug)]
pub struct ScrollBuffer {
    /// Unwrapped history, one entry per logical line appended.
    raw: Vec<LogicalLine>,
    /// History wrapped at the current viewport width.
    lines: Vec<DisplayLine>,
    /// Index of the top visible row.
    first_index: usize,
    /// Whether the user has paged away from the bottom; while set, appends do
    /// not auto-scroll.
    scrolled_up: bool,
    width: usize,
    height: usize,
    overlap: usize,
}

impl ScrollBuffer {
    /// Creates an empty buffer for a viewport of `width` x `height`.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            raw: Vec::new(),
            lines: Vec::new(),
            first_index: 0,
            scrolled_up: false,
            width: width.max(1),
            height: height.max(1),
            overlap: SCROLL_OVERLAP_ROWS,
        }
    }

    /// Creates a buffer with a non-default page overlap.
    pub fn with_overlap(width: usize, height: usize, overlap: usize) -> Self {
        let mut buffer = Self::new(width, height);
        buffer.overlap = overlap;
        buffer
    }

    /// Appends `text`, splitting on explicit line breaks and wrapping each
    /// logical line left-to-right into rows of at most the viewport width.
    /// Auto-scrolls to the bottom unless the user has paged up.
    pub fn append(&mut self, text: &str, style: StyleTag) {
        for logical in text.split('\n') {
            self.raw.push(LogicalLine {
                text: logical.to_string(),
                style,
            });
            wrap_into(&mut self.lines, logical, style, self.width);
        }
        if !self.scrolled_up {
            self.first_index = self.bottom();
        }
    }

    /// Moves the window one page toward older lines, keeping overlap rows
    /// for continuity.
    pub fn page_up(&mut self) {
        self.first_index = self.first_index.saturating_sub(self.page_step());
        self.scrolled_up = self.first_index < self.bottom();
    }

    /// Moves the window one page toward newer lines; never past the newest
    /// line. Reaching the bottom re-enables auto-scroll.
    pub fn page_down(&mut self) {
        self.first_index = (self.first_index + self.page_step()).min(self.bottom());
        self.scrolled_up = self.first_index < self.bottom();
    }

    /// Returns exactly `viewport_height` rows starting at the window top,
    /// padded with blank rows past the end of the stored lines.
    pub fn visible_window(&self) -> Vec<DisplayLine> {
        (self.first_index..self.first_index + self.height)
            .map(|i| self.lines.get(i).cloned().unwrap_or_else(DisplayLine::blank))
            .collect()
    }

    /// Applies new viewport dimensions, re-wrapping all history from the
    /// retained raw text.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.lines.clear();
        for logical in &self.raw {
            wrap_into(&mut self.lines, &logical.text, logical.style, self.width);
        }
        if self.scrolled_up {
            self.first_index = self.first_index.min(self.bottom());
        } else {
            self.first_index = self.bottom();
        }
    }

    /// Number of wrapped rows stored.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no rows are stored yet.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index of the top visible row.
    pub fn first_index(&self) -> usize {
        self.first_index
    }

    /// Current viewport height in rows.
    pub fn viewport_height(&self) -> usize {
        self.height
    }

    /// Largest valid `first_index`: the window position showing the newest line.
    fn bottom(&self) -> usize {
        self.lines.len().saturating_sub(self.height)
    }

    /// Rows advanced per page; at least one even for tiny viewports.
    fn page_step(&self) -> usize {
        self.height.saturating_sub(self.overlap).max(1)
    }
}

/// Wraps one logical line into rows of at most `width` characters, pure
/// left-to-right with no word-break awareness. An empty logical line still
/// produces one blank row.
fn wrap_into(lines: &mut Vec<DisplayLine>, text: &str, style: StyleTag, width: usize) {
    if text.is_empty() {
        lines.push(DisplayLine::new("", style));
        return;
    }
    let mut row = String::new();
    let mut count = 0;
    for c in text.chars() {
        row.push(c);
        count += 1;
        if count == width {
            lines.push(DisplayLine::new(std::mem::take(&mut row), style));
            count = 0;
        }
    }
    if !row.is_empty() {
        lines.push(DisplayLine::new(row, style));
    }
}
