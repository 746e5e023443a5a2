//! Terminal renderer: draws the scrollback window and the prompt row.
//!
//! In quiet (headless) mode no terminal is touched at all; every draw is a
//! no-op while the session logic runs unchanged.

use std::io::Stdout;

use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use proto::{RenderError, StyleTag};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::Paragraph,
};

use crate::editor::LineEditor;
use crate::scroll::ScrollBuffer;

/// Viewport dimensions assumed in quiet mode, where no terminal exists.
const HEADLESS_VIEWPORT: (usize, usize) = (80, 23);

/// RAII guard that restores the terminal on drop (even on panic).
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
    }
}

/// Draws session state onto the terminal surface.
pub struct Renderer {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    _guard: Option<TerminalGuard>,
}

impl Renderer {
    /// Sets up raw mode and the alternate screen, or a headless renderer
    /// when `quiet` is set.
    pub fn new(quiet: bool) -> Result<Self, RenderError> {
        if quiet {
            return Ok(Self::headless());
        }
        enable_raw_mode()?;
        execute!(std::io::stdout(), EnterAlternateScreen)?;
        let guard = TerminalGuard;
        let terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
        Ok(Self {
            terminal: Some(terminal),
            _guard: Some(guard),
        })
    }

    /// A renderer that never touches the terminal.
    pub fn headless() -> Self {
        Self {
            terminal: None,
            _guard: None,
        }
    }

    /// Current (viewport width, viewport height) in cells. The bottom row is
    /// reserved for the prompt.
    pub fn viewport(&self) -> (usize, usize) {
        match &self.terminal {
            Some(terminal) => match terminal.size() {
                Ok(size) => (
                    size.width.max(1) as usize,
                    (size.height.saturating_sub(1)).max(1) as usize,
                ),
                Err(_) => HEADLESS_VIEWPORT,
            },
            None => HEADLESS_VIEWPORT,
        }
    }

    /// Draws the visible scrollback window and the prompt row, placing the
    /// cursor at the end of the edit line. Idempotent: unchanged inputs
    /// produce an unchanged surface (ratatui diffs against the previous
    /// frame buffer).
    pub fn draw(&mut self, scroll: &ScrollBuffer, editor: &LineEditor) -> Result<(), RenderError> {
        let Some(terminal) = self.terminal.as_mut() else {
            return Ok(());
        };

        terminal.draw(|frame| {
            let chunks =
                Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).split(frame.area());

            let rows: Vec<Line<'_>> = scroll
                .visible_window()
                .into_iter()
                .map(|row| Line::from(Span::styled(row.text, style_for(row.style))))
                .collect();
            frame.render_widget(Paragraph::new(Text::from(rows)), chunks[0]);

            frame.render_widget(Paragraph::new(editor.text().to_string()), chunks[1]);
            frame.set_cursor_position((
                chunks[1].x + editor.cursor_col() as u16,
                chunks[1].y,
            ));
        })?;
        Ok(())
    }
}

/// Foreground color and emphasis for each style tag.
fn style_for(tag: StyleTag) -> Style {
    match tag {
        StyleTag::Normal => Style::default(),
        StyleTag::NormalEmphasis => Style::default().add_modifier(Modifier::BOLD),
        StyleTag::Command => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        StyleTag::ConnectionEvent => Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::BOLD),
        StyleTag::SystemMessage => Style::default().fg(Color::Cyan),
        StyleTag::SystemMessageEmphasis => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    }
}
