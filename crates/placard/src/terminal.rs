//! Terminal front end.
//!
//! The alternate screen stands in for full-screen mode: entering it takes
//! over the whole terminal, leaving it restores the shell. Key presses are
//! read on a blocking task and forwarded as [`TerminalEvent`]s.

use std::io::{self, BufRead, Write};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::clock::ClockRenderer;
use crate::error::{Error, Result};
use crate::history::HistoryView;
use crate::markup;
use crate::session::{Display, Notifier};

/// Keyboard polling interval while waiting for a key.
const KEYBOARD_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Rows kept free at the bottom of the frame for the clock and the hint.
const RESERVED_ROWS: u16 = 2;

/// Hint drawn on the last row of the frame.
const KEY_HINT: &str = "Esc: leave full screen   q: close";

/// What the user did while an announcement is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalEvent {
    /// Close the announcement.
    Close,
    /// Leave full-screen mode.
    FullscreenExited,
    /// The terminal was resized.
    Resize,
}

/// Map a raw terminal event to a [`TerminalEvent`].
#[must_use]
pub fn classify(event: &Event) -> Option<TerminalEvent> {
    match event {
        Event::Key(KeyEvent {
            kind: KeyEventKind::Release,
            ..
        }) => None,
        Event::Key(KeyEvent {
            code: KeyCode::Esc, ..
        }) => Some(TerminalEvent::FullscreenExited),
        Event::Key(KeyEvent {
            code: KeyCode::Char('c'),
            modifiers,
            ..
        }) if modifiers.contains(KeyModifiers::CONTROL) => Some(TerminalEvent::Close),
        Event::Key(KeyEvent {
            code: KeyCode::Char('q' | 'Q'),
            ..
        }) => Some(TerminalEvent::Close),
        Event::Resize(..) => Some(TerminalEvent::Resize),
        _ => None,
    }
}

/// Forward terminal events until the receiver is dropped.
#[must_use]
pub fn spawn_event_listener() -> (mpsc::UnboundedReceiver<TerminalEvent>, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::task::spawn_blocking(move || {
        while !tx.is_closed() {
            match poll(KEYBOARD_POLL_INTERVAL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!("Stopped reading terminal events: {}", e);
                    break;
                }
            }

            match read() {
                Ok(event) => {
                    if let Some(event) = classify(&event) {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    warn!("Stopped reading terminal events: {}", e);
                    break;
                }
            }
        }
        debug!("Terminal event listener finished");
    });

    (rx, handle)
}

#[derive(Debug, Default)]
struct Frame {
    lines: Vec<String>,
    visible: bool,
    fullscreen: bool,
    clock_visible: bool,
    clock_text: String,
}

/// A line of text placed at a column and row.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Placed {
    col: u16,
    row: u16,
    text: String,
}

/// Center `lines` in the area above the reserved rows.
#[allow(clippy::cast_possible_truncation)]
fn layout(lines: &[String], width: u16, height: u16) -> Vec<Placed> {
    let body_rows = height.saturating_sub(RESERVED_ROWS);
    let shown = lines.len().min(usize::from(body_rows)) as u16;
    let top = (body_rows - shown) / 2;

    lines
        .iter()
        .take(usize::from(shown))
        .enumerate()
        .map(|(i, line)| {
            let text = truncate(line, width);
            Placed {
                col: centered(&text, width),
                row: top + i as u16,
                text,
            }
        })
        .collect()
}

fn truncate(line: &str, width: u16) -> String {
    line.chars().take(usize::from(width)).collect()
}

#[allow(clippy::cast_possible_truncation)]
fn centered(text: &str, width: u16) -> u16 {
    let len = text.chars().count().min(usize::from(width)) as u16;
    (width - len) / 2
}

/// Full-screen announcement display on the controlling terminal.
///
/// Nothing is drawn until full-screen mode is entered. Outside it, history
/// listings are printed to stdout when enabled.
#[derive(Debug, Default)]
pub struct TerminalDisplay {
    frame: Mutex<Frame>,
    print_listing: bool,
}

impl TerminalDisplay {
    /// Create a display; `print_listing` controls whether history changes
    /// are echoed to stdout.
    #[must_use]
    pub fn new(print_listing: bool) -> Self {
        Self {
            frame: Mutex::new(Frame::default()),
            print_listing,
        }
    }

    /// Draw the whole frame again, e.g. after a resize.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be written.
    pub fn redraw(&self) -> Result<()> {
        let frame = self.frame()?;
        draw(&frame)
    }

    /// Whether the alternate screen is active.
    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.frame().is_ok_and(|f| f.fullscreen)
    }

    fn frame(&self) -> Result<MutexGuard<'_, Frame>> {
        self.frame
            .lock()
            .map_err(|_| Error::display("frame state poisoned"))
    }

    fn update_clock(&self, change: impl FnOnce(&mut Frame)) {
        let result = self.frame().and_then(|mut frame| {
            change(&mut frame);
            draw_clock(&frame)
        });
        if let Err(e) = result {
            warn!("Failed to draw clock: {}", e);
        }
    }
}

fn draw(frame: &Frame) -> Result<()> {
    if !frame.fullscreen {
        return Ok(());
    }

    let mut out = io::stdout().lock();
    queue!(out, Clear(ClearType::All))?;

    if frame.visible {
        let (width, height) = terminal::size()?;
        for placed in layout(&frame.lines, width, height) {
            queue!(
                out,
                MoveTo(placed.col, placed.row),
                SetAttribute(Attribute::Bold),
                Print(placed.text),
                SetAttribute(Attribute::Reset)
            )?;
        }
        queue!(
            out,
            MoveTo(centered(KEY_HINT, width), height.saturating_sub(1)),
            SetAttribute(Attribute::Dim),
            Print(KEY_HINT),
            SetAttribute(Attribute::Reset)
        )?;
    }
    out.flush()?;
    drop(out);

    draw_clock(frame)
}

fn draw_clock(frame: &Frame) -> Result<()> {
    if !frame.fullscreen || !frame.visible {
        return Ok(());
    }

    let (width, height) = terminal::size()?;
    let row = height.saturating_sub(RESERVED_ROWS);
    let mut out = io::stdout().lock();
    queue!(out, MoveTo(0, row), Clear(ClearType::CurrentLine))?;
    if frame.clock_visible && !frame.clock_text.is_empty() {
        let text = truncate(&frame.clock_text, width);
        queue!(out, MoveTo(centered(&text, width), row), Print(text))?;
    }
    out.flush()?;
    Ok(())
}

impl Display for TerminalDisplay {
    fn set_content(&self, content: &str) -> Result<()> {
        let mut frame = self.frame()?;
        frame.lines = markup::to_plain_lines(content);
        draw(&frame)
    }

    fn show(&self) -> Result<()> {
        let mut frame = self.frame()?;
        frame.visible = true;
        draw(&frame)
    }

    fn hide(&self) -> Result<()> {
        let mut frame = self.frame()?;
        frame.visible = false;
        draw(&frame)
    }

    fn enter_fullscreen(&self) -> Result<()> {
        let mut frame = self.frame()?;
        if frame.fullscreen {
            return Ok(());
        }

        enable_raw_mode()?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen, Hide) {
            disable_raw_mode().ok();
            return Err(e.into());
        }
        frame.fullscreen = true;
        debug!("Entered full screen");
        draw(&frame)
    }

    fn exit_fullscreen(&self) -> Result<()> {
        let mut frame = self.frame()?;
        if !frame.fullscreen {
            return Ok(());
        }

        frame.fullscreen = false;
        execute!(io::stdout(), Show, LeaveAlternateScreen)?;
        disable_raw_mode()?;
        debug!("Left full screen");
        Ok(())
    }

    fn render_history(&self, view: &HistoryView) -> Result<()> {
        if !self.print_listing || self.is_fullscreen() {
            return Ok(());
        }
        let mut out = io::stdout().lock();
        write!(out, "{view}")?;
        out.flush()?;
        Ok(())
    }
}

impl ClockRenderer for TerminalDisplay {
    fn show_clock(&self) {
        self.update_clock(|frame| frame.clock_visible = true);
    }

    fn hide_clock(&self) {
        self.update_clock(|frame| {
            frame.clock_visible = false;
            frame.clock_text.clear();
        });
    }

    fn render_clock(&self, text: &str) {
        self.update_clock(|frame| text.clone_into(&mut frame.clock_text));
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        if self.is_fullscreen() {
            execute!(io::stdout(), Show, LeaveAlternateScreen).ok();
            disable_raw_mode().ok();
        }
    }
}

/// Notices on stdout, confirmations read from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier {
    assume_yes: bool,
}

impl TerminalNotifier {
    /// Create a notifier; with `assume_yes` every confirmation is granted
    /// without prompting.
    #[must_use]
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Notifier for TerminalNotifier {
    fn alert(&self, message: &str) {
        println!("{message}");
    }

    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        print!("{message} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_affirmative(&answer),
            Err(e) => {
                warn!("Could not read confirmation: {}", e);
                false
            }
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
