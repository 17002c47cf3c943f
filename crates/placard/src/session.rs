//! The announcement session.
//!
//! [`Announcer`] is the single owner of everything a display session
//! mutates: the history, the display clock (offset and tick) and the
//! full-screen flag. Platform collaborators are reached through the
//! [`Display`] and [`Notifier`] traits.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::clock::{format_local, DisplayClock};
use crate::error::Result;
use crate::history::{self, HistoryAction, HistoryStore, HistoryView};
use crate::markup;
use crate::record::RecordId;

/// Notice shown when generating with blank content.
pub const EMPTY_GENERATE_NOTICE: &str = "Please type a message before generating the announcement.";

/// Notice shown when saving blank content.
pub const EMPTY_SAVE_NOTICE: &str = "Please type a message before saving.";

/// Notice shown after a non-silent save.
pub const SAVED_NOTICE: &str = "Announcement saved to history.";

/// Confirmation asked before deleting one record.
pub const CONFIRM_DELETE: &str = "Are you sure you want to delete this announcement from history?";

/// Confirmation asked before clearing the history.
pub const CONFIRM_CLEAR: &str =
    "Are you sure you want to clear the whole history? This cannot be undone.";

/// Surface the announcement is shown on.
pub trait Display: Send + Sync + fmt::Debug {
    /// Replace the announcement content.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be drawn.
    fn set_content(&self, content: &str) -> Result<()>;

    /// Make the announcement visible.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be drawn.
    fn show(&self) -> Result<()>;

    /// Hide the announcement.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be drawn.
    fn hide(&self) -> Result<()>;

    /// Take over the whole screen.
    ///
    /// # Errors
    ///
    /// Returns an error if full-screen mode cannot be entered.
    fn enter_fullscreen(&self) -> Result<()>;

    /// Give the screen back.
    ///
    /// # Errors
    ///
    /// Returns an error if full-screen mode cannot be left.
    fn exit_fullscreen(&self) -> Result<()>;

    /// Redraw the history listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be drawn.
    fn render_history(&self, view: &HistoryView) -> Result<()>;
}

/// Blocking user notices.
pub trait Notifier: Send + Sync + fmt::Debug {
    /// Tell the user something.
    fn alert(&self, message: &str);

    /// Ask the user to confirm a destructive action.
    fn confirm(&self, message: &str) -> bool;
}

/// Outcome of a save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The record was written.
    Saved(RecordId),
    /// Blank content; nothing was written.
    Rejected,
}

/// Outcome of a generate request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// Saved and shown full-screen.
    Shown,
    /// Blank content; nothing was saved or shown.
    Rejected,
}

impl GenerateOutcome {
    /// Whether the announcement is on screen.
    #[must_use]
    pub fn is_shown(self) -> bool {
        matches!(self, Self::Shown)
    }
}

/// Session controller for composing, showing and managing announcements.
#[derive(Debug)]
pub struct Announcer {
    history: HistoryStore,
    clock: DisplayClock,
    display: Arc<dyn Display>,
    notifier: Arc<dyn Notifier>,
    timestamp_format: String,
    fullscreen: bool,
    showing: bool,
}

impl Announcer {
    /// Create a session over an opened history.
    #[must_use]
    pub fn new(
        history: HistoryStore,
        clock: DisplayClock,
        display: Arc<dyn Display>,
        notifier: Arc<dyn Notifier>,
        timestamp_format: impl Into<String>,
    ) -> Self {
        Self {
            history,
            clock,
            display,
            notifier,
            timestamp_format: timestamp_format.into(),
            fullscreen: false,
            showing: false,
        }
    }

    /// Save `content` at the head of the history.
    ///
    /// `silent` suppresses both the success notice and the blank-content
    /// notice; it is used when saving automatically before display.
    ///
    /// # Errors
    ///
    /// Returns an error only if storage or the listing fails.
    pub fn save(&mut self, content: &str, include_clock: bool, silent: bool) -> Result<SaveOutcome> {
        let at = self.clock.now();
        let timestamp = format_local(at, &self.timestamp_format);

        let id = match self.history.save(content, include_clock, &at, timestamp) {
            Ok(id) => id,
            Err(e) if history::is_rejected(&e) => {
                debug!("Rejected blank announcement");
                if !silent {
                    self.notifier.alert(EMPTY_SAVE_NOTICE);
                }
                return Ok(SaveOutcome::Rejected);
            }
            Err(e) => return Err(e),
        };

        self.display.render_history(&self.history.view())?;
        if !silent {
            self.notifier.alert(SAVED_NOTICE);
        }
        Ok(SaveOutcome::Saved(id))
    }

    /// Save `content` silently and show it full-screen.
    ///
    /// Blank content raises a notice and shows nothing. Returns as soon as
    /// the announcement is on screen; the clock offset arrives later.
    ///
    /// # Errors
    ///
    /// Returns an error if storage or the display fails.
    pub fn generate(&mut self, content: &str, include_clock: bool) -> Result<GenerateOutcome> {
        if markup::is_blank(content) {
            self.notifier.alert(EMPTY_GENERATE_NOTICE);
            return Ok(GenerateOutcome::Rejected);
        }

        self.save(content, include_clock, true)?;
        self.present(content, include_clock)?;
        Ok(GenerateOutcome::Shown)
    }

    /// Show a saved announcement again.
    ///
    /// Returns `false` without doing anything when `id` is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if storage or the display fails.
    pub fn replay(&mut self, id: RecordId) -> Result<bool> {
        self.history.load()?;
        let Some(record) = self.history.find(id).cloned() else {
            debug!("No announcement with id {} to replay", id);
            return Ok(false);
        };

        info!("Replaying announcement {}", id);
        self.present(&record.content, record.include_clock)?;
        Ok(true)
    }

    /// Delete a saved announcement after confirmation.
    ///
    /// Returns `true` only if a record was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if storage or the listing fails.
    pub fn delete(&mut self, id: RecordId) -> Result<bool> {
        if !self.notifier.confirm(CONFIRM_DELETE) {
            debug!("Deletion of {} declined", id);
            return Ok(false);
        }

        let removed = self.history.delete(id)?;
        self.display.render_history(&self.history.view())?;
        Ok(removed)
    }

    /// Remove the whole history after confirmation.
    ///
    /// Returns `false` if the user declined.
    ///
    /// # Errors
    ///
    /// Returns an error if storage or the listing fails.
    pub fn clear_all(&mut self) -> Result<bool> {
        if !self.notifier.confirm(CONFIRM_CLEAR) {
            debug!("Clearing history declined");
            return Ok(false);
        }

        self.history.clear_all()?;
        self.display.render_history(&self.history.view())?;
        Ok(true)
    }

    /// Read the history and render it.
    ///
    /// # Errors
    ///
    /// Returns an error if storage or the listing fails.
    pub fn list(&mut self) -> Result<HistoryView> {
        self.history.load()?;
        let view = self.history.view();
        self.display.render_history(&view)?;
        Ok(view)
    }

    /// Run an action bound to a rendered history item.
    ///
    /// Actions not offered by the current listing are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if storage or the display fails.
    pub fn dispatch(&mut self, action: HistoryAction) -> Result<bool> {
        self.history.load()?;
        if !self.history.view().offers(action) {
            debug!("Ignoring action for unlisted announcement {}", action.id());
            return Ok(false);
        }

        match action {
            HistoryAction::Replay(id) => self.replay(id),
            HistoryAction::Delete(id) => self.delete(id),
        }
    }

    /// Close the shown announcement.
    ///
    /// # Errors
    ///
    /// Returns an error if the display fails.
    pub fn close(&mut self) -> Result<()> {
        if self.fullscreen {
            self.display.exit_fullscreen()?;
            self.fullscreen = false;
        }
        self.teardown()
    }

    /// React to the platform reporting a full-screen change.
    ///
    /// Leaving full-screen by any outside means tears the session down the
    /// same way [`Announcer::close`] does.
    ///
    /// # Errors
    ///
    /// Returns an error if the display fails.
    pub fn fullscreen_changed(&mut self, still_fullscreen: bool) -> Result<()> {
        if still_fullscreen {
            return Ok(());
        }
        debug!("Full-screen left externally");
        self.fullscreen = false;
        self.teardown()
    }

    /// Whether an announcement is currently shown.
    #[must_use]
    pub fn is_showing(&self) -> bool {
        self.showing
    }

    /// Whether the session holds full-screen.
    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// The session clock.
    #[must_use]
    pub fn clock(&self) -> &DisplayClock {
        &self.clock
    }

    /// The session history.
    #[must_use]
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    fn present(&mut self, content: &str, include_clock: bool) -> Result<()> {
        self.display.set_content(content)?;
        self.display.enter_fullscreen()?;
        self.fullscreen = true;
        self.display.show()?;
        self.showing = true;

        self.clock.start(include_clock);
        Ok(())
    }

    fn teardown(&mut self) -> Result<()> {
        self.clock.stop();
        self.showing = false;
        self.display.hide()
    }
}
