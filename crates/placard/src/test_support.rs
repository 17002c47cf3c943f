//! Test doubles shared by unit tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::clock::{ClockRenderer, LocalClock, TimeSource};
use crate::error::{Error, Result};
use crate::history::HistoryView;
use crate::session::{Display, Notifier};

/// Let spawned tasks run up to their next wait.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub(crate) fn instant(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .expect("valid test instant")
        .with_timezone(&Utc)
}

/// Local clock frozen at a settable instant.
#[derive(Debug)]
pub(crate) struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub(crate) fn new(at: DateTime<Utc>) -> Self {
        Self(Mutex::new(at))
    }

    pub(crate) fn advance(&self, by: TimeDelta) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

impl LocalClock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Time source with a canned answer.
#[derive(Debug)]
pub(crate) enum StubTimeSource {
    At(DateTime<Utc>),
    Failing(String),
    /// Never answers.
    Hanging,
}

impl StubTimeSource {
    pub(crate) fn at(at: DateTime<Utc>) -> Self {
        Self::At(at)
    }

    pub(crate) fn failing(reason: &str) -> Self {
        Self::Failing(reason.to_string())
    }

    pub(crate) fn hanging() -> Self {
        Self::Hanging
    }
}

#[async_trait]
impl TimeSource for StubTimeSource {
    fn endpoint(&self) -> &str {
        "stub://time"
    }

    async fn fetch(&self) -> Result<DateTime<Utc>> {
        match self {
            Self::At(at) => Ok(*at),
            Self::Failing(reason) => Err(Error::time_source_request("stub://time", reason.clone())),
            Self::Hanging => std::future::pending().await,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RenderEvent {
    Shown,
    Hidden,
    Rendered(String),
}

/// Clock renderer that records every call.
#[derive(Debug, Default)]
pub(crate) struct RecordingRenderer(Mutex<Vec<RenderEvent>>);

impl RecordingRenderer {
    pub(crate) fn events(&self) -> Vec<RenderEvent> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn rendered(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RenderEvent::Rendered(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl ClockRenderer for RecordingRenderer {
    fn show_clock(&self) {
        self.0.lock().unwrap().push(RenderEvent::Shown);
    }

    fn hide_clock(&self) {
        self.0.lock().unwrap().push(RenderEvent::Hidden);
    }

    fn render_clock(&self, text: &str) {
        self.0
            .lock()
            .unwrap()
            .push(RenderEvent::Rendered(text.to_string()));
    }
}

/// Snapshot of what a [`RecordingDisplay`] currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DisplayState {
    pub(crate) content: Option<String>,
    pub(crate) visible: bool,
    pub(crate) fullscreen: bool,
    pub(crate) enter_count: usize,
    pub(crate) exit_count: usize,
}

/// Display double that tracks visibility, full-screen state and listings.
#[derive(Debug, Default)]
pub(crate) struct RecordingDisplay {
    state: Mutex<DisplayState>,
    histories: Mutex<Vec<HistoryView>>,
}

impl RecordingDisplay {
    pub(crate) fn state(&self) -> DisplayState {
        self.state.lock().unwrap().clone()
    }

    pub(crate) fn history_renders(&self) -> usize {
        self.histories.lock().unwrap().len()
    }

    pub(crate) fn last_history(&self) -> Option<HistoryView> {
        self.histories.lock().unwrap().last().cloned()
    }
}

impl Display for RecordingDisplay {
    fn set_content(&self, content: &str) -> Result<()> {
        self.state.lock().unwrap().content = Some(content.to_string());
        Ok(())
    }

    fn show(&self) -> Result<()> {
        self.state.lock().unwrap().visible = true;
        Ok(())
    }

    fn hide(&self) -> Result<()> {
        self.state.lock().unwrap().visible = false;
        Ok(())
    }

    fn enter_fullscreen(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.fullscreen = true;
        state.enter_count += 1;
        Ok(())
    }

    fn exit_fullscreen(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.fullscreen = false;
        state.exit_count += 1;
        Ok(())
    }

    fn render_history(&self, view: &HistoryView) -> Result<()> {
        self.histories.lock().unwrap().push(view.clone());
        Ok(())
    }
}

/// Notifier double with a fixed confirmation answer.
#[derive(Debug)]
pub(crate) struct ScriptedNotifier {
    confirm_answer: bool,
    alerts: Mutex<Vec<String>>,
    confirms: Mutex<Vec<String>>,
}

impl ScriptedNotifier {
    pub(crate) fn answering(confirm_answer: bool) -> Self {
        Self {
            confirm_answer,
            alerts: Mutex::new(Vec::new()),
            confirms: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    pub(crate) fn confirms(&self) -> Vec<String> {
        self.confirms.lock().unwrap().clone()
    }
}

impl Notifier for ScriptedNotifier {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }

    fn confirm(&self, message: &str) -> bool {
        self.confirms.lock().unwrap().push(message.to_string());
        self.confirm_answer
    }
}
