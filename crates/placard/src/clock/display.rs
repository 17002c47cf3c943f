//! The repeating clock shown next to an announcement.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use super::{format_local, ClockOffset, OffsetReading, TimeSync};

/// Surface the clock is drawn on.
pub trait ClockRenderer: Send + Sync + fmt::Debug {
    /// Make the clock area visible.
    fn show_clock(&self);

    /// Hide the clock area.
    fn hide_clock(&self);

    /// Draw the current clock text.
    fn render_clock(&self, text: &str);
}

/// Session-scoped clock: owns the offset and the single clock task.
///
/// The clock task first takes one offset reading, then renders corrected
/// time every interval. Its handle never leaves this type;
/// [`DisplayClock::start`] and [`DisplayClock::stop`] are the only ways to
/// change it, and stopping cancels a pending reading as well as the tick.
#[derive(Debug)]
pub struct DisplayClock {
    sync: TimeSync,
    renderer: Arc<dyn ClockRenderer>,
    reading: Arc<watch::Sender<Option<OffsetReading>>>,
    ticker: Option<JoinHandle<()>>,
    interval: Duration,
    time_format: String,
}

impl DisplayClock {
    /// Create a stopped clock.
    #[must_use]
    pub fn new(
        sync: TimeSync,
        renderer: Arc<dyn ClockRenderer>,
        interval: Duration,
        time_format: impl Into<String>,
    ) -> Self {
        Self {
            sync,
            renderer,
            reading: Arc::new(watch::channel(None).0),
            ticker: None,
            interval,
            time_format: time_format.into(),
        }
    }

    /// Start or restart the clock without waiting on the time source.
    ///
    /// Any running clock task is cancelled first and the offset reset. With
    /// `include_clock` false the clock is hidden. Otherwise the clock area is
    /// shown right away and a fresh task takes one offset reading, renders,
    /// and keeps rendering corrected time every interval.
    ///
    /// Must be called from within a tokio runtime when `include_clock` is set.
    pub fn start(&mut self, include_clock: bool) {
        self.stop();
        self.reading.send_replace(None);

        if !include_clock {
            self.renderer.hide_clock();
            return;
        }

        self.renderer.show_clock();
        self.spawn_ticker();
    }

    /// Cancel the clock task, if any.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            debug!("Clock task cancelled");
        }
    }

    /// Whether a clock task is currently scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// The reading taken for the current session, once it has arrived.
    #[must_use]
    pub fn reading(&self) -> Option<OffsetReading> {
        self.reading.borrow().clone()
    }

    /// The offset currently applied; zero until a reading arrives.
    #[must_use]
    pub fn offset(&self) -> ClockOffset {
        self.reading
            .borrow()
            .as_ref()
            .map_or_else(ClockOffset::zero, OffsetReading::offset)
    }

    /// Local now corrected by the current offset.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.offset().apply(self.sync.local_now())
    }

    /// The clock text for the current instant.
    #[must_use]
    pub fn text(&self) -> String {
        format_local(self.now(), &self.time_format)
    }

    fn spawn_ticker(&mut self) {
        let sync = self.sync.clone();
        let renderer = Arc::clone(&self.renderer);
        let shared = Arc::clone(&self.reading);
        let format = self.time_format.clone();
        let period = self.interval;

        self.ticker = Some(tokio::spawn(async move {
            let reading = sync.acquire_offset().await;
            let offset = reading.offset();
            shared.send_replace(Some(reading));
            debug!("Clock tick started every {:?} with offset {}", period, offset);

            let local = sync.local_clock();
            renderer.render_clock(&format_local(offset.apply(local.now()), &format));

            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                renderer.render_clock(&format_local(offset.apply(local.now()), &format));
            }
        }));
    }
}

impl Drop for DisplayClock {
    fn drop(&mut self) {
        self.stop();
    }
}
