//! `placard` - Full-screen announcements with a synchronized clock
//!
//! This library provides the announcement history, the clock corrected
//! against a public time source, and the session that shows announcements
//! full screen.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod markup;
pub mod record;
pub mod session;
pub mod storage;
pub mod terminal;

#[cfg(test)]
mod test_support;

pub use clock::{ClockOffset, DisplayClock, HttpTimeSource, OffsetReading, SystemClock, TimeSync};
pub use config::Config;
pub use error::{Error, Result};
pub use history::{HistoryAction, HistoryStore, HistoryView};
pub use logging::init_logging;
pub use record::{AnnouncementRecord, RecordId};
pub use session::Announcer;
pub use storage::Storage;
