//! # bratgen Common Library
//!
//! Shared code for the bratgen client including:
//! - Clock-style time formatting
//! - Synchronized lyrics parsing and range derivation
//! - Line selection state machine
//! - Render style options and their preferences cache
//! - Job status and update events
//! - Configuration loading

pub mod config;
pub mod error;
pub mod events;
pub mod lyrics;
pub mod selection;
pub mod style;
pub mod time_format;

pub use error::{Error, Result};
pub use events::{JobStatus, JobUpdate};
pub use lyrics::{LyricsTimeline, TimeRange, TimedLine};
pub use selection::{LineSelector, Selection};
pub use style::{StyleOptions, StylePreferences};
