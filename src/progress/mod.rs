//! Turning progress events into log lines.
//!
//! The [`Reporter`] formats every [`ProgressEvent`](crate::download::ProgressEvent)
//! into one human-readable line and appends it to each registered
//! [`LogSink`]. Sinks never see a line twice and always see lines in
//! arrival order.
//!
//! - `reporter` - Line formatting and fan-out to sinks
//! - `sink` - The sink trait and an in-memory sink
//! - `display` - An indicatif-backed console sink with a batch progress bar
//! - `style` - Styling options for the console progress bar
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use tapedeck::download::{ProgressEvent, ProgressStatus};
//! use tapedeck::progress::{MemorySink, Reporter};
//!
//! let memory = Arc::new(MemorySink::default());
//! let reporter = Reporter::new().with_sink(memory.clone());
//!
//! reporter.publish(&ProgressEvent {
//!     job: 0,
//!     status: ProgressStatus::Downloading,
//!     bytes_done: 50,
//!     bytes_total: 200,
//!     filename: "song.webm".into(),
//! });
//!
//! assert_eq!(memory.lines(), ["Downloading \"song.webm\": 25.0%"]);
//! ```

pub(crate) mod display;
pub(crate) mod reporter;
pub(crate) mod sink;
pub(crate) mod style;

pub use display::ProgressDisplay;
pub use reporter::{format_event, Reporter};
pub use sink::{LogSink, MemorySink};
pub use style::ProgressBarOpts;
