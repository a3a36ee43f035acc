pub mod analysis;
pub mod args;
pub mod config;
pub mod error;
pub mod report;
pub mod segment;
pub mod table;
pub mod util;

pub use analysis::{analyze, available_channels};
pub use error::{SegmentError, TableError};
pub use segment::{segment, Activity, ChannelReport, ExceededRule, Pulse, SegmentOptions, TrailingPulse};
pub use table::{load_table, Sample, TableOptions};
