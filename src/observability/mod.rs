//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! config loads, skipped rules, resolution results
//!     → tracing events (debug / trace / warn)
//!     → logging.rs subscriber → stderr
//! ```
//!
//! # Design Decisions
//! - Library code only emits events; binaries install the subscriber
//! - Recovered problems (bad regex, failed /proc read) log below `warn`

pub mod logging;
