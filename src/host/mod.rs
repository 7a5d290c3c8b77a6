//! Remote host detection.
//!
//! # Data Flow
//! ```text
//! pane pid ─▶ inspect.rs (/proc lookup) ─┐
//!                                        ├─▶ parser.rs ─▶ lowercase host | None
//! explicit cmdline ──────────────────────┘
//! ```

pub mod inspect;
pub mod parser;

pub use inspect::{NoInspector, ProcessInspector, ProcfsInspector};
pub use parser::{parse_host, parse_host_args};
