//! Observability: structured logging and spans via `tracing`.
//!
//! The client emits:
//!
//! | Event | Level |
//! |-------|-------|
//! | `negotiation` span around open, attach and rebind | INFO |
//! | `bind` span around the table walk | DEBUG |
//! | bound capability, unknown GUID | DEBUG |
//! | foreign-format record, null pointer | WARN |
//! | table bound, state change | INFO |
//! | negotiation failure | ERROR |
//!
//! Nothing is printed unless the application installs a subscriber:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt().with_env_filter("uxlink=debug").init();
//! ```

mod tracing_support;

pub use tracing_support::{
    instrument_negotiation, span_bind, span_negotiation, trace_bind_report, trace_error,
    trace_state_change,
};
