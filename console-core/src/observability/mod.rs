pub mod logging;
pub mod trace_context;

pub use trace_context::TracedClientExt;
