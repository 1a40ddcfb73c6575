//! Library crate for parallel-ping-rs exposing reusable modules.
pub mod cancel;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod probe;
pub mod reporter;
pub mod session;
pub mod types;
pub mod worklist;
