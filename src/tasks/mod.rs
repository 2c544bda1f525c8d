//! Background Tasks Module
//!
//! Tasks that run periodically for the life of the process.
//!
//! # Tasks
//! - Fallback expiry sweep: reclaims expired fallback-store entries
//! - Reconnect loop: probes the backing store and reconnects when it
//!   comes back

mod cleanup;
mod reconnect;

pub use cleanup::spawn_cleanup_task;
pub use reconnect::spawn_reconnect_task;
