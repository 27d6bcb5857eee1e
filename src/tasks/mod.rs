//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry Sweep: Removes expired idempotency records at configured intervals

mod sweep;

pub use sweep::spawn_sweep_task;
