//! Core types for lease-based distributed locks.
//!
//! A [`Dlm`] hands out [`Mutex`] values bound to a [`LockStore`]. Each
//! acquisition is a single conditional write in the store; the store, not the
//! client, decides who holds a key. Leases expire on their own, so a crashed
//! holder never blocks a key for longer than its TTL.

pub mod dlm;
pub mod error;
pub mod health;
pub mod memory;
pub mod mutex;
pub mod prelude;
pub mod record;
pub mod traits;
pub mod wait;

pub use dlm::{DEFAULT_TTL, DEFAULT_WAITING_INTERVAL};
pub use error::{LockError, LockResult};
pub use prelude::*;
