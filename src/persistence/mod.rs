//! Persistence layer: embedded SQLite store.
//!
//! All mutation goes through [`sqlite::Store`]. Concurrency correctness
//! for redemption relies on the store's transaction primitive plus
//! conditional updates (`rows_affected` as the success signal), never on
//! in-process locking.

pub mod sqlite;

pub use sqlite::{FinalizeOutcome, Store};
