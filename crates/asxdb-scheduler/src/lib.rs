//! Staleness-ordered scrape scheduler.
//!
//! Each [`Scheduler::run_cycle`] call takes the single-flight [`CycleLock`],
//! picks the active company with the oldest `last_refreshed`, fetches its
//! three statements concurrently, upserts whatever arrived, and always
//! advances the company's timestamp so a permanently failing company cannot
//! starve the rest of the roster.

pub mod adapters;
pub mod error;
pub mod lock;
pub mod ports;
pub mod scheduler;
pub mod selection;

pub use adapters::{PgRosterStore, PgScheduler, PgStatementStore};
pub use error::{
    CycleFailure, FetchError, FetchErrorKind, PrioritizeError, SkipReason, StoreError,
};
pub use lock::{CycleGuard, CycleLock};
pub use ports::{RosterStore, StatementProvider, StatementStore};
pub use scheduler::{CycleOutcome, CyclePhase, CycleReport, CycleResult, Scheduler};
pub use selection::select_stalest;
