//! This crate provides a buffered, date-indexed store for a personal planner: daily tasks, and due-date markers.
//!
//! Records are kept by a [`RecordStore`](store::RecordStore), that is able to scan them in date order.
//! This crate provides a local implementation, backed by a JSON file, in the [`store::local`] module.
//!
//! Because a calendar view displays a whole month at once, records are not fetched day by day. Instead, a
//! [`MonthBuffer`](buffer::MonthBuffer) loads a whole month with a single scan, and serves per-day lookups from memory. \
//! Lookups are never blocking: they return a handle that completes once the day is loaded, even if it was asked for
//! before its month started loading. \
//! Mutations (add, remove, toggle completion) are written to the store first, then applied to the buffered month.
//!
//! A [`Planner`] pairs a task buffer and a due-marker buffer over the same store.

pub mod config;
pub mod dates;
pub mod record;
pub use record::{DueIcon, DueMarker, Record, RecordId, RecordKind, Task};

pub mod store;
pub mod mock_behaviour;
pub mod resolvable;
pub mod buffer;
pub use buffer::{BufferError, DayHandle, MonthBuffer};
pub mod planner;
pub use planner::Planner;
pub mod agenda;

pub mod utils;
