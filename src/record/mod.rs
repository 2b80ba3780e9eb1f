//! Records kept by a [`RecordStore`](crate::store::RecordStore): daily tasks and due-date markers

use std::fmt::{Debug, Display, Formatter};

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub mod task;
pub mod due;

pub use task::Task;
pub use due::{DueIcon, DueMarker};


/// The identifier a store assigned to a record.
/// Identifiers are only unique among records of the same [`RecordKind`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for RecordId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}


/// The two record populations. They never share identifiers, storage tables or buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    Task,
    DueMarker,
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Task => write!(f, "task"),
            RecordKind::DueMarker => write!(f, "due marker"),
        }
    }
}


/// Something that can be stored in a [`RecordStore`](crate::store::RecordStore) and buffered by a [`MonthBuffer`](crate::buffer::MonthBuffer)
pub trait Record: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The table this record type lives in
    const KIND: RecordKind;

    /// The store-assigned identifier, or `None` if this record has never been stored
    fn id(&self) -> Option<RecordId>;
    fn set_id(&mut self, id: RecordId);

    /// The point in (local) time this record is filed under. Stores order their date index by this value.
    fn timestamp(&self) -> NaiveDateTime;

    /// The calendar day this record is filed under
    fn day(&self) -> NaiveDate {
        self.timestamp().date()
    }
}
