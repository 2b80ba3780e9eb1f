//! Daily to-do tasks

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordId, RecordKind};

/// Tasks are rated from one to this many stars
pub const MAX_PRIORITY: u8 = 5;

/// A to-do task, filed under a single day
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Assigned by the store. `None` until the task has been added
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<RecordId>,

    title: String,
    subtitle: String,
    date: NaiveDate,
    /// From 1 to [`MAX_PRIORITY`]
    priority: u8,
    completed: bool,
}

impl Task {
    /// Create a brand new, uncompleted task that is not in a store yet.
    ///
    /// `priority` is clamped into `1..=MAX_PRIORITY`
    pub fn new(title: String, subtitle: String, date: NaiveDate, priority: u8) -> Self {
        Self {
            id: None,
            title,
            subtitle,
            date,
            priority: priority.max(1).min(MAX_PRIORITY),
            completed: false,
        }
    }

    pub fn title(&self) -> &str     { &self.title       }
    pub fn subtitle(&self) -> &str  { &self.subtitle    }
    pub fn date(&self) -> NaiveDate { self.date         }
    pub fn priority(&self) -> u8    { self.priority     }
    pub fn completed(&self) -> bool { self.completed    }

    pub fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }

    /// Builder-style variant of [`Self::set_completed`]
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

impl Record for Task {
    const KIND: RecordKind = RecordKind::Task;

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::MIN)
    }

    fn day(&self) -> NaiveDate {
        self.date
    }
}
