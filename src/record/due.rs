//! Due-date markers, shown as icons on the calendar

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordId, RecordKind};

/// The fixed set of icons a due marker can be drawn with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DueIcon {
    Square,
    Circle,
    Diamond,
    Feather,
    Certificate,
    CalendarCheck,
    Exclamation,
    UserGraduate,
    UserCode,
    UserBagShopping,
    UserBook,
}

impl DueIcon {
    pub const ALL: [DueIcon; 11] = [
        DueIcon::Square, DueIcon::Circle, DueIcon::Diamond, DueIcon::Feather,
        DueIcon::Certificate, DueIcon::CalendarCheck, DueIcon::Exclamation,
        DueIcon::UserGraduate, DueIcon::UserCode, DueIcon::UserBagShopping, DueIcon::UserBook,
    ];

    /// The symbolic name of this icon
    pub fn name(&self) -> &'static str {
        match self {
            DueIcon::Square => "square",
            DueIcon::Circle => "circle",
            DueIcon::Diamond => "diamond",
            DueIcon::Feather => "feather",
            DueIcon::Certificate => "certificate",
            DueIcon::CalendarCheck => "calendar-check",
            DueIcon::Exclamation => "exclamation",
            DueIcon::UserGraduate => "user-graduate",
            DueIcon::UserCode => "user-code",
            DueIcon::UserBagShopping => "user-bag-shopping",
            DueIcon::UserBook => "user-book",
        }
    }
}

impl Default for DueIcon {
    fn default() -> Self {
        DueIcon::Square
    }
}

impl Display for DueIcon {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DueIcon {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.iter()
            .find(|icon| icon.name() == s)
            .copied()
            .ok_or_else(|| format!("Unknown due icon {:?}", s))
    }
}


/// A deadline, filed under the day (and optionally the time) it is due
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueMarker {
    /// Assigned by the store. `None` until the marker has been added
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<RecordId>,

    title: String,
    due: NaiveDateTime,
    icon: DueIcon,
}

impl DueMarker {
    /// Create a brand new marker that is not in a store yet
    pub fn new(title: String, due: NaiveDateTime, icon: DueIcon) -> Self {
        Self { id: None, title, due, icon }
    }

    pub fn title(&self) -> &str         { &self.title }
    pub fn due(&self) -> NaiveDateTime  { self.due    }
    pub fn icon(&self) -> DueIcon       { self.icon   }
}

impl Record for DueMarker {
    const KIND: RecordKind = RecordKind::DueMarker;

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.due
    }
}
