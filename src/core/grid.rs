//! Day and clock interpretation of grid indices.
//!
//! The conflict engine treats slots as an opaque ordered index. This module fixes the
//! resolution used by the catalog producer: half-hour slots from 08:00, thirty per day,
//! Monday through Friday.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Slots per day.
pub const SLOTS_PER_DAY: u32 = 30;
/// Minutes per slot.
pub const SLOT_MINUTES: u32 = 30;
/// Clock hour of slot 0 each day.
pub const DAY_START_HOUR: u32 = 8;
/// Number of days on the grid.
pub const DAYS: u32 = 5;

/// Weekday on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    /// Monday.
    Mon,
    /// Tuesday.
    Tue,
    /// Wednesday.
    Wed,
    /// Thursday.
    Thu,
    /// Friday.
    Fri,
}

impl Weekday {
    fn from_index(idx: u32) -> Option<Self> {
        match idx {
            0 => Some(Self::Mon),
            1 => Some(Self::Tue),
            2 => Some(Self::Wed),
            3 => Some(Self::Thu),
            4 => Some(Self::Fri),
            _ => None,
        }
    }
}

/// Day and clock time of a grid index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTime {
    /// Day, `None` when the index falls past the last day.
    pub day: Option<Weekday>,
    /// Hour on a 24-hour clock.
    pub hour: u32,
    /// Minute.
    pub minute: u32,
}

impl SlotTime {
    /// Interprets a grid index.
    pub fn from_slot(slot: u32) -> Self {
        let day = Weekday::from_index(slot / SLOTS_PER_DAY);
        let minutes = (slot % SLOTS_PER_DAY) * SLOT_MINUTES;
        Self {
            day,
            hour: DAY_START_HOUR + minutes / 60,
            minute: minutes % 60,
        }
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.day {
            Some(day) => write!(f, "{day:?} {:02}:{:02}", self.hour, self.minute),
            None => write!(f, "?? {:02}:{:02}", self.hour, self.minute),
        }
    }
}
