use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::core::grid::{SLOT_MINUTES, SlotTime};

/// Contiguous block `[start_slot, start_slot + num_slots)` on the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timeslot {
    /// First occupied grid index.
    pub start_slot: u32,
    /// Number of occupied indices, always positive.
    pub num_slots: u32,
}

impl Timeslot {
    /// Builds a timeslot, `None` when `num_slots` is zero.
    pub fn new(start_slot: u32, num_slots: u32) -> Option<Self> {
        (num_slots > 0).then_some(Self {
            start_slot,
            num_slots,
        })
    }

    /// One past the last occupied index.
    pub fn end_slot(&self) -> u32 {
        self.start_slot + self.num_slots
    }

    /// Occupied grid indices.
    pub fn range(&self) -> Range<u32> {
        self.start_slot..self.end_slot()
    }

    /// True when the two index ranges intersect.
    pub fn overlaps(&self, other: &Timeslot) -> bool {
        self.start_slot < other.end_slot() && other.start_slot < self.end_slot()
    }

    /// Day and clock time of the first slot.
    pub fn start_time(&self) -> SlotTime {
        SlotTime::from_slot(self.start_slot)
    }

    /// Day and clock time at the end of the last slot.
    pub fn end_time(&self) -> SlotTime {
        let mut time = SlotTime::from_slot(self.end_slot() - 1);
        let minutes = time.minute + SLOT_MINUTES;
        time.hour += minutes / 60;
        time.minute = minutes % 60;
        time
    }
}

/// Meeting times of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Meetings {
    /// Times not announced; never conflicts.
    Tba,
    /// Known blocks in source order, never empty. Blocks of one section may overlap each other.
    Scheduled(Vec<Timeslot>),
}

impl Meetings {
    /// Wraps a block list, mapping an empty one to [`Meetings::Tba`].
    pub fn from_slots(slots: Vec<Timeslot>) -> Self {
        if slots.is_empty() {
            Self::Tba
        } else {
            Self::Scheduled(slots)
        }
    }

    /// True for [`Meetings::Tba`].
    pub fn is_tba(&self) -> bool {
        matches!(self, Self::Tba)
    }

    /// Blocks; empty for TBA.
    pub fn slots(&self) -> &[Timeslot] {
        match self {
            Self::Tba => &[],
            Self::Scheduled(slots) => slots,
        }
    }

    /// True when any block of `self` overlaps any block of `other`.
    pub fn conflicts_with(&self, other: &Meetings) -> bool {
        match (self, other) {
            (Self::Tba, _) | (_, Self::Tba) => false,
            (Self::Scheduled(a), Self::Scheduled(b)) => {
                a.iter().any(|x| b.iter().any(|y| x.overlaps(y)))
            }
        }
    }
}
