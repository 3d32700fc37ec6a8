//! Shared primitive IDs and the section-kind enum.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Catalog class number, e.g. `"6.036"`.
pub type ClassNumber = String;
/// Position of a section inside its class's list for one kind.
pub type SectionIndex = usize;
/// Monotonic selection generation.
pub type Generation = u64;
/// Handle returned by observer registration.
pub type SubscriptionId = u64;

/// Category of meeting a section fulfills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SectionKind {
    /// Lecture, raw code `l`.
    Lecture,
    /// Recitation, raw code `r`.
    Recitation,
    /// Lab, raw code `b`.
    Lab,
}

/// Raw catalog codes, in declaration order.
const KIND_CODES: [(&str, SectionKind); 3] = [
    ("l", SectionKind::Lecture),
    ("r", SectionKind::Recitation),
    ("b", SectionKind::Lab),
];

impl SectionKind {
    /// All kinds in declaration order.
    pub const ALL: [SectionKind; 3] = [Self::Lecture, Self::Recitation, Self::Lab];

    /// Maps a raw catalog code to its kind, `None` for anything unrecognized.
    pub fn from_code(code: &str) -> Option<Self> {
        KIND_CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, kind)| *kind)
    }

    /// Raw catalog code for this kind.
    pub fn code(self) -> &'static str {
        match self {
            Self::Lecture => "l",
            Self::Recitation => "r",
            Self::Lab => "b",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lecture => "Lecture",
            Self::Recitation => "Recitation",
            Self::Lab => "Lab",
        };
        f.write_str(name)
    }
}

/// A `(class, kind)` pair that needs one section chosen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionRef {
    /// Class number.
    pub class: ClassNumber,
    /// Kind to resolve.
    pub kind: SectionKind,
}

impl SectionRef {
    /// Builds a pair.
    pub fn new(class: impl Into<ClassNumber>, kind: SectionKind) -> Self {
        Self {
            class: class.into(),
            kind,
        }
    }
}
