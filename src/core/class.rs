use std::sync::Arc;

use serde::Serialize;

use crate::{
    core::timeslot::{Meetings, Timeslot},
    raw::{RawClassRecord, RawSection},
    types::{ClassNumber, SectionIndex, SectionKind},
};

/// Why a raw record was rejected at load.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    /// The record could not be decoded at all.
    #[error("class {key}: undecodable record: {message}")]
    Decode {
        /// Catalog key of the record.
        key: String,
        /// Decoder message.
        message: String,
    },
    /// The catalog lists the same class number twice; the first entry wins.
    #[error("class {number}: duplicate class number")]
    DuplicateClass {
        /// Class number.
        number: ClassNumber,
    },
    /// A unit component is negative or not finite.
    #[error("class {number}: {field} out of range ({value})")]
    UnitsOutOfRange {
        /// Class number.
        number: ClassNumber,
        /// Offending field, `u1`, `u2` or `u3`.
        field: &'static str,
        /// Raw value.
        value: f64,
    },
    /// Workload hours are negative or not finite.
    #[error("class {number}: invalid workload hours ({value})")]
    InvalidHours {
        /// Class number.
        number: ClassNumber,
        /// Raw value.
        value: f64,
    },
    /// A section kind code is not one of `l`, `r`, `b`.
    #[error("class {number}: unknown section kind code {code:?}")]
    UnknownSectionKind {
        /// Class number.
        number: ClassNumber,
        /// Raw code.
        code: String,
    },
    /// A section kind code is listed twice.
    #[error("class {number}: section kind {kind} listed twice")]
    DuplicateSectionKind {
        /// Class number.
        number: ClassNumber,
        /// Repeated kind.
        kind: SectionKind,
    },
    /// A timeslot has a negative start, non-positive length, or leaves the index space.
    #[error("class {number}: {kind} section {section} has invalid timeslot [{start}, {length}]")]
    InvalidTimeslot {
        /// Class number.
        number: ClassNumber,
        /// Kind of the section.
        kind: SectionKind,
        /// Index of the section.
        section: SectionIndex,
        /// Raw start slot.
        start: i64,
        /// Raw length.
        length: i64,
    },
}

/// Workload estimate with provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hours {
    /// Estimated weekly hours.
    pub hours: f64,
    /// True when the estimate fell back to the unit count.
    pub set_to_units: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct SectionData {
    meetings: Meetings,
    room: String,
}

/// Read-only view over one validated [`RawClassRecord`].
#[derive(Debug, Clone)]
pub struct Class {
    raw: Arc<RawClassRecord>,
    kinds: Vec<(SectionKind, Vec<SectionData>)>,
}

/// One concrete meeting option, borrowing its owner class.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    class: &'a Class,
    kind: SectionKind,
    index: SectionIndex,
    data: &'a SectionData,
}

impl Class {
    /// Validates a raw record.
    pub fn from_raw(raw: RawClassRecord) -> Result<Self, RecordError> {
        for (field, value) in [("u1", raw.u1), ("u2", raw.u2), ("u3", raw.u3)] {
            if !value.is_finite() || value < 0.0 {
                return Err(RecordError::UnitsOutOfRange {
                    number: raw.no.clone(),
                    field,
                    value,
                });
            }
        }

        if !raw.h.is_finite() || raw.h < 0.0 {
            return Err(RecordError::InvalidHours {
                number: raw.no.clone(),
                value: raw.h,
            });
        }

        let mut kinds: Vec<(SectionKind, Vec<SectionData>)> = Vec::with_capacity(raw.s.len());
        for code in &raw.s {
            let kind = SectionKind::from_code(code).ok_or_else(|| RecordError::UnknownSectionKind {
                number: raw.no.clone(),
                code: code.clone(),
            })?;
            if kinds.iter().any(|(k, _)| *k == kind) {
                return Err(RecordError::DuplicateSectionKind {
                    number: raw.no.clone(),
                    kind,
                });
            }

            let sections = raw
                .sections_for_code(code)
                .iter()
                .enumerate()
                .map(|(idx, sec)| convert_section(&raw.no, kind, idx, sec))
                .collect::<Result<Vec<_>, _>>()?;
            if sections.is_empty() {
                log::warn!("class {}: {kind} declared without sections, no schedule can include it", raw.no);
            }
            kinds.push((kind, sections));
        }

        Ok(Self {
            raw: Arc::new(raw),
            kinds,
        })
    }

    /// The underlying record.
    pub fn raw(&self) -> &RawClassRecord {
        &self.raw
    }

    /// Class number, e.g. `"6.036"`.
    pub fn number(&self) -> &str {
        &self.raw.no
    }

    /// Course part of the number, e.g. `"6"`; derived from the number when the feed omits it.
    pub fn course(&self) -> &str {
        if self.raw.co.is_empty() {
            self.raw.no.split_once('.').map_or(self.raw.no.as_str(), |(co, _)| co)
        } else {
            &self.raw.co
        }
    }

    /// Subject part of the number, e.g. `"036"`; empty when the number has no `.`.
    pub fn subject(&self) -> &str {
        if self.raw.cl.is_empty() {
            self.raw.no.split_once('.').map_or("", |(_, cl)| cl)
        } else {
            &self.raw.cl
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.raw.n
    }

    /// Evaluation rating, 0 when unknown.
    pub fn rating(&self) -> f64 {
        self.raw.ra
    }

    /// True when the catalog marks the class's times as to be announced.
    pub fn is_tba(&self) -> bool {
        self.raw.tb
    }

    /// Total credit units, `u1 + u2 + u3`. Exact for integer-valued components.
    pub fn units(&self) -> f64 {
        self.raw.u1 + self.raw.u2 + self.raw.u3
    }

    /// Workload estimate, falling back to units when the evaluation value is missing.
    pub fn hours(&self) -> Hours {
        let set_to_units = self.raw.h == 0.0;
        Hours {
            hours: if set_to_units {
                self.units()
            } else {
                self.raw.h
            },
            set_to_units,
        }
    }

    /// Offered kinds in declaration order.
    pub fn section_kinds(&self) -> Vec<SectionKind> {
        self.kinds.iter().map(|(k, _)| *k).collect()
    }

    /// True when the class declares `kind`, even with no sections listed.
    pub fn offers(&self, kind: SectionKind) -> bool {
        self.kinds.iter().any(|(k, _)| *k == kind)
    }

    /// Sections of one kind in source order; empty when the kind is not offered.
    pub fn sections_of_kind(&self, kind: SectionKind) -> Vec<Section<'_>> {
        self.kinds
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, data)| {
                data.iter()
                    .enumerate()
                    .map(|(index, data)| Section {
                        class: self,
                        kind,
                        index,
                        data,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of sections of `kind`.
    pub fn section_count(&self, kind: SectionKind) -> usize {
        self.kinds
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, data)| data.len())
    }

    /// One section by kind and index.
    pub fn section(&self, kind: SectionKind, index: SectionIndex) -> Option<Section<'_>> {
        let (_, sections) = self.kinds.iter().find(|(k, _)| *k == kind)?;
        sections.get(index).map(|data| Section {
            class: self,
            kind,
            index,
            data,
        })
    }

    /// Every offered kind with its sections, in declaration order.
    pub fn sections(&self) -> Vec<(SectionKind, Vec<Section<'_>>)> {
        self.kinds
            .iter()
            .map(|(kind, _)| (*kind, self.sections_of_kind(*kind)))
            .collect()
    }
}

impl<'a> Section<'a> {
    /// Owning class.
    pub fn class(&self) -> &'a Class {
        self.class
    }

    /// Kind this section fulfills.
    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    /// Position in the owner's list for this kind.
    pub fn index(&self) -> SectionIndex {
        self.index
    }

    /// Meeting times.
    pub fn meetings(&self) -> &'a Meetings {
        &self.data.meetings
    }

    /// Meeting blocks; empty for TBA.
    pub fn timeslots(&self) -> &'a [Timeslot] {
        self.data.meetings.slots()
    }

    /// Room label.
    pub fn room(&self) -> &'a str {
        &self.data.room
    }

    /// True when any block overlaps any block of `other`. TBA sections never conflict.
    pub fn conflicts_with(&self, other: &Section<'_>) -> bool {
        self.data.meetings.conflicts_with(&other.data.meetings)
    }
}

fn convert_section(
    number: &str,
    kind: SectionKind,
    section: SectionIndex,
    raw: &RawSection,
) -> Result<SectionData, RecordError> {
    let RawSection(raw_slots, room) = raw;
    let slots = raw_slots
        .iter()
        .map(|slot| {
            convert_timeslot(slot.0, slot.1).ok_or_else(|| RecordError::InvalidTimeslot {
                number: number.to_string(),
                kind,
                section,
                start: slot.0,
                length: slot.1,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SectionData {
        meetings: Meetings::from_slots(slots),
        room: room.clone(),
    })
}

fn convert_timeslot(start: i64, length: i64) -> Option<Timeslot> {
    let start = u32::try_from(start).ok()?;
    let length = u32::try_from(length).ok()?;
    start.checked_add(length)?;
    Timeslot::new(start, length)
}
