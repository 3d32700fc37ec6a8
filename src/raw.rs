//! Raw catalog records as produced by the external feed.
//!
//! Field names follow the feed's short keys. Everything except the unit counts, workload
//! hours, section kinds and section lists is opaque pass-through data for display.

use serde::{Deserialize, Deserializer, Serialize};

/// `[startSlot, length]` on the weekly grid, e.g. `[6, 3]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTimeslot(pub i64, pub i64);

/// `[timeslots, room]`, e.g. `[[[6, 3], [66, 3]], "34-101"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RawSection(pub Vec<RawTimeslot>, pub String);

/// One immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RawClassRecord {
    /// Class number, e.g. `"6.036"`.
    pub no: String,
    /// Course (department) part of the number, e.g. `"6"`.
    #[serde(default)]
    pub co: String,
    /// Class part of the number, e.g. `"036"`.
    #[serde(default)]
    pub cl: String,
    /// True when the meeting times are to be announced.
    #[serde(default)]
    pub tb: bool,

    /// Section kind codes offered, subset of `l`, `r`, `b`.
    pub s: Vec<String>,
    /// Lecture sections.
    #[serde(default)]
    pub l: Vec<RawSection>,
    /// Recitation sections.
    #[serde(default)]
    pub r: Vec<RawSection>,
    /// Lab sections.
    #[serde(default)]
    pub b: Vec<RawSection>,
    /// Raw lecture schedule text, e.g. `T9.30-11`.
    #[serde(default)]
    pub lr: String,
    /// Raw recitation schedule text.
    #[serde(default)]
    pub rr: String,
    /// Raw lab schedule text.
    #[serde(default)]
    pub br: String,

    /// HASS-H designation.
    #[serde(default)]
    pub hh: bool,
    /// HASS-A designation.
    #[serde(default)]
    pub ha: bool,
    /// HASS-S designation.
    #[serde(default)]
    pub hs: bool,
    /// HASS-E designation.
    #[serde(default)]
    pub he: bool,
    /// CI-H designation.
    #[serde(default)]
    pub ci: bool,
    /// CI-HW designation.
    #[serde(default)]
    pub cw: bool,
    /// REST designation.
    #[serde(default)]
    pub re: bool,
    /// Institute lab designation.
    #[serde(default)]
    pub la: bool,
    /// Partial institute lab designation.
    #[serde(default)]
    pub pl: bool,

    /// Lecture units.
    pub u1: f64,
    /// Recitation units.
    pub u2: f64,
    /// Lab/preparation units.
    pub u3: f64,

    /// Level, `"U"` or `"G"`.
    #[serde(default)]
    pub le: String,
    /// Comma-separated same-as classes.
    #[serde(default)]
    pub sa: String,
    /// Comma-separated meets-with classes.
    #[serde(default)]
    pub mw: String,
    /// Terms offered, subset of `FA`, `JA`, `SP`, `SU`.
    #[serde(default)]
    pub t: Vec<String>,
    /// Free-form prerequisites.
    #[serde(default)]
    pub pr: String,

    /// Description.
    #[serde(default)]
    pub d: String,
    /// Name.
    #[serde(default)]
    pub n: String,
    /// In-charge.
    #[serde(default)]
    pub i: String,
    /// Virtual.
    #[serde(default)]
    pub v: bool,
    /// True when not offered next year.
    #[serde(default)]
    pub nx: bool,
    /// Repeatable for credit.
    #[serde(default)]
    pub rp: bool,
    /// Class url.
    #[serde(default)]
    pub u: String,
    /// Has a final.
    #[serde(default)]
    pub f: bool,

    /// Evaluation rating.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub ra: f64,
    /// Evaluation workload hours, 0 when unknown.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub h: f64,
    /// Evaluation class size.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub si: f64,
}

impl RawClassRecord {
    /// Raw section list stored under a kind code; unknown codes have none.
    pub fn sections_for_code(&self, code: &str) -> &[RawSection] {
        match code {
            "l" => &self.l,
            "r" => &self.r,
            "b" => &self.b,
            _ => &[],
        }
    }
}

/// Evaluation fields arrive as `null` when the class has no evaluations.
fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}
