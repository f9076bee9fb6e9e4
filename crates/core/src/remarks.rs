//! The free-text remark ("keterangan") thread attached to a submission.
//! Append-only on the server; the client only re-orders a fetched snapshot.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Wire names are the backend's, snake_case included; this payload predates
/// the camelCase convention of the rest of the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remark {
    pub keterangan: String,
    #[serde(rename = "peranPengirim")]
    pub sender_role: String,
    pub waktu_pengajuan: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRemark {
    #[serde(rename = "idPengajuan")]
    pub submission_id: String,
    pub keterangan: String,
    #[serde(rename = "peranPengirim")]
    pub sender_role: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    SubmittedAt,
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Sort control state: toggling the active field flips direction, selecting
/// a new field resets to ascending. Default view is newest-first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemarkSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for RemarkSort {
    fn default() -> Self {
        Self { field: SortField::SubmittedAt, direction: SortDirection::Descending }
    }
}

impl RemarkSort {
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Ascending;
        }
    }
}

/// Ordered view over a fetched thread; the input slice is never mutated.
pub fn sorted(remarks: &[Remark], sort: RemarkSort) -> Vec<Remark> {
    let mut view = remarks.to_vec();
    view.sort_by(|left, right| {
        let ordering = match sort.field {
            SortField::SubmittedAt => timestamp_millis(&left.waktu_pengajuan)
                .cmp(&timestamp_millis(&right.waktu_pengajuan)),
            SortField::Text => left
                .keterangan
                .to_lowercase()
                .cmp(&right.keterangan.to_lowercase())
                .then_with(|| left.keterangan.cmp(&right.keterangan)),
        };
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    view
}

/// Millisecond timestamp for comparison. Unparseable values sort first in
/// ascending order rather than failing the whole view.
fn timestamp_millis(raw: &str) -> i64 {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.timestamp_millis();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return parsed.and_utc().timestamp_millis();
    }
    0
}

/// "No submission selected" and "no remarks yet" are distinct user-visible
/// states and must not collapse into one another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ThreadState {
    NoSubmission,
    Empty,
    Loaded(Vec<Remark>),
}

impl ThreadState {
    pub fn from_fetch(submission_id: Option<&str>, remarks: Vec<Remark>, sort: RemarkSort) -> Self {
        match submission_id {
            None => Self::NoSubmission,
            Some(_) if remarks.is_empty() => Self::Empty,
            Some(_) => Self::Loaded(sorted(&remarks, sort)),
        }
    }
}
