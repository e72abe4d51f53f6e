use {
    crate::{
        config::constants::display::{DATE_FORMAT, TIME_FORMAT},
        domain::ShipmentStatus,
        utils::{parse_date, parse_time_of_day},
    },
    chrono::{DateTime, NaiveDateTime, Utc},
    serde::{Deserialize, Serialize},
};

/// One row of the append-only audit trail.
///
/// Stored as the collaborator writes it: free-text status plus separate
/// date (`YYYY-MM-DD`) and time (`HH:MM:SS`) columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: String,
    pub location: String,
    pub date: String,
    #[serde(default)]
    pub time: String,
}

impl StatusHistoryEntry {
    pub fn new(status: ShipmentStatus, location: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            status: status.label().to_string(),
            location: location.into(),
            date: at.format(DATE_FORMAT).to_string(),
            time: at.format(TIME_FORMAT).to_string(),
        }
    }

    pub fn canonical_status(&self) -> Option<ShipmentStatus> {
        ShipmentStatus::from_label(&self.status)
    }

    /// A missing time column counts as midnight.
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        let date = parse_date(&self.date)?;
        let time = if self.time.trim().is_empty() {
            chrono::NaiveTime::from_hms_opt(0, 0, 0)?
        } else {
            parse_time_of_day(&self.time)?
        };
        Some(date.and_time(time))
    }
}

/// Problems found in a stored history. Reported, never repaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryIssue {
    UnknownStatus { index: usize, status: String },
    UnreadableTimestamp { index: usize },
    OutOfOrder { index: usize },
}

impl std::fmt::Display for HistoryIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownStatus { index, status } => {
                write!(f, "entry {}: unknown status '{}'", index + 1, status)
            }
            Self::UnreadableTimestamp { index } => write!(f, "entry {}: unreadable date/time", index + 1),
            Self::OutOfOrder { index } => write!(f, "entry {}: older than a previous entry", index + 1),
        }
    }
}

/// Checks the history invariants: canonical statuses and non-decreasing time.
pub fn audit_history(entries: &[StatusHistoryEntry]) -> Vec<HistoryIssue> {
    let mut issues = Vec::new();
    let mut latest: Option<NaiveDateTime> = None;

    for (index, entry) in entries.iter().enumerate() {
        if entry.canonical_status().is_none() {
            issues.push(HistoryIssue::UnknownStatus {
                index,
                status: entry.status.clone(),
            });
        }

        match entry.recorded_at() {
            Some(at) => {
                if latest.is_some_and(|prev| at < prev) {
                    issues.push(HistoryIssue::OutOfOrder { index });
                } else {
                    latest = Some(at);
                }
            }
            None => issues.push(HistoryIssue::UnreadableTimestamp { index }),
        }
    }

    issues
}
