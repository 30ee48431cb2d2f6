use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Days between two-week wellness checks.
pub const CHECK_CADENCE_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum CheckStatus {
    Due,
    Complete,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckSchedule {
    pub due: bool,
    pub status: CheckStatus,
    pub next_due_date: NaiveDate,
    pub days_until: i64,
    pub last_date: Option<NaiveDate>,
}

/// A check is due with no prior record, or once a full cadence has elapsed
/// since the last one (due on exactly day 14).
pub fn schedule_for(last_date: Option<NaiveDate>, today: NaiveDate) -> CheckSchedule {
    let due = last_date
        .map(|last| (today - last).num_days() >= CHECK_CADENCE_DAYS)
        .unwrap_or(true);

    let next_due_date = match last_date {
        Some(last) if !due => last + Duration::days(CHECK_CADENCE_DAYS),
        _ => today,
    };

    CheckSchedule {
        due,
        status: if due { CheckStatus::Due } else { CheckStatus::Complete },
        next_due_date,
        days_until: (next_due_date - today).num_days(),
        last_date,
    }
}
