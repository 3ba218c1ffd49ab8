//! Control interval arithmetic and due-tier classification.
//!
//! Intervals are fixed day counts, not calendar months: a "monthly" control
//! is due 30 days after its last completion regardless of month length.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Date, DbId};

// ---------------------------------------------------------------------------
// Intervals
// ---------------------------------------------------------------------------

/// Recurrence interval of a master control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlInterval {
    Weekly,
    BiWeekly,
    Monthly,
    Quarterly,
    BiAnnually,
    Annually,
}

impl ControlInterval {
    /// Fixed length of the interval in days.
    pub fn day_count(self) -> i64 {
        match self {
            Self::Weekly => 7,
            Self::BiWeekly => 14,
            Self::Monthly => 30,
            Self::Quarterly => 90,
            Self::BiAnnually => 180,
            Self::Annually => 365,
        }
    }

    /// Parse an interval string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "weekly" => Ok(Self::Weekly),
            "bi-weekly" => Ok(Self::BiWeekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "bi-annually" => Ok(Self::BiAnnually),
            "annually" => Ok(Self::Annually),
            _ => Err(CoreError::Validation(format!(
                "Invalid control interval '{s}'. Must be one of: weekly, bi-weekly, \
                 monthly, quarterly, bi-annually, annually"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::BiWeekly => "bi-weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::BiAnnually => "bi-annually",
            Self::Annually => "annually",
        }
    }

    /// Human-readable frequency label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Weekly => "Every week",
            Self::BiWeekly => "Every 2 weeks",
            Self::Monthly => "Every month",
            Self::Quarterly => "Every 3 months",
            Self::BiAnnually => "Every 6 months",
            Self::Annually => "Once a year",
        }
    }
}

/// Date on which the next inspection is due.
pub fn next_due_date(last_completed: Date, interval: ControlInterval) -> Date {
    last_completed + Duration::days(interval.day_count())
}

/// First day of the buffer window preceding `due_date`.
///
/// A buffer at least as long as the interval is accepted; the window then
/// starts before the previous due date.
pub fn buffer_window_start(due_date: Date, buffer_days: u32) -> Date {
    due_date - Duration::days(i64::from(buffer_days))
}

/// Whether the buffer covers the whole interval (callers may warn).
pub fn buffer_exceeds_interval(buffer_days: u32, interval: ControlInterval) -> bool {
    i64::from(buffer_days) >= interval.day_count()
}

// ---------------------------------------------------------------------------
// Due tiers
// ---------------------------------------------------------------------------

/// Display tier of a pending inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueTier {
    Overdue,
    Due,
    Upcoming,
}

impl DueTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::Due => "due",
            Self::Upcoming => "upcoming",
        }
    }
}

/// Classify `today` against a due date and its buffer window.
///
/// Both window boundaries are inclusive: the buffer start and the due date
/// itself are `Due`; only the day after the due date is `Overdue`.
pub fn due_tier(today: Date, due_date: Date, buffer_days: u32) -> DueTier {
    if today > due_date {
        DueTier::Overdue
    } else if today >= buffer_window_start(due_date, buffer_days) {
        DueTier::Due
    } else {
        DueTier::Upcoming
    }
}

// ---------------------------------------------------------------------------
// Schedule entries
// ---------------------------------------------------------------------------

/// Inputs describing one control for schedule computation.
#[derive(Debug, Clone)]
pub struct ScheduledControl {
    pub control_id: DbId,
    pub control_name: String,
    pub interval: ControlInterval,
    pub buffer_days: u32,
    /// Date the control was activated; a never-inspected control is due then.
    pub anchor_date: Date,
    /// Date of the latest finalized report, if any.
    pub last_completed: Option<Date>,
}

/// Computed schedule row for dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub control_id: DbId,
    pub control_name: String,
    pub interval: ControlInterval,
    pub buffer_days: u32,
    pub last_completed: Option<Date>,
    pub next_due: Date,
    pub buffer_window_start: Date,
    pub tier: DueTier,
    pub buffer_warning: bool,
}

impl ScheduleEntry {
    /// Compute the schedule row for `control` as of `today`.
    pub fn compute(control: &ScheduledControl, today: Date) -> Self {
        let next_due = match control.last_completed {
            Some(last) => next_due_date(last, control.interval),
            None => control.anchor_date,
        };
        Self {
            control_id: control.control_id,
            control_name: control.control_name.clone(),
            interval: control.interval,
            buffer_days: control.buffer_days,
            last_completed: control.last_completed,
            next_due,
            buffer_window_start: buffer_window_start(next_due, control.buffer_days),
            tier: due_tier(today, next_due, control.buffer_days),
            buffer_warning: buffer_exceeds_interval(control.buffer_days, control.interval),
        }
    }
}

/// Build a schedule for many controls: overdue first, then by due date.
pub fn build_schedule(controls: &[ScheduledControl], today: Date) -> Vec<ScheduleEntry> {
    let mut entries: Vec<ScheduleEntry> = controls
        .iter()
        .map(|c| ScheduleEntry::compute(c, today))
        .collect();
    entries.sort_by(|a, b| {
        a.tier
            .cmp(&b.tier)
            .then(a.next_due.cmp(&b.next_due))
            .then(a.control_id.cmp(&b.control_id))
    });
    entries
}

/// Count of schedule entries per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub overdue: usize,
    pub due: usize,
    pub upcoming: usize,
}

impl TierCounts {
    pub fn from_entries(entries: &[ScheduleEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut acc, e| {
            match e.tier {
                DueTier::Overdue => acc.overdue += 1,
                DueTier::Due => acc.due += 1,
                DueTier::Upcoming => acc.upcoming += 1,
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn interval_day_counts() {
        assert_eq!(ControlInterval::Weekly.day_count(), 7);
        assert_eq!(ControlInterval::BiWeekly.day_count(), 14);
        assert_eq!(ControlInterval::Monthly.day_count(), 30);
        assert_eq!(ControlInterval::Quarterly.day_count(), 90);
        assert_eq!(ControlInterval::BiAnnually.day_count(), 180);
        assert_eq!(ControlInterval::Annually.day_count(), 365);
    }

    #[test]
    fn monthly_is_thirty_days_not_a_calendar_month() {
        assert_eq!(
            next_due_date(date(2024, 1, 31), ControlInterval::Monthly),
            date(2024, 3, 1)
        );
    }

    #[test]
    fn buffer_window_start_subtracts_days() {
        assert_eq!(buffer_window_start(date(2024, 7, 15), 7), date(2024, 7, 8));
    }

    #[test]
    fn tier_boundaries_are_inclusive() {
        let due = date(2024, 7, 15);
        assert_eq!(due_tier(date(2024, 7, 7), due, 7), DueTier::Upcoming);
        assert_eq!(due_tier(date(2024, 7, 8), due, 7), DueTier::Due);
        assert_eq!(due_tier(due, due, 7), DueTier::Due);
        assert_eq!(due_tier(date(2024, 7, 16), due, 7), DueTier::Overdue);
    }

    #[test]
    fn zero_buffer_is_due_only_on_the_day() {
        let due = date(2024, 7, 15);
        assert_eq!(due_tier(date(2024, 7, 14), due, 0), DueTier::Upcoming);
        assert_eq!(due_tier(due, due, 0), DueTier::Due);
    }

    #[test]
    fn oversized_buffer_is_accepted() {
        let due = date(2024, 7, 15);
        assert_eq!(buffer_window_start(due, 10), date(2024, 7, 5));
        assert!(buffer_exceeds_interval(10, ControlInterval::Weekly));
        assert!(buffer_exceeds_interval(7, ControlInterval::Weekly));
        assert!(!buffer_exceeds_interval(6, ControlInterval::Weekly));
    }

    #[test]
    fn interval_string_round_trip_matches_serde() {
        for interval in [
            ControlInterval::Weekly,
            ControlInterval::BiWeekly,
            ControlInterval::Monthly,
            ControlInterval::Quarterly,
            ControlInterval::BiAnnually,
            ControlInterval::Annually,
        ] {
            let json = serde_json::to_value(interval).unwrap();
            assert_eq!(json, interval.as_str());
            assert_eq!(ControlInterval::from_str_db(interval.as_str()).unwrap(), interval);
        }
    }

    #[test]
    fn unknown_interval_rejected() {
        assert!(ControlInterval::from_str_db("daily").is_err());
    }

    #[test]
    fn never_inspected_control_is_due_on_anchor() {
        let control = ScheduledControl {
            control_id: 1,
            control_name: "Fire Extinguishers".into(),
            interval: ControlInterval::BiAnnually,
            buffer_days: 16,
            anchor_date: date(2024, 7, 15),
            last_completed: None,
        };
        let entry = ScheduleEntry::compute(&control, date(2024, 7, 1));
        assert_eq!(entry.next_due, date(2024, 7, 15));
        assert_eq!(entry.buffer_window_start, date(2024, 6, 29));
        assert_eq!(entry.tier, DueTier::Due);
        assert!(!entry.buffer_warning);
    }

    #[test]
    fn schedule_orders_overdue_first_then_by_due_date() {
        let base = ScheduledControl {
            control_id: 0,
            control_name: String::new(),
            interval: ControlInterval::Monthly,
            buffer_days: 7,
            anchor_date: date(2024, 1, 1),
            last_completed: None,
        };
        let controls = vec![
            ScheduledControl {
                control_id: 1,
                last_completed: Some(date(2024, 6, 20)),
                ..base.clone()
            },
            ScheduledControl {
                control_id: 2,
                last_completed: Some(date(2024, 5, 1)),
                ..base.clone()
            },
            ScheduledControl {
                control_id: 3,
                last_completed: Some(date(2024, 6, 10)),
                ..base
            },
        ];
        let today = date(2024, 7, 5);
        let schedule = build_schedule(&controls, today);
        let ids: Vec<DbId> = schedule.iter().map(|e| e.control_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(schedule[0].tier, DueTier::Overdue);
        assert_eq!(schedule[1].tier, DueTier::Due);
        assert_eq!(schedule[2].tier, DueTier::Upcoming);

        let counts = TierCounts::from_entries(&schedule);
        assert_eq!(
            counts,
            TierCounts {
                overdue: 1,
                due: 1,
                upcoming: 1
            }
        );
    }
}
