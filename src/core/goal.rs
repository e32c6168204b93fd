//! Savings goals and the progress figures derived from them.

use crate::core::{deserialize_id, deserialize_timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Paused,
    Cancelled,
    #[serde(other)]
    Other,
}

impl Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                GoalStatus::Active => "active",
                GoalStatus::Completed => "completed",
                GoalStatus::Paused => "paused",
                GoalStatus::Cancelled => "cancelled",
                GoalStatus::Other => "other",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRecord {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub current_amount: f64,
    pub target_amount: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub target_date: DateTime<Utc>,
    #[serde(default)]
    pub status: GoalStatus,
}

/// Payload for `POST /goals` and `PUT /goals/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalInput {
    pub name: String,
    pub current_amount: f64,
    pub target_amount: f64,
    pub target_date: DateTime<Utc>,
    pub status: GoalStatus,
}

impl From<&GoalRecord> for GoalInput {
    fn from(goal: &GoalRecord) -> Self {
        Self {
            name: goal.name.clone(),
            current_amount: goal.current_amount,
            target_amount: goal.target_amount,
            target_date: goal.target_date,
            status: goal.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgress {
    pub progress_percentage: f64,
    pub remaining_amount: f64,
    pub days_remaining: i64,
    pub overdue: bool,
    pub required_daily_saving: Option<f64>,
    pub required_weekly_saving: Option<f64>,
    pub required_monthly_saving: Option<f64>,
}

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Whole days from `now` until `target`, rounded up.
pub fn days_until(target: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (target - now).num_milliseconds() as f64;
    (millis / MILLIS_PER_DAY).ceil() as i64
}

pub fn derive_goal_progress(goal: &GoalRecord, now: DateTime<Utc>) -> GoalProgress {
    let current = if goal.current_amount.is_finite() {
        goal.current_amount
    } else {
        0.0
    };
    let target = if goal.target_amount.is_finite() {
        goal.target_amount
    } else {
        0.0
    };

    // Overshoot is capped at 100%, unlike the budget overlay.
    let progress_percentage = if target > 0.0 {
        ((current / target) * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };
    let remaining_amount = target - current;
    let days_remaining = days_until(goal.target_date, now);
    let overdue = days_remaining <= 0;

    let daily = (!overdue).then(|| remaining_amount / days_remaining.max(1) as f64);

    GoalProgress {
        progress_percentage,
        remaining_amount,
        days_remaining,
        overdue,
        required_daily_saving: daily,
        required_weekly_saving: daily.map(|d| d * 7.0),
        required_monthly_saving: daily.map(|d| d * 30.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn goal(current: f64, target: f64, target_date: DateTime<Utc>) -> GoalRecord {
        GoalRecord {
            id: "g1".to_string(),
            name: "Holiday".to_string(),
            current_amount: current,
            target_amount: target,
            target_date,
            status: GoalStatus::Active,
        }
    }

    #[test]
    fn test_goal_progress_ten_days_out() {
        let now = Utc::now();
        let p = derive_goal_progress(&goal(300.0, 1000.0, now + Duration::days(10)), now);
        assert_eq!(p.progress_percentage, 30.0);
        assert_eq!(p.remaining_amount, 700.0);
        assert_eq!(p.days_remaining, 10);
        assert!(!p.overdue);
        assert_eq!(p.required_daily_saving, Some(70.0));
        assert_eq!(p.required_weekly_saving, Some(490.0));
        assert_eq!(p.required_monthly_saving, Some(2100.0));
    }

    #[test]
    fn test_past_goal_omits_savings() {
        let now = Utc::now();
        let p = derive_goal_progress(&goal(300.0, 1000.0, now - Duration::days(3)), now);
        assert!(p.days_remaining <= 0);
        assert!(p.overdue);
        assert_eq!(p.required_daily_saving, None);
        assert_eq!(p.required_weekly_saving, None);
        assert_eq!(p.required_monthly_saving, None);
    }

    #[test]
    fn test_goal_due_now_is_overdue() {
        let now = Utc::now();
        let p = derive_goal_progress(&goal(0.0, 100.0, now), now);
        assert_eq!(p.days_remaining, 0);
        assert!(p.required_daily_saving.is_none());
    }

    #[test]
    fn test_partial_day_rounds_up() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let target = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        assert_eq!(days_until(target, now), 2);

        let p = derive_goal_progress(&goal(0.0, 100.0, target), now);
        assert_eq!(p.required_daily_saving, Some(50.0));
    }

    #[test]
    fn test_overshoot_is_clamped() {
        let now = Utc::now();
        let p = derive_goal_progress(&goal(1500.0, 1000.0, now + Duration::days(5)), now);
        assert_eq!(p.progress_percentage, 100.0);
        assert_eq!(p.remaining_amount, -500.0);
    }

    #[test]
    fn test_zero_target_is_guarded() {
        let now = Utc::now();
        let p = derive_goal_progress(&goal(10.0, 0.0, now + Duration::days(5)), now);
        assert_eq!(p.progress_percentage, 0.0);
    }

    #[test]
    fn test_goal_wire_format_accepts_plain_dates() {
        let json = r#"{
            "id": 7,
            "name": "Car",
            "currentAmount": 2500,
            "targetAmount": 10000,
            "targetDate": "2025-06-30",
            "status": "active"
        }"#;
        let g: GoalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(g.id, "7");
        assert_eq!(
            g.target_date,
            Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap()
        );
        assert_eq!(g.status, GoalStatus::Active);

        let json = r#"{"targetAmount": 1, "targetDate": "2025-06-30T10:00:00Z", "status": "archived"}"#;
        let g: GoalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(g.status, GoalStatus::Other);
    }

    #[test]
    fn test_goal_wire_format_accepts_local_date_times() {
        let json = r#"{"id": 8, "name": "Bike", "currentAmount": 0, "targetAmount": 900, "targetDate": "2025-06-30T10:00:00"}"#;
        let g: GoalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            g.target_date,
            Utc.with_ymd_and_hms(2025, 6, 30, 10, 0, 0).unwrap()
        );
    }
}
