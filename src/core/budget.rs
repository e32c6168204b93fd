//! Budget records and the progress figures derived from them.

use crate::core::{deserialize_id, deserialize_opt_id};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    #[serde(other)]
    Other,
}

impl Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                BudgetPeriod::Daily => "daily",
                BudgetPeriod::Weekly => "weekly",
                BudgetPeriod::Monthly => "monthly",
                BudgetPeriod::Yearly => "yearly",
                BudgetPeriod::Other => "other",
            }
        )
    }
}

impl FromStr for BudgetPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(BudgetPeriod::Daily),
            "weekly" => Ok(BudgetPeriod::Weekly),
            "monthly" => Ok(BudgetPeriod::Monthly),
            "yearly" | "annually" => Ok(BudgetPeriod::Yearly),
            _ => Err(anyhow!("Invalid budget period: {}", s)),
        }
    }
}

fn default_threshold() -> f64 {
    80.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRecord {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub spent: f64,
    #[serde(default = "default_threshold")]
    pub notify_threshold: f64,
    pub period: BudgetPeriod,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub category_id: Option<String>,
}

/// Payload for `POST /budgets`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    pub name: Option<String>,
    pub amount: f64,
    pub period: BudgetPeriod,
    pub notify_threshold: f64,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressColor {
    Danger,
    Warning,
    Caution,
    Success,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetProgress {
    pub percent_used: f64,
    pub remaining: f64,
    pub over_budget: bool,
    pub is_warning: bool,
    pub display_color: ProgressColor,
    /// Progress bar width, clamped to [0, 100]
    pub bar_width: f64,
    /// Width of the over-budget overlay, clamped to [0, 100]
    pub overlay_width: f64,
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

pub fn derive_budget_progress(budget: &BudgetRecord) -> BudgetProgress {
    let amount = finite_or_zero(budget.amount);
    let spent = finite_or_zero(budget.spent);
    let threshold = finite_or_zero(budget.notify_threshold);

    let percent_used = if amount > 0.0 {
        (spent / amount) * 100.0
    } else {
        0.0
    };
    let over_budget = percent_used > 100.0;
    let is_warning = percent_used >= threshold;

    // Threshold wins over the fixed 50% band.
    let display_color = if over_budget {
        ProgressColor::Danger
    } else if is_warning {
        ProgressColor::Warning
    } else if percent_used > 50.0 {
        ProgressColor::Caution
    } else {
        ProgressColor::Success
    };

    BudgetProgress {
        percent_used,
        remaining: amount - spent,
        over_budget,
        is_warning,
        display_color,
        bar_width: percent_used.clamp(0.0, 100.0),
        overlay_width: (percent_used - 100.0).clamp(0.0, 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(amount: f64, spent: f64, notify_threshold: f64) -> BudgetRecord {
        BudgetRecord {
            id: "b1".to_string(),
            name: None,
            amount,
            spent,
            notify_threshold,
            period: BudgetPeriod::Monthly,
            category_id: None,
        }
    }

    #[test]
    fn test_over_budget() {
        let p = derive_budget_progress(&budget(100.0, 150.0, 80.0));
        assert_eq!(p.percent_used, 150.0);
        assert!(p.over_budget);
        assert_eq!(p.bar_width, 100.0);
        assert_eq!(p.overlay_width, 50.0);
        assert_eq!(p.remaining, -50.0);
        assert_eq!(p.display_color, ProgressColor::Danger);
    }

    #[test]
    fn test_zero_amount_is_guarded() {
        let p = derive_budget_progress(&budget(0.0, 50.0, 80.0));
        assert_eq!(p.percent_used, 0.0);
        assert!(!p.over_budget);
        assert_eq!(p.bar_width, 0.0);
        assert_eq!(p.overlay_width, 0.0);
        assert_eq!(p.display_color, ProgressColor::Success);
    }

    #[test]
    fn test_threshold_takes_precedence_over_caution() {
        let p = derive_budget_progress(&budget(100.0, 40.0, 30.0));
        assert!(p.is_warning);
        assert_eq!(p.display_color, ProgressColor::Warning);

        let p = derive_budget_progress(&budget(100.0, 60.0, 80.0));
        assert!(!p.is_warning);
        assert_eq!(p.display_color, ProgressColor::Caution);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let p = derive_budget_progress(&budget(200.0, 160.0, 80.0));
        assert_eq!(p.percent_used, 80.0);
        assert!(p.is_warning);
        assert_eq!(p.display_color, ProgressColor::Warning);
    }

    #[test]
    fn test_exactly_full_is_not_over() {
        let p = derive_budget_progress(&budget(100.0, 100.0, 110.0));
        assert!(!p.over_budget);
        assert_eq!(p.bar_width, 100.0);
        assert_eq!(p.overlay_width, 0.0);
        assert_eq!(p.display_color, ProgressColor::Caution);
    }

    #[test]
    fn test_overlay_clamps_at_hundred() {
        let p = derive_budget_progress(&budget(10.0, 100.0, 80.0));
        assert_eq!(p.percent_used, 1000.0);
        assert_eq!(p.overlay_width, 100.0);
    }

    #[test]
    fn test_refund_keeps_bar_at_zero() {
        let p = derive_budget_progress(&budget(100.0, -20.0, 80.0));
        assert_eq!(p.bar_width, 0.0);
        assert_eq!(p.remaining, 120.0);
        assert_eq!(p.display_color, ProgressColor::Success);
    }

    #[test]
    fn test_budget_wire_format() {
        let json = r#"{
            "id": "42",
            "amount": 500,
            "spent": 125.5,
            "notifyThreshold": 75,
            "period": "monthly",
            "categoryId": "groceries"
        }"#;
        let b: BudgetRecord = serde_json::from_str(json).unwrap();
        assert_eq!(b.amount, 500.0);
        assert_eq!(b.notify_threshold, 75.0);
        assert_eq!(b.period, BudgetPeriod::Monthly);
        assert_eq!(b.category_id.as_deref(), Some("groceries"));

        let json = r#"{"amount": 10, "period": "fortnightly"}"#;
        let b: BudgetRecord = serde_json::from_str(json).unwrap();
        assert_eq!(b.period, BudgetPeriod::Other);
        assert_eq!(b.spent, 0.0);
        assert_eq!(b.notify_threshold, 80.0);
    }

    #[test]
    fn test_parse_period() {
        assert_eq!("Monthly".parse::<BudgetPeriod>().unwrap(), BudgetPeriod::Monthly);
        assert_eq!("annually".parse::<BudgetPeriod>().unwrap(), BudgetPeriod::Yearly);
        assert!("fortnightly".parse::<BudgetPeriod>().is_err());
    }
}
