use super::{AppContext, parse_date_or_today, ui};
use crate::GoalCommand;
use crate::core::budget::ProgressColor;
use crate::core::currency::BASE_CURRENCY;
use crate::core::format::CurrencyFormatter;
use crate::core::goal::{GoalInput, GoalRecord, GoalStatus, derive_goal_progress};
use anyhow::Result;
use chrono::{DateTime, NaiveTime, Utc};
use comfy_table::{Cell, Color};
use tracing::debug;

pub fn goals_table(
    goals: &[GoalRecord],
    formatter: &CurrencyFormatter,
    now: DateTime<Utc>,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Goal"),
        ui::header_cell("Saved"),
        ui::header_cell("Target"),
        ui::header_cell("Progress"),
        ui::header_cell("Due"),
        ui::header_cell("Per day"),
        ui::header_cell("Per week"),
        ui::header_cell("Per month"),
    ]);

    let money = |v: f64| formatter.format_dual_currency(v, BASE_CURRENCY);
    for goal in goals {
        let progress = derive_goal_progress(goal, now);
        let due = if progress.overdue {
            Cell::new(format!("{} (overdue)", goal.target_date.format("%Y-%m-%d")))
                .fg(Color::Red)
        } else {
            Cell::new(format!(
                "{} ({} days)",
                goal.target_date.format("%Y-%m-%d"),
                progress.days_remaining
            ))
        };
        let color = if goal.status == GoalStatus::Completed || progress.remaining_amount <= 0.0 {
            ProgressColor::Success
        } else if progress.overdue {
            ProgressColor::Danger
        } else {
            ProgressColor::Caution
        };

        table.add_row(vec![
            Cell::new(&goal.id),
            Cell::new(format!("{} [{}]", goal.name, goal.status)),
            ui::money_cell(money(goal.current_amount)),
            ui::money_cell(money(goal.target_amount)),
            ui::progress_cell(
                progress.progress_percentage,
                progress.progress_percentage,
                0.0,
                color,
            ),
            due,
            ui::format_optional_cell(progress.required_daily_saving, money),
            ui::format_optional_cell(progress.required_weekly_saving, money),
            ui::format_optional_cell(progress.required_monthly_saving, money),
        ]);
    }
    table.to_string()
}

async fn list(ctx: &AppContext) -> Result<()> {
    let spinner = ui::new_spinner("Fetching goals...");
    let result = futures::try_join!(ctx.api().list_goals(), ctx.formatter());
    spinner.finish_and_clear();
    let (goals, formatter) = result?;

    if goals.is_empty() {
        println!("No goals yet. Add one with `fintrack goals add`.");
        return Ok(());
    }
    println!("{}", goals_table(&goals, &formatter, Utc::now()));
    Ok(())
}

/// Adds a contribution and marks the goal completed once the target is met.
pub fn apply_contribution(goal: &GoalRecord, amount: f64) -> GoalInput {
    let mut input = GoalInput::from(goal);
    input.current_amount += amount;
    if input.current_amount >= input.target_amount && input.status == GoalStatus::Active {
        input.status = GoalStatus::Completed;
    }
    input
}

pub async fn run(ctx: &AppContext, command: Option<GoalCommand>) -> Result<()> {
    match command.unwrap_or(GoalCommand::List) {
        GoalCommand::List => list(ctx).await,
        GoalCommand::Add {
            name,
            target,
            date,
            saved,
        } => {
            if target <= 0.0 || !target.is_finite() {
                anyhow::bail!("Goal target must be positive");
            }
            let target_date = parse_date_or_today(Some(&date))?
                .and_time(NaiveTime::MIN)
                .and_utc();
            let goal = ctx
                .api()
                .create_goal(&GoalInput {
                    name,
                    current_amount: saved,
                    target_amount: target,
                    target_date,
                    status: GoalStatus::Active,
                })
                .await?;
            println!(
                "Created goal {} ({})",
                ui::style_text(&goal.name, ui::StyleType::TotalLabel),
                goal.id
            );
            Ok(())
        }
        GoalCommand::Contribute { id, amount } => {
            let goal = ctx.api().get_goal(&id).await?;
            let input = apply_contribution(&goal, amount);
            debug!(
                "Goal {} moves from {} to {}",
                id, goal.current_amount, input.current_amount
            );
            let updated = ctx.api().update_goal(&id, &input).await?;
            let progress = derive_goal_progress(&updated, Utc::now());
            println!(
                "{}: {:.1}% saved",
                ui::style_text(&updated.name, ui::StyleType::TotalLabel),
                progress.progress_percentage
            );
            if updated.status == GoalStatus::Completed {
                println!("{}", ui::style_text("Goal reached", ui::StyleType::Success));
            }
            Ok(())
        }
        GoalCommand::Delete { id } => {
            ctx.api().delete_goal(&id).await?;
            println!("Deleted goal {id}");
            Ok(())
        }
    }
}
