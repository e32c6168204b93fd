use super::{AppContext, ui};
use crate::BudgetCommand;
use crate::core::budget::{BudgetRecord, NewBudget, derive_budget_progress};
use crate::core::currency::BASE_CURRENCY;
use crate::core::format::CurrencyFormatter;
use anyhow::Result;
use comfy_table::Cell;

fn budget_label(budget: &BudgetRecord) -> String {
    budget
        .name
        .clone()
        .or_else(|| budget.category_id.clone())
        .unwrap_or_else(|| budget.id.clone())
}

pub fn budgets_table(budgets: &[BudgetRecord], formatter: &CurrencyFormatter) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Budget"),
        ui::header_cell("Period"),
        ui::header_cell("Amount"),
        ui::header_cell("Spent"),
        ui::header_cell("Remaining"),
        ui::header_cell("Progress"),
    ]);

    let mut alerts = Vec::new();
    for budget in budgets {
        let progress = derive_budget_progress(budget);
        let label = budget_label(budget);
        table.add_row(vec![
            Cell::new(&budget.id),
            Cell::new(&label),
            Cell::new(budget.period),
            ui::money_cell(formatter.format_dual_currency(budget.amount, BASE_CURRENCY)),
            ui::money_cell(formatter.format_dual_currency(budget.spent, BASE_CURRENCY)),
            ui::signed_money_cell(
                formatter.format_dual_currency(progress.remaining, BASE_CURRENCY),
                progress.remaining >= 0.0,
            ),
            ui::progress_cell(
                progress.percent_used,
                progress.bar_width,
                progress.overlay_width,
                progress.display_color,
            ),
        ]);

        if progress.over_budget {
            alerts.push(ui::style_text(
                &format!("{label} is over budget ({:.1}%)", progress.percent_used),
                ui::StyleType::Error,
            ));
        } else if progress.is_warning {
            alerts.push(format!(
                "{label} has reached {:.1}% of its budget",
                progress.percent_used
            ));
        }
    }

    let mut output = table.to_string();
    for alert in alerts {
        output.push('\n');
        output.push_str(&alert);
    }
    output
}

async fn list(ctx: &AppContext) -> Result<()> {
    let spinner = ui::new_spinner("Fetching budgets...");
    let result = futures::try_join!(ctx.api().list_budgets(), ctx.formatter());
    spinner.finish_and_clear();
    let (budgets, formatter) = result?;

    if budgets.is_empty() {
        println!("No budgets yet. Add one with `fintrack budgets add`.");
        return Ok(());
    }
    println!("{}", budgets_table(&budgets, &formatter));
    Ok(())
}

pub async fn run(ctx: &AppContext, command: Option<BudgetCommand>) -> Result<()> {
    match command.unwrap_or(BudgetCommand::List) {
        BudgetCommand::List => list(ctx).await,
        BudgetCommand::Add {
            amount,
            period,
            name,
            category,
            threshold,
        } => {
            if amount <= 0.0 || !amount.is_finite() {
                anyhow::bail!("Budget amount must be positive");
            }
            let budget = ctx
                .api()
                .create_budget(&NewBudget {
                    name,
                    amount,
                    period: period.parse()?,
                    notify_threshold: threshold,
                    category_id: category,
                })
                .await?;
            println!(
                "Created budget {} ({})",
                ui::style_text(&budget_label(&budget), ui::StyleType::TotalLabel),
                budget.id
            );
            Ok(())
        }
        BudgetCommand::Delete { id } => {
            ctx.api().delete_budget(&id).await?;
            println!("Deleted budget {id}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::budget::BudgetPeriod;
    use crate::core::currency::{CurrencyPreferences, RateTable};
    use crate::core::format::Locale;

    fn budget(id: &str, name: Option<&str>, amount: f64, spent: f64) -> BudgetRecord {
        BudgetRecord {
            id: id.to_string(),
            name: name.map(str::to_string),
            amount,
            spent,
            notify_threshold: 80.0,
            period: BudgetPeriod::Monthly,
            category_id: Some("food".to_string()),
        }
    }

    #[test]
    fn test_budget_label_fallbacks() {
        assert_eq!(budget_label(&budget("1", Some("Food"), 1.0, 0.0)), "Food");
        assert_eq!(budget_label(&budget("1", None, 1.0, 0.0)), "food");
        let mut b = budget("7", None, 1.0, 0.0);
        b.category_id = None;
        assert_eq!(budget_label(&b), "7");
    }

    #[test]
    fn test_budgets_table_alerts() {
        let formatter = CurrencyFormatter::new(
            CurrencyPreferences::default(),
            RateTable::from_rates("USD", &[]),
            Locale::EN_US,
        );
        let output = budgets_table(
            &[
                budget("1", Some("Rent"), 1000.0, 200.0),
                budget("2", Some("Dining"), 100.0, 90.0),
                budget("3", Some("Travel"), 100.0, 150.0),
            ],
            &formatter,
        );
        assert!(output.contains("$1,000.00"));
        assert!(output.contains("Dining has reached 90.0% of its budget"));
        assert!(output.contains("Travel is over budget (150.0%)"));
        assert!(!output.contains("Rent has reached"));
    }
}
