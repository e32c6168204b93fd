use super::{AppContext, parse_date_or_today, ui};
use crate::RecurringCommand;
use crate::core::currency::BASE_CURRENCY;
use crate::core::format::CurrencyFormatter;
use crate::core::records::{NewRecurringTransaction, RecurringTransaction};
use anyhow::Result;
use comfy_table::{Cell, Color};

pub fn recurring_table(
    schedules: &[RecurringTransaction],
    formatter: &CurrencyFormatter,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Description"),
        ui::header_cell("Type"),
        ui::header_cell("Frequency"),
        ui::header_cell("Next"),
        ui::header_cell("Amount"),
        ui::header_cell("Status"),
    ]);
    for schedule in schedules {
        let status = if schedule.is_active {
            Cell::new("active").fg(Color::Green)
        } else {
            Cell::new("paused").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(&schedule.id),
            Cell::new(schedule.description.as_deref().unwrap_or("-")),
            Cell::new(schedule.kind),
            Cell::new(schedule.frequency),
            Cell::new(schedule.next_occurrence.format("%Y-%m-%d")),
            ui::money_cell(formatter.format_dual_currency(schedule.amount, BASE_CURRENCY)),
            status,
        ]);
    }
    table.to_string()
}

async fn list(ctx: &AppContext) -> Result<()> {
    let spinner = ui::new_spinner("Fetching recurring transactions...");
    let result = futures::try_join!(ctx.api().list_recurring(), ctx.formatter());
    spinner.finish_and_clear();
    let (schedules, formatter) = result?;

    if schedules.is_empty() {
        println!("No recurring transactions.");
        return Ok(());
    }
    println!("{}", recurring_table(&schedules, &formatter));
    Ok(())
}

pub async fn run(ctx: &AppContext, command: Option<RecurringCommand>) -> Result<()> {
    match command.unwrap_or(RecurringCommand::List) {
        RecurringCommand::List => list(ctx).await,
        RecurringCommand::Add {
            amount,
            frequency,
            kind,
            start,
            category,
            description,
        } => {
            let created = ctx
                .api()
                .create_recurring(&NewRecurringTransaction {
                    amount,
                    kind: kind.parse()?,
                    category_id: category,
                    description,
                    frequency: frequency.parse()?,
                    start_date: parse_date_or_today(start.as_deref())?,
                })
                .await?;
            println!(
                "Scheduled {} {} ({}), next on {}",
                created.frequency,
                created.kind,
                created.id,
                created.next_occurrence.format("%Y-%m-%d")
            );
            Ok(())
        }
        RecurringCommand::Toggle { id } => {
            let updated = ctx.api().toggle_recurring(&id).await?;
            let state = if updated.is_active { "resumed" } else { "paused" };
            println!("Recurring transaction {id} {state}");
            Ok(())
        }
        RecurringCommand::Delete { id } => {
            ctx.api().delete_recurring(&id).await?;
            println!("Deleted recurring transaction {id}");
            Ok(())
        }
    }
}
