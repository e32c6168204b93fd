use super::{AppContext, parse_date_or_today, ui, write_output};
use crate::TransactionCommand;
use crate::core::currency::{BASE_CURRENCY, normalize_code};
use crate::core::format::{CurrencyFormatter, format_money};
use crate::core::records::{
    Category, NewTransaction, Transaction, TransactionType, import_template,
};
use anyhow::Result;
use comfy_table::Cell;
use std::collections::HashMap;

fn transaction_currency(tx: &Transaction) -> &str {
    tx.currency.as_deref().unwrap_or(BASE_CURRENCY)
}

/// Income and expense totals in the preferred currency.
pub fn totals(transactions: &[Transaction], formatter: &CurrencyFormatter) -> (f64, f64) {
    let target = &formatter.preferences().default_currency;
    transactions
        .iter()
        .fold((0.0, 0.0), |(income, expense), tx| {
            let value = formatter
                .convert(tx.amount.abs(), transaction_currency(tx), target)
                .value();
            match tx.kind {
                TransactionType::Income => (income + value, expense),
                TransactionType::Expense => (income, expense + value),
                TransactionType::Transfer => (income, expense),
            }
        })
}

pub fn transactions_table(
    transactions: &[Transaction],
    categories: &[Category],
    formatter: &CurrencyFormatter,
) -> String {
    let names: HashMap<&str, &str> = categories
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Date"),
        ui::header_cell("Type"),
        ui::header_cell("Category"),
        ui::header_cell("Description"),
        ui::header_cell("Amount"),
    ]);

    for tx in transactions {
        let category = tx
            .category_id
            .as_deref()
            .map(|id| names.get(id).copied().unwrap_or(id))
            .unwrap_or("-");
        let amount = formatter.format_dual_currency(tx.amount.abs(), transaction_currency(tx));
        let amount_cell = match tx.kind {
            TransactionType::Income => ui::signed_money_cell(format!("+{amount}"), true),
            TransactionType::Expense => ui::signed_money_cell(format!("-{amount}"), false),
            TransactionType::Transfer => ui::money_cell(amount),
        };
        table.add_row(vec![
            Cell::new(&tx.id),
            Cell::new(tx.date.format("%Y-%m-%d")),
            Cell::new(tx.kind),
            Cell::new(category),
            Cell::new(tx.description.as_deref().unwrap_or("")),
            amount_cell,
        ]);
    }

    let (income, expense) = totals(transactions, formatter);
    let target = &formatter.preferences().default_currency;
    let locale = formatter.locale();
    format!(
        "{}\n\n{} {}   {} {}",
        table,
        ui::style_text("Income:", ui::StyleType::TotalLabel),
        ui::style_text(&format_money(income, target, locale), ui::StyleType::TotalValue),
        ui::style_text("Expenses:", ui::StyleType::TotalLabel),
        ui::style_text(&format_money(expense, target, locale), ui::StyleType::Error),
    )
}

async fn list(ctx: &AppContext, limit: Option<usize>) -> Result<()> {
    let spinner = ui::new_spinner("Fetching transactions...");
    let result = futures::try_join!(
        ctx.api().list_transactions(limit),
        ctx.api().list_categories(),
        ctx.formatter()
    );
    spinner.finish_and_clear();
    let (transactions, categories, formatter) = result?;

    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }
    println!(
        "{}",
        transactions_table(&transactions, &categories, &formatter)
    );
    Ok(())
}

pub async fn run(ctx: &AppContext, command: Option<TransactionCommand>) -> Result<()> {
    match command.unwrap_or(TransactionCommand::List { limit: None }) {
        TransactionCommand::List { limit } => list(ctx, limit).await,
        TransactionCommand::Add {
            amount,
            kind,
            date,
            category,
            description,
            currency,
        } => {
            let tx = NewTransaction {
                date: parse_date_or_today(date.as_deref())?,
                amount,
                kind: kind.parse()?,
                category_id: category,
                description,
                currency: currency.as_deref().map(normalize_code),
            };
            let created = ctx.api().create_transaction(&tx).await?;
            println!(
                "Recorded {} {} on {}",
                created.kind,
                format_money(created.amount, transaction_currency(&created), &ctx.locale),
                created.date.format("%Y-%m-%d")
            );
            Ok(())
        }
        TransactionCommand::Delete { id } => {
            ctx.api().delete_transaction(&id).await?;
            println!("Deleted transaction {id}");
            Ok(())
        }
        TransactionCommand::Export { output } => {
            let csv = ctx.api().export_transactions().await?;
            write_output(&csv, output.as_deref())
        }
        TransactionCommand::Template { output } => {
            write_output(&import_template(), output.as_deref())
        }
    }
}
