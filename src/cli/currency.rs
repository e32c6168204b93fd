use super::{AppContext, ui};
use crate::PrefsCommand;
use crate::core::currency::{
    AvailableCurrency, Conversion, ConversionRequest, CurrencyPreferences, CurrencyService,
    ExchangeRate, normalize_code,
};
use crate::core::format::{Locale, format_money};
use anyhow::Result;
use comfy_table::Cell;

/// One-line description of a local conversion.
pub fn describe_conversion(
    amount: f64,
    from: &str,
    to: &str,
    conversion: &Conversion,
    locale: &Locale,
) -> String {
    let source = format_money(amount, from, locale);
    match conversion {
        Conversion::Converted(value) => {
            format!("{source} = {}", format_money(*value, to, locale))
        }
        Conversion::Unconverted { reason, .. } => {
            format!(
                "{source} could not be converted to {}: {reason}",
                normalize_code(to)
            )
        }
    }
}

pub async fn convert(
    ctx: &AppContext,
    amount: f64,
    from: &str,
    to: Option<&str>,
    remote: bool,
) -> Result<()> {
    if remote {
        let to = match to {
            Some(to) => normalize_code(to),
            None => ctx.currency().get_preferences().await?.default_currency,
        };
        let result = ctx
            .currency()
            .convert_remote(&ConversionRequest {
                amount,
                from_currency: normalize_code(from),
                to_currency: to.clone(),
            })
            .await?;
        println!(
            "{} = {} {}",
            format_money(amount, from, &ctx.locale),
            format_money(result.converted_amount, &to, &ctx.locale),
            ui::style_text(
                &format!("(rate {:.6})", result.exchange_rate),
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }

    let formatter = ctx.formatter().await?;
    let to = to
        .map(normalize_code)
        .unwrap_or_else(|| formatter.preferences().default_currency.clone());
    let conversion = formatter.convert(amount, from, &to);
    let line = describe_conversion(amount, from, &to, &conversion, formatter.locale());
    if conversion.is_converted() {
        println!("{line}");
    } else {
        println!("{}", ui::style_text(&line, ui::StyleType::Error));
    }
    Ok(())
}

pub fn rates_table(base: &str, rates: &[ExchangeRate]) -> String {
    let mut sorted: Vec<&ExchangeRate> = rates.iter().collect();
    sorted.sort_by(|a, b| a.to_currency.cmp(&b.to_currency));

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Per 1 {}", normalize_code(base))),
        ui::header_cell("Valid from"),
        ui::header_cell("Source"),
    ]);
    for rate in sorted {
        table.add_row(vec![
            Cell::new(&rate.to_currency),
            ui::money_cell(format!("{:.6}", rate.rate)),
            Cell::new(
                rate.valid_from
                    .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(&rate.source),
        ]);
    }
    table.to_string()
}

pub async fn rates(ctx: &AppContext, base: &str) -> Result<()> {
    let rates = ctx.currency().get_rates(base).await?;
    println!("{}", rates_table(base, &rates));
    Ok(())
}

pub fn currencies_table(currencies: &[AvailableCurrency]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Symbol"),
    ]);
    for currency in currencies {
        table.add_row(vec![
            Cell::new(&currency.code),
            Cell::new(&currency.name),
            Cell::new(&currency.symbol),
        ]);
    }
    table.to_string()
}

pub async fn currencies(ctx: &AppContext) -> Result<()> {
    let spinner = ui::new_spinner("Fetching currencies...");
    let currencies = ctx.currency().available_currencies().await;
    spinner.finish_and_clear();
    println!("{}", currencies_table(&currencies?));
    Ok(())
}

fn print_preferences(prefs: &CurrencyPreferences) {
    println!(
        "Default currency:   {}",
        ui::style_text(&prefs.default_currency, ui::StyleType::TotalLabel)
    );
    println!("Secondary currency: {}", prefs.secondary_currency);
    println!(
        "Show secondary:     {}",
        if prefs.display_secondary { "yes" } else { "no" }
    );
}

/// Applies the given changes on top of the current preferences.
pub fn apply_preference_changes(
    current: &CurrencyPreferences,
    default_currency: Option<&str>,
    secondary_currency: Option<&str>,
    display_secondary: Option<bool>,
) -> CurrencyPreferences {
    CurrencyPreferences {
        default_currency: default_currency
            .map(normalize_code)
            .unwrap_or_else(|| current.default_currency.clone()),
        secondary_currency: secondary_currency
            .map(normalize_code)
            .unwrap_or_else(|| current.secondary_currency.clone()),
        display_secondary: display_secondary.unwrap_or(current.display_secondary),
    }
}

pub async fn prefs(ctx: &AppContext, command: Option<PrefsCommand>) -> Result<()> {
    match command.unwrap_or(PrefsCommand::Show) {
        PrefsCommand::Show => {
            let prefs = ctx.currency().get_preferences().await?;
            print_preferences(&prefs);
        }
        PrefsCommand::Set {
            default_currency,
            secondary_currency,
            display_secondary,
        } => {
            let current = ctx.currency().get_preferences().await?;
            let updated = apply_preference_changes(
                &current,
                default_currency.as_deref(),
                secondary_currency.as_deref(),
                display_secondary,
            );
            let saved = ctx.currency().update_preferences(&updated).await?;
            println!("{}", ui::style_text("Preferences saved", ui::StyleType::Success));
            print_preferences(&saved);
        }
    }
    Ok(())
}
