//! Locale-aware money formatting and dual-currency display

use crate::core::currency::{
    BASE_CURRENCY, Conversion, CurrencyPreferences, RateTable, convert, normalize_code,
};
use rust_decimal::prelude::*;
use std::fmt::Display;
use std::str::FromStr;

/// Display metadata for a currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub symbol: &'static str,
    pub minor_units: u32,
}

const CURRENCIES: &[CurrencyInfo] = &[
    CurrencyInfo { code: "USD", symbol: "$", minor_units: 2 },
    CurrencyInfo { code: "EUR", symbol: "€", minor_units: 2 },
    CurrencyInfo { code: "GBP", symbol: "£", minor_units: 2 },
    CurrencyInfo { code: "JPY", symbol: "¥", minor_units: 0 },
    CurrencyInfo { code: "CNY", symbol: "CN¥", minor_units: 2 },
    CurrencyInfo { code: "INR", symbol: "₹", minor_units: 2 },
    CurrencyInfo { code: "KRW", symbol: "₩", minor_units: 0 },
    CurrencyInfo { code: "CAD", symbol: "CA$", minor_units: 2 },
    CurrencyInfo { code: "AUD", symbol: "A$", minor_units: 2 },
    CurrencyInfo { code: "NZD", symbol: "NZ$", minor_units: 2 },
    CurrencyInfo { code: "MXN", symbol: "MX$", minor_units: 2 },
    CurrencyInfo { code: "BRL", symbol: "R$", minor_units: 2 },
    CurrencyInfo { code: "CHF", symbol: "CHF", minor_units: 2 },
    CurrencyInfo { code: "SEK", symbol: "SEK", minor_units: 2 },
    CurrencyInfo { code: "NOK", symbol: "NOK", minor_units: 2 },
    CurrencyInfo { code: "DKK", symbol: "DKK", minor_units: 2 },
    CurrencyInfo { code: "PLN", symbol: "PLN", minor_units: 2 },
    CurrencyInfo { code: "RUB", symbol: "RUB", minor_units: 2 },
    CurrencyInfo { code: "TRY", symbol: "TRY", minor_units: 2 },
    CurrencyInfo { code: "ZAR", symbol: "ZAR", minor_units: 2 },
    CurrencyInfo { code: "SGD", symbol: "SGD", minor_units: 2 },
    CurrencyInfo { code: "HKD", symbol: "HK$", minor_units: 2 },
    CurrencyInfo { code: "VND", symbol: "₫", minor_units: 0 },
    CurrencyInfo { code: "CLP", symbol: "CLP", minor_units: 0 },
    CurrencyInfo { code: "ISK", symbol: "ISK", minor_units: 0 },
    CurrencyInfo { code: "BIF", symbol: "BIF", minor_units: 0 },
    CurrencyInfo { code: "DJF", symbol: "DJF", minor_units: 0 },
    CurrencyInfo { code: "GNF", symbol: "GNF", minor_units: 0 },
    CurrencyInfo { code: "KMF", symbol: "KMF", minor_units: 0 },
    CurrencyInfo { code: "PYG", symbol: "PYG", minor_units: 0 },
    CurrencyInfo { code: "RWF", symbol: "RWF", minor_units: 0 },
    CurrencyInfo { code: "UGX", symbol: "UGX", minor_units: 0 },
    CurrencyInfo { code: "UYI", symbol: "UYI", minor_units: 0 },
    CurrencyInfo { code: "VUV", symbol: "VUV", minor_units: 0 },
    CurrencyInfo { code: "XAF", symbol: "XAF", minor_units: 0 },
    CurrencyInfo { code: "XOF", symbol: "XOF", minor_units: 0 },
    CurrencyInfo { code: "XPF", symbol: "XPF", minor_units: 0 },
    CurrencyInfo { code: "BHD", symbol: "BHD", minor_units: 3 },
    CurrencyInfo { code: "KWD", symbol: "KWD", minor_units: 3 },
    CurrencyInfo { code: "OMR", symbol: "OMR", minor_units: 3 },
    CurrencyInfo { code: "IQD", symbol: "IQD", minor_units: 3 },
    CurrencyInfo { code: "JOD", symbol: "JOD", minor_units: 3 },
    CurrencyInfo { code: "LYD", symbol: "LYD", minor_units: 3 },
    CurrencyInfo { code: "TND", symbol: "TND", minor_units: 3 },
];

/// Looks up display metadata; unknown codes use the code as symbol with two
/// minor units.
pub fn currency_info(code: &str) -> CurrencyInfo {
    let code = normalize_code(code);
    CURRENCIES
        .iter()
        .find(|c| c.code == code)
        .copied()
        .unwrap_or(CurrencyInfo {
            code: "",
            symbol: "",
            minor_units: 2,
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Grouping {
    #[default]
    Thousands,
    /// 12,34,567 style used in India
    Lakh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    pub tag: &'static str,
    pub group_separator: &'static str,
    pub decimal_separator: &'static str,
    pub symbol_after: bool,
    pub grouping: Grouping,
}

impl Locale {
    pub const EN_US: Locale = Locale {
        tag: "en-US",
        group_separator: ",",
        decimal_separator: ".",
        symbol_after: false,
        grouping: Grouping::Thousands,
    };
    pub const EN_GB: Locale = Locale {
        tag: "en-GB",
        ..Locale::EN_US
    };
    pub const EN_IN: Locale = Locale {
        tag: "en-IN",
        grouping: Grouping::Lakh,
        ..Locale::EN_US
    };
    pub const DE_DE: Locale = Locale {
        tag: "de-DE",
        group_separator: ".",
        decimal_separator: ",",
        symbol_after: true,
        grouping: Grouping::Thousands,
    };
    pub const FR_FR: Locale = Locale {
        tag: "fr-FR",
        group_separator: "\u{202f}",
        decimal_separator: ",",
        symbol_after: true,
        grouping: Grouping::Thousands,
    };
    pub const JA_JP: Locale = Locale {
        tag: "ja-JP",
        ..Locale::EN_US
    };

    const ALL: [Locale; 6] = [
        Locale::EN_US,
        Locale::EN_GB,
        Locale::EN_IN,
        Locale::DE_DE,
        Locale::FR_FR,
        Locale::JA_JP,
    ];

    /// Resolves a BCP 47 tag, falling back to `en-US`.
    pub fn from_tag(tag: &str) -> Locale {
        let tag = tag.replace('_', "-");
        Locale::ALL
            .into_iter()
            .find(|l| l.tag.eq_ignore_ascii_case(&tag))
            .unwrap_or(Locale::EN_US)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::EN_US
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag)
    }
}

impl FromStr for Locale {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Locale::from_tag(s))
    }
}

fn group_digits(digits: &str, locale: &Locale) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 2);
    for (i, ch) in digits.chars().enumerate() {
        let left = len - i;
        if i > 0 {
            let boundary = match locale.grouping {
                Grouping::Thousands => left % 3 == 0,
                Grouping::Lakh => left == 3 || (left > 3 && (left - 3) % 2 == 0),
            };
            if boundary {
                out.push_str(locale.group_separator);
            }
        }
        out.push(ch);
    }
    out
}

/// Renders `|amount|` rounded half away from zero to `minor_units` places.
fn format_number(amount: f64, minor_units: u32, locale: &Locale) -> String {
    let fixed = match Decimal::from_f64_retain(amount.abs()) {
        Some(d) => {
            let mut d = d.round_dp_with_strategy(minor_units, RoundingStrategy::MidpointAwayFromZero);
            d.rescale(minor_units);
            d.to_string()
        }
        None => format!("{:.*}", minor_units as usize, amount.abs()),
    };

    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let mut out = group_digits(int_part, locale);
    if !frac_part.is_empty() {
        out.push_str(locale.decimal_separator);
        out.push_str(frac_part);
    }
    out
}

/// Formats an amount in `code` without any conversion.
pub fn format_money(amount: f64, code: &str, locale: &Locale) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let info = currency_info(code);
    let code = normalize_code(code);
    let symbol = if info.symbol.is_empty() {
        code.as_str()
    } else {
        info.symbol
    };
    let number = format_number(amount, info.minor_units, locale);
    let is_zero = number.chars().all(|c| !c.is_ascii_digit() || c == '0');
    let sign = if amount < 0.0 && !is_zero { "-" } else { "" };

    if locale.symbol_after {
        format!("{sign}{number}\u{a0}{symbol}")
    } else if symbol.chars().all(|c| c.is_ascii_alphabetic()) {
        format!("{sign}{symbol}\u{a0}{number}")
    } else {
        format!("{sign}{symbol}{number}")
    }
}

#[derive(Debug, Clone)]
pub struct FormatOptions<'a> {
    pub from: &'a str,
    /// Defaults to the preferred currency
    pub to: Option<&'a str>,
    pub skip_conversion: bool,
}

impl Default for FormatOptions<'_> {
    fn default() -> Self {
        Self {
            from: BASE_CURRENCY,
            to: None,
            skip_conversion: false,
        }
    }
}

/// Formats amounts using the user's preferences and a rate snapshot.
#[derive(Debug, Clone, Default)]
pub struct CurrencyFormatter {
    preferences: CurrencyPreferences,
    rates: RateTable,
    locale: Locale,
}

impl CurrencyFormatter {
    pub fn new(preferences: CurrencyPreferences, rates: RateTable, locale: Locale) -> Self {
        Self {
            preferences,
            rates,
            locale,
        }
    }

    pub fn preferences(&self) -> &CurrencyPreferences {
        &self.preferences
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Conversion {
        convert(amount, from, to, &self.rates)
    }

    pub fn format(&self, amount: f64, options: &FormatOptions) -> String {
        let to = options
            .to
            .unwrap_or(self.preferences.default_currency.as_str());
        if options.skip_conversion {
            return format_money(amount, to, &self.locale);
        }
        let converted = self.convert(amount, options.from, to);
        format_money(converted.value(), to, &self.locale)
    }

    /// Primary amount in the default currency, with the secondary currency in
    /// parentheses when enabled and different.
    pub fn format_dual_currency(&self, amount: f64, from: &str) -> String {
        let prefs = &self.preferences;
        let primary = self.format(
            amount,
            &FormatOptions {
                from,
                to: Some(prefs.default_currency.as_str()),
                skip_conversion: false,
            },
        );

        if !prefs.display_secondary
            || normalize_code(&prefs.secondary_currency) == normalize_code(&prefs.default_currency)
        {
            return primary;
        }

        let secondary = self.format(
            amount,
            &FormatOptions {
                from,
                to: Some(prefs.secondary_currency.as_str()),
                skip_conversion: false,
            },
        );
        format!("{primary} ({secondary})")
    }
}
