pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

pub use crate::core::config;

use anyhow::Result;
use clap::Subcommand;
use tracing::{debug, info};

#[derive(Debug, Clone, Subcommand)]
pub enum AppCommand {
    /// Create default configuration
    Setup,
    /// Sign in and remember the session token
    Login {
        #[arg(short, long)]
        email: String,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
        /// Two-factor authentication code
        #[arg(long)]
        code: Option<String>,
    },
    /// Forget the stored session token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Convert an amount between currencies
    Convert {
        #[arg(allow_hyphen_values = true)]
        amount: f64,
        from: String,
        /// Defaults to the preferred currency
        to: Option<String>,
        /// Ask the server to convert instead of using cached rates
        #[arg(long)]
        remote: bool,
    },
    /// Show exchange rates
    Rates {
        #[arg(long, default_value = "USD")]
        base: String,
    },
    /// List currencies supported by the server
    Currencies,
    /// Show or change currency preferences
    Prefs {
        #[command(subcommand)]
        command: Option<PrefsCommand>,
    },
    /// Budgets and their progress
    Budgets {
        #[command(subcommand)]
        command: Option<BudgetCommand>,
    },
    /// Savings goals and required savings
    Goals {
        #[command(subcommand)]
        command: Option<GoalCommand>,
    },
    /// Transactions, CSV export and import template
    Transactions {
        #[command(subcommand)]
        command: Option<TransactionCommand>,
    },
    /// Transaction categories
    Categories {
        #[command(subcommand)]
        command: Option<CategoryCommand>,
    },
    /// Recurring transaction schedules
    Recurring {
        #[command(subcommand)]
        command: Option<RecurringCommand>,
    },
    /// Notifications
    Notifications {
        #[command(subcommand)]
        command: Option<NotificationCommand>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum PrefsCommand {
    Show,
    Set {
        #[arg(long = "default")]
        default_currency: Option<String>,
        #[arg(long = "secondary")]
        secondary_currency: Option<String>,
        #[arg(long)]
        display_secondary: Option<bool>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum BudgetCommand {
    List,
    Add {
        amount: f64,
        #[arg(long, default_value = "monthly")]
        period: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Percentage of the budget at which to warn
        #[arg(long, default_value_t = 80.0)]
        threshold: f64,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum GoalCommand {
    List,
    Add {
        name: String,
        target: f64,
        /// Target date as YYYY-MM-DD
        date: String,
        #[arg(long, default_value_t = 0.0)]
        saved: f64,
    },
    /// Add an amount to a goal's savings
    Contribute {
        id: String,
        amount: f64,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum TransactionCommand {
    List {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    Add {
        #[arg(allow_hyphen_values = true)]
        amount: f64,
        /// income, expense or transfer
        #[arg(long = "type", default_value = "expense")]
        kind: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        currency: Option<String>,
    },
    Delete {
        id: String,
    },
    /// Download the server CSV export
    Export {
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Write the CSV import template
    Template {
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum CategoryCommand {
    List,
    Add {
        name: String,
        #[arg(long = "type", default_value = "expense")]
        kind: String,
        #[arg(long)]
        color: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum RecurringCommand {
    List,
    Add {
        #[arg(allow_hyphen_values = true)]
        amount: f64,
        frequency: String,
        #[arg(long = "type", default_value = "expense")]
        kind: String,
        /// First occurrence as YYYY-MM-DD, defaults to today
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Pause or resume a schedule
    Toggle {
        id: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum NotificationCommand {
    List {
        #[arg(long)]
        unread: bool,
    },
    Read {
        id: String,
    },
    ReadAll,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fintrack starting...");

    if let AppCommand::Setup = command {
        return cli::setup::setup();
    }

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let ctx = cli::AppContext::new(config).await?;

    let result = match command {
        AppCommand::Setup => Ok(()),
        AppCommand::Login {
            email,
            password,
            code,
        } => cli::auth::login(&ctx, &email, password, code).await,
        AppCommand::Logout => cli::auth::logout(&ctx).await,
        AppCommand::Whoami => cli::auth::whoami(&ctx).await,
        AppCommand::Convert {
            amount,
            from,
            to,
            remote,
        } => cli::currency::convert(&ctx, amount, &from, to.as_deref(), remote).await,
        AppCommand::Rates { base } => cli::currency::rates(&ctx, &base).await,
        AppCommand::Currencies => cli::currency::currencies(&ctx).await,
        AppCommand::Prefs { command } => cli::currency::prefs(&ctx, command).await,
        AppCommand::Budgets { command } => cli::budgets::run(&ctx, command).await,
        AppCommand::Goals { command } => cli::goals::run(&ctx, command).await,
        AppCommand::Transactions { command } => cli::transactions::run(&ctx, command).await,
        AppCommand::Categories { command } => cli::categories::run(&ctx, command).await,
        AppCommand::Recurring { command } => cli::recurring::run(&ctx, command).await,
        AppCommand::Notifications { command } => cli::notifications::run(&ctx, command).await,
    };

    ctx.finish().await;
    result
}
