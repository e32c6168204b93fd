pub mod auth;
pub mod budgets;
pub mod categories;
pub mod currency;
pub mod goals;
pub mod notifications;
pub mod recurring;
pub mod setup;
pub mod transactions;
pub mod ui;

use crate::core::cache::{KeyValueCollection, Store};
use crate::core::config::AppConfig;
use crate::core::currency::{BASE_CURRENCY, CurrencyService};
use crate::core::format::{CurrencyFormatter, Locale};
use crate::providers::{ApiClient, CachingCurrencyService};
use crate::store::KeyValueStore;
use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::debug;

pub(crate) const SESSION_COLLECTION: &str = "session";
pub(crate) const TOKEN_KEY: &[u8] = b"token";
const CURRENCY_COLLECTION: &str = "currency";
const TOKEN_ENV: &str = "FINTRACK_TOKEN";

/// Picks the first available token: config, then environment, then the
/// stored session.
pub fn resolve_token(
    configured: Option<&str>,
    environment: Option<&str>,
    stored: Option<&str>,
) -> Option<String> {
    [configured, environment, stored]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

/// Where a token that outranks the stored session comes from, if any.
pub fn token_override(
    configured: Option<&str>,
    environment: Option<&str>,
) -> Option<&'static str> {
    let present = |t: Option<&str>| t.is_some_and(|t| !t.trim().is_empty());
    if present(configured) {
        Some("api.token in the config file")
    } else if present(environment) {
        Some("the FINTRACK_TOKEN environment variable")
    } else {
        None
    }
}

/// Everything a command needs: config, caches and the API client.
pub struct AppContext {
    pub config: AppConfig,
    pub locale: Locale,
    store: KeyValueStore,
    session: Arc<dyn KeyValueCollection>,
    currency: CachingCurrencyService<ApiClient>,
}

impl AppContext {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let data_path = config.default_data_path().ok();
        let store = KeyValueStore::new(data_path.as_deref());
        if !store.is_persistent() {
            debug!("Using in-memory caches");
        }

        let session = store
            .get_collection(SESSION_COLLECTION, true, true)
            .ok_or_else(|| anyhow!("Could not open session store"))?;
        let currency_cache = store
            .get_collection(CURRENCY_COLLECTION, true, true)
            .ok_or_else(|| anyhow!("Could not open currency cache"))?;

        let stored = session
            .get(TOKEN_KEY)
            .await
            .and_then(|bytes| String::from_utf8(bytes).ok());
        let environment = std::env::var(TOKEN_ENV).ok();
        let token = resolve_token(
            config.api.token.as_deref(),
            environment.as_deref(),
            stored.as_deref(),
        );

        let api = ApiClient::new(&config.api.base_url, token)?;
        let currency = CachingCurrencyService::new(
            api,
            currency_cache,
            config.cache.preferences_ttl(),
            config.cache.rates_ttl(),
        );

        Ok(Self {
            locale: Locale::from_tag(&config.locale),
            config,
            store,
            session,
            currency,
        })
    }

    pub fn api(&self) -> &ApiClient {
        self.currency.inner()
    }

    pub fn currency(&self) -> &CachingCurrencyService<ApiClient> {
        &self.currency
    }

    pub fn session(&self) -> &dyn KeyValueCollection {
        self.session.as_ref()
    }

    /// Source of a token that stays active after the session is cleared.
    pub fn token_override(&self) -> Option<&'static str> {
        let environment = std::env::var(TOKEN_ENV).ok();
        token_override(self.config.api.token.as_deref(), environment.as_deref())
    }

    /// Forgets the stored session and everything cached for that user.
    pub async fn clear_user_data(&self) {
        self.session.clear().await;
        if let Some(currency) = self.store.get_collection(CURRENCY_COLLECTION, true, false) {
            currency.clear().await;
        }
    }

    /// Preferences and USD rates are fetched concurrently.
    pub async fn formatter(&self) -> Result<CurrencyFormatter> {
        let (preferences, rates) = futures::try_join!(
            self.currency.get_preferences(),
            self.currency.rate_table(BASE_CURRENCY)
        )
        .context("Failed to load currency settings")?;
        Ok(CurrencyFormatter::new(preferences, rates, self.locale))
    }

    /// Lets background refreshes land in the cache before exit.
    pub async fn finish(&self) {
        self.currency.settle().await;
        self.store.flush();
    }
}

/// Parses `YYYY-MM-DD`, defaulting to today.
pub(crate) fn parse_date_or_today(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {d}")),
        None => Ok(Utc::now().date_naive()),
    }
}

/// Writes `content` to `output` or stdout.
pub(crate) fn write_output(content: &str, output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {path}"))?;
            println!("Wrote {}", path);
        }
        None => print!("{content}"),
    }
    Ok(())
}
