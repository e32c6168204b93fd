//! HTTP client for the finance tracking service.

use crate::core::budget::{BudgetRecord, NewBudget};
use crate::core::currency::{
    AvailableCurrency, ConversionRequest, CurrencyPreferences, CurrencyService, ExchangeRate,
    RemoteConversion, normalize_code,
};
use crate::core::goal::{GoalInput, GoalRecord};
use crate::core::records::{
    Category, LoginRequest, LoginResponse, NewCategory, NewRecurringTransaction, NewTransaction,
    Notification, RecurringTransaction, Transaction, User,
};
use crate::providers::util::with_retry;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fintrack/0.1")
            .build()?;
        Ok(ApiClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    async fn execute(&self, method: Method, path: &str, body: Option<Value>) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Requesting {} {}", method, url);

        // One transport-level retry for send failures
        let response = with_retry(
            || {
                let mut request = self.client.request(method.clone(), &url);
                if let Some(token) = &self.token {
                    request = request.bearer_auth(token);
                }
                if let Some(body) = &body {
                    request = request.json(body);
                }
                request.send()
            },
            1,
            500,
        )
        .await
        .with_context(|| format!("Request failed: {method} {path}"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string));
            return Err(match message {
                Some(message) => anyhow!("HTTP error: {} for {} {}: {}", status, method, path, message),
                None => anyhow!("HTTP error: {} for {} {}", status, method, path),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(Method::GET, path, None).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", path, e))
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let response = self.execute(method, path, Some(body)).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", path, e))
    }

    async fn send_empty(&self, method: Method, path: &str) -> Result<()> {
        self.execute(method, path, None).await?;
        Ok(())
    }

    // Auth

    #[instrument(name = "Login", skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.send_json(Method::POST, "/auth/login", request).await
    }

    pub async fn current_user(&self) -> Result<User> {
        self.get_json("/users/me").await
    }

    // Transactions

    pub async fn list_transactions(&self, limit: Option<usize>) -> Result<Vec<Transaction>> {
        match limit {
            Some(limit) => self.get_json(&format!("/transactions?limit={limit}")).await,
            None => self.get_json("/transactions").await,
        }
    }

    pub async fn create_transaction(&self, tx: &NewTransaction) -> Result<Transaction> {
        self.send_json(Method::POST, "/transactions", tx).await
    }

    pub async fn delete_transaction(&self, id: &str) -> Result<()> {
        self.send_empty(Method::DELETE, &format!("/transactions/{id}"))
            .await
    }

    /// Server-generated CSV export.
    pub async fn export_transactions(&self) -> Result<String> {
        let response = self
            .execute(Method::GET, "/transactions/export", None)
            .await?;
        Ok(response.text().await?)
    }

    // Categories

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.get_json("/categories").await
    }

    pub async fn create_category(&self, category: &NewCategory) -> Result<Category> {
        self.send_json(Method::POST, "/categories", category).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<()> {
        self.send_empty(Method::DELETE, &format!("/categories/{id}"))
            .await
    }

    // Budgets

    pub async fn list_budgets(&self) -> Result<Vec<BudgetRecord>> {
        self.get_json("/budgets").await
    }

    pub async fn create_budget(&self, budget: &NewBudget) -> Result<BudgetRecord> {
        self.send_json(Method::POST, "/budgets", budget).await
    }

    pub async fn delete_budget(&self, id: &str) -> Result<()> {
        self.send_empty(Method::DELETE, &format!("/budgets/{id}")).await
    }

    // Goals

    pub async fn list_goals(&self) -> Result<Vec<GoalRecord>> {
        self.get_json("/goals").await
    }

    pub async fn get_goal(&self, id: &str) -> Result<GoalRecord> {
        self.get_json(&format!("/goals/{id}")).await
    }

    pub async fn create_goal(&self, goal: &GoalInput) -> Result<GoalRecord> {
        self.send_json(Method::POST, "/goals", goal).await
    }

    pub async fn update_goal(&self, id: &str, goal: &GoalInput) -> Result<GoalRecord> {
        self.send_json(Method::PUT, &format!("/goals/{id}"), goal)
            .await
    }

    pub async fn delete_goal(&self, id: &str) -> Result<()> {
        self.send_empty(Method::DELETE, &format!("/goals/{id}")).await
    }

    // Recurring transactions

    pub async fn list_recurring(&self) -> Result<Vec<RecurringTransaction>> {
        self.get_json("/recurring-transactions").await
    }

    pub async fn create_recurring(
        &self,
        recurring: &NewRecurringTransaction,
    ) -> Result<RecurringTransaction> {
        self.send_json(Method::POST, "/recurring-transactions", recurring)
            .await
    }

    pub async fn toggle_recurring(&self, id: &str) -> Result<RecurringTransaction> {
        self.send_json(
            Method::PATCH,
            &format!("/recurring-transactions/{id}/toggle"),
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn delete_recurring(&self, id: &str) -> Result<()> {
        self.send_empty(Method::DELETE, &format!("/recurring-transactions/{id}"))
            .await
    }

    // Notifications

    pub async fn list_notifications(&self, unread_only: bool) -> Result<Vec<Notification>> {
        if unread_only {
            self.get_json("/notifications?unread=true").await
        } else {
            self.get_json("/notifications").await
        }
    }

    pub async fn mark_notification_read(&self, id: &str) -> Result<()> {
        self.send_empty(Method::PATCH, &format!("/notifications/{id}/read"))
            .await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<()> {
        self.send_empty(Method::PATCH, "/notifications/read-all")
            .await
    }
}

#[async_trait]
impl CurrencyService for ApiClient {
    async fn get_preferences(&self) -> Result<CurrencyPreferences> {
        self.get_json("/currency/preferences").await
    }

    async fn update_preferences(
        &self,
        prefs: &CurrencyPreferences,
    ) -> Result<CurrencyPreferences> {
        self.send_json(Method::PUT, "/currency/preferences", prefs)
            .await
    }

    #[instrument(name = "RatesFetch", skip(self), fields(base = %base))]
    async fn get_rates(&self, base: &str) -> Result<Vec<ExchangeRate>> {
        let base = normalize_code(base);
        self.get_json(&format!("/currency/rates/{base}")).await
    }

    async fn convert_remote(&self, request: &ConversionRequest) -> Result<RemoteConversion> {
        self.send_json(Method::POST, "/currency/convert", request)
            .await
    }

    async fn available_currencies(&self) -> Result<Vec<AvailableCurrency>> {
        self.get_json("/currency/available").await
    }
}
