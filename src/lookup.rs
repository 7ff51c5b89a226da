//! Food name to calorie resolution through the Spoonacular ingredient API.
//!
//! The HTTP calls sit behind [`NutritionSource`] so the resolution rules and
//! the key rotation in [`NutritionLookup`] can be exercised without a network.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

pub const SUGGESTION_LIMIT: u8 = 5;
pub const SUGGESTION_MIN_CHARS: usize = 2;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("No results for \"{0}\".")]
    NoMatch(String),
    #[error("API key exhausted. Switched to next key.")]
    QuotaExceeded,
    #[error("no nutrition API keys configured")]
    NoCredentials,
    #[error("nutrition API responded with status {0}")]
    Upstream(u16),
    #[error("nutrition API request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngredientHit {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<IngredientHit>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Nutrient {
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Nutrition {
    #[serde(default)]
    pub nutrients: Vec<Nutrient>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IngredientInformation {
    #[serde(default)]
    pub nutrition: Option<Nutrition>,
}

impl IngredientInformation {
    pub fn calories(&self) -> f64 {
        self.nutrition
            .as_ref()
            .and_then(|nutrition| {
                nutrition
                    .nutrients
                    .iter()
                    .find(|nutrient| nutrient.name.eq_ignore_ascii_case("calories"))
            })
            .map_or(0.0, |nutrient| nutrient.amount)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFood {
    pub name: String,
    pub calories: f64,
    pub image_url: Option<String>,
}

#[async_trait]
pub trait NutritionSource: Send + Sync {
    async fn search(
        &self,
        api_key: &str,
        query: &str,
        number: u8,
    ) -> Result<Vec<IngredientHit>, LookupError>;

    async fn information(
        &self,
        api_key: &str,
        ingredient_id: i64,
        amount: f64,
        unit: &str,
    ) -> Result<IngredientInformation, LookupError>;
}

/// Round-robin pool of API keys.
#[derive(Debug, Clone)]
pub struct CredentialPool {
    keys: Vec<String>,
    index: usize,
}

impl CredentialPool {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys = keys
            .into_iter()
            .map(Into::into)
            .map(|key: String| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect();
        Self { keys, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn current(&self) -> Option<&str> {
        self.keys.get(self.index).map(String::as_str)
    }

    /// Marks the current key as exhausted and moves to the next one, wrapping
    /// around at the end. Returns the new current key.
    pub fn mark_exhausted_and_advance(&mut self) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.keys.len();
        self.current()
    }
}

pub struct NutritionLookup {
    source: Arc<dyn NutritionSource>,
    pool: Mutex<CredentialPool>,
    image_base_url: String,
}

impl NutritionLookup {
    pub fn new(
        source: Arc<dyn NutritionSource>,
        pool: CredentialPool,
        image_base_url: impl Into<String>,
    ) -> Self {
        Self {
            source,
            pool: Mutex::new(pool),
            image_base_url: image_base_url.into(),
        }
    }

    pub async fn current_key(&self) -> Option<String> {
        self.pool.lock().await.current().map(str::to_string)
    }

    pub async fn resolve(
        &self,
        name: &str,
        amount: f64,
        unit: &str,
    ) -> Result<ResolvedFood, LookupError> {
        self.with_rotation(|key| async move { self.resolve_with_key(&key, name, amount, unit).await })
            .await
    }

    /// Up to five ingredient names for a partially typed query.
    pub async fn suggest(&self, query: &str) -> Result<Vec<String>, LookupError> {
        let query = query.trim();
        if query.chars().count() < SUGGESTION_MIN_CHARS {
            return Ok(Vec::new());
        }
        let hits = self
            .with_rotation(|key| async move {
                self.source.search(&key, query, SUGGESTION_LIMIT).await
            })
            .await?;
        Ok(hits.into_iter().map(|hit| hit.name).collect())
    }

    async fn resolve_with_key(
        &self,
        key: &str,
        name: &str,
        amount: f64,
        unit: &str,
    ) -> Result<ResolvedFood, LookupError> {
        let hit = self
            .source
            .search(key, name, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::NoMatch(name.to_string()))?;

        let info = self.source.information(key, hit.id, amount, unit).await?;
        let image_url = hit
            .image
            .filter(|image| !image.is_empty())
            .map(|image| format!("{}/{}", self.image_base_url.trim_end_matches('/'), image));

        Ok(ResolvedFood {
            name: hit.name,
            calories: info.calories().round(),
            image_url,
        })
    }

    /// Runs `op` with the current key. A quota error rotates the pool and the
    /// call is retried once with the next key; a second quota error rotates
    /// again and is returned.
    async fn with_rotation<T, F, Fut>(&self, op: F) -> Result<T, LookupError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, LookupError>>,
    {
        let key = self.current_key().await.ok_or(LookupError::NoCredentials)?;
        match op(key.clone()).await {
            Err(LookupError::QuotaExceeded) => match self.rotate_from(&key).await {
                Some(next) if next != key => match op(next.clone()).await {
                    Err(LookupError::QuotaExceeded) => {
                        self.rotate_from(&next).await;
                        Err(LookupError::QuotaExceeded)
                    }
                    other => other,
                },
                _ => Err(LookupError::QuotaExceeded),
            },
            other => other,
        }
    }

    /// Advances past `failed` unless a concurrent call already did, and
    /// returns the key now in use.
    async fn rotate_from(&self, failed: &str) -> Option<String> {
        let mut pool = self.pool.lock().await;
        if pool.current() == Some(failed) {
            pool.mark_exhausted_and_advance();
            warn!(keys = pool.len(), "nutrition API quota exhausted; rotated to next key");
        }
        pool.current().map(str::to_string)
    }
}

pub struct SpoonacularClient {
    http: reqwest::Client,
    base_url: String,
}

impl SpoonacularClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T>(&self, url: &str, params: &[(&str, String)]) -> Result<T, LookupError>
    where
        T: serde::de::DeserializeOwned,
    {
        debug!(%url, "nutrition API request");
        let response = self.http.get(url).query(params).send().await?;
        let status = response.status();
        if status == StatusCode::PAYMENT_REQUIRED || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LookupError::QuotaExceeded);
        }
        if !status.is_success() {
            error!(%status, %url, "nutrition API request failed");
            return Err(LookupError::Upstream(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl NutritionSource for SpoonacularClient {
    async fn search(
        &self,
        api_key: &str,
        query: &str,
        number: u8,
    ) -> Result<Vec<IngredientHit>, LookupError> {
        let url = format!("{}/food/ingredients/search", self.base_url);
        let params = [
            ("query", query.to_string()),
            ("number", number.to_string()),
            ("apiKey", api_key.to_string()),
        ];
        let body: SearchResponse = self.get_json(&url, &params).await?;
        Ok(body.results)
    }

    async fn information(
        &self,
        api_key: &str,
        ingredient_id: i64,
        amount: f64,
        unit: &str,
    ) -> Result<IngredientInformation, LookupError> {
        let url = format!("{}/food/ingredients/{}/information", self.base_url, ingredient_id);
        let params = [
            ("amount", amount.to_string()),
            ("unit", unit.to_string()),
            ("apiKey", api_key.to_string()),
        ];
        self.get_json(&url, &params).await
    }
}
