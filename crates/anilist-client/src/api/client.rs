//! AniList GraphQL client with a request cache in front of reads.

use super::types::{GraphQlResponse, Viewer, ViewerData};
use crate::cache::{Epoch, RequestCache, SetOutcome};
use crate::query::template::VIEWER;
use crate::query::{build, BuildOptions, BuiltQuery, MediaFilter};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::{json, Value};
use shared::Config;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default GraphQL endpoint
pub const ANILIST_URL: &str = "https://graphql.anilist.co";

/// AniList GraphQL client
pub struct AnilistClient {
    /// HTTP client
    client: Client,
    /// GraphQL endpoint
    url: String,
    /// Access token of the logged-in user
    token: Option<String>,
    /// Name of the logged-in user
    user: Option<String>,
    /// Response cache, if enabled
    cache: Option<RequestCache>,
    /// Number of mutations sent this session
    epoch: Epoch,
}

impl AnilistClient {
    /// Create a new client
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
        cache: Option<RequestCache>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
            token: None,
            user: None,
            cache,
            epoch: 0,
        })
    }

    /// Create a client from configuration, opening the cache if enabled
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = if config.cache.enabled {
            let path = config.cache_path();
            Some(
                RequestCache::open(&path, config.cache.ttl_ms)
                    .with_context(|| format!("Failed to open request cache at {}", path.display()))?,
            )
        } else {
            None
        };

        Self::new(
            config.api.url.clone(),
            Duration::from_secs(config.api.timeout_secs),
            &config.api.user_agent,
            cache,
        )
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Current mutation epoch
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn cache(&self) -> Option<&RequestCache> {
        self.cache.as_ref()
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("Access token is not a valid header value")?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// POST a query
    ///
    /// Returns `None` when the endpoint answers with a non-success status.
    /// The body of such a response is not inspected.
    async fn post(&self, query: &str, variables: &Value, headers: HeaderMap) -> Result<Option<Value>> {
        debug!(url = %self.url, "Making API request");

        let response = self
            .client
            .post(&self.url)
            .headers(headers)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, status = %status, "Request failed");
            return Ok(None);
        }

        let body = response
            .json::<Value>()
            .await
            .context("Failed to parse response")?;

        debug!(url = %self.url, "Request successful");
        Ok(Some(body))
    }

    /// Log in with an existing access token
    ///
    /// The token is kept only if the endpoint accepts it.
    pub async fn login(&mut self, token: impl Into<String>) -> Result<Option<Viewer>> {
        let previous = self.token.replace(token.into());

        let built = build(&VIEWER, &MediaFilter::default(), None, BuildOptions::default())?;
        let body = match self.post(&built.query, &json!({}), self.headers()?).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                self.token = previous;
                return Ok(None);
            }
            Err(e) => {
                self.token = previous;
                return Err(e);
            }
        };

        let response: GraphQlResponse<ViewerData> =
            serde_json::from_value(body).context("Failed to parse viewer response")?;
        let Some(data) = response.data else {
            warn!("Login rejected");
            self.token = previous;
            return Ok(None);
        };

        info!(user = %data.viewer.name, "Logged in");
        self.user = Some(data.viewer.name.clone());
        Ok(Some(data.viewer))
    }

    /// Forget the access token and user
    pub fn logout(&mut self) {
        self.token = None;
        self.user = None;
    }

    /// Run a read query, answering from the cache when possible
    pub async fn query(&self, built: &BuiltQuery) -> Result<Option<Value>> {
        if let Some(cache) = &self.cache {
            if let Some(entry) = cache.get(&built.query, &built.variables, self.user(), self.epoch)? {
                debug!(epoch = self.epoch, "Serving response from cache");
                return Ok(Some(entry.data));
            }
        }

        let variables = Value::Object(built.variables.clone());
        let Some(body) = self.post(&built.query, &variables, self.headers()?).await? else {
            return Ok(None);
        };

        if let Some(cache) = &self.cache {
            let outcome = cache.set(&built.query, &built.variables, self.user(), &body, self.epoch)?;
            if outcome == SetOutcome::AlreadyExists {
                debug!("Response already cached");
            }
        }

        Ok(Some(body))
    }

    /// Run a mutation as the logged-in user
    ///
    /// Mutations bypass the cache. Sending one moves the epoch forward and
    /// purges every cached read written under an older epoch, so later
    /// sessions sharing the cache file cannot see them either.
    pub async fn mutate(&mut self, built: &BuiltQuery) -> Result<Option<Value>> {
        let headers = self.headers()?;
        let variables = Value::Object(built.variables.clone());
        let result = self.post(&built.query, &variables, headers).await;

        self.epoch += 1;
        debug!(epoch = self.epoch, "Mutation sent, epoch advanced");

        if let Some(cache) = &self.cache {
            cache
                .purge_expired(self.epoch)
                .context("Failed to purge cache after mutation")?;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_client_creation() {
        let client = AnilistClient::new(ANILIST_URL, Duration::from_secs(30), "test-agent", None);
        assert!(client.is_ok());

        let client = client.unwrap();
        assert!(!client.is_authenticated());
        assert_eq!(client.user(), None);
        assert_eq!(client.epoch(), 0);
    }

    #[test]
    fn test_from_config_opens_cache() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let mut config = Config::default();
        config.data.root_dir = temp_dir.path().to_string_lossy().to_string();

        let client = AnilistClient::from_config(&config)?;
        assert!(client.cache().is_some());
        assert!(config.cache_path().exists());

        config.cache.enabled = false;
        let client = AnilistClient::from_config(&config)?;
        assert!(client.cache().is_none());

        Ok(())
    }

    #[test]
    fn test_authorization_header() -> Result<()> {
        let mut client = AnilistClient::new(ANILIST_URL, Duration::from_secs(30), "test-agent", None)?;
        assert!(client.headers()?.get(AUTHORIZATION).is_none());

        client.token = Some("abc".to_string());
        assert_eq!(client.headers()?.get(AUTHORIZATION).unwrap(), "Bearer abc");

        client.logout();
        assert!(!client.is_authenticated());

        Ok(())
    }
}
