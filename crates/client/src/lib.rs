//! Vitrine HTTP Client
//!
//! A native Rust client for the Vitrine catalog service.
//!
//! # Quick Start
//!
//! ```no_run
//! use vitrine_client::VitrineClient;
//! use vitrine_core::{Filter, Memory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vitrine_client::Error> {
//!     let client = VitrineClient::new("http://localhost:8080")?;
//!     client.login("admin1", "secret").await?;
//!
//!     let filter = Filter::new().max_price_usd(3000.0).min_ram(Memory::gigabytes(8));
//!     let records = client.search_records(&filter).await?.collect_all().await?;
//!     println!("found {} records", records.len());
//!     Ok(())
//! }
//! ```
//!
//! # Authentication
//!
//! [`VitrineClient::login`] stores the issued token in the client, and every
//! later call to a guarded method carries it. Open methods never send it.
//! [`TokenRefresher`] keeps the token fresh in the background.

mod error;
pub mod rating;
pub mod refresh;
pub mod stream;
pub mod upload;

pub use error::Error;
pub use rating::RatingSession;
pub use refresh::{RefreshHandle, TokenRefresher};
pub use stream::RecordStream;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::debug;
use vitrine_core::{
    AUTHORIZATION_METADATA_KEY, CreateRecordRequest, CreateRecordResponse, Filter, LoginRequest,
    LoginResponse, Method, Record, SearchRecordsRequest, TIMEOUT_METADATA_KEY,
};

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the Vitrine catalog service.
///
/// Cloning is cheap; clones share the connection pool and the access token.
#[derive(Debug, Clone)]
pub struct VitrineClient {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
    unary_timeout: Duration,
    call_timeout: Option<Duration>,
}

/// Builder for configuring a [`VitrineClient`].
#[derive(Debug)]
pub struct VitrineClientBuilder {
    base_url: String,
    timeout: Duration,
    call_timeout: Option<Duration>,
    token: Option<String>,
    client: Option<Client>,
}

impl VitrineClientBuilder {
    /// Create a new builder with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            call_timeout: None,
            token: None,
            client: None,
        }
    }

    /// Set the timeout for unary requests.
    ///
    /// Streaming calls are not bounded by it; use
    /// [`call_timeout`](Self::call_timeout) to bound them on the server.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ask the server to abandon every call after `timeout`.
    #[must_use]
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Start with an access token obtained elsewhere.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Use a custom reqwest Client.
    ///
    /// Useful for configuring TLS, proxies, or other advanced settings.
    #[must_use]
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<VitrineClient, Error> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Configuration(format!(
                "base URL must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }

        let client = match self.client {
            Some(c) => c,
            None => Client::builder()
                .build()
                .map_err(|e| Error::Configuration(e.to_string()))?,
        };

        Ok(VitrineClient {
            client,
            base_url: self.base_url,
            token: Arc::new(RwLock::new(self.token)),
            unary_timeout: self.timeout,
            call_timeout: self.call_timeout,
        })
    }
}

impl VitrineClient {
    /// Create a new client with default configuration.
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        VitrineClientBuilder::new(base_url).build()
    }

    /// Create a builder for advanced configuration.
    pub fn builder(base_url: impl Into<String>) -> VitrineClientBuilder {
        VitrineClientBuilder::new(base_url)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The access token currently attached to guarded calls.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Replace the access token attached to guarded calls.
    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    /// Forget the access token.
    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    /// Start a `POST` to `path` for `method`.
    ///
    /// The token is attached only when the method is guarded.
    pub(crate) async fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        let mut req = self.client.post(&url);

        if method.requires_token()
            && let Some(token) = self.token.read().await.as_deref()
        {
            req = req.header(AUTHORIZATION_METADATA_KEY, format!("Bearer {token}"));
        }
        if let Some(timeout) = self.call_timeout {
            req = req.header(TIMEOUT_METADATA_KEY, timeout.as_millis().to_string());
        }
        req
    }

    /// Send a unary request and decode its JSON response.
    async fn send_unary<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, Error> {
        let response = req
            .timeout(self.unary_timeout)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        if response.status().is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| Error::Deserialization(e.to_string()))
        } else {
            Err(error::from_response(response).await)
        }
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Check if the server is healthy.
    pub async fn health(&self) -> Result<bool, Error> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.unary_timeout)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        Ok(response.status().is_success())
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for an access token and keep it for later calls.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> Result<(), vitrine_client::Error> {
    /// use vitrine_client::VitrineClient;
    ///
    /// let client = VitrineClient::new("http://localhost:8080")?;
    /// let login = client.login("user1", "secret").await?;
    /// println!("token valid for {}s", login.expires_in);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, Error> {
        let req = self
            .request(Method::Login, "/v1/auth/login")
            .await
            .json(&LoginRequest {
                username: username.to_owned(),
                password: password.to_owned(),
            });
        let resp: LoginResponse = self.send_unary(req).await?;
        self.set_token(resp.access_token.clone()).await;
        debug!(username, "logged in");
        Ok(resp)
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Store a record and return its ID. Requires the admin role.
    ///
    /// An empty `record.id` asks the server to assign one.
    pub async fn create_record(&self, record: &Record) -> Result<String, Error> {
        let req = self
            .request(Method::CreateRecord, "/v1/records")
            .await
            .json(&CreateRecordRequest {
                record: record.clone(),
            });
        let resp: CreateRecordResponse = self.send_unary(req).await?;
        Ok(resp.id)
    }

    /// Stream every record matching `filter`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> Result<(), vitrine_client::Error> {
    /// use futures::StreamExt;
    /// use vitrine_client::VitrineClient;
    /// use vitrine_core::Filter;
    ///
    /// let client = VitrineClient::new("http://localhost:8080")?;
    /// let mut records = client
    ///     .search_records(&Filter::new().min_cpu_cores(4))
    ///     .await?;
    /// while let Some(record) = records.next().await {
    ///     println!("{}", record?.id);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search_records(&self, filter: &Filter) -> Result<RecordStream, Error> {
        let response = self
            .request(Method::SearchRecords, "/v1/records/search")
            .await
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&SearchRecordsRequest { filter: *filter })
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error::from_response(response).await);
        }
        Ok(stream::record_stream_from_response(response))
    }
}
