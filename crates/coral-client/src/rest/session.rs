//! Authenticated WSAPI session
//!
//! Wraps a reqwest client with session-key authentication, one-shot re-auth
//! on expiry, a retry loop for transient failures, and mapping of HTTP
//! responses into the closed error taxonomy. All session state is internally
//! synchronized; `login` and `logout` must still not be raced with in-flight
//! requests (the array invalidates the old key server-side).

use reqwest::header::{self, HeaderMap};
use reqwest::Method;
use serde_json::{json, Value};
use std::time::SystemTime;
use tokio::sync::{Mutex, RwLock};

use coral_core::config::RestConfig;
use coral_core::{sanitize_certificates, ClientError, ErrorDetails, SessionKey, WsApiVersion};

use super::retry::RetryState;

/// Header carrying the session key on every authenticated request
pub const SESSION_HEADER: &str = "X-CoralStor-Session-Key";

/// Credentials resource, relative to the API base URL
const CREDENTIALS_PATH: &str = "/credentials";

const USER_AGENT: &str = concat!("coral-client/", env!("CARGO_PKG_VERSION"));

/// Timing record for one request
#[derive(Debug, Clone)]
pub struct RequestTiming {
    /// `METHOD url` of the request
    pub label: String,
    /// Wall-clock start
    pub start: SystemTime,
    /// Wall-clock finish
    pub finish: SystemTime,
}

/// Stored credentials, replayed on re-authentication
#[derive(Clone)]
struct Credentials {
    user: String,
    password: String,
    options: Option<Value>,
}

/// Authenticated JSON/HTTPS session with a CoralStor WSAPI
pub struct RestSession {
    config: RestConfig,
    client: reqwest::Client,
    session_key: RwLock<Option<SessionKey>>,
    credentials: RwLock<Option<Credentials>>,
    timings: Mutex<Vec<RequestTiming>>,
}

impl std::fmt::Debug for RestSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestSession").finish_non_exhaustive()
    }
}

impl RestSession {
    /// Build a session for the given WSAPI base URL.
    ///
    /// No network traffic happens here; authentication is explicit via
    /// [`RestSession::login`].
    pub fn new(config: RestConfig) -> Result<Self, ClientError> {
        if !config.secure && !config.suppress_ssl_warnings {
            tracing::warn!(
                api_url = %config.api_url,
                "TLS certificate verification is disabled for this session"
            );
        }

        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.secure);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(map_reqwest_error)?;

        Ok(Self {
            config,
            client,
            session_key: RwLock::new(None),
            credentials: RwLock::new(None),
            timings: Mutex::new(Vec::new()),
        })
    }

    /// The configured API base URL
    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    /// Whether a session key is currently held
    pub async fn has_session(&self) -> bool {
        self.session_key.read().await.is_some()
    }

    /// Authenticate and store the issued session key.
    ///
    /// The credentials are kept so an expired session can be transparently
    /// re-established later.
    pub async fn login(
        &self,
        user: &str,
        password: &str,
        options: Option<Value>,
    ) -> Result<(), ClientError> {
        let mut body = json!({ "user": user, "password": password });
        if let (Value::Object(target), Some(Value::Object(extra))) = (&mut body, &options) {
            for (k, v) in extra {
                target.insert(k.clone(), v.clone());
            }
        }

        let url = format!("{}{}", self.config.api_url, CREDENTIALS_PATH);
        let (_, response) = self.send(Method::POST, &url, Some(&body), true).await?;

        let key = response
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ClientError::InternalError(ErrorDetails {
                    status: 200,
                    body: Some("login response did not include a session key".to_string()),
                    ..ErrorDetails::default()
                })
            })?;

        *self.session_key.write().await = Some(SessionKey::new(key));
        *self.credentials.write().await = Some(Credentials {
            user: user.to_string(),
            password: password.to_string(),
            options,
        });

        tracing::debug!(user, "WSAPI session established");
        Ok(())
    }

    /// Delete the credentials resource and clear the held key.
    ///
    /// The stored credentials are kept: a later request on this session will
    /// re-authenticate on demand.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let key = self.session_key.write().await.take();
        if let Some(key) = key {
            let url = format!(
                "{}{}/{}",
                self.config.api_url,
                CREDENTIALS_PATH,
                key.as_str()
            );
            self.send(Method::DELETE, &url, None, true).await?;
            tracing::debug!("WSAPI session closed");
        }
        Ok(())
    }

    /// Re-invoke `login` with the previously used credentials
    pub async fn reauth(&self) -> Result<(), ClientError> {
        let credentials = self.credentials.read().await.clone();
        let Some(credentials) = credentials else {
            return Err(ClientError::Unauthorized(ErrorDetails {
                status: 401,
                body: Some("no stored credentials to re-authenticate with".to_string()),
                ..ErrorDetails::default()
            }));
        };

        self.login(
            &credentials.user,
            &credentials.password,
            credentials.options.clone(),
        )
        .await
    }

    /// GET a resource
    pub async fn get(&self, path: &str) -> Result<(HeaderMap, Value), ClientError> {
        self.request(Method::GET, path, None).await
    }

    /// POST a body to a resource
    pub async fn post(&self, path: &str, body: &Value) -> Result<(HeaderMap, Value), ClientError> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// PUT a body to a resource
    pub async fn put(&self, path: &str, body: &Value) -> Result<(HeaderMap, Value), ClientError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// DELETE a resource
    pub async fn delete(&self, path: &str) -> Result<(HeaderMap, Value), ClientError> {
        self.request(Method::DELETE, path, None).await
    }

    /// Perform an authenticated request with re-auth and retry.
    ///
    /// `path` is relative to the API base URL. Exactly one re-auth is
    /// attempted per originating call when the array answers unauthorized or
    /// forbidden; transient failures are retried per the configured policy.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<(HeaderMap, Value), ClientError> {
        let url = format!("{}{}", self.config.api_url, path);
        let mut retry = RetryState::new(&self.config.retry);

        loop {
            let result = self.request_with_reauth(method.clone(), &url, body).await;
            match result {
                Err(err) if err.is_retryable() => match retry.next_delay() {
                    Some(delay) => {
                        tracing::warn!(
                            %method,
                            url = %url,
                            error = %err,
                            tries_left = retry.tries_left(),
                            "transient WSAPI failure, retrying in {:?}",
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(err),
                },
                other => return other,
            }
        }
    }

    /// One attempt plus at most one re-auth.
    ///
    /// Authentication calls themselves go through [`RestSession::send`] with
    /// the auth flag set and can never recurse back here.
    async fn request_with_reauth(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<(HeaderMap, Value), ClientError> {
        match self.send(method.clone(), url, body, false).await {
            Err(err) if err.is_auth_failure() && self.credentials.read().await.is_some() => {
                tracing::info!(error = %err, "session rejected, re-authenticating once");
                self.reauth().await?;
                self.send(method, url, body, false).await
            }
            other => other,
        }
    }

    /// Fetch the WSAPI version from the unauthenticated version endpoint.
    ///
    /// The endpoint lives at `/api`, one level above the versioned base URL.
    pub async fn ws_api_version(&self) -> Result<WsApiVersion, ClientError> {
        let root = self
            .config
            .api_url
            .rsplit_once("/api")
            .map(|(head, _)| head)
            .unwrap_or(self.config.api_url.as_str());
        let url = format!("{root}/api");

        let (_, body) = self.send(Method::GET, &url, None, true).await?;
        serde_json::from_value(body).map_err(|e| {
            ClientError::InternalError(ErrorDetails {
                status: 200,
                body: Some(format!("malformed version response: {e}")),
                ..ErrorDetails::default()
            })
        })
    }

    /// Single HTTP exchange: sign, send, decode, map errors.
    ///
    /// `is_auth` marks authentication traffic: no session header is attached
    /// and the caller will not attempt re-auth on its failure.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        is_auth: bool,
    ) -> Result<(HeaderMap, Value), ClientError> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        if !is_auth {
            if let Some(key) = self.session_key.read().await.as_ref() {
                request = request.header(SESSION_HEADER, key.as_str());
            }
        }

        if self.config.http_log_debug {
            tracing::debug!(%method, url, body = ?body, "WSAPI request");
        }

        let start = SystemTime::now();
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(map_reqwest_error)?;
        self.record_timing(format!("{method} {url}"), start).await;

        if self.config.http_log_debug {
            tracing::debug!(
                status,
                body = %sanitize_certificates(&text),
                "WSAPI response"
            );
        }

        if status >= 400 {
            return Err(ClientError::from_http(status, &text));
        }

        let parsed = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok((headers, parsed))
    }

    /// Snapshot of the timing records collected so far.
    ///
    /// Every request is timed; callers profiling a workload should
    /// [`reset_timings`](RestSession::reset_timings) between runs.
    pub async fn timings(&self) -> Vec<RequestTiming> {
        self.timings.lock().await.clone()
    }

    /// Discard all collected timings
    pub async fn reset_timings(&self) {
        self.timings.lock().await.clear();
    }

    async fn record_timing(&self, label: String, start: SystemTime) {
        self.timings.lock().await.push(RequestTiming {
            label,
            start,
            finish: SystemTime::now(),
        });
    }
}

/// Map a reqwest failure into the taxonomy without losing the reason
fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    let reason = err.to_string();
    if err.is_timeout() {
        return ClientError::Timeout(reason);
    }
    if err.is_redirect() {
        return ClientError::TooManyRedirects(reason);
    }

    let chain = error_chain(&err).to_lowercase();
    if chain.contains("certificate") || chain.contains("tls") || chain.contains("ssl") {
        return ClientError::SslFailure(reason);
    }
    ClientError::ConnectionError(reason)
}

/// Full source chain of an error, for classification
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}
