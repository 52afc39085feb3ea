//! Authenticated HTTP client shared by every domain service.
//!
//! Each call runs through the same pipeline:
//! 1. The stored access token is attached as a bearer credential
//! 2. 2xx bodies are normalised into an [`ApiResponse`] envelope and a
//!    `success: false` envelope is turned into [`ApiError::Business`]
//! 3. A 401 on a request that has not been retried yet triggers a token
//!    refresh (one per episode, see [`RefreshCoordinator`]) and a single retry
//! 4. Terminal failures other than business rejections are reported to the
//!    [`Notifier`] before being returned to the caller

use crate::api::common::{ApiResponse, classify_failure};
use crate::api::notifier::Notifier;
use crate::api::refresh::{RefreshCoordinator, RefreshGuard, RefreshTicket};
use crate::api::transport::{HttpRequest, ReqwestTransport, Transport};
use crate::auth::models::{JwtResponse, RefreshTokenRequest};
use crate::config::ClientConfig;
use crate::errors::{ApiError, ApiResult, SESSION_EXPIRED_MESSAGE};
use crate::session::SessionStore;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Endpoint exchanging a refresh token for a new access token.
pub const REFRESH_TOKEN_PATH: &str = "/auth/refresh-token";

/// A call as issued by a domain service, before the bearer is attached.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    anonymous: bool,
    no_refresh: bool,
    retried: bool,
    /// Replaces the backend's message when the call is rejected with 401
    unauthorized_message: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            anonymous: false,
            no_refresh: false,
            retried: false,
            unauthorized_message: None,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query.extend(query);
        self
    }

    #[must_use]
    pub fn with_param(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::internal(format!("Failed to encode request body: {}", e)))?;
        self.body = Some(body);
        Ok(self)
    }

    /// Sends without credentials; a 401 is final instead of
    /// starting a refresh. Used for the credential endpoints themselves.
    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self.no_refresh = true;
        self
    }

    /// Keeps the bearer but treats a 401 as final. For calls where 401 means
    /// "wrong credentials in the body", not "expired token".
    #[must_use]
    pub fn no_refresh(mut self) -> Self {
        self.no_refresh = true;
        self
    }

    /// Message reported and returned when the call ends with a 401.
    #[must_use]
    pub fn with_unauthorized_message(mut self, message: impl Into<String>) -> Self {
        self.unauthorized_message = Some(message.into());
        self
    }

    fn can_refresh(&self) -> bool {
        !self.no_refresh && !self.retried
    }

    fn rename_unauthorized(&self, error: ApiError) -> ApiError {
        match &self.unauthorized_message {
            Some(message) if matches!(error, ApiError::Unauthorized { .. }) => {
                ApiError::unauthorized(message.clone())
            }
            _ => error,
        }
    }
}

pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
    refresh: RefreshCoordinator,
}

impl ApiClient {
    /// Creates a client talking to the configured backend over reqwest.
    pub fn new(
        config: ClientConfig,
        session: Arc<SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> ApiResult<Self> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::with_transport(
            config,
            Arc::new(transport),
            session,
            notifier,
        ))
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        session: Arc<SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            transport,
            session,
            notifier,
            refresh: RefreshCoordinator::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<ApiResponse<T>> {
        self.send(ApiRequest::new(Method::GET, path)).await
    }

    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> ApiResult<ApiResponse<T>> {
        self.send(ApiRequest::new(Method::GET, path).with_query(query))
            .await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<ApiResponse<T>> {
        self.send(ApiRequest::new(Method::POST, path).with_json(body)?)
            .await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<ApiResponse<T>> {
        self.send(ApiRequest::new(Method::POST, path)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<ApiResponse<T>> {
        self.send(ApiRequest::new(Method::PUT, path).with_json(body)?)
            .await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<ApiResponse<T>> {
        self.send(ApiRequest::new(Method::PATCH, path).with_json(body)?)
            .await
    }

    pub async fn patch_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<ApiResponse<T>> {
        self.send(ApiRequest::new(Method::PATCH, path)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<ApiResponse<T>> {
        self.send(ApiRequest::new(Method::DELETE, path)).await
    }

    /// Runs the pipeline and decodes the payload into `T`.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<ApiResponse<T>> {
        self.execute(request).await?.into_typed()
    }

    /// Runs the full pipeline and returns the normalised envelope.
    pub async fn execute(&self, request: ApiRequest) -> ApiResult<ApiResponse<Value>> {
        let bearer = if request.anonymous {
            None
        } else {
            self.session.access_token()
        };

        match self.send_once(&request, bearer.clone()).await {
            Err(ApiError::Unauthorized { .. }) if request.can_refresh() => {
                self.refresh_and_retry(request, bearer).await
            }
            Err(error) => {
                let error = request.rename_unauthorized(error);
                self.report(&error);
                Err(error)
            }
            Ok(response) => Ok(response),
        }
    }

    async fn send_once(
        &self,
        request: &ApiRequest,
        bearer: Option<String>,
    ) -> ApiResult<ApiResponse<Value>> {
        let http_request = HttpRequest {
            method: request.method.clone(),
            url: self.config.endpoint(&request.path),
            query: request.query.clone(),
            body: request.body.clone(),
            bearer,
        };

        let response = self.transport.send(http_request).await?;
        debug!(
            "{} {} -> {}",
            request.method, request.path, response.status
        );

        if response.is_success() {
            ApiResponse::from_text(&response.body)?.into_result()
        } else {
            Err(classify_failure(response.status, &response.body))
        }
    }

    async fn refresh_and_retry(
        &self,
        mut request: ApiRequest,
        sent_with: Option<String>,
    ) -> ApiResult<ApiResponse<Value>> {
        request.retried = true;

        let token = match self.session.access_token() {
            // A refresh finished while this request was in flight.
            Some(current) if sent_with.as_deref() != Some(current.as_str()) => current,
            // The leader reports a failed refresh once for the whole episode.
            _ => match self.refresh.enter() {
                RefreshTicket::Leader(guard) => self.lead_refresh(guard).await?,
                RefreshTicket::Waiter(waiter) => waiter.wait().await?,
            },
        };

        debug!(
            "Retrying {} {} with refreshed token",
            request.method, request.path
        );
        let result = self
            .send_once(&request, Some(token))
            .await
            .map_err(|error| request.rename_unauthorized(error));
        if let Err(error) = &result {
            self.report(error);
        }
        result
    }

    async fn lead_refresh(&self, guard: RefreshGuard<'_>) -> ApiResult<String> {
        let Some(refresh_token) = self.session.refresh_token() else {
            warn!("Access token rejected and no refresh token is stored");
            let error = ApiError::session_expired();
            guard.reject(&error);
            self.expire_session();
            return Err(error);
        };

        match self.request_new_token(&refresh_token).await {
            Ok(bundle) => {
                let token = bundle.token.unwrap_or_default();
                if let Err(e) = self
                    .session
                    .update_tokens(&token, bundle.refresh_token.as_deref())
                {
                    warn!("Failed to persist refreshed tokens: {}", e);
                }

                let released = guard.resolve(&token);
                info!(
                    "Access token refreshed, releasing {} queued request(s)",
                    released
                );
                Ok(token)
            }
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                let error = ApiError::SessionExpired {
                    message: format!("{} ({})", SESSION_EXPIRED_MESSAGE, e),
                };
                guard.reject(&error);
                self.expire_session();
                Err(error)
            }
        }
    }

    /// Calls the refresh endpoint directly, bypassing the pipeline so a
    /// rejected refresh can never start another refresh.
    async fn request_new_token(&self, refresh_token: &str) -> ApiResult<JwtResponse> {
        let body = serde_json::to_value(RefreshTokenRequest {
            refresh_token: refresh_token.to_string(),
        })?;
        let request = HttpRequest {
            method: Method::POST,
            url: self.config.endpoint(REFRESH_TOKEN_PATH),
            query: Vec::new(),
            body: Some(body),
            bearer: None,
        };

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(classify_failure(response.status, &response.body));
        }

        ApiResponse::from_text(&response.body)?
            .into_result()?
            .into_typed::<JwtResponse>()?
            .data
            .filter(|bundle| bundle.token.as_deref().is_some_and(|t| !t.is_empty()))
            .ok_or_else(|| ApiError::invalid_response("Refresh response carried no token"))
    }

    fn expire_session(&self) {
        if let Err(e) = self.session.clear() {
            warn!("Failed to clear session: {}", e);
        }
        self.notifier.error(SESSION_EXPIRED_MESSAGE);
        self.notifier
            .redirect_to_login(self.config.login_redirect_delay);
    }

    fn report(&self, error: &ApiError) {
        match error {
            // Business rejections are rendered by the caller; an expired
            // session has already been reported by the refresh leader.
            ApiError::Business { .. } | ApiError::SessionExpired { .. } => {}
            _ => {
                warn!("Request failed: {}", error);
                self.notifier.error(&error.user_message());
            }
        }
    }
}
