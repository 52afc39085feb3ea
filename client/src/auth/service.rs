//! Session actions: login, registration, logout and password management.

use crate::api::client::{ApiClient, ApiRequest};
use crate::auth::models::*;
use crate::errors::{ApiError, ApiResult, validation_errors_to_api_error};
use crate::session::{Session, SessionStore};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use validator::Validate;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";
pub const ACCOUNT_LOCKED_MESSAGE: &str =
    "Your account has been locked. Please contact an administrator.";
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to perform this action";
pub const WRONG_PASSWORD_MESSAGE: &str = "Current password is incorrect";

/// Authentication service driving the shared [`SessionStore`]
pub struct AuthService {
    client: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.client.session()
    }

    /// Authenticates the user and stores the resulting session.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        request.validate().map_err(validation_errors_to_api_error)?;

        debug!("Logging in as {}", username);
        let response = self
            .client
            .execute(
                ApiRequest::new(Method::POST, "/auth/login")
                    .with_json(&request)?
                    .anonymous()
                    .with_unauthorized_message(INVALID_CREDENTIALS_MESSAGE),
            )
            .await
            .map_err(|error| match error {
                ApiError::Forbidden { .. } => ApiError::Forbidden {
                    message: ACCOUNT_LOCKED_MESSAGE.to_string(),
                },
                other => other,
            })?;

        let bundle = token_bundle(response.data)?;
        let login = self.start_session(bundle, None)?;
        info!("Logged in as {}", login.user.username);
        Ok(login)
    }

    /// Creates an account and logs it in.
    pub async fn register(&self, request: RegisterRequest) -> ApiResult<LoginResponse> {
        request.validate().map_err(validation_errors_to_api_error)?;

        debug!("Registering {}", request.username);
        let response = self
            .client
            .execute(
                ApiRequest::new(Method::POST, "/auth/register")
                    .with_json(&request)?
                    .anonymous(),
            )
            .await?;

        let bundle = token_bundle(response.data)?;
        let login = self.start_session(bundle, Some(&request.full_name))?;
        info!("Registered {}", login.user.username);
        Ok(login)
    }

    /// Forgets the session and every cached piece of application data, then
    /// sends the user back to the login screen.
    pub fn logout(&self) -> ApiResult<()> {
        info!("Logging out");
        self.session().clear_all()?;
        self.client.notifier().redirect_to_login(Duration::ZERO);
        Ok(())
    }

    /// Changes the password of the logged-in user. Returns the backend's message.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> ApiResult<String> {
        if self.session().access_token().is_none() {
            return Err(ApiError::unauthorized(LOGIN_REQUIRED_MESSAGE));
        }

        let request = ChangePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        request.validate().map_err(validation_errors_to_api_error)?;

        // The backend answers a wrong current password with 401.
        let response = self
            .client
            .execute(
                ApiRequest::new(Method::POST, "/auth/change-password")
                    .with_json(&request)?
                    .no_refresh()
                    .with_unauthorized_message(WRONG_PASSWORD_MESSAGE),
            )
            .await?;

        Ok(non_empty_or(response.message, "Password changed successfully"))
    }

    /// Replaces an expired password and stores the session the backend returns.
    pub async fn change_expired_password(
        &self,
        request: ChangeExpiredPasswordRequest,
    ) -> ApiResult<LoginResponse> {
        request.validate().map_err(validation_errors_to_api_error)?;
        if request.new_password != request.confirm_new_password {
            return Err(ApiError::validation(
                "New password and confirmation do not match",
            ));
        }

        let response = self
            .client
            .execute(
                ApiRequest::new(Method::POST, "/auth/change-password-expired")
                    .with_json(&request)?
                    .anonymous(),
            )
            .await?;

        let bundle = token_bundle(response.data)?;
        self.start_session(bundle, None)
    }

    /// Asks the backend whether the stored token is still accepted, adopting
    /// any token pair it hands back. Never fails: problems read as `false`.
    pub async fn validate_token(&self) -> bool {
        let Some(token) = self.session().access_token() else {
            debug!("No token to validate");
            return false;
        };
        if !self.session().is_authenticated() {
            debug!("Stored token has expired");
            return false;
        }

        let request = ApiRequest::new(Method::GET, "/auth/validate-token").with_param("token", &token);
        match self.client.send::<JwtResponse>(request).await {
            Ok(response) => match response.data.and_then(|bundle| {
                bundle.token.clone().map(|token| (token, bundle.refresh_token))
            }) {
                Some((token, refresh_token)) => {
                    if let Err(e) = self
                        .session()
                        .update_tokens(&token, refresh_token.as_deref())
                    {
                        warn!("Failed to store validated token: {}", e);
                    }
                    true
                }
                None => false,
            },
            Err(e) => {
                warn!("Token validation failed: {}", e);
                false
            }
        }
    }

    /// Fetches the profile of the logged-in user and stores it with the session.
    pub async fn current_user(&self) -> ApiResult<Option<UserProfile>> {
        let response = self.client.get::<UserProfile>("/auth/current-user").await?;

        if let Some(user) = &response.data {
            self.session().set_user(user.clone())?;
        }
        Ok(response.data)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn has_permission(&self, role: &str) -> bool {
        self.session().has_permission(role)
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        self.session().has_any_role(roles)
    }

    fn start_session(
        &self,
        bundle: JwtResponse,
        fallback_full_name: Option<&str>,
    ) -> ApiResult<LoginResponse> {
        let mut user = bundle.profile();
        if user.full_name.is_empty() {
            if let Some(full_name) = fallback_full_name {
                user.full_name = full_name.to_string();
            }
        }

        let token = bundle
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::invalid_response("No authentication token in response"))?;

        self.session().set_session(Session {
            access_token: Some(token.clone()),
            refresh_token: bundle.refresh_token.clone(),
            user: Some(user.clone()),
        })?;

        Ok(LoginResponse {
            token,
            refresh_token: bundle.refresh_token,
            user,
        })
    }
}

/// Reads the token bundle from a login-style payload.
///
/// The payload is either the bundle itself or a nested
/// `{success, message, data: bundle}` login result.
fn token_bundle(data: Option<Value>) -> ApiResult<JwtResponse> {
    let data = data.ok_or_else(|| ApiError::invalid_response("No data in response"))?;

    let nested = data.get("token").is_none() && data.get("data").is_some_and(Value::is_object);
    let data = if nested {
        if data.get("success").and_then(Value::as_bool) == Some(false) {
            let message = data
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Login failed");
            let error_code = data
                .get("errorCode")
                .and_then(Value::as_str)
                .map(str::to_string);
            return Err(ApiError::business(message, error_code));
        }
        data.get("data").cloned().unwrap_or(Value::Null)
    } else {
        data
    };

    serde_json::from_value(data)
        .map_err(|e| ApiError::invalid_response(format!("Malformed token bundle: {}", e)))
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.is_empty() || message == crate::api::common::WRAPPED_MESSAGE {
        fallback.to_string()
    } else {
        message
    }
}
