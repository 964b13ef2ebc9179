use crate::auth::credential::{Credential, SessionToken, SESSION_COOKIE};
use crate::config::Config;
use crate::error::AuthError;
use reqwest::{header::COOKIE, Client};
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Exchanges a credential pair for a session token at the login endpoint.
#[derive(Debug, Clone)]
pub struct SessionAuthenticator {
    client: Client,
    login_url: String,
    remember_me: bool,
    timeout: Duration,
}

impl SessionAuthenticator {
    pub fn new(config: &Config) -> Result<Self, AuthError> {
        Self::with_endpoint(&config.login_url, config.remember_me, config.login_timeout())
    }

    pub fn with_endpoint(
        login_url: impl Into<String>,
        remember_me: bool,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        let client = Client::builder().build().map_err(AuthError::Client)?;

        Ok(Self {
            client,
            login_url: login_url.into(),
            remember_me,
            timeout,
        })
    }

    /// POST the credential and return the `SessionID` cookie the server sets.
    ///
    /// A response without the cookie is an error carrying the status and body,
    /// whatever the status code was.
    pub async fn login(&self, credential: &Credential) -> Result<SessionToken, AuthError> {
        let body = json!({
            "Email": credential.email,
            "Password": credential.password.expose(),
            "RememberMe": self.remember_me,
        });

        info!(url=%self.login_url, email=%credential.email, "Logging in");

        self.with_timeout(self.post_login(&body)).await
    }

    /// End the session server-side. The login endpoint treats DELETE as logout.
    pub async fn logout(&self, token: &SessionToken) -> Result<(), AuthError> {
        info!(url=%self.login_url, "Logging out");

        self.with_timeout(self.send_logout(token)).await
    }

    async fn post_login(&self, body: &Value) -> Result<SessionToken, AuthError> {
        let response = self.client.post(&self.login_url).json(body).send().await?;
        let status = response.status();

        info!(status=%status, "Login response received");

        let session_id = response
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string());

        match session_id {
            Some(value) if !value.is_empty() => {
                debug!(session_id=%value, "Session cookie issued");
                Ok(SessionToken::new(value))
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                warn!(status=%status, body=%body, "Login response has no SessionID cookie");
                Err(AuthError::MissingSessionCookie { status, body })
            }
        }
    }

    async fn send_logout(&self, token: &SessionToken) -> Result<(), AuthError> {
        let response = self
            .client
            .delete(&self.login_url)
            .header(COOKIE, token.cookie_header())
            .send()
            .await?;
        let status = response.status();

        if status.is_success() {
            info!(status=%status, "Logged out");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status=%status, body=%body, "Logout rejected");
        Err(AuthError::Logout { status, body })
    }

    async fn with_timeout<T, F>(&self, request: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, AuthError>>,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(inner_result) => inner_result,
            Err(_) => {
                error!(url=%self.login_url, timeout=?self.timeout, "Login endpoint timed out");
                Err(AuthError::Timeout(self.timeout))
            }
        }
    }
}
