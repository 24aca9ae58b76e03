use reqwest::Client;
use tracing::info;

use crate::error::GatewayError;
use crate::gateway::{check_status, decode};
use crate::models::{LoginRequest, RegisterRequest, TokenResponse};
use crate::session::Session;

/// Obtains bearer tokens from the auth endpoints.
#[derive(Clone, Debug)]
pub struct AuthClient {
    base_url: String,
    http: Client,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, GatewayError> {
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let res = self
            .http
            .post(format!("{}/api/v1/auth/login", self.base_url))
            .json(&req)
            .send()
            .await?;
        let res = check_status(res, "Invalid credentials", false).await?;
        let TokenResponse { token } = decode(res).await?;
        info!("User logged in");
        Ok(token)
    }

    /// Creates the account, then logs in with the same credentials.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, GatewayError> {
        let req = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let res = self
            .http
            .post(format!("{}/api/v1/auth/register", self.base_url))
            .json(&req)
            .send()
            .await?;
        check_status(res, "Registration failed", false).await?;
        info!("User registered");
        self.login(email, password).await
    }

    pub async fn sign_in(
        &self,
        session: &Session,
        email: &str,
        password: &str,
    ) -> Result<(), GatewayError> {
        let token = self.login(email, password).await?;
        session.sign_in(token);
        Ok(())
    }
}
