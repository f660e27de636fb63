//! Google OAuth client
//!
//! Builds the consent URL, exchanges authorization codes and reads the
//! signed-in user's profile. All outbound calls share one bounded client.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::auth::models::GoogleProfile;
use crate::config::GoogleConfig;
use crate::error::AppError;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

const SCOPES: &str = "https://www.googleapis.com/auth/userinfo.email \
https://www.googleapis.com/auth/userinfo.profile openid";

#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
}

pub struct GoogleOAuthClient {
    client: Client,
    config: GoogleConfig,
}

impl GoogleOAuthClient {
    pub fn new(config: GoogleConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs.max(1)))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        !self.config.client_id.is_empty()
    }

    pub fn frontend_url(&self) -> &str {
        &self.config.frontend_url
    }

    /// Consent page URL carrying the anti-forgery `state`
    pub fn authorization_url(&self, state: &str) -> Result<Url, AppError> {
        if !self.is_configured() {
            return Err(AppError::Internal(
                "OAuth configuration is not available".to_string(),
            ));
        }
        Url::parse_with_params(
            AUTH_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("state", state),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to build authorization URL: {e}")))
    }

    /// Trade an authorization code for an access token
    pub async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("token exchange failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "token exchange returned {}",
                response.status()
            )));
        }

        let body: TokenExchangeResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid token response: {e}")))?;
        Ok(body.access_token)
    }

    /// Fetch the profile behind an access token
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, AppError> {
        let response = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "userinfo returned {}",
                response.status()
            )));
        }

        response
            .json::<GoogleProfile>()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid user info: {e}")))
    }
}

/// Read the profile claims out of a Google ID token.
///
/// Only the payload segment is decoded; the signature is not checked against
/// Google's keys.
pub fn decode_id_token(credential: &str) -> Result<GoogleProfile, AppError> {
    let mut parts = credential.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AppError::Unauthorized("Invalid ID token format".to_string()));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| AppError::Unauthorized("Failed to decode token payload".to_string()))?;
    let profile: GoogleProfile = serde_json::from_slice(&bytes)
        .map_err(|_| AppError::Unauthorized("Invalid token payload".to_string()))?;

    if profile.sub.is_empty() {
        return Err(AppError::Unauthorized("Token payload has no subject".to_string()));
    }
    Ok(profile)
}

#[cfg(test)]
pub(crate) fn fake_id_token(sub: &str, email: &str, name: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({ "sub": sub, "email": email, "name": name }).to_string(),
    );
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> GoogleConfig {
        GoogleConfig {
            client_id: "client-123".into(),
            client_secret: "shh".into(),
            redirect_url: "http://localhost:8080/auth/google/callback".into(),
            frontend_url: "http://localhost:5173".into(),
            http_timeout_secs: 5,
        }
    }

    #[test]
    fn test_authorization_url_carries_state_and_client() {
        let client = GoogleOAuthClient::new(configured()).unwrap();
        let url = client.authorization_url("state-xyz").unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["state"], "state-xyz");
        assert_eq!(params["access_type"], "offline");
        assert!(params["scope"].contains("openid"));
    }

    #[test]
    fn test_unconfigured_client_refuses_login() {
        let mut config = configured();
        config.client_id.clear();
        let client = GoogleOAuthClient::new(config).unwrap();
        assert!(matches!(
            client.authorization_url("s"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_decode_id_token() {
        let token = fake_id_token("sub-1", "cook@example.com", "Cook");
        let profile = decode_id_token(&token).unwrap();
        assert_eq!(profile.sub, "sub-1");
        assert_eq!(profile.email, "cook@example.com");
        assert_eq!(profile.name, "Cook");
    }

    #[test]
    fn test_decode_id_token_rejects_garbage() {
        assert!(decode_id_token("only.two").is_err());
        assert!(decode_id_token("a.b.c.d").is_err());
        assert!(decode_id_token("a.!!!.c").is_err());
        let no_sub = format!("h.{}.s", URL_SAFE_NO_PAD.encode(br#"{"email":"x@y.z"}"#));
        assert!(decode_id_token(&no_sub).is_err());
    }
}
