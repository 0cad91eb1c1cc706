use super::token::{ConsentFlow, Credential, TokenResponse, DEFAULT_TOKEN_URI};
use crate::error::{auth_error, AssistantResult};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Google's consent page
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// How long the loopback server waits for the browser to come back
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// OAuth client from a downloaded `credentials.json`
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Load the client from an installed-app or web credentials file
    pub fn load(path: &Path) -> AssistantResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            auth_error(&format!(
                "Cannot read OAuth client file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> AssistantResult<Self> {
        let file: SecretsFile = serde_json::from_str(content)
            .map_err(|e| auth_error(&format!("Invalid OAuth client file: {}", e)))?;
        file.installed
            .or(file.web)
            .ok_or_else(|| auth_error("OAuth client file has no 'installed' or 'web' section"))
    }
}

/// Installed-app consent: opens the browser and catches the redirect on a loopback port
#[derive(Clone)]
pub struct LocalServerConsent {
    secrets: ClientSecrets,
    client: Client,
}

impl LocalServerConsent {
    pub fn new(secrets: ClientSecrets, client: Client) -> Self {
        Self { secrets, client }
    }

    /// Consent page URL for the given redirect and state
    pub fn authorization_url(
        &self,
        redirect_uri: &str,
        scopes: &[String],
        state: &str,
    ) -> AssistantResult<Url> {
        let mut url = Url::parse(&self.secrets.auth_uri)
            .map_err(|e| auth_error(&format!("Failed to parse auth URI: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.secrets.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("scope", &scopes.join(" "))
            .append_pair("state", state);

        Ok(url)
    }

    /// Run the browser round trip and return the authorization code
    async fn receive_code(&self, scopes: &[String]) -> AssistantResult<(String, String)> {
        // Start local server to receive the callback
        let server = tiny_http::Server::http("127.0.0.1:0")
            .map_err(|e| auth_error(&format!("Failed to start callback server: {}", e)))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| auth_error("Callback server has no TCP address"))?;
        let redirect_uri = format!("http://localhost:{}/", port);

        // Generate random state for security
        let state = uuid::Uuid::new_v4().to_string();
        let auth_url = self.authorization_url(&redirect_uri, scopes, &state)?;

        info!("Opening browser for Google Calendar authorization");
        webbrowser::open(auth_url.as_str())
            .map_err(|e| auth_error(&format!("No browser available for consent: {}", e)))?;

        let code = tokio::task::spawn_blocking(move || wait_for_callback(server, &state))
            .await
            .map_err(|e| auth_error(&format!("Callback task failed: {}", e)))??;

        Ok((code, redirect_uri))
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> AssistantResult<Credential> {
        let response = self
            .client
            .post(&self.secrets.token_uri)
            .form(&[
                ("client_id", self.secrets.client_id.as_str()),
                ("client_secret", self.secrets.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to exchange code: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(auth_error(&format!("Failed to get token: {}", error_text)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))?;

        Ok(Credential {
            token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            token_uri: self.secrets.token_uri.clone(),
            client_id: self.secrets.client_id.clone(),
            client_secret: self.secrets.client_secret.clone(),
            scopes: token.granted_scopes(scopes),
            expiry: Some(token.expiry(Utc::now())),
        })
    }
}

#[async_trait]
impl ConsentFlow for LocalServerConsent {
    async fn authorize(&self, scopes: &[String]) -> AssistantResult<Credential> {
        let (code, redirect_uri) = self.receive_code(scopes).await?;
        self.exchange_code(&code, &redirect_uri, scopes).await
    }
}

/// Stand-in used when no OAuth client file could be read
#[derive(Debug, Clone)]
pub struct UnavailableConsent {
    reason: String,
}

impl UnavailableConsent {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl ConsentFlow for UnavailableConsent {
    async fn authorize(&self, _scopes: &[String]) -> AssistantResult<Credential> {
        Err(auth_error(&self.reason))
    }
}

fn wait_for_callback(server: tiny_http::Server, expected_state: &str) -> AssistantResult<String> {
    let request = server
        .recv_timeout(CALLBACK_TIMEOUT)
        .map_err(|e| auth_error(&format!("Callback server error: {}", e)))?
        .ok_or_else(|| auth_error("Timed out waiting for authorization callback"))?;

    let result = parse_callback(request.url(), expected_state);

    let message = match &result {
        Ok(_) => "Authorization successful! You can close this window.",
        Err(_) => "Authorization failed. You can close this window.",
    };
    // The browser page is cosmetic
    let _ = request.respond(tiny_http::Response::from_string(message));

    result
}

/// Pull the authorization code out of the redirect path, checking `state`
pub fn parse_callback(path: &str, expected_state: &str) -> AssistantResult<String> {
    let url = Url::parse("http://localhost")
        .and_then(|base| base.join(path))
        .map_err(|e| auth_error(&format!("Malformed callback URL: {}", e)))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(auth_error(&format!("Consent was refused: {}", error)));
    }
    if state.as_deref() != Some(expected_state) {
        return Err(auth_error("State mismatch in authorization callback"));
    }
    code.ok_or_else(|| auth_error("No authorization code found in callback"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_installed_client_file() {
        let secrets = ClientSecrets::parse(
            r#"{"installed":{"client_id":"cid","client_secret":"cs","redirect_uris":["http://localhost"]}}"#,
        )
        .unwrap();
        assert_eq!(secrets.client_id, "cid");
        assert_eq!(secrets.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn callback_requires_matching_state() {
        assert_eq!(parse_callback("/?state=abc&code=xyz", "abc").unwrap(), "xyz");
        assert!(parse_callback("/?state=evil&code=xyz", "abc").is_err());
        assert!(parse_callback("/?state=abc&error=access_denied", "abc").is_err());
    }

    #[test]
    fn authorization_url_requests_offline_access() {
        let consent = LocalServerConsent::new(
            ClientSecrets::parse(r#"{"installed":{"client_id":"cid","client_secret":"cs"}}"#)
                .unwrap(),
            Client::new(),
        );
        let url = consent
            .authorization_url(
                "http://localhost:1234/",
                &["scope-a".to_string()],
                "state-1",
            )
            .unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("access_type".to_string(), "offline".to_string())));
        assert!(pairs.contains(&("state".to_string(), "state-1".to_string())));
    }
}
