use crate::error::{auth_error, AssistantResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Read-only access to calendar events
pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Google's token endpoint, used when the credentials file does not name one
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are refreshed before use
const EXPIRY_SKEW_SECONDS: i64 = 10;

/// Authorized user credential as persisted in the token file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Lifecycle of the live credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Absent,
    Pending,
    Valid,
    Expired,
    Refreshed,
    Revoked,
}

impl Credential {
    /// True once the access token can no longer be used
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_SKEW_SECONDS) <= now,
            None => false,
        }
    }

    /// True if every requested scope was granted
    pub fn covers(&self, scopes: &[String]) -> bool {
        scopes.iter().all(|scope| self.scopes.contains(scope))
    }

    /// State of this credential at `now`
    pub fn state(&self, now: DateTime<Utc>) -> CredentialState {
        if self.is_expired(now) {
            CredentialState::Expired
        } else {
            CredentialState::Valid
        }
    }
}

/// Token endpoint response for both code exchange and refresh
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Expiry timestamp computed from `expires_in`, one hour when absent
    pub fn expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::seconds(self.expires_in.unwrap_or(3600))
    }

    /// Scopes granted by the response, falling back to the requested ones
    pub fn granted_scopes(&self, requested: &[String]) -> Vec<String> {
        match &self.scope {
            Some(scope) if !scope.trim().is_empty() => {
                scope.split_whitespace().map(|s| s.to_string()).collect()
            }
            _ => requested.to_vec(),
        }
    }
}

/// Durable storage for the credential
pub trait TokenStore: Send + Sync {
    /// Load the persisted credential, `None` when nothing was stored yet
    fn load(&self) -> AssistantResult<Option<Credential>>;

    /// Overwrite the persisted credential
    fn save(&self, credential: &Credential) -> AssistantResult<()>;
}

/// Why a refresh attempt did not produce a new access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// The refresh token was rejected, a new consent is needed
    Revoked(String),
    /// Network or server trouble
    Failed(String),
}

/// Exchanges a refresh token for a new access token
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, credential: &Credential) -> Result<Credential, RefreshError>;
}

/// Interactive consent producing a brand new credential
#[async_trait]
pub trait ConsentFlow: Send + Sync {
    async fn authorize(&self, scopes: &[String]) -> AssistantResult<Credential>;
}

/// JSON token file on disk
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> AssistantResult<Option<Credential>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Err(auth_error(&format!(
                    "Token file {} is corrupt: {}",
                    self.path.display(),
                    e
                )));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map(Some).map_err(|e| {
            auth_error(&format!(
                "Token file {} is corrupt: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn save(&self, credential: &Credential) -> AssistantResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write next to the target and rename so readers never see half a file
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_string_pretty(credential)?)?;
        fs::rename(&tmp_path, &self.path)?;

        debug!("Saved calendar token to {}", self.path.display());
        Ok(())
    }
}

/// Refreshes tokens against the OAuth token endpoint
#[derive(Clone, Default)]
pub struct OAuthRefresher {
    client: Client,
}

impl OAuthRefresher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TokenRefresher for OAuthRefresher {
    async fn refresh(&self, credential: &Credential) -> Result<Credential, RefreshError> {
        let refresh_token = credential
            .refresh_token
            .clone()
            .ok_or_else(|| RefreshError::Failed("No refresh token in token data".to_string()))?;

        let params = [
            ("client_id", credential.client_id.clone()),
            ("client_secret", credential.client_secret.clone()),
            ("refresh_token", refresh_token.clone()),
            ("grant_type", "refresh_token".to_string()),
        ];

        let response = self
            .client
            .post(&credential.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| RefreshError::Failed(format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());

            if error_body.contains("invalid_grant") {
                return Err(RefreshError::Revoked(error_body));
            }

            return Err(RefreshError::Failed(format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let new_token: TokenResponse = response
            .json()
            .await
            .map_err(|e| RefreshError::Failed(format!("Failed to parse token response: {}", e)))?;

        // Combine new access token with existing refresh token
        Ok(Credential {
            token: new_token.access_token.clone(),
            refresh_token: new_token.refresh_token.clone().or(Some(refresh_token)),
            expiry: Some(new_token.expiry(Utc::now())),
            scopes: new_token.granted_scopes(&credential.scopes),
            ..credential.clone()
        })
    }
}

/// Owns the single live credential of the process
pub struct CredentialCache {
    store: Box<dyn TokenStore>,
    refresher: Box<dyn TokenRefresher>,
    consent: Box<dyn ConsentFlow>,
    live: Option<Credential>,
    state: CredentialState,
}

impl CredentialCache {
    pub fn new(
        store: Box<dyn TokenStore>,
        refresher: Box<dyn TokenRefresher>,
        consent: Box<dyn ConsentFlow>,
    ) -> Self {
        Self {
            store,
            refresher,
            consent,
            live: None,
            state: CredentialState::Absent,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> CredentialState {
        self.state
    }

    /// Get a valid credential covering `scopes`, refreshing or asking for consent as needed
    pub async fn obtain_credential(&mut self, scopes: &[String]) -> AssistantResult<Credential> {
        let now = Utc::now();

        let candidate = match self.live.take() {
            Some(credential) => Some(credential),
            None => self.store.load()?,
        };

        let candidate = candidate.filter(|credential| {
            let covered = credential.covers(scopes);
            if !covered {
                info!("Stored calendar token lacks requested scopes, asking for consent");
            }
            covered
        });

        if let Some(credential) = candidate {
            match credential.state(now) {
                CredentialState::Valid => {
                    self.state = CredentialState::Valid;
                    self.live = Some(credential.clone());
                    return Ok(credential);
                }
                _ => {
                    self.state = CredentialState::Expired;
                    if credential.refresh_token.is_some() {
                        match self.refresher.refresh(&credential).await {
                            Ok(refreshed) => {
                                self.state = CredentialState::Refreshed;
                                info!("Refreshed calendar token");
                                return self.persist(refreshed);
                            }
                            Err(RefreshError::Revoked(reason)) => {
                                warn!("Calendar token was revoked: {}", reason);
                                self.state = CredentialState::Revoked;
                            }
                            Err(RefreshError::Failed(reason)) => {
                                warn!("Calendar token refresh failed: {}", reason);
                            }
                        }
                    }
                }
            }
        }

        self.state = CredentialState::Pending;
        info!("Requesting calendar consent");
        match self.consent.authorize(scopes).await {
            Ok(credential) => self.persist(credential),
            Err(e) => {
                self.state = CredentialState::Absent;
                Err(auth_error(&format!("Consent could not be completed: {}", e)))
            }
        }
    }

    fn persist(&mut self, credential: Credential) -> AssistantResult<Credential> {
        self.store.save(&credential)?;
        self.state = CredentialState::Valid;
        self.live = Some(credential.clone());
        Ok(credential)
    }
}
