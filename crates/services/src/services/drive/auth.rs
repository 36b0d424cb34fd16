use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Only files the application itself creates; never broader account access.
const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
/// How long the interactive consent flow waits for the browser redirect.
const CONSENT_TIMEOUT: Duration = Duration::from_secs(300);
/// Tokens expiring within this margin are refreshed eagerly.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Drive credentials file not found: {0}")]
    MissingCredentials(PathBuf),
    #[error("Malformed credentials file {0}: {1}")]
    MalformedCredentials(PathBuf, #[source] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    #[error("Token endpoint returned {status}: {message}")]
    TokenEndpoint { status: u16, message: String },
    #[error("Authorization was denied by the user")]
    Denied,
    #[error("Timed out waiting for the authorization redirect")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, AuthError>;

/// OAuth client secrets in the Google Cloud console "installed app" format.
#[derive(Debug, Deserialize)]
struct ClientSecrets {
    installed: InstalledApp,
}

#[derive(Debug, Deserialize)]
struct InstalledApp {
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl StoredToken {
    fn is_fresh(&self) -> bool {
        self.expires_at - chrono::Duration::seconds(EXPIRY_MARGIN_SECS) > Utc::now()
    }
}

/// Process-wide credential provider for the Drive API: cached token file,
/// refresh when expired, interactive consent when neither works.
pub struct DriveAuthenticator {
    http: reqwest::Client,
    credentials_path: PathBuf,
    token_path: PathBuf,
}

impl DriveAuthenticator {
    pub fn new(credentials_path: PathBuf, token_path: PathBuf) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            credentials_path,
            token_path,
        }
    }

    /// Returns a usable bearer token, running the consent flow if needed.
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.load_token() {
            if token.is_fresh() {
                return Ok(token.access_token);
            }
            if let Some(refresh_token) = token.refresh_token.as_deref() {
                match self.refresh(refresh_token).await {
                    Ok(refreshed) => return Ok(refreshed.access_token),
                    Err(err) => {
                        tracing::warn!(
                            "Drive token refresh failed ({err}), falling back to interactive consent"
                        );
                    }
                }
            }
        }

        let token = self.interactive_consent().await?;
        Ok(token.access_token)
    }

    fn load_token(&self) -> Option<StoredToken> {
        let raw = std::fs::read_to_string(&self.token_path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(token) => Some(token),
            Err(err) => {
                tracing::warn!(
                    "Ignoring unreadable token file {}: {err}",
                    self.token_path.display()
                );
                None
            }
        }
    }

    fn store_token(&self, token: &StoredToken) -> Result<()> {
        if let Some(parent) = self.token_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(token).map_err(std::io::Error::other)?;
        std::fs::write(&self.token_path, raw)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.token_path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn load_secrets(&self) -> Result<InstalledApp> {
        if !self.credentials_path.exists() {
            return Err(AuthError::MissingCredentials(self.credentials_path.clone()));
        }
        let raw = std::fs::read_to_string(&self.credentials_path)?;
        let secrets: ClientSecrets = serde_json::from_str(&raw)
            .map_err(|err| AuthError::MalformedCredentials(self.credentials_path.clone(), err))?;
        Ok(secrets.installed)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<StoredToken> {
        let secrets = self.load_secrets()?;
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let parsed = Self::parse_token_response(response).await?;
        let token = StoredToken {
            access_token: parsed.access_token,
            // Google omits the refresh token on refresh responses.
            refresh_token: parsed
                .refresh_token
                .or_else(|| Some(refresh_token.to_string())),
            expires_at: Utc::now() + chrono::Duration::seconds(parsed.expires_in),
        };
        self.store_token(&token)?;
        Ok(token)
    }

    /// Blocking consent flow: bind a loopback redirect listener, send the
    /// user to the consent page, wait (bounded) for the code, exchange and
    /// persist it.
    async fn interactive_consent(&self) -> Result<StoredToken> {
        let secrets = self.load_secrets()?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let redirect_uri = format!("http://127.0.0.1:{}", listener.local_addr()?.port());

        let consent_url = Url::parse_with_params(
            AUTH_URL,
            [
                ("client_id", secrets.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", DRIVE_FILE_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .expect("valid consent url");

        tracing::info!("Waiting for Google Drive authorization in the browser");
        if utils::browser::open_browser(consent_url.as_str()).await.is_err() {
            tracing::info!("Could not open a browser; visit {consent_url} to authorize");
        }

        let code = tokio::time::timeout(CONSENT_TIMEOUT, Self::wait_for_redirect(listener))
            .await
            .map_err(|_| AuthError::Timeout)??;

        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("code", code.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let parsed = Self::parse_token_response(response).await?;
        let token = StoredToken {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token,
            expires_at: Utc::now() + chrono::Duration::seconds(parsed.expires_in),
        };
        self.store_token(&token)?;
        tracing::info!("Google Drive authorization complete");
        Ok(token)
    }

    async fn parse_token_response(response: reqwest::Response) -> Result<TokenEndpointResponse> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenEndpoint {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    /// Accepts loopback connections until one carries the authorization
    /// redirect; stray requests (favicons etc.) get a 404 and are ignored.
    async fn wait_for_redirect(listener: TcpListener) -> Result<String> {
        loop {
            let (mut stream, _) = listener.accept().await?;

            let mut buf = vec![0u8; 4096];
            let read = stream.read(&mut buf).await?;
            let request = String::from_utf8_lossy(&buf[..read]);

            let Some(path) = request
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
            else {
                Self::respond(&mut stream, "404 Not Found", "Not found").await;
                continue;
            };

            let Ok(url) = Url::parse(&format!("http://127.0.0.1{path}")) else {
                Self::respond(&mut stream, "404 Not Found", "Not found").await;
                continue;
            };

            let mut code = None;
            let mut denied = false;
            for (key, value) in url.query_pairs() {
                match key.as_ref() {
                    "code" => code = Some(value.into_owned()),
                    "error" => denied = true,
                    _ => {}
                }
            }

            if denied {
                Self::respond(
                    &mut stream,
                    "200 OK",
                    "Authorization was denied. You can close this tab.",
                )
                .await;
                return Err(AuthError::Denied);
            }

            if let Some(code) = code {
                Self::respond(
                    &mut stream,
                    "200 OK",
                    "Authorization complete. You can close this tab.",
                )
                .await;
                return Ok(code);
            }

            Self::respond(&mut stream, "404 Not Found", "Not found").await;
        }
    }

    async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
        let payload = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(payload.as_bytes()).await;
        let _ = stream.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{AuthError, DriveAuthenticator, StoredToken};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{name}-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn missing_credentials_file_is_reported() {
        let auth = DriveAuthenticator::new(temp_path("creds"), temp_path("token"));
        let err = auth.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials(_)));
    }

    #[tokio::test]
    async fn fresh_cached_token_is_reused_without_secrets() {
        let token_path = temp_path("token");
        let token = StoredToken {
            access_token: "cached-token".to_string(),
            refresh_token: None,
            expires_at: Utc::now() + chrono::Duration::hours(1),
        };
        std::fs::write(&token_path, serde_json::to_string(&token).unwrap()).unwrap();

        let auth = DriveAuthenticator::new(temp_path("creds"), token_path.clone());
        assert_eq!(auth.access_token().await.unwrap(), "cached-token");

        std::fs::remove_file(token_path).unwrap();
    }

    #[tokio::test]
    async fn malformed_credentials_file_is_reported() {
        let creds_path = temp_path("creds");
        std::fs::write(&creds_path, "{ not json").unwrap();

        let auth = DriveAuthenticator::new(creds_path.clone(), temp_path("token"));
        let err = auth.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::MalformedCredentials(_, _)));

        std::fs::remove_file(creds_path).unwrap();
    }
}
