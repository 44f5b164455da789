use crate::seo::SeoMetadata;
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";
const VIDEOS_INSERT_URL: &str =
    "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status";
const THUMBNAILS_SET_URL: &str = "https://www.googleapis.com/upload/youtube/v3/thumbnails/set";

// Tokens within this margin of expiry count as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Platform API failure, logged distinctly from generic pipeline errors at
/// the top level.
#[derive(Debug, thiserror::Error)]
#[error("YouTube API error (HTTP {status}): {body}")]
pub struct YouTubeApiError {
    pub status: u16,
    pub body: String,
}

fn api_error(status: reqwest::StatusCode, body: &str) -> anyhow::Error {
    YouTubeApiError {
        status: status.as_u16(),
        body: body.chars().take(400).collect(),
    }
    .into()
}

/// The `installed` section of a Google client_secret.json.
#[derive(Debug, Clone, Deserialize)]
pub struct InstalledApp {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: InstalledApp,
}

impl InstalledApp {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).await.with_context(|| {
            format!("Failed to read client secret: {}", path.as_ref().display())
        })?;
        let file: ClientSecretFile =
            serde_json::from_str(&content).context("client_secret.json parse failed")?;
        Ok(file.installed)
    }
}

/// OAuth token cached on disk between runs. Owned by the uploader; no other
/// component reads or writes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry: DateTime<Utc>,
}

impl StoredToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expiry
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Option<Self> {
        let content = fs::read_to_string(path).await.ok()?;
        serde_json::from_str(&content).ok()
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).await.with_context(|| {
            format!("Failed to write token file: {}", path.as_ref().display())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    UseCached,
    Refresh,
    Interactive,
}

/// A cached unexpired token is reused as-is; an expired one with a refresh
/// token goes through the refresh grant; anything else needs the
/// interactive consent flow.
pub fn decide_auth(token: Option<&StoredToken>, now: DateTime<Utc>) -> AuthDecision {
    match token {
        Some(t) if !t.is_expired_at(now) => AuthDecision::UseCached,
        Some(t) if t.refresh_token.is_some() => AuthDecision::Refresh,
        _ => AuthDecision::Interactive,
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: Option<String>,
}

fn token_from_response(resp: TokenResponse, previous_refresh: Option<String>) -> StoredToken {
    StoredToken {
        access_token: resp.access_token,
        refresh_token: resp.refresh_token.or(previous_refresh),
        expiry: Utc::now() + Duration::seconds(resp.expires_in),
    }
}

async fn refresh_token(
    client: &Client,
    app: &InstalledApp,
    cached: &StoredToken,
) -> Result<StoredToken> {
    let refresh = cached
        .refresh_token
        .clone()
        .context("No refresh token available")?;

    let resp = client
        .post(&app.token_uri)
        .form(&[
            ("client_id", app.client_id.as_str()),
            ("client_secret", app.client_secret.as_str()),
            ("refresh_token", refresh.as_str()),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await
        .context("Token refresh request failed")?;

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(api_error(status, &raw));
    }

    let parsed: TokenResponse =
        serde_json::from_str(&raw).context("Token refresh response parse failed")?;
    Ok(token_from_response(parsed, Some(refresh)))
}

/// Decode `%XX` triplets and `+` from a URL query component. Malformed
/// escapes are kept verbatim.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(b) => {
                        out.push(b);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Pull the authorization code out of the loopback redirect's request line,
/// e.g. `GET /?code=4%2Fabc&scope=... HTTP/1.1`. The code arrives
/// percent-encoded and must be decoded before the token exchange, or the
/// form post re-encodes the `%` and the endpoint rejects the grant.
pub fn extract_auth_code(request_line: &str) -> Option<String> {
    let path = request_line.split_whitespace().nth(1)?;
    let query = path.split_once('?')?.1;
    for pair in query.split('&') {
        if let Some(code) = pair.strip_prefix("code=") {
            if !code.is_empty() {
                return Some(percent_decode(code));
            }
        }
    }
    None
}

async fn interactive_flow(client: &Client, app: &InstalledApp) -> Result<StoredToken> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("Failed to bind loopback listener for OAuth redirect")?;
    let port = listener.local_addr()?.port();
    let redirect_uri = format!("http://127.0.0.1:{}", port);

    let auth_url = format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        app.auth_uri, app.client_id, redirect_uri, UPLOAD_SCOPE
    );

    logi("Authorization required. Open this URL in a browser:".to_string());
    eprintln!("{}", auth_url);

    let (mut stream, _) = listener
        .accept()
        .await
        .context("OAuth redirect connection failed")?;

    let mut buf = vec![0u8; 4096];
    let n = stream.read(&mut buf).await.context("OAuth redirect read failed")?;
    let request = String::from_utf8_lossy(&buf[..n]).into_owned();
    let first_line = request.lines().next().unwrap_or("");

    let code = extract_auth_code(first_line)
        .context("No authorization code in redirect request")?;

    let reply = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
                 <html><body>Authorization complete. You can close this tab.</body></html>";
    let _ = stream.write_all(reply.as_bytes()).await;

    let resp = client
        .post(&app.token_uri)
        .form(&[
            ("client_id", app.client_id.as_str()),
            ("client_secret", app.client_secret.as_str()),
            ("code", code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .context("Authorization code exchange failed")?;

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(api_error(status, &raw));
    }

    let parsed: TokenResponse =
        serde_json::from_str(&raw).context("Token exchange response parse failed")?;
    Ok(token_from_response(parsed, None))
}

/// Produce a usable access token: cached, refreshed, or newly authorized.
/// The (possibly new) token is persisted back to `token_path`.
pub async fn get_credentials(
    client: &Client,
    client_secret_path: &str,
    token_path: &str,
) -> Result<StoredToken> {
    let cached = StoredToken::load(token_path).await;
    let decision = decide_auth(cached.as_ref(), Utc::now());

    if decision == AuthDecision::UseCached {
        logok(format!("Using cached token from {}", token_path));
        return Ok(cached.unwrap());
    }

    let app = InstalledApp::load(client_secret_path).await?;

    let token = match (decision, cached) {
        (AuthDecision::Refresh, Some(cached)) => {
            logi("Cached token expired; refreshing...".to_string());
            match refresh_token(client, &app, &cached).await {
                Ok(t) => t,
                Err(err) => {
                    logw(format!("Token refresh failed ({}); falling back to consent flow", err));
                    interactive_flow(client, &app).await?
                }
            }
        }
        _ => interactive_flow(client, &app).await?,
    };

    token.save(token_path).await?;
    logok(format!("Token persisted to {}", token_path));
    Ok(token)
}

fn parse_video_id(raw: &str) -> Result<String> {
    let root: serde_json::Value =
        serde_json::from_str(raw).context("Upload response parse failed")?;
    root.get("id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .context("Upload response missing video id")
}

/// Resumable upload: initiate a session with the metadata, then PUT the
/// video bytes to the session URI. Returns the published video id.
pub async fn upload_video(
    client: &Client,
    token: &StoredToken,
    video_path: &Path,
    meta: &SeoMetadata,
    privacy_status: &str,
) -> Result<String> {
    let file_size = fs::metadata(video_path)
        .await
        .with_context(|| format!("Cannot stat {}", video_path.display()))?
        .len();

    let body = serde_json::json!({
        "snippet": {
            "title": meta.title,
            "description": meta.description,
            "tags": meta.tags,
            "categoryId": "28",
        },
        "status": {"privacyStatus": privacy_status},
    });

    logi(format!(
        "Initiating resumable upload ({} bytes): {}",
        file_size,
        video_path.display()
    ));

    let initiate = client
        .post(VIDEOS_INSERT_URL)
        .bearer_auth(&token.access_token)
        .header("X-Upload-Content-Type", "video/mp4")
        .header("X-Upload-Content-Length", file_size.to_string())
        .json(&body)
        .send()
        .await
        .context("Upload initiation request failed")?;

    let status = initiate.status();
    if !status.is_success() {
        let raw = initiate.text().await.unwrap_or_default();
        return Err(api_error(status, &raw));
    }

    let session_uri = initiate
        .headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .context("No Location header in upload-initiation response")?;

    let bytes = fs::read(video_path)
        .await
        .with_context(|| format!("Failed to read {}", video_path.display()))?;

    let upload = client
        .put(&session_uri)
        .bearer_auth(&token.access_token)
        .header("Content-Type", "video/mp4")
        .body(bytes)
        .timeout(std::time::Duration::from_secs(3600))
        .send()
        .await
        .context("Video upload request failed")?;

    let status = upload.status();
    let raw = upload.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(api_error(status, &raw));
    }

    let video_id = parse_video_id(&raw)?;
    logok(format!("Uploaded: https://www.youtube.com/watch?v={}", video_id));
    Ok(video_id)
}

/// Set a custom thumbnail on an already-published video.
pub async fn set_thumbnail(
    client: &Client,
    token: &StoredToken,
    video_id: &str,
    thumbnail_path: &Path,
) -> Result<()> {
    let bytes = fs::read(thumbnail_path)
        .await
        .with_context(|| format!("Failed to read {}", thumbnail_path.display()))?;

    let resp = client
        .post(THUMBNAILS_SET_URL)
        .query(&[("videoId", video_id)])
        .bearer_auth(&token.access_token)
        .header("Content-Type", "image/jpeg")
        .body(bytes)
        .send()
        .await
        .context("Thumbnail set request failed")?;

    let status = resp.status();
    if !status.is_success() {
        let raw = resp.text().await.unwrap_or_default();
        return Err(api_error(status, &raw));
    }

    logok(format!("Thumbnail set for video {}", video_id));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expires_in_secs: i64, refresh: Option<&str>) -> StoredToken {
        StoredToken {
            access_token: "ya29.cached".to_string(),
            refresh_token: refresh.map(|s| s.to_string()),
            expiry: Utc::now() + Duration::seconds(expires_in_secs),
        }
    }

    #[test]
    fn cached_valid_token_skips_consent_flow() {
        let t = token(3600, Some("1//refresh"));
        assert_eq!(decide_auth(Some(&t), Utc::now()), AuthDecision::UseCached);
    }

    #[test]
    fn expired_token_with_refresh_refreshes() {
        let t = token(-10, Some("1//refresh"));
        assert_eq!(decide_auth(Some(&t), Utc::now()), AuthDecision::Refresh);
    }

    #[test]
    fn expired_token_without_refresh_goes_interactive() {
        let t = token(-10, None);
        assert_eq!(decide_auth(Some(&t), Utc::now()), AuthDecision::Interactive);
        assert_eq!(decide_auth(None, Utc::now()), AuthDecision::Interactive);
    }

    #[test]
    fn near_expiry_counts_as_expired() {
        let t = token(EXPIRY_MARGIN_SECS - 5, Some("1//refresh"));
        assert_eq!(decide_auth(Some(&t), Utc::now()), AuthDecision::Refresh);
    }

    #[test]
    fn auth_code_extraction() {
        assert_eq!(
            extract_auth_code("GET /?state=x&code=zzz HTTP/1.1"),
            Some("zzz".to_string())
        );
        assert_eq!(extract_auth_code("GET /?error=access_denied HTTP/1.1"), None);
        assert_eq!(extract_auth_code("GET / HTTP/1.1"), None);
    }

    #[test]
    fn auth_code_is_percent_decoded() {
        // Google codes look like 4/0Ae... and arrive encoded as 4%2F0Ae...;
        // the decoded form must go into the token exchange, never the raw one.
        let code =
            extract_auth_code("GET /?code=4%2F0AeaYSHabc&scope=youtube.upload HTTP/1.1").unwrap();
        assert_eq!(code, "4/0AeaYSHabc");
        assert!(!code.contains('%'));
    }

    #[test]
    fn percent_decoding_edge_cases() {
        assert_eq!(percent_decode("a%20b"), "a b");
        assert_eq!(percent_decode("a+b"), "a b");
        assert_eq!(percent_decode("plain"), "plain");
        // Malformed escapes pass through untouched.
        assert_eq!(percent_decode("bad%2"), "bad%2");
        assert_eq!(percent_decode("bad%zz"), "bad%zz");
    }

    #[test]
    fn refresh_token_survives_token_rotation() {
        let rotated = token_from_response(
            TokenResponse {
                access_token: "ya29.new".to_string(),
                expires_in: 3599,
                refresh_token: None,
            },
            Some("1//old-refresh".to_string()),
        );
        assert_eq!(rotated.refresh_token.as_deref(), Some("1//old-refresh"));
        assert!(!rotated.is_expired_at(Utc::now()));
    }

    #[test]
    fn video_id_parsing() {
        assert_eq!(
            parse_video_id(r#"{"kind":"youtube#video","id":"dQw4w9WgXcQ"}"#).unwrap(),
            "dQw4w9WgXcQ"
        );
        assert!(parse_video_id(r#"{"kind":"youtube#video"}"#).is_err());
    }

    #[tokio::test]
    async fn token_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let t = token(3600, Some("1//refresh"));
        t.save(&path).await.unwrap();

        let loaded = StoredToken::load(&path).await.unwrap();
        assert_eq!(loaded.access_token, t.access_token);
        assert_eq!(loaded.refresh_token, t.refresh_token);
        assert_eq!(decide_auth(Some(&loaded), Utc::now()), AuthDecision::UseCached);
    }

    #[tokio::test]
    async fn missing_token_file_loads_none() {
        assert!(StoredToken::load("does/not/exist/token.json").await.is_none());
    }
}
