use crate::error::{Result, TrackerError};
use crate::models::{CedulaResponse, LoginResponse, TokenPair};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const LOGIN_PATH: &str = "/auth/login";
const VALIDATE_CEDULA_PATH: &str = "/auth/validate-cedula";
const REFRESH_PATH: &str = "/auth/refresh-token";
const LOGOUT_PATH: &str = "/auth/logout";

/// Authentication endpoints of the production-tracking backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse>;

    async fn validate_cedula(&self, cedula: &str) -> Result<CedulaResponse>;

    /// Exchange a refresh token for a new token pair
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair>;

    /// Ask the server to invalidate `refresh_token`
    async fn logout(&self, refresh_token: &str) -> Result<()>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct CedulaRequest<'a> {
    cedula: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    message: Option<String>,
}

/// reqwest-backed client for the REST endpoints
pub struct HttpAuthApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("jornada/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let response = self.send(path, body).await?;
        Ok(response.json::<R>().await?)
    }

    async fn send<B>(&self, path: &str, body: &B) -> Result<reqwest::Response>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(path);
        tracing::debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });

        tracing::debug!("POST {} failed with {}: {}", url, status, message);

        Err(TrackerError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        self.post(LOGIN_PATH, &LoginRequest { email, password })
            .await
            .map_err(|e| match e {
                TrackerError::Api { status: 400 | 401, message } => {
                    TrackerError::AuthenticationFailed(message)
                }
                other => other,
            })
    }

    async fn validate_cedula(&self, cedula: &str) -> Result<CedulaResponse> {
        self.post(VALIDATE_CEDULA_PATH, &CedulaRequest { cedula })
            .await
            .map_err(|e| match e {
                TrackerError::Api { status: 400 | 401 | 404, message } => {
                    TrackerError::AuthenticationFailed(message)
                }
                other => other,
            })
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair> {
        self.post(REFRESH_PATH, &RefreshRequest { refresh_token })
            .await
    }

    async fn logout(&self, refresh_token: &str) -> Result<()> {
        self.send(LOGOUT_PATH, &RefreshRequest { refresh_token })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer a single request with `status` and a JSON `body`.
    /// The handle yields the raw request that was received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/api", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            let header_end = loop {
                let n = socket.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed before headers");
                request.extend_from_slice(&buf[..n]);
                if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };

            let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while request.len() < header_end + content_length {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&request).into_owned()
        });

        (base_url, handle)
    }

    fn client(base_url: &str) -> HttpAuthApi {
        HttpAuthApi::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_refresh_returns_token_pair() {
        let (base_url, server) =
            serve_once("200 OK", r#"{"token":"a-2","refreshToken":"r-2"}"#).await;

        let pair = client(&base_url).refresh_token("r-1").await.unwrap();
        assert_eq!(pair.token, "a-2");
        assert_eq!(pair.refresh_token, "r-2");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/auth/refresh-token HTTP/1.1"));
        assert!(request.ends_with(r#"{"refreshToken":"r-1"}"#));
    }

    #[tokio::test]
    async fn test_rejected_refresh_carries_server_message() {
        let (base_url, server) =
            serve_once("401 Unauthorized", r#"{"message":"Refresh token expirado"}"#).await;

        let err = client(&base_url).refresh_token("r-1").await.unwrap_err();
        match err {
            TrackerError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Refresh token expirado");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_error_without_body_falls_back_to_reason() {
        let (base_url, server) = serve_once("503 Service Unavailable", "").await;

        let err = client(&base_url).logout("r-1").await.unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Api { status: 503, ref message } if message == "Service Unavailable"
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_login_rejection_is_authentication_failure() {
        let (base_url, server) =
            serve_once("401 Unauthorized", r#"{"error":"Credenciales inválidas"}"#).await;

        let err = client(&base_url)
            .login("ana@example.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TrackerError::AuthenticationFailed(ref message) if message == "Credenciales inválidas"
        ));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/auth/login HTTP/1.1"));
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let api = HttpAuthApi::new("http://localhost:5000/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            api.url(REFRESH_PATH),
            "http://localhost:5000/api/auth/refresh-token"
        );
    }

    #[test]
    fn test_refresh_request_wire_format() {
        let body = serde_json::to_value(RefreshRequest {
            refresh_token: "r-1",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "refreshToken": "r-1" }));
    }

    #[test]
    fn test_error_body_accepts_message_or_error() {
        let body: ErrorBody = serde_json::from_str(r#"{"message":"Token inválido"}"#).unwrap();
        assert_eq!(body.message.as_deref(), Some("Token inválido"));

        let body: ErrorBody = serde_json::from_str(r#"{"error":"expired"}"#).unwrap();
        assert_eq!(body.message.as_deref(), Some("expired"));
    }
}
