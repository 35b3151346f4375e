//! GoTrue auth client: session lookup and sign-up over HTTP.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{AccessToken, AuthClient, SessionOracle, SessionUser, SignUpRequest, SignedUpUser};
use crate::config::BackendConfig;
use crate::error::AuthError;

/// HTTP client for the hosted auth endpoints (`/auth/v1`).
pub struct GoTrueClient {
    base_url: String,
    anon_key: SecretString,
    access_token: AccessToken,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: Option<String>,
    email: Option<String>,
}

impl GoTrueClient {
    pub fn new(config: &BackendConfig, access_token: AccessToken) -> Self {
        Self {
            base_url: config.url.clone(),
            anon_key: config.anon_key.clone(),
            access_token,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    /// Handle to the token this client reads and refreshes.
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }
}

#[async_trait]
impl SessionOracle for GoTrueClient {
    async fn current_user(&self) -> Result<Option<SessionUser>, AuthError> {
        let token = match self.access_token.get().await {
            Some(token) => token,
            None => {
                tracing::debug!("No access token; treating as signed out");
                return Ok(None);
            }
        };

        let resp = self
            .client
            .get(self.api_url("user"))
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            tracing::debug!(status = status.as_u16(), "Session rejected; treating as signed out");
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let body: UserBody = resp
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        match body.id {
            Some(id) => Ok(Some(SessionUser {
                id,
                email: body.email,
            })),
            None => Err(AuthError::InvalidResponse("user without id".into())),
        }
    }
}

#[async_trait]
impl AuthClient for GoTrueClient {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignedUpUser, AuthError> {
        let body = serde_json::json!({
            "email": request.email,
            "password": request.password,
            "data": { "legal_name": request.legal_name },
        });

        let mut req = self.client.post(self.api_url("signup"));
        if let Some(redirect) = &request.redirect_to {
            req = req.query(&[("redirect_to", redirect)]);
        }

        let resp = req
            .header("apikey", self.anon_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let (user, access_token) = parse_sign_up(&text)?;
        if let Some(token) = access_token {
            self.access_token.set(Some(token)).await;
        }

        tracing::info!(user_id = %user.id, "Account created");
        Ok(user)
    }
}

/// Sign-up returns either the bare user or a session wrapping it.
fn parse_sign_up(text: &str) -> Result<(SignedUpUser, Option<String>), AuthError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

    let user = value.get("user").unwrap_or(&value);
    let id = user
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or(AuthError::MissingUser)?;
    let email = user.get("email").and_then(|v| v.as_str()).map(str::to_string);
    let access_token = value
        .get("access_token")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Ok((
        SignedUpUser {
            id: id.to_string(),
            email,
        },
        access_token,
    ))
}

/// Pull a readable message out of an auth error body.
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()))
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer, token: Option<&str>) -> GoTrueClient {
        let mut config = BackendConfig::new(server.uri(), "anon-key");
        if let Some(token) = token {
            config = config.with_access_token(token);
        }
        let token = AccessToken::from_config(&config);
        GoTrueClient::new(&config, token)
    }

    #[tokio::test]
    async fn current_user_returns_session_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "real-uuid",
                "email": "mary@example.com",
                "aud": "authenticated"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("tok"));
        let user = client.current_user().await.unwrap().unwrap();
        assert_eq!(user.id, "real-uuid");
        assert_eq!(user.email.as_deref(), Some("mary@example.com"));
    }

    #[tokio::test]
    async fn no_token_means_signed_out_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        assert!(client.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unauthorized_means_signed_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "msg": "invalid JWT"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("expired"));
        assert!(client.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("tok"));
        let err = client.current_user().await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected { status: 503, .. }));
    }

    #[tokio::test]
    async fn sign_up_sends_legal_name_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(body_partial_json(serde_json::json!({
                "email": "mary@example.com",
                "data": { "legal_name": "Mary Achol" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "new-user",
                "email": "mary@example.com"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let user = client
            .sign_up(&SignUpRequest {
                email: "mary@example.com".into(),
                password: "secret1".into(),
                legal_name: "Mary Achol".into(),
                redirect_to: None,
            })
            .await
            .unwrap();
        assert_eq!(user.id, "new-user");
        assert!(!client.access_token().is_set().await);
    }

    #[tokio::test]
    async fn sign_up_with_session_stores_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh",
                "token_type": "bearer",
                "user": { "id": "new-user", "email": "john@example.com" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let user = client
            .sign_up(&SignUpRequest {
                email: "john@example.com".into(),
                password: "secret1".into(),
                legal_name: "John Mabior".into(),
                redirect_to: None,
            })
            .await
            .unwrap();
        assert_eq!(user.id, "new-user");
        assert!(client.access_token().is_set().await);
    }

    #[tokio::test]
    async fn sign_up_rejection_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "msg": "User already registered"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let err = client
            .sign_up(&SignUpRequest {
                email: "taken@example.com".into(),
                password: "secret1".into(),
                legal_name: "Taken".into(),
                redirect_to: None,
            })
            .await
            .unwrap_err();
        match err {
            AuthError::Rejected { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "User already registered");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
