use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::shared::entities::UserId;
use crate::shared::ports::identity::{IdentityError, IdentityFuture, IdentityPort};

#[derive(Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct VerifyResponse {
    uid: String,
}

/// Verifies bearer credentials against the external identity service.
pub struct HttpIdentityVerifier {
    client: Client,
    verify_url: String,
}

impl HttpIdentityVerifier {
    pub fn new(verify_url: String, timeout: Duration) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        Ok(Self { client, verify_url })
    }
}

impl IdentityPort for HttpIdentityVerifier {
    fn verify_token(&self, token: String) -> IdentityFuture<Result<UserId, IdentityError>> {
        let client = self.client.clone();
        let verify_url = self.verify_url.clone();
        Box::pin(async move {
            let resp = client
                .post(&verify_url)
                .json(&VerifyRequest { token: &token })
                .send()
                .await
                .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

            let status = resp.status();
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(IdentityError::InvalidToken);
            }
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(IdentityError::Unavailable(format!(
                    "verifier status {}: {}",
                    status.as_u16(),
                    body
                )));
            }

            let body: VerifyResponse = resp
                .json()
                .await
                .map_err(|e| IdentityError::Unavailable(format!("verifier response: {}", e)))?;
            UserId::new(body.uid)
                .map_err(|_| IdentityError::Unavailable("verifier returned empty uid".to_string()))
        })
    }
}
