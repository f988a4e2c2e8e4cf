//! HTTP client for the portal's statement export API.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::COOKIE;
use tracing::{debug, info};

use releve_core::models::ClientKey;

use crate::error::PortalError;

const EXPORT_PATH: &str = "/customers/export-customer-statement";

/// Authenticated portal client. The session cookie comes from the login
/// collaborator; this client only consumes it.
pub struct PortalClient {
    http: reqwest::Client,
    base_url: String,
    session_cookie: String,
}

impl PortalClient {
    /// Build a client against `base_url` with the given session cookie.
    pub fn new(
        base_url: impl Into<String>,
        session_cookie: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, PortalError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_cookie: session_cookie.into(),
        })
    }

    /// Download one client's detailed statement PDF for a date range.
    pub async fn download_statement(
        &self,
        client: &ClientKey,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<u8>, PortalError> {
        let url = format!("{}{}", self.base_url, EXPORT_PATH);
        debug!(client = %client.name, start_date, end_date, "requesting statement export");

        let response = self
            .http
            .get(&url)
            .header(COOKIE, &self.session_cookie)
            .query(&[
                ("type", "detailed"),
                ("start_date", start_date),
                ("end_date", end_date),
                ("customer_id", client.portal_key.as_str()),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(PortalError::SessionExpired),
            status if !status.is_success() => {
                return Err(PortalError::Download {
                    client: client.name.clone(),
                    status: status.as_u16(),
                });
            }
            _ => {}
        }

        let bytes = response.bytes().await?.to_vec();
        if !bytes.starts_with(b"%PDF") {
            return Err(PortalError::NotAPdf {
                client: client.name.clone(),
            });
        }

        info!(client = %client.name, size = bytes.len(), "statement downloaded");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = PortalClient::new(
            "https://api.example.com/",
            "session=abc",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://api.example.com");
    }
}
