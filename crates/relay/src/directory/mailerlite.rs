//! MailerLite API client.
//!
//! Implements [`Directory`] over MailerLite's REST API for subscriber,
//! group, and tag management.
//!
//! # API Reference
//!
//! - Base URL: `https://connect.mailerlite.com/api`
//! - Authentication: API key via `Authorization: Bearer <key>`
//! - Subscribers are addressed by email; groups and tags by remote id,
//!   resolved from their names per call (nothing is cached locally)

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use super::{Directory, DirectoryError, Group, Subscriber, Tag};

/// MailerLite API base URL.
const BASE_URL: &str = "https://connect.mailerlite.com/api";

/// MailerLite API client.
#[derive(Clone)]
pub struct MailerLiteClient {
    inner: Arc<MailerLiteClientInner>,
}

struct MailerLiteClientInner {
    client: reqwest::Client,
}

impl MailerLiteClient {
    /// Create a new MailerLite API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(api_key: &SecretString) -> Result<Self, DirectoryError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", api_key.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| DirectoryError::Parse(format!("Invalid API key format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert("Authorization", auth_header);

        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(MailerLiteClientInner { client }),
        })
    }

    /// Execute a GET request, deserializing the response body.
    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, DirectoryError> {
        let url = format!("{BASE_URL}{path}");
        let response = self.inner.client.get(&url).send().await?;
        handle_response(response).await
    }

    /// Execute a GET request where 404 means the resource is absent.
    async fn get_optional<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, DirectoryError> {
        let url = format!("{BASE_URL}{path}");
        let response = self.inner.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        handle_response(response).await.map(Some)
    }

    /// Execute a POST request with a JSON body, deserializing the response.
    async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DirectoryError> {
        let url = format!("{BASE_URL}{path}");
        let response = self.inner.client.post(&url).json(body).send().await?;
        handle_response(response).await
    }

    /// Execute a POST request with a JSON body, checking only the status.
    async fn post_status<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), DirectoryError> {
        let url = format!("{BASE_URL}{path}");
        let response = self.inner.client.post(&url).json(body).send().await?;
        check_status(response).await
    }

    /// Execute a bodyless POST request, checking only the status.
    async fn post_empty(&self, path: &str) -> Result<(), DirectoryError> {
        let url = format!("{BASE_URL}{path}");
        let response = self.inner.client.post(&url).send().await?;
        check_status(response).await
    }

    /// Execute a DELETE request. A 404 counts as success: the membership or
    /// attachment being absent is the state the delete was after.
    async fn delete(&self, path: &str) -> Result<(), DirectoryError> {
        let url = format!("{BASE_URL}{path}");
        let response = self.inner.client.delete(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status(response).await
    }
}

/// Check the response status and deserialize the body.
async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, DirectoryError> {
    let status = response.status();

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(DirectoryError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| DirectoryError::Parse(e.to_string()))
}

/// Check the response status, discarding the body.
async fn check_status(response: reqwest::Response) -> Result<(), DirectoryError> {
    let status = response.status();

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(DirectoryError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(())
}

/// Wrapper for MailerLite's `{ "data": ... }` response envelope.
#[derive(Debug, serde::Deserialize)]
struct ApiResponse<T> {
    data: T,
}

#[async_trait]
impl Directory for MailerLiteClient {
    async fn find_subscriber(&self, email: &str) -> Result<Option<Subscriber>, DirectoryError> {
        let path = format!("/subscribers/{}", urlencoding::encode(email));
        let response: Option<ApiResponse<Subscriber>> = self.get_optional(&path).await?;
        Ok(response.map(|r| r.data))
    }

    async fn create_subscriber(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<Subscriber, DirectoryError> {
        let mut body = serde_json::json!({ "email": email });
        if let Some(name) = name {
            body["fields"] = serde_json::json!({ "name": name });
        }

        let response: ApiResponse<Subscriber> = self.post("/subscribers", &body).await?;
        Ok(response.data)
    }

    async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>, DirectoryError> {
        let path = format!("/groups?filter[name]={}", urlencoding::encode(name));
        let response: ApiResponse<Vec<Group>> = self.get(&path).await?;

        // The filter matches loosely; require the exact name, first wins.
        Ok(response.data.into_iter().find(|group| group.name == name))
    }

    async fn assign_to_group(
        &self,
        group_id: &str,
        subscriber_id: &str,
    ) -> Result<(), DirectoryError> {
        self.post_empty(&format!("/groups/{group_id}/subscribers/{subscriber_id}"))
            .await
    }

    async fn unassign_from_group(
        &self,
        subscriber_id: &str,
        group_id: &str,
    ) -> Result<(), DirectoryError> {
        self.delete(&format!("/subscribers/{subscriber_id}/groups/{group_id}"))
            .await
    }

    async fn attach_tag(&self, name: &str, subscriber_id: &str) -> Result<(), DirectoryError> {
        // Tag creation is implicit: attaching an existing tag is applied all
        // the same.
        let body = serde_json::json!({
            "name": name,
            "subscribers": [subscriber_id],
        });
        self.post_status("/tags", &body).await
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, DirectoryError> {
        let response: ApiResponse<Vec<Tag>> = self.get("/tags").await?;
        Ok(response.data)
    }

    async fn detach_tag(&self, tag_id: &str, subscriber_id: &str) -> Result<(), DirectoryError> {
        self.delete(&format!("/tags/{tag_id}/subscribers/{subscriber_id}"))
            .await
    }

    async fn subscriber_with_groups(
        &self,
        email: &str,
    ) -> Result<Option<Subscriber>, DirectoryError> {
        let path = format!(
            "/subscribers/{}?include=groups",
            urlencoding::encode(email)
        );
        let response: Option<ApiResponse<Subscriber>> = self.get_optional(&path).await?;
        Ok(response.map(|r| r.data))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_with_any_printable_key() {
        let key = SecretString::from("ml-test-key");
        assert!(MailerLiteClient::new(&key).is_ok());
    }

    #[test]
    fn test_client_rejects_non_header_key() {
        let key = SecretString::from("bad\nkey");
        assert!(matches!(
            MailerLiteClient::new(&key),
            Err(DirectoryError::Parse(_))
        ));
    }

    #[test]
    fn test_api_response_envelope() {
        let raw = r#"{"data": {"id": "123", "email": "a@x.com"}}"#;
        let response: ApiResponse<Subscriber> = serde_json::from_str(raw).unwrap();
        assert_eq!(response.data.id, "123");
        assert!(response.data.groups.is_empty());
    }

    #[test]
    fn test_subscriber_with_groups_envelope() {
        let raw = r#"{"data": {
            "id": "123",
            "email": "a@x.com",
            "groups": [{"id": "g1", "name": "Students"}]
        }}"#;
        let response: ApiResponse<Subscriber> = serde_json::from_str(raw).unwrap();
        assert_eq!(
            response.data.groups,
            vec![Group {
                id: "g1".to_string(),
                name: "Students".to_string()
            }]
        );
    }
}
