use super::check_status;
use super::endpoints::{self, resolve};
use crate::error::ClientError;
use crate::models::local_alert::NewAlerta;
use crate::models::user::{NewUser, User, UserData, ROLE_USER};
use anyhow::Result;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// REST client for the alert and user resources.
///
/// Every call takes the caller's bearer token; `None` sends the request
/// unauthenticated.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base: Url,
}

impl BackendClient {
    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            client,
            base: Url::parse(base_url)?,
        })
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = check_status(builder.send().await?).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ClientError> {
        check_status(builder.send().await?).await?;
        Ok(())
    }

    async fn send_optional<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Option<T>, ClientError> {
        let response = match check_status(builder.send().await?).await {
            Ok(response) => response,
            Err(ClientError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    fn with_body<B: Serialize>(
        &self,
        method: Method,
        url: Url,
        token: Option<&str>,
        body: &B,
    ) -> RequestBuilder {
        self.request(method, url, token).json(body)
    }

    // Alerts. Records are returned raw; their shape varies across backend
    // revisions and is reconciled downstream.

    pub async fn list_alerts(&self, token: Option<&str>) -> Result<Vec<Value>, ClientError> {
        let url = resolve(&self.base, endpoints::ALERTS, &[]);
        self.send_json(self.request(Method::GET, url, token)).await
    }

    pub async fn get_alert(&self, id: i64, token: Option<&str>) -> Result<Value, ClientError> {
        let id = id.to_string();
        let url = resolve(&self.base, endpoints::ALERT_BY_ID, &[("id", &id)]);
        self.send_json(self.request(Method::GET, url, token)).await
    }

    pub async fn create_alert(
        &self,
        alert: &NewAlerta,
        token: Option<&str>,
    ) -> Result<Value, ClientError> {
        let url = resolve(&self.base, endpoints::ALERTS, &[]);
        self.send_json(self.with_body(Method::POST, url, token, alert))
            .await
    }

    pub async fn update_alert(
        &self,
        id: i64,
        patch: &Value,
        token: Option<&str>,
    ) -> Result<Value, ClientError> {
        let id = id.to_string();
        let url = resolve(&self.base, endpoints::ALERT_UPDATE, &[("id", &id)]);
        self.send_json(self.with_body(Method::PUT, url, token, patch))
            .await
    }

    pub async fn delete_alert(&self, id: i64, token: Option<&str>) -> Result<(), ClientError> {
        let id = id.to_string();
        let url = resolve(&self.base, endpoints::ALERT_DELETE, &[("id", &id)]);
        self.send_empty(self.request(Method::DELETE, url, token))
            .await
    }

    // Users

    pub async fn list_users(&self, token: Option<&str>) -> Result<Vec<User>, ClientError> {
        let url = resolve(&self.base, endpoints::USERS, &[]);
        self.send_json(self.request(Method::GET, url, token)).await
    }

    pub async fn find_user(&self, id: i64, token: Option<&str>) -> Result<Option<User>, ClientError> {
        let id = id.to_string();
        let url = resolve(&self.base, endpoints::USER_BY_ID, &[("id", &id)]);
        self.send_optional(self.request(Method::GET, url, token))
            .await
    }

    pub async fn find_user_by_email(
        &self,
        email: &str,
        token: Option<&str>,
    ) -> Result<Option<User>, ClientError> {
        let url = resolve(&self.base, endpoints::USER_BY_EMAIL, &[("email", email)]);
        self.send_optional(self.request(Method::GET, url, token))
            .await
    }

    /// Registers a user, stamping today's date as the registration date.
    pub async fn create_user(&self, data: &UserData, token: Option<&str>) -> Result<User, ClientError> {
        let body = new_user(data);
        let url = resolve(&self.base, endpoints::USERS, &[]);
        self.send_json(self.with_body(Method::POST, url, token, &body))
            .await
    }

    pub async fn update_user(
        &self,
        id: i64,
        data: &UserData,
        token: Option<&str>,
    ) -> Result<User, ClientError> {
        let id = id.to_string();
        let url = resolve(&self.base, endpoints::USER_BY_ID, &[("id", &id)]);
        self.send_json(self.with_body(Method::PUT, url, token, data))
            .await
    }

    pub async fn delete_user(&self, id: i64, token: Option<&str>) -> Result<(), ClientError> {
        let id = id.to_string();
        let url = resolve(&self.base, endpoints::USER_BY_ID, &[("id", &id)]);
        self.send_empty(self.request(Method::DELETE, url, token))
            .await
    }
}

fn new_user(data: &UserData) -> NewUser {
    NewUser {
        nome_usuario: data.nome_usuario.clone().unwrap_or_default(),
        email: data.email.clone().unwrap_or_default(),
        tipo_usuario: data
            .tipo_usuario
            .clone()
            .unwrap_or_else(|| ROLE_USER.to_string()),
        data_cadastro: Utc::now().format("%Y-%m-%d").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_base_url() {
        assert!(BackendClient::new(Client::new(), "not a url").is_err());
        assert!(BackendClient::new(Client::new(), "https://api.example.com").is_ok());
    }

    #[test]
    fn bearer_token_is_attached() {
        let backend = BackendClient::new(Client::new(), "https://api.example.com").unwrap();
        let url = resolve(&backend.base, endpoints::ALERTS, &[]);

        let request = backend
            .request(Method::GET, url.clone(), Some("abc"))
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer abc"
        );

        let anonymous = backend.request(Method::GET, url, None).build().unwrap();
        assert!(anonymous.headers().get("authorization").is_none());
    }

    #[test]
    fn new_user_defaults_role_and_stamps_date() {
        let body = new_user(&UserData {
            nome_usuario: Some("ana".into()),
            email: Some("ana@example.com".into()),
            tipo_usuario: None,
        });
        assert_eq!(body.tipo_usuario, ROLE_USER);
        assert_eq!(body.data_cadastro.len(), 10);
    }
}
