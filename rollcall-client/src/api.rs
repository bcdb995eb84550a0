use async_trait::async_trait;
use rollcall_model::{ActiveStudent, CheckReceipt, Student, StudentStatus};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid server URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Server rejected request ({status}): {message}")]
    Api { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// The two reads the polling fallback needs. Split out as a trait so
/// session logic is testable without a server.
#[async_trait]
pub trait RosterFetch: Send + Sync {
    async fn fetch_students(&self) -> Result<Vec<Student>>;
    async fn fetch_active(&self) -> Result<Vec<ActiveStudent>>;
}

/// HTTP client for the Rollcall API, authenticated with a bearer token.
#[derive(Debug, Clone)]
pub struct RosterApi {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl RosterApi {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
            token: token.into(),
        })
    }

    pub async fn check_in(&self, barcode: &str) -> Result<CheckReceipt> {
        self.post_json(
            "api/dismissal/check-in",
            &serde_json::json!({ "barcode": barcode }),
        )
        .await
    }

    pub async fn check_out(&self, barcode: &str) -> Result<CheckReceipt> {
        self.post_json(
            "api/dismissal/check-out",
            &serde_json::json!({ "barcode": barcode }),
        )
        .await
    }

    pub async fn status(&self, barcode: &str) -> Result<StudentStatus> {
        self.get_json(&format!("api/dismissal/status/{barcode}")).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let url = self.base_url.join(path)?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = match response.json::<ApiErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RosterFetch for RosterApi {
    async fn fetch_students(&self) -> Result<Vec<Student>> {
        self.get_json("api/students").await
    }

    async fn fetch_active(&self) -> Result<Vec<ActiveStudent>> {
        self.get_json("api/dismissal/active").await
    }
}
