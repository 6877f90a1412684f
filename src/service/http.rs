//! HTTP implementation of `SymptomService` over `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use super::{ApiStatus, ErrorDetail, StarRequest, StarVerdict, SymptomService};
use crate::config::ClientConfig;
use crate::error::ServiceError;
use crate::intake::{Diagnosis, SymptomRequest};
use crate::utils::truncate::{truncate_text, BODY_EXCERPT_BYTES};

pub struct HttpSymptomService {
    client: Client,
    config: ClientConfig,
}

impl HttpSymptomService {
    pub fn new(config: ClientConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn check_symptoms_url(&self, username: &str) -> String {
        format!(
            "{}?github_username={}",
            self.config.endpoint("check-symptoms"),
            urlencoding::encode(username)
        )
    }

    /// Turn a non-200 response into a `ServiceError`, keeping 403 distinct.
    async fn reject(response: Response) -> ServiceError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::FORBIDDEN {
            let detail = serde_json::from_str::<ErrorDetail>(&body)
                .ok()
                .and_then(|d| d.detail);
            return ServiceError::Forbidden(detail);
        }

        ServiceError::Status {
            status: status.as_u16(),
            body: truncate_text(&body, BODY_EXCERPT_BYTES),
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!("Undecodable response body: {}", truncate_text(&body, BODY_EXCERPT_BYTES));
            ServiceError::from(e)
        })
    }
}

#[async_trait]
impl SymptomService for HttpSymptomService {
    async fn verify_star(&self, username: &str) -> Result<StarVerdict, ServiceError> {
        let url = self.config.endpoint("verify-star");
        debug!("POST {} for {}", url, username);

        let response = self.client
            .post(&url)
            .timeout(self.config.verify_timeout)
            .json(&StarRequest { github_username: username.to_string() })
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(Self::reject(response).await);
        }
        Self::decode(response).await
    }

    async fn check_symptoms(&self, username: &str, request: &SymptomRequest) -> Result<Diagnosis, ServiceError> {
        let url = self.check_symptoms_url(username);
        debug!("POST {}", url);

        let response = self.client
            .post(&url)
            .timeout(self.config.check_timeout)
            .json(request)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(Self::reject(response).await);
        }
        Self::decode(response).await
    }

    async fn status(&self) -> Result<String, ServiceError> {
        let response = self.client
            .get(self.config.endpoint("api"))
            .timeout(self.config.verify_timeout)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(Self::reject(response).await);
        }
        let status: ApiStatus = Self::decode(response).await?;
        Ok(status.message)
    }
}
