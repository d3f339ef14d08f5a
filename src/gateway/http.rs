//! HTTP gateway for the back-office REST API

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Envelope, FeeGateway, GatewayError, GatewayResult};
use crate::calendar::ReferenceMonth;
use crate::companies::{CompanyChanges, CompanyDraft};
use crate::config::GatewayConfig;
use crate::dashboard::parse_revenue;
use crate::decimal::Money;
use crate::records::{Company, PaymentRecord, StatusUpdate};
use crate::types::{CompanyId, PaymentId};

/// REST client, every request carries the bearer token when one is set
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// exchange credentials for an access token and keep it for later requests
    pub async fn login(&mut self, email: &str, password: &str) -> GatewayResult<String> {
        #[derive(Serialize)]
        struct LoginRequest<'a> {
            email: &'a str,
            password: &'a str,
        }

        #[derive(Deserialize)]
        struct LoginResponse {
            access_token: String,
        }

        let request = self
            .request(Method::POST, "auth/login")
            .json(&LoginRequest { email, password });
        let response: LoginResponse = self.send(request).await?;

        tracing::info!("gateway login succeeded");
        self.token = Some(response.access_token.clone());
        Ok(response.access_token)
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        tracing::debug!(%method, %url, "gateway request");

        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> GatewayResult<T> {
        let response = Self::check(request.send().await?).await?;
        let body = response.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.into_inner())
    }

    async fn send_empty(&self, request: RequestBuilder) -> GatewayResult<()> {
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn check(response: Response) -> GatewayResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        tracing::warn!(%status, "gateway request failed");
        Err(match status {
            StatusCode::UNAUTHORIZED => GatewayError::Unauthorized,
            StatusCode::FORBIDDEN => GatewayError::Forbidden(text),
            StatusCode::NOT_FOUND => GatewayError::NotFound(text),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => GatewayError::Validation(text),
            _ => GatewayError::Server(format!("{status}: {text}")),
        })
    }
}

#[async_trait]
impl FeeGateway for HttpGateway {
    async fn list_companies(&self) -> GatewayResult<Vec<Company>> {
        self.send(self.request(Method::GET, "companies")).await
    }

    async fn list_payments(&self) -> GatewayResult<Vec<PaymentRecord>> {
        self.send(self.request(Method::GET, "payments")).await
    }

    async fn update_payment_status(
        &self,
        id: PaymentId,
        update: &StatusUpdate,
    ) -> GatewayResult<PaymentRecord> {
        let request = self
            .request(Method::PATCH, &format!("payments/{id}"))
            .json(update);
        self.send(request).await
    }

    async fn monthly_revenue(&self, month: ReferenceMonth) -> GatewayResult<Money> {
        let request = self
            .request(Method::GET, "payments/monthly-revenue")
            .query(&[("year", month.year().to_string()), ("month", month.month().to_string())]);
        let value: serde_json::Value = self.send(request).await?;
        Ok(parse_revenue(&value))
    }

    async fn generate_payments(&self, month: ReferenceMonth) -> GatewayResult<()> {
        #[derive(Serialize)]
        struct GenerateRequest {
            reference_month: String,
        }

        let request = self
            .request(Method::POST, "payments/generate")
            .json(&GenerateRequest {
                reference_month: month.iso_first_day(),
            });
        self.send_empty(request).await
    }

    async fn create_company(&self, draft: &CompanyDraft) -> GatewayResult<Company> {
        self.send(self.request(Method::POST, "companies").json(draft)).await
    }

    async fn update_company(&self, id: CompanyId, changes: &CompanyChanges) -> GatewayResult<Company> {
        let request = self
            .request(Method::PATCH, &format!("companies/{id}"))
            .json(changes);
        self.send(request).await
    }

    async fn delete_company(&self, id: CompanyId) -> GatewayResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("companies/{id}"))).await
    }
}
