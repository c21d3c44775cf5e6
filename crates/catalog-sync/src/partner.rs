//! # Partner API
//!
//! The three partner endpoints the catalog depends on, behind a trait so
//! the refresher, reconciler and registrar can run against a fake.
//!
//! | Operation            | Request                                  |
//! |----------------------|------------------------------------------|
//! | `authenticate`       | `POST {base}/auth`                       |
//! | `register_product`   | `POST {base}/products/register`          |
//! | `product_offers`     | `GET  {base}/products/{id}/offers`       |

use async_trait::async_trait;
use catalog_core::Product;
use serde_json::json;
use uuid::Uuid;

use crate::client::{build_http_client, HttpMethod, ServiceClient, ServiceResponse};
use crate::config::PartnerConfig;
use crate::error::SyncResult;

/// Partner service operations.
///
/// Every method returns the raw response; status handling belongs to the
/// caller. `Err` means no response was received.
#[async_trait]
pub trait PartnerApi: Send + Sync {
    /// Exchanges the long-lived refresh credential for an access token.
    async fn authenticate(&self, refresh_credential: &str) -> SyncResult<ServiceResponse>;

    /// Registers a product with the partner.
    async fn register_product(&self, token: &str, product: &Product)
        -> SyncResult<ServiceResponse>;

    /// Lists the partner's offers for a product.
    async fn product_offers(&self, token: &str, product_id: Uuid) -> SyncResult<ServiceResponse>;
}

/// [`PartnerApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPartnerApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPartnerApi {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Builds the client from the partner URL and request timeout.
    pub fn from_config(config: &PartnerConfig) -> SyncResult<Self> {
        let http = build_http_client(config.request_timeout())?;
        Ok(Self::new(http, &config.partner.base_url))
    }

    fn client(&self, method: HttpMethod, path: &str, token: &str) -> ServiceClient {
        ServiceClient::new(
            self.http.clone(),
            method,
            format!("{}{}", self.base_url, path),
            token,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PartnerApi for HttpPartnerApi {
    async fn authenticate(&self, refresh_credential: &str) -> SyncResult<ServiceResponse> {
        let body = json!({ "refresh_token": refresh_credential });
        self.client(HttpMethod::Post, "/auth", refresh_credential)
            .call(Some(&body))
            .await
    }

    async fn register_product(
        &self,
        token: &str,
        product: &Product,
    ) -> SyncResult<ServiceResponse> {
        let body = product.registration_payload();
        self.client(HttpMethod::Post, "/products/register", token)
            .call(Some(&body))
            .await
    }

    async fn product_offers(&self, token: &str, product_id: Uuid) -> SyncResult<ServiceResponse> {
        self.client(
            HttpMethod::Get,
            &format!("/products/{}/offers", product_id),
            token,
        )
        .call(None)
        .await
    }
}
