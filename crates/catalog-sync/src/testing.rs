//! Scripted [`PartnerApi`] for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use catalog_core::Product;
use tokio::time::Instant;
use uuid::Uuid;

use crate::client::ServiceResponse;
use crate::error::SyncResult;
use crate::partner::PartnerApi;

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub op: &'static str,
    pub token: String,
    pub at: Instant,
}

/// Answers each operation from its own queue.
///
/// An empty queue answers 500 for `auth` and `register`, 404 for `offers`.
#[derive(Default)]
pub(crate) struct ScriptedPartner {
    auth: Mutex<VecDeque<SyncResult<ServiceResponse>>>,
    register: Mutex<VecDeque<SyncResult<ServiceResponse>>>,
    offers: Mutex<VecDeque<SyncResult<ServiceResponse>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedPartner {
    pub fn push_auth(&self, response: SyncResult<ServiceResponse>) {
        self.auth.lock().unwrap().push_back(response);
    }

    pub fn push_register(&self, response: SyncResult<ServiceResponse>) {
        self.register.lock().unwrap().push_back(response);
    }

    pub fn push_offers(&self, response: SyncResult<ServiceResponse>) {
        self.offers.lock().unwrap().push_back(response);
    }

    pub fn calls(&self, op: &str) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.op == op)
            .cloned()
            .collect()
    }

    pub fn call_times(&self, op: &str) -> Vec<Instant> {
        self.calls(op).into_iter().map(|c| c.at).collect()
    }

    pub fn tokens_used(&self, op: &str) -> Vec<String> {
        self.calls(op).into_iter().map(|c| c.token).collect()
    }

    fn answer(
        &self,
        op: &'static str,
        token: &str,
        queue: &Mutex<VecDeque<SyncResult<ServiceResponse>>>,
        fallback: u16,
    ) -> SyncResult<ServiceResponse> {
        self.calls.lock().unwrap().push(Call {
            op,
            token: token.to_string(),
            at: Instant::now(),
        });
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ServiceResponse::new(fallback, "")))
    }
}

#[async_trait]
impl PartnerApi for ScriptedPartner {
    async fn authenticate(&self, refresh_credential: &str) -> SyncResult<ServiceResponse> {
        self.answer("auth", refresh_credential, &self.auth, 500)
    }

    async fn register_product(
        &self,
        token: &str,
        _product: &Product,
    ) -> SyncResult<ServiceResponse> {
        self.answer("register", token, &self.register, 500)
    }

    async fn product_offers(&self, token: &str, _product_id: Uuid) -> SyncResult<ServiceResponse> {
        self.answer("offers", token, &self.offers, 404)
    }
}
