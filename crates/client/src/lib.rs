//! HTTP implementation of the submission gateway.
//!
//! A thin request/response mapping over `reqwest`: no retries, no caching,
//! no client-enforced timeout beyond the network default, and no
//! cancellation of in-flight requests on teardown. Failures never surface as
//! `Err` to callers; they are folded into the uniform envelope with the
//! numeric HTTP status when one was received and `500` otherwise.

use async_trait::async_trait;
use pengadaan_core::config::AppConfig;
use pengadaan_core::{
    ApiEnvelope, ApprovalDecision, DecisionEndpoint, NewRemark, Remark, Session, StockBatch,
    StockRecord, Submission, SubmissionGateway, GENERIC_REMOTE_ERROR,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct HttpSubmissionGateway {
    client: Client,
    base_url: String,
    domain: String,
}

impl HttpSubmissionGateway {
    pub fn new(base_url: impl Into<String>, domain: impl Into<String>) -> Self {
        Self { client: Client::new(), base_url: base_url.into(), domain: domain.into() }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.api.base_url.clone(), config.api.domain.clone())
    }

    fn domain_url(&self, path: &str) -> String {
        format!("{}/api/{}/{}", self.base_url, self.domain, path)
    }

    /// The backend serves stock reduction outside the main domain prefix;
    /// the divergence is part of the contract.
    fn reduction_url(&self) -> String {
        format!("{}/api/kurang-stok-cabang/kurangi", self.base_url)
    }

    async fn get_envelope<T: DeserializeOwned>(
        &self,
        session: &Session,
        url: String,
    ) -> ApiEnvelope<T> {
        let request = self.client.get(&url);
        self.execute(session, request, &url).await
    }

    async fn post_envelope<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        session: &Session,
        url: String,
        body: &B,
    ) -> ApiEnvelope<T> {
        let request = self.client.post(&url).json(body);
        self.execute(session, request, &url).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        session: &Session,
        request: RequestBuilder,
        url: &str,
    ) -> ApiEnvelope<T> {
        let correlation_id = Uuid::new_v4();

        let response = match request.bearer_auth(session.bearer()).send().await {
            Ok(response) => response,
            Err(error) => {
                let status = error.status().map(|code| code.as_u16()).unwrap_or(500);
                warn!(
                    event_name = "gateway.transport_failure",
                    %correlation_id,
                    url,
                    status,
                    error = %error,
                    "request did not complete"
                );
                return ApiEnvelope::remote_error(status, GENERIC_REMOTE_ERROR);
            }
        };

        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(
                    event_name = "gateway.body_read_failure",
                    %correlation_id,
                    url,
                    status = status.as_u16(),
                    error = %error,
                    "response body could not be read"
                );
                return ApiEnvelope::remote_error(status.as_u16(), GENERIC_REMOTE_ERROR);
            }
        };

        // The backend answers errors in the same envelope shape; prefer its
        // own status and message whenever the body parses.
        match serde_json::from_slice::<ApiEnvelope<T>>(&bytes) {
            Ok(envelope) => envelope,
            Err(_) if status.is_success() => {
                warn!(
                    event_name = "gateway.invalid_shape",
                    %correlation_id,
                    url,
                    "2xx response with an unexpected payload shape"
                );
                ApiEnvelope::invalid_shape()
            }
            Err(_) => {
                warn!(
                    event_name = "gateway.remote_error",
                    %correlation_id,
                    url,
                    status = status.as_u16(),
                    "non-2xx response without an envelope body"
                );
                ApiEnvelope::remote_error(status.as_u16(), GENERIC_REMOTE_ERROR)
            }
        }
    }
}

#[async_trait]
impl SubmissionGateway for HttpSubmissionGateway {
    async fn fetch_submission(
        &self,
        session: &Session,
        submission_id: &str,
    ) -> ApiEnvelope<Submission> {
        let url = self.domain_url(&format!("tabel-pengadaan/{submission_id}"));
        self.get_envelope(session, url).await
    }

    async fn list_submissions(
        &self,
        session: &Session,
        branch: Option<u32>,
    ) -> ApiEnvelope<Vec<Submission>> {
        let url = match branch {
            Some(branch) => self.domain_url(&format!("tabel-pengadaan?nomorCabang={branch}")),
            None => self.domain_url("tabel-pengadaan"),
        };
        self.get_envelope(session, url).await
    }

    async fn fetch_branch_stock(
        &self,
        session: &Session,
        branch: u32,
    ) -> ApiEnvelope<Vec<StockRecord>> {
        let url = self.domain_url(&format!("get-stock/{branch}"));
        self.get_envelope(session, url).await
    }

    async fn submit_stock_reduction(
        &self,
        session: &Session,
        batch: &StockBatch,
    ) -> ApiEnvelope<Value> {
        self.post_envelope(session, self.reduction_url(), batch).await
    }

    async fn submit_stock_addition(
        &self,
        session: &Session,
        batch: &StockBatch,
    ) -> ApiEnvelope<Value> {
        self.post_envelope(session, self.domain_url("add-stock"), batch).await
    }

    async fn post_decision(
        &self,
        session: &Session,
        endpoint: DecisionEndpoint,
        decision: &ApprovalDecision,
    ) -> ApiEnvelope<Submission> {
        let url = self.domain_url(&endpoint.path());
        self.post_envelope(session, url, decision).await
    }

    async fn fetch_remarks(
        &self,
        session: &Session,
        submission_id: &str,
    ) -> ApiEnvelope<Vec<Remark>> {
        let url = self.domain_url(&format!("keterangan/{submission_id}"));
        self.get_envelope(session, url).await
    }

    async fn post_remark(&self, session: &Session, remark: &NewRemark) -> ApiEnvelope<Remark> {
        self.post_envelope(session, self.domain_url("keterangan"), remark).await
    }
}
