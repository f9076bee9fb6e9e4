//! The submission gateway seam.
//!
//! Every remote operation returns the backend's uniform envelope instead of
//! erroring: transport failures and non-2xx responses are folded into an
//! envelope whose `status` carries the numeric HTTP code when one was
//! received and `500` otherwise. Callers branch on the number, never on
//! message text.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ApprovalDecision, StockBatch, StockRecord, Submission};
use crate::policy::{FlowVariant, Step};
use crate::remarks::{NewRemark, Remark};
use crate::token::Session;

/// Distinct message for payloads of an unexpected shape; everything else
/// remote-side gets the generic server-error text.
pub const INVALID_DATA_FORMAT: &str = "invalid data format";
pub const GENERIC_REMOTE_ERROR: &str = "Terjadi kesalahan pada server";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: u16,
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: 200,
            message: "OK".to_owned(),
            data: Some(data),
            timestamp: Some(Utc::now().to_rfc3339()),
        }
    }

    pub fn remote_error(status: u16, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), data: None, timestamp: None }
    }

    pub fn transport_failure() -> Self {
        Self::remote_error(500, GENERIC_REMOTE_ERROR)
    }

    pub fn invalid_shape() -> Self {
        Self::remote_error(500, INVALID_DATA_FORMAT)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Which decision endpoint a screen posts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecisionEndpoint {
    HrDepartment,
    FinanceStaff,
    WarehouseStaff,
    BranchHead { branch: u32 },
}

impl DecisionEndpoint {
    pub fn path(&self) -> String {
        match self {
            Self::HrDepartment => "departemen-sdm".to_owned(),
            Self::FinanceStaff => "staf-keuangan".to_owned(),
            Self::WarehouseStaff => "staf-gudang".to_owned(),
            Self::BranchHead { branch } => format!("kepala-cabang/{branch}"),
        }
    }
}

/// One method per remote operation. No retries, no caching, no ordering
/// guarantees between in-flight calls.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn fetch_submission(&self, session: &Session, submission_id: &str)
        -> ApiEnvelope<Submission>;

    async fn list_submissions(
        &self,
        session: &Session,
        branch: Option<u32>,
    ) -> ApiEnvelope<Vec<Submission>>;

    async fn fetch_branch_stock(&self, session: &Session, branch: u32)
        -> ApiEnvelope<Vec<StockRecord>>;

    async fn submit_stock_reduction(
        &self,
        session: &Session,
        batch: &StockBatch,
    ) -> ApiEnvelope<Value>;

    async fn submit_stock_addition(
        &self,
        session: &Session,
        batch: &StockBatch,
    ) -> ApiEnvelope<Value>;

    async fn post_decision(
        &self,
        session: &Session,
        endpoint: DecisionEndpoint,
        decision: &ApprovalDecision,
    ) -> ApiEnvelope<Submission>;

    async fn fetch_remarks(&self, session: &Session, submission_id: &str)
        -> ApiEnvelope<Vec<Remark>>;

    async fn post_remark(&self, session: &Session, remark: &NewRemark) -> ApiEnvelope<Remark>;
}

/// In-memory gateway for tests and offline use. Approvals advance the step
/// the way the backend does for each flow; rejections drop to step 0.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    submissions: HashMap<String, Submission>,
    stock: HashMap<u32, Vec<StockRecord>>,
    remarks: HashMap<String, Vec<Remark>>,
    fail_status: Option<u16>,
}

impl MemoryGateway {
    pub fn with_submission(self, submission: Submission) -> Self {
        self.state
            .lock()
            .expect("memory gateway poisoned")
            .submissions
            .insert(submission.id.clone(), submission);
        self
    }

    pub fn with_stock(self, branch: u32, records: Vec<StockRecord>) -> Self {
        self.state.lock().expect("memory gateway poisoned").stock.insert(branch, records);
        self
    }

    pub fn with_remarks(self, submission_id: &str, remarks: Vec<Remark>) -> Self {
        self.state
            .lock()
            .expect("memory gateway poisoned")
            .remarks
            .insert(submission_id.to_owned(), remarks);
        self
    }

    /// Makes every subsequent call answer with the given status.
    pub fn failing_with(self, status: u16) -> Self {
        self.state.lock().expect("memory gateway poisoned").fail_status = Some(status);
        self
    }

    pub fn submission(&self, submission_id: &str) -> Option<Submission> {
        self.state.lock().expect("memory gateway poisoned").submissions.get(submission_id).cloned()
    }

    pub fn remarks(&self, submission_id: &str) -> Vec<Remark> {
        self.state
            .lock()
            .expect("memory gateway poisoned")
            .remarks
            .get(submission_id)
            .cloned()
            .unwrap_or_default()
    }

    fn failure<T>(&self) -> Option<ApiEnvelope<T>> {
        let status = self.state.lock().expect("memory gateway poisoned").fail_status?;
        Some(ApiEnvelope::remote_error(status, GENERIC_REMOTE_ERROR))
    }
}

fn advance(variant: FlowVariant, step: Step, approve: bool) -> Step {
    if !approve {
        return Step::REJECTED;
    }
    match (variant, step) {
        (FlowVariant::OwnedBranch, Step(code)) if (1..=4).contains(&code) => Step(code + 1),
        (FlowVariant::Partner, Step(code)) if (1..=2).contains(&code) => Step(code + 1),
        (_, unchanged) => unchanged,
    }
}

#[async_trait]
impl SubmissionGateway for MemoryGateway {
    async fn fetch_submission(
        &self,
        _session: &Session,
        submission_id: &str,
    ) -> ApiEnvelope<Submission> {
        if let Some(failure) = self.failure() {
            return failure;
        }
        match self.submission(submission_id) {
            Some(submission) => ApiEnvelope::ok(submission),
            None => ApiEnvelope::remote_error(404, "pengajuan tidak ditemukan"),
        }
    }

    async fn list_submissions(
        &self,
        _session: &Session,
        branch: Option<u32>,
    ) -> ApiEnvelope<Vec<Submission>> {
        if let Some(failure) = self.failure() {
            return failure;
        }
        let state = self.state.lock().expect("memory gateway poisoned");
        let mut submissions: Vec<Submission> = state
            .submissions
            .values()
            .filter(|submission| branch.map_or(true, |wanted| submission.origin_branch == wanted))
            .cloned()
            .collect();
        submissions.sort_by(|left, right| left.id.cmp(&right.id));
        ApiEnvelope::ok(submissions)
    }

    async fn fetch_branch_stock(
        &self,
        _session: &Session,
        branch: u32,
    ) -> ApiEnvelope<Vec<StockRecord>> {
        if let Some(failure) = self.failure() {
            return failure;
        }
        let state = self.state.lock().expect("memory gateway poisoned");
        ApiEnvelope::ok(state.stock.get(&branch).cloned().unwrap_or_default())
    }

    async fn submit_stock_reduction(
        &self,
        _session: &Session,
        _batch: &StockBatch,
    ) -> ApiEnvelope<Value> {
        self.failure().unwrap_or_else(|| ApiEnvelope::ok(Value::Null))
    }

    async fn submit_stock_addition(
        &self,
        _session: &Session,
        _batch: &StockBatch,
    ) -> ApiEnvelope<Value> {
        self.failure().unwrap_or_else(|| ApiEnvelope::ok(Value::Null))
    }

    async fn post_decision(
        &self,
        _session: &Session,
        _endpoint: DecisionEndpoint,
        decision: &ApprovalDecision,
    ) -> ApiEnvelope<Submission> {
        if let Some(failure) = self.failure() {
            return failure;
        }
        let mut state = self.state.lock().expect("memory gateway poisoned");
        match state.submissions.get_mut(&decision.submission_id) {
            Some(submission) => {
                submission.step = advance(submission.variant(), submission.step, decision.approve);
                ApiEnvelope::ok(submission.clone())
            }
            None => ApiEnvelope::remote_error(404, "pengajuan tidak ditemukan"),
        }
    }

    async fn fetch_remarks(
        &self,
        _session: &Session,
        submission_id: &str,
    ) -> ApiEnvelope<Vec<Remark>> {
        if let Some(failure) = self.failure() {
            return failure;
        }
        ApiEnvelope::ok(self.remarks(submission_id))
    }

    async fn post_remark(&self, _session: &Session, remark: &NewRemark) -> ApiEnvelope<Remark> {
        if let Some(failure) = self.failure() {
            return failure;
        }
        let stored = Remark {
            keterangan: remark.keterangan.clone(),
            sender_role: remark.sender_role.clone(),
            waktu_pengajuan: Utc::now().to_rfc3339(),
        };
        let mut state = self.state.lock().expect("memory gateway poisoned");
        state.remarks.entry(remark.submission_id.clone()).or_default().push(stored.clone());
        ApiEnvelope::ok(stored)
    }
}
