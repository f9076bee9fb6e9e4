//! Role-gated submission screens.
//!
//! A screen loads one submission, derives allowed actions from the step
//! policy and the caller's decoded role, holds the locally queued batch of
//! item rows, and posts the batch plus decision through the gateway. The
//! server owns every transition; the screen only re-routes on what comes
//! back. Screen state is local to one instance and never shared.

use rust_decimal::Decimal;
use serde_json::Value;

use crate::domain::{ApprovalDecision, PendingRow, StockBatch, StockRecord, Submission};
use crate::errors::{AuthError, WorkflowError};
use crate::gateway::{ApiEnvelope, DecisionEndpoint, SubmissionGateway};
use crate::policy::{
    acting_role, can_approve, label_and_color, route_for, FlowVariant, Role, RouteOutcome,
    StepStatus,
};
use crate::remarks::{NewRemark, RemarkSort, ThreadState};
use crate::token::Session;
use crate::validation::{
    can_add_row, parse_quantity, total_price, RowAdmission, RowRejection, StockContext,
};

/// The four role-specific screens of the approval workflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenKind {
    WarehouseConfirmation,
    HrApproval,
    FinanceApproval,
    BranchHeadReview,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BatchKind {
    Reduction,
    Addition,
}

impl ScreenKind {
    pub fn required_role(self) -> Role {
        match self {
            Self::WarehouseConfirmation => Role::WarehouseStaff,
            Self::HrApproval => Role::HrDepartmentHead,
            Self::FinanceApproval => Role::FinanceStaff,
            Self::BranchHeadReview => Role::BranchHead,
        }
    }

    pub fn stock_context(self) -> StockContext {
        match self {
            Self::WarehouseConfirmation => StockContext::Reduction,
            Self::HrApproval => StockContext::Addition { hr_review: true },
            Self::FinanceApproval | Self::BranchHeadReview => {
                StockContext::Addition { hr_review: false }
            }
        }
    }

    fn decision_endpoint(self, branch: u32) -> DecisionEndpoint {
        match self {
            Self::WarehouseConfirmation => DecisionEndpoint::WarehouseStaff,
            Self::HrApproval => DecisionEndpoint::HrDepartment,
            Self::FinanceApproval => DecisionEndpoint::FinanceStaff,
            Self::BranchHeadReview => DecisionEndpoint::BranchHead { branch },
        }
    }

    /// Which batch the screen posts before its decision, if any. HR and
    /// finance screens review existing line items and post decisions only.
    fn batch_kind(self) -> Option<BatchKind> {
        match self {
            Self::WarehouseConfirmation => Some(BatchKind::Reduction),
            Self::BranchHeadReview => Some(BatchKind::Addition),
            Self::HrApproval | Self::FinanceApproval => None,
        }
    }
}

/// Result of a confirm attempt that did not error.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfirmOutcome {
    /// Decision accepted; navigate per the step policy.
    Routed(RouteOutcome),
    /// Some queued row exceeds central stock; ask the user to override
    /// before submitting again.
    ConfirmCentralOverride,
}

#[derive(Debug)]
pub struct SubmissionScreen<G> {
    gateway: G,
    session: Session,
    kind: ScreenKind,
    branch: u32,
    submission: Submission,
    stock: Vec<StockRecord>,
    rows: Vec<PendingRow>,
}

impl<G: SubmissionGateway> SubmissionScreen<G> {
    /// Opens a screen: gates on the exact role label, then loads the
    /// submission and the branch stock snapshot. The two requests race
    /// independently and rendering waits on both.
    pub async fn open(
        gateway: G,
        session: Session,
        kind: ScreenKind,
        submission_id: &str,
        default_branch: u32,
    ) -> Result<Self, WorkflowError> {
        let required = kind.required_role();
        if session.identity.role != required.label() {
            return Err(WorkflowError::Forbidden {
                role: session.identity.role.clone(),
                required: required.label().to_owned(),
            });
        }

        let branch = session.branch_or(default_branch);
        let (submission_envelope, stock_envelope) = tokio::join!(
            gateway.fetch_submission(&session, submission_id),
            gateway.fetch_branch_stock(&session, branch),
        );

        let submission = unwrap_envelope(submission_envelope, Some(submission_id))?;
        let stock = unwrap_envelope(stock_envelope, None)?;

        Ok(Self { gateway, session, kind, branch, submission, stock, rows: Vec::new() })
    }

    pub fn kind(&self) -> ScreenKind {
        self.kind
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    pub fn stock(&self) -> &[StockRecord] {
        &self.stock
    }

    pub fn rows(&self) -> &[PendingRow] {
        &self.rows
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn variant(&self) -> FlowVariant {
        self.submission.variant()
    }

    pub fn status(&self) -> StepStatus {
        label_and_color(self.variant(), self.submission.step)
    }

    pub fn can_approve(&self) -> bool {
        can_approve(
            self.variant(),
            self.submission.step,
            &self.session.identity.role,
            &self.submission.items,
        )
    }

    /// Queues one item/quantity row. The quantity arrives as form text; the
    /// item must come from the fetched stock snapshot.
    pub fn add_row(&mut self, code: &str, quantity_input: &str) -> Result<RowAdmission, RowRejection> {
        let record = self
            .stock
            .iter()
            .find(|record| record.code == code)
            .cloned()
            .ok_or_else(|| RowRejection::UnknownItem { code: code.to_owned() })?;

        let quantity = parse_quantity(quantity_input)?;
        let context = self.kind.stock_context();
        let available = match context {
            StockContext::Reduction => record.current_stock,
            StockContext::Addition { .. } => record.central_stock,
        };
        let queued: Vec<String> = self.rows.iter().map(|row| row.code.clone()).collect();
        let admission = can_add_row(context, &record.code, quantity, available, &queued)?;

        self.rows.push(PendingRow {
            code: record.code,
            name: record.name,
            quantity,
            unit_price: record.unit_price,
        });
        Ok(admission)
    }

    pub fn remove_row(&mut self, code: &str) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| row.code != code);
        self.rows.len() != before
    }

    pub fn batch_total(&self) -> Decimal {
        total_price(&self.rows)
    }

    /// Whether any queued row was admitted past central stock and therefore
    /// needs an explicit override at submit time.
    pub fn rows_exceed_central(&self) -> bool {
        self.rows.iter().any(|row| {
            self.stock
                .iter()
                .find(|record| record.code == row.code)
                .map(|record| row.quantity > record.central_stock)
                .unwrap_or(false)
        })
    }

    /// Posts the queued batch (when this screen owns one) and the decision,
    /// then re-routes on the step the server answered with.
    pub async fn confirm(
        &mut self,
        approve: bool,
        remark: &str,
        central_override: bool,
    ) -> Result<ConfirmOutcome, WorkflowError> {
        let step = self.submission.step;
        if approve && !self.can_approve() {
            return Err(WorkflowError::ActionNotAllowed { step: step.0 });
        }
        if !approve && acting_role(self.variant(), step) != Some(self.kind.required_role()) {
            return Err(WorkflowError::ActionNotAllowed { step: step.0 });
        }
        if approve
            && matches!(self.kind.stock_context(), StockContext::Addition { hr_review: false })
            && self.rows_exceed_central()
            && !central_override
        {
            return Ok(ConfirmOutcome::ConfirmCentralOverride);
        }

        if approve && !self.rows.is_empty() {
            let batch = StockBatch {
                branch: self.branch,
                items: self.rows.iter().map(PendingRow::to_input).collect(),
            };
            let envelope: ApiEnvelope<Value> = match self.kind.batch_kind() {
                Some(BatchKind::Reduction) => {
                    self.gateway.submit_stock_reduction(&self.session, &batch).await
                }
                Some(BatchKind::Addition) => {
                    self.gateway.submit_stock_addition(&self.session, &batch).await
                }
                None => ApiEnvelope::ok(Value::Null),
            };
            ensure_success(&envelope)?;
        }

        let decision = ApprovalDecision {
            submission_id: self.submission.id.clone(),
            branch: self.branch,
            approve,
            remark: remark.to_owned(),
        };
        let envelope = self
            .gateway
            .post_decision(&self.session, self.kind.decision_endpoint(self.branch), &decision)
            .await;
        self.submission = unwrap_envelope(envelope, Some(&decision.submission_id))?;
        if approve {
            self.rows.clear();
        }

        Ok(ConfirmOutcome::Routed(route_for(
            self.variant(),
            self.submission.step,
            &self.session.identity.role,
            &self.submission.id,
        )))
    }

    pub async fn load_remarks(&self, sort: RemarkSort) -> Result<ThreadState, WorkflowError> {
        let envelope = self.gateway.fetch_remarks(&self.session, &self.submission.id).await;
        let remarks = unwrap_envelope(envelope, Some(&self.submission.id))?;
        Ok(ThreadState::from_fetch(Some(&self.submission.id), remarks, sort))
    }

    pub async fn post_remark(&self, text: &str) -> Result<(), WorkflowError> {
        let remark = NewRemark {
            submission_id: self.submission.id.clone(),
            keterangan: text.to_owned(),
            sender_role: self.session.identity.role.clone(),
        };
        let envelope = self.gateway.post_remark(&self.session, &remark).await;
        ensure_success(&envelope)
    }

    /// Where the current role should navigate for this submission.
    pub fn route(&self) -> RouteOutcome {
        route_for(
            self.variant(),
            self.submission.step,
            &self.session.identity.role,
            &self.submission.id,
        )
    }
}

fn unwrap_envelope<T>(
    envelope: ApiEnvelope<T>,
    submission_id: Option<&str>,
) -> Result<T, WorkflowError> {
    ensure_status(envelope.status, &envelope.message, submission_id)?;
    envelope.data.ok_or(WorkflowError::DataShape)
}

fn ensure_success<T>(envelope: &ApiEnvelope<T>) -> Result<(), WorkflowError> {
    ensure_status(envelope.status, &envelope.message, None)
}

fn ensure_status(
    status: u16,
    message: &str,
    submission_id: Option<&str>,
) -> Result<(), WorkflowError> {
    match status {
        200..=299 => Ok(()),
        401 | 403 => Err(WorkflowError::Auth(AuthError::Invalid)),
        404 => match submission_id {
            Some(id) => Err(WorkflowError::NotFound { id: id.to_owned() }),
            None => Err(WorkflowError::Remote { status, message: message.to_owned() }),
        },
        status => Err(WorkflowError::Remote { status, message: message.to_owned() }),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;

    use crate::domain::{LineItem, StockRecord, Submission};
    use crate::errors::{AuthError, WorkflowError};
    use crate::gateway::{ApiEnvelope, MemoryGateway};
    use crate::money::Money;
    use crate::policy::{RouteOutcome, Step};
    use crate::remarks::RemarkSort;
    use crate::token::{self, Session};
    use crate::validation::RowRejection;

    use super::{unwrap_envelope, ConfirmOutcome, ScreenKind, SubmissionScreen};

    fn session_for(role: &str, branch: u32) -> Session {
        let token = token::token_with(json!({
            "sub": "uji",
            "roles": role,
            "nomorCabang": branch,
            "exp": 4_000_000_000u32,
        }));
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        Session::from_token_at(&token, now).expect("test session")
    }

    fn submission(step: i64, owned: bool) -> Submission {
        Submission {
            id: "PGN-1".to_owned(),
            step: Step(step),
            submitted_at: "2025-03-14T09:30:00Z".to_owned(),
            origin_branch: 2,
            destination_branch: 1,
            owned_branch: owned,
            items: vec![LineItem {
                code: "BRG-01".to_owned(),
                name: "Kertas A4".to_owned(),
                unit_price: Money::from(55_000),
                branch_stock: 12,
                input_qty: 5,
                central_stock: 30,
            }],
        }
    }

    fn branch_stock() -> Vec<StockRecord> {
        vec![
            StockRecord {
                code: "BRG-01".to_owned(),
                name: "Kertas A4".to_owned(),
                unit_price: Money::from(55_000),
                current_stock: 12,
                central_stock: 30,
            },
            StockRecord {
                code: "BRG-02".to_owned(),
                name: "Tinta Printer".to_owned(),
                unit_price: Money::parse("Rp 85.000").expect("price"),
                current_stock: 4,
                central_stock: 5,
            },
        ]
    }

    async fn warehouse_screen() -> SubmissionScreen<MemoryGateway> {
        let gateway = MemoryGateway::default()
            .with_submission(submission(3, true))
            .with_stock(2, branch_stock());
        SubmissionScreen::open(
            gateway,
            session_for("Staf Gudang Pelaksana Umum", 2),
            ScreenKind::WarehouseConfirmation,
            "PGN-1",
            1,
        )
        .await
        .expect("screen opens")
    }

    #[tokio::test]
    async fn open_rejects_a_role_mismatch() {
        let gateway = MemoryGateway::default()
            .with_submission(submission(3, true))
            .with_stock(2, branch_stock());
        let error = SubmissionScreen::open(
            gateway,
            session_for("Staf keuangan", 2),
            ScreenKind::WarehouseConfirmation,
            "PGN-1",
            1,
        )
        .await
        .unwrap_err();

        assert!(matches!(error, WorkflowError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn open_maps_missing_submission_to_not_found() {
        let gateway = MemoryGateway::default().with_stock(2, branch_stock());
        let error = SubmissionScreen::open(
            gateway,
            session_for("Staf Gudang Pelaksana Umum", 2),
            ScreenKind::WarehouseConfirmation,
            "PGN-404",
            1,
        )
        .await
        .unwrap_err();

        assert_eq!(error, WorkflowError::NotFound { id: "PGN-404".to_owned() });
    }

    #[tokio::test]
    async fn open_maps_unauthorized_status_to_auth_error() {
        let gateway = MemoryGateway::default().failing_with(401);
        let error = SubmissionScreen::open(
            gateway,
            session_for("Staf Gudang Pelaksana Umum", 2),
            ScreenKind::WarehouseConfirmation,
            "PGN-1",
            1,
        )
        .await
        .unwrap_err();

        assert_eq!(error, WorkflowError::Auth(AuthError::Invalid));
    }

    #[tokio::test]
    async fn add_row_enforces_the_reduction_rules() {
        let mut screen = warehouse_screen().await;

        screen.add_row("BRG-01", "5").expect("first row");
        let duplicate = screen.add_row("BRG-01", "2").unwrap_err();
        assert_eq!(duplicate, RowRejection::DuplicateItem { code: "BRG-01".to_owned() });

        let overdrawn = screen.add_row("BRG-02", "11").unwrap_err();
        assert_eq!(overdrawn, RowRejection::ExceedsAvailable { requested: 11, available: 4 });

        let unknown = screen.add_row("BRG-99", "1").unwrap_err();
        assert_eq!(unknown, RowRejection::UnknownItem { code: "BRG-99".to_owned() });

        assert_eq!(screen.rows().len(), 1);
        assert_eq!(screen.batch_total(), Decimal::from(275_000));
    }

    #[tokio::test]
    async fn warehouse_confirm_posts_batch_and_routes_to_branch_head_step() {
        let mut screen = warehouse_screen().await;
        screen.add_row("BRG-01", "5").expect("row queued");

        let outcome = screen.confirm(true, "stok dikurangi", false).await.expect("confirm");

        assert_eq!(screen.submission().step, Step(4));
        assert!(screen.rows().is_empty());
        assert_eq!(
            outcome,
            ConfirmOutcome::Routed(RouteOutcome::Screen(
                "/pengadaan/konfirmasi-gudang/PGN-1".to_owned()
            ))
        );
    }

    #[tokio::test]
    async fn branch_head_addition_over_central_asks_for_override_then_submits() {
        let gateway = MemoryGateway::default()
            .with_submission(submission(4, true))
            .with_stock(2, branch_stock());
        let mut screen = SubmissionScreen::open(
            gateway,
            session_for("Kepala Operasional Cabang", 2),
            ScreenKind::BranchHeadReview,
            "PGN-1",
            1,
        )
        .await
        .expect("screen opens");

        let admission = screen.add_row("BRG-02", "11").expect("admitted with warning");
        assert!(admission.warn_exceeds_central);
        assert!(screen.rows_exceed_central());

        let first = screen.confirm(true, "", false).await.expect("prompt");
        assert_eq!(first, ConfirmOutcome::ConfirmCentralOverride);
        assert_eq!(screen.submission().step, Step(4), "nothing posted yet");

        let second = screen.confirm(true, "disetujui", true).await.expect("submitted");
        assert_eq!(screen.submission().step, Step(5));
        assert!(matches!(second, ConfirmOutcome::Routed(_)));
    }

    #[tokio::test]
    async fn hr_approval_is_blocked_while_central_stock_is_exceeded() {
        let mut over = submission(1, true);
        over.items[0].input_qty = 40;
        let gateway =
            MemoryGateway::default().with_submission(over).with_stock(2, branch_stock());
        let mut screen = SubmissionScreen::open(
            gateway,
            session_for("Kepala Departemen SDM dan Umum", 2),
            ScreenKind::HrApproval,
            "PGN-1",
            1,
        )
        .await
        .expect("screen opens");

        assert!(!screen.can_approve());
        let error = screen.confirm(true, "", false).await.unwrap_err();
        assert_eq!(error, WorkflowError::ActionNotAllowed { step: 1 });
    }

    #[tokio::test]
    async fn rejection_drops_the_submission_to_step_zero() {
        let gateway = MemoryGateway::default()
            .with_submission(submission(2, true))
            .with_stock(2, branch_stock());
        let mut screen = SubmissionScreen::open(
            gateway,
            session_for("Staf keuangan", 2),
            ScreenKind::FinanceApproval,
            "PGN-1",
            1,
        )
        .await
        .expect("screen opens");

        let outcome = screen.confirm(false, "anggaran tidak tersedia", false).await.expect("reject");
        assert_eq!(screen.submission().step, Step(0));
        assert_eq!(screen.status().label, "Ditolak");
        assert!(matches!(outcome, ConfirmOutcome::Routed(_)));
    }

    #[tokio::test]
    async fn confirm_outside_the_screens_step_is_not_allowed() {
        let gateway = MemoryGateway::default()
            .with_submission(submission(4, true))
            .with_stock(2, branch_stock());
        let mut screen = SubmissionScreen::open(
            gateway,
            session_for("Staf keuangan", 2),
            ScreenKind::FinanceApproval,
            "PGN-1",
            1,
        )
        .await
        .expect("screen opens");

        let error = screen.confirm(false, "", false).await.unwrap_err();
        assert_eq!(error, WorkflowError::ActionNotAllowed { step: 4 });
    }

    #[tokio::test]
    async fn remark_roundtrip_reflects_the_sender_role() {
        let screen = warehouse_screen().await;
        screen.post_remark("stok fisik sudah dicek").await.expect("posted");

        let state = screen.load_remarks(RemarkSort::default()).await.expect("thread");
        match state {
            crate::remarks::ThreadState::Loaded(remarks) => {
                assert_eq!(remarks.len(), 1);
                assert_eq!(remarks[0].sender_role, "Staf Gudang Pelaksana Umum");
            }
            other => panic!("unexpected thread state: {other:?}"),
        }
    }

    #[test]
    fn successful_envelope_without_data_is_an_invalid_shape() {
        let envelope = ApiEnvelope::<Submission> {
            status: 200,
            message: "OK".to_owned(),
            data: None,
            timestamp: None,
        };
        let error = unwrap_envelope(envelope, Some("PGN-1")).unwrap_err();
        assert_eq!(error, WorkflowError::DataShape);
    }

    #[tokio::test]
    async fn empty_thread_is_reported_as_empty_not_missing() {
        let screen = warehouse_screen().await;
        let state = screen.load_remarks(RemarkSort::default()).await.expect("thread");
        assert_eq!(state, crate::remarks::ThreadState::Empty);
    }
}
