pub mod config;
pub mod domain;
pub mod errors;
pub mod gateway;
pub mod money;
pub mod policy;
pub mod remarks;
pub mod token;
pub mod validation;
pub mod workflow;

pub use domain::{
    ApprovalDecision, LineItem, PendingRow, StockBatch, StockInput, StockRecord, Submission,
};
pub use errors::{AuthError, WorkflowError};
pub use gateway::{
    ApiEnvelope, DecisionEndpoint, MemoryGateway, SubmissionGateway, GENERIC_REMOTE_ERROR,
    INVALID_DATA_FORMAT,
};
pub use money::{parse_rupiah, Money};
pub use policy::{
    acting_role, can_approve, is_terminal, label_and_color, route_for, FlowVariant, Role,
    RouteOutcome, Step, StepStatus,
};
pub use remarks::{NewRemark, Remark, RemarkSort, SortDirection, SortField, ThreadState};
pub use token::{DecodedIdentity, Session, DEFAULT_BRANCH};
pub use validation::{
    can_add_row, parse_quantity, total_price, RowAdmission, RowRejection, StockContext,
};
pub use workflow::{ConfirmOutcome, ScreenKind, SubmissionScreen};
