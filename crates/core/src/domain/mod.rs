pub mod submission;

pub use submission::{
    ApprovalDecision, LineItem, PendingRow, StockBatch, StockInput, StockRecord, Submission,
};
