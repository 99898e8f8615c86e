//! # Batch Payments
//!
//! A batch file is planned completely before anything is sent:
//!
//! ```text
//! lines ──▶ BatchPlanner ──▶ BatchPlan ──▶ BatchExecutor ──▶ BatchRun
//!             (pure)                         (Ledger)
//! ```

pub mod executor;
pub mod planner;
pub mod types;

pub use executor::{
    BatchError, BatchExecutionState, BatchExecutor, BatchOutcome, BatchRun, ExecutorConfig, SubmissionOutcome,
};
pub use planner::{BatchPlanner, PlanError, PlannerConfig};
pub use types::{BatchPlan, PaymentInstruction, PlanWarning};
