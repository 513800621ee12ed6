pub mod comparator;
pub mod engine;
pub mod error;
pub mod events;
pub mod lister;
pub mod model;
pub mod supervisor;
pub mod transfer;

pub use comparator::{FileComparator, FileRelation};
pub use engine::{ComparisonRequest, Orchestrator};
pub use error::{format_budget, InvocationError, ItemTransferError, ListingError};
pub use events::{ComparisonOutcome, EngineEvent};
pub use lister::{parse_line, parse_listing, ListingKind, ListingLine, RemoteLister};
pub use model::{
    CompareCriteria, ComparisonResult, ComparisonSummary, Criterion, FileEntry, Report,
    TransferResult,
};
pub use supervisor::{OperationState, OperationStatus, ProcessHandle, ProcessSupervisor};
pub use transfer::{TransferExecutor, TransferRequest};
