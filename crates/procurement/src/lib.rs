//! Procurement domain (event-sourced): purchase requisitions, budget-bound
//! projects and the per-tenant project directory.
//!
//! Deterministic domain logic only. Loading, pricing lookups and atomic
//! persistence of several streams live in `procura-infra`.

pub mod comment;
pub mod directory;
pub mod error;
pub mod line_item;
pub mod pricing;
pub mod project;
pub mod requisition;
pub mod status;

pub use comment::{Comment, CommentId};
pub use directory::{
    DefaultProjectMoved, DirectoryCommand, DirectoryEvent, MoveDefault, ProjectDirectory,
    ProjectRegistered, ProjectUnregistered, RegisterProject, UnregisterProject,
};
pub use error::{ProcurementError, ProcurementResult};
pub use line_item::{LineItem, ProductId, VendorId};
pub use pricing::{PricedLine, RequisitionPricing};
pub use project::{
    CommitPurchase, CreateProject, DeleteProject, MarkDefault, Project, ProjectCommand,
    ProjectCreated, ProjectDefaultChanged, ProjectDeleted, ProjectEvent, ProjectId,
    ProjectRenamed, PurchaseCommitted, RenameProject, UnmarkDefault,
};
pub use requisition::{
    ApproveRequisition, CommentDeleted, CommentEdited, CommentPosted, CreateRequisition,
    DeleteComment, DeleteRequisition, EditComment, PostComment, RejectRequisition, Requisition,
    RequisitionApproved, RequisitionCommand, RequisitionCreated, RequisitionDeleted,
    RequisitionEvent, RequisitionId, RequisitionRejected, RequisitionStatusChanged, SetStatus,
};
pub use status::{Priority, RequisitionStatus};
