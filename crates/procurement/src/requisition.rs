use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use procura_core::{Aggregate, AggregateId, AggregateRoot, TenantId, UserId};
use procura_events::Event;

use crate::comment::{Comment, CommentId};
use crate::error::ProcurementError;
use crate::line_item::LineItem;
use crate::project::ProjectId;
use crate::status::{Priority, RequisitionStatus};

/// Purchase requisition identifier (one event stream per requisition).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequisitionId(pub AggregateId);

impl RequisitionId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for RequisitionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: PurchaseRequisition.
///
/// Owns its line items and comment thread. Budget effects of completion are
/// decided by the owning [`crate::Project`]; the workflow layer appends both
/// streams in one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requisition {
    id: RequisitionId,
    tenant_id: Option<TenantId>,
    project_id: Option<ProjectId>,
    requester: Option<UserId>,
    name: String,
    priority: Priority,
    target_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    status: RequisitionStatus,
    is_approved: bool,
    is_rejected: bool,
    rejected_comment: Option<String>,
    lines: Vec<LineItem>,
    comments: Vec<Comment>,
    created_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
    deleted: bool,
}

impl Requisition {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: RequisitionId) -> Self {
        Self {
            id,
            tenant_id: None,
            project_id: None,
            requester: None,
            name: String::new(),
            priority: Priority::Medium,
            target_date: None,
            due_date: None,
            status: RequisitionStatus::Draft,
            is_approved: false,
            is_rejected: false,
            rejected_comment: None,
            lines: Vec::new(),
            comments: Vec::new(),
            created_at: None,
            version: 0,
            created: false,
            deleted: false,
        }
    }

    pub fn id_typed(&self) -> RequisitionId {
        self.id
    }

    /// Created and not deleted.
    pub fn exists(&self) -> bool {
        self.created && !self.deleted
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    pub fn requester(&self) -> Option<UserId> {
        self.requester
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn target_date(&self) -> Option<NaiveDate> {
        self.target_date
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn status(&self) -> RequisitionStatus {
        self.status
    }

    pub fn is_approved(&self) -> bool {
        self.is_approved
    }

    pub fn is_rejected(&self) -> bool {
        self.is_rejected
    }

    pub fn rejected_comment(&self) -> Option<&str> {
        self.rejected_comment.as_deref()
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    pub fn comment(&self, comment_id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    /// Comment thread, most recent first.
    pub fn comments_newest_first(&self) -> Vec<Comment> {
        let mut comments = self.comments.clone();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        comments
    }
}

impl AggregateRoot for Requisition {
    type Id = RequisitionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

// -------------------------
// Commands
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequisition {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub project_id: ProjectId,
    pub requester: UserId,
    pub name: String,
    pub priority: Priority,
    pub target_date: NaiveDate,
    pub due_date: NaiveDate,
    pub lines: Vec<LineItem>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetStatus. Completion's budget check happens on the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetStatus {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub status: RequisitionStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveRequisition {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectRequisition {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub comment: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequisition {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostComment {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub comment_id: CommentId,
    pub author: UserId,
    pub content: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditComment {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub comment_id: CommentId,
    pub content: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteComment {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub comment_id: CommentId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequisitionCommand {
    CreateRequisition(CreateRequisition),
    SetStatus(SetStatus),
    Approve(ApproveRequisition),
    Reject(RejectRequisition),
    Delete(DeleteRequisition),
    PostComment(PostComment),
    EditComment(EditComment),
    DeleteComment(DeleteComment),
}

// -------------------------
// Events
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequisitionCreated {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub project_id: ProjectId,
    pub requester: UserId,
    pub name: String,
    pub priority: Priority,
    pub target_date: NaiveDate,
    pub due_date: NaiveDate,
    pub lines: Vec<LineItem>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequisitionStatusChanged {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub from: RequisitionStatus,
    pub to: RequisitionStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequisitionApproved {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequisitionRejected {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub comment: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequisitionDeleted {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPosted {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub comment_id: CommentId,
    pub author: UserId,
    pub content: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentEdited {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub comment_id: CommentId,
    pub content: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDeleted {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub comment_id: CommentId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequisitionEvent {
    RequisitionCreated(RequisitionCreated),
    RequisitionStatusChanged(RequisitionStatusChanged),
    RequisitionApproved(RequisitionApproved),
    RequisitionRejected(RequisitionRejected),
    RequisitionDeleted(RequisitionDeleted),
    CommentPosted(CommentPosted),
    CommentEdited(CommentEdited),
    CommentDeleted(CommentDeleted),
}

impl Event for RequisitionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RequisitionEvent::RequisitionCreated(_) => "procurement.requisition.created",
            RequisitionEvent::RequisitionStatusChanged(_) => {
                "procurement.requisition.status_changed"
            }
            RequisitionEvent::RequisitionApproved(_) => "procurement.requisition.approved",
            RequisitionEvent::RequisitionRejected(_) => "procurement.requisition.rejected",
            RequisitionEvent::RequisitionDeleted(_) => "procurement.requisition.deleted",
            RequisitionEvent::CommentPosted(_) => "procurement.requisition.comment_posted",
            RequisitionEvent::CommentEdited(_) => "procurement.requisition.comment_edited",
            RequisitionEvent::CommentDeleted(_) => "procurement.requisition.comment_deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            RequisitionEvent::RequisitionCreated(e) => e.occurred_at,
            RequisitionEvent::RequisitionStatusChanged(e) => e.occurred_at,
            RequisitionEvent::RequisitionApproved(e) => e.occurred_at,
            RequisitionEvent::RequisitionRejected(e) => e.occurred_at,
            RequisitionEvent::RequisitionDeleted(e) => e.occurred_at,
            RequisitionEvent::CommentPosted(e) => e.occurred_at,
            RequisitionEvent::CommentEdited(e) => e.occurred_at,
            RequisitionEvent::CommentDeleted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Requisition {
    const AGGREGATE_TYPE: &'static str = "procurement.requisition";

    type Command = RequisitionCommand;
    type Event = RequisitionEvent;
    type Error = ProcurementError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            RequisitionEvent::RequisitionCreated(e) => {
                self.id = e.requisition_id;
                self.tenant_id = Some(e.tenant_id);
                self.project_id = Some(e.project_id);
                self.requester = Some(e.requester);
                self.name = e.name.clone();
                self.priority = e.priority;
                self.target_date = Some(e.target_date);
                self.due_date = Some(e.due_date);
                self.status = RequisitionStatus::Draft;
                self.lines = e.lines.clone();
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            RequisitionEvent::RequisitionStatusChanged(e) => {
                self.status = e.to;
            }
            RequisitionEvent::RequisitionApproved(_) => {
                self.is_approved = true;
                self.status = RequisitionStatus::InProgress;
            }
            RequisitionEvent::RequisitionRejected(e) => {
                self.is_rejected = true;
                self.is_approved = false;
                self.status = RequisitionStatus::Cancelled;
                self.rejected_comment = Some(e.comment.clone());
            }
            RequisitionEvent::RequisitionDeleted(_) => {
                self.deleted = true;
                self.lines.clear();
                self.comments.clear();
            }
            RequisitionEvent::CommentPosted(e) => {
                self.comments.push(Comment {
                    id: e.comment_id,
                    author: e.author,
                    content: e.content.clone(),
                    created_at: e.occurred_at,
                    updated_at: e.occurred_at,
                    is_updated: false,
                });
            }
            RequisitionEvent::CommentEdited(e) => {
                if let Some(comment) = self.comments.iter_mut().find(|c| c.id == e.comment_id) {
                    comment.content = e.content.clone();
                    comment.updated_at = e.occurred_at;
                    comment.is_updated = true;
                }
            }
            RequisitionEvent::CommentDeleted(e) => {
                self.comments.retain(|c| c.id != e.comment_id);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            RequisitionCommand::CreateRequisition(cmd) => self.handle_create(cmd),
            RequisitionCommand::SetStatus(cmd) => self.handle_set_status(cmd),
            RequisitionCommand::Approve(cmd) => self.handle_approve(cmd),
            RequisitionCommand::Reject(cmd) => self.handle_reject(cmd),
            RequisitionCommand::Delete(cmd) => self.handle_delete(cmd),
            RequisitionCommand::PostComment(cmd) => self.handle_post_comment(cmd),
            RequisitionCommand::EditComment(cmd) => self.handle_edit_comment(cmd),
            RequisitionCommand::DeleteComment(cmd) => self.handle_delete_comment(cmd),
        }
    }
}

impl Requisition {
    fn ensure_exists(&self, tenant_id: TenantId) -> Result<(), ProcurementError> {
        if !self.exists() || self.tenant_id != Some(tenant_id) {
            return Err(ProcurementError::not_found(format!(
                "purchase requisition {}",
                self.id
            )));
        }
        Ok(())
    }

    fn ensure_comment(&self, comment_id: CommentId) -> Result<(), ProcurementError> {
        if self.comment(comment_id).is_none() {
            return Err(ProcurementError::not_found(format!("comment {comment_id}")));
        }
        Ok(())
    }

    fn handle_create(
        &self,
        cmd: &CreateRequisition,
    ) -> Result<Vec<RequisitionEvent>, ProcurementError> {
        if self.created {
            return Err(ProcurementError::conflict("purchase requisition already exists"));
        }

        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(ProcurementError::validation("requisition name is required"));
        }

        let mut seen = HashSet::with_capacity(cmd.lines.len());
        for line in &cmd.lines {
            if line.quantity == 0 {
                return Err(ProcurementError::validation(format!(
                    "quantity for product {} must be positive",
                    line.product_id
                )));
            }
            if !seen.insert(line.product_id) {
                return Err(ProcurementError::validation(format!(
                    "product {} appears more than once",
                    line.product_id
                )));
            }
        }

        Ok(vec![RequisitionEvent::RequisitionCreated(
            RequisitionCreated {
                tenant_id: cmd.tenant_id,
                requisition_id: cmd.requisition_id,
                project_id: cmd.project_id,
                requester: cmd.requester,
                name: name.to_string(),
                priority: cmd.priority,
                target_date: cmd.target_date,
                due_date: cmd.due_date,
                lines: cmd.lines.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_set_status(&self, cmd: &SetStatus) -> Result<Vec<RequisitionEvent>, ProcurementError> {
        self.ensure_exists(cmd.tenant_id)?;

        if self.status.is_terminal() {
            return Err(ProcurementError::invalid_transition(format!(
                "requisition is already {}",
                self.status
            )));
        }
        if !self.is_approved && cmd.status.requires_approval() {
            return Err(ProcurementError::NotApproved {
                requested: cmd.status,
            });
        }
        if self.is_approved && cmd.status == RequisitionStatus::WaitingToApproval {
            return Err(ProcurementError::AlreadyApproved);
        }

        Ok(vec![RequisitionEvent::RequisitionStatusChanged(
            RequisitionStatusChanged {
                tenant_id: cmd.tenant_id,
                requisition_id: cmd.requisition_id,
                from: self.status,
                to: cmd.status,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_approve(
        &self,
        cmd: &ApproveRequisition,
    ) -> Result<Vec<RequisitionEvent>, ProcurementError> {
        self.ensure_exists(cmd.tenant_id)?;

        if self.status != RequisitionStatus::WaitingToApproval {
            return Err(ProcurementError::invalid_transition(format!(
                "requisition is {}, not waiting for approval",
                self.status
            )));
        }

        Ok(vec![RequisitionEvent::RequisitionApproved(
            RequisitionApproved {
                tenant_id: cmd.tenant_id,
                requisition_id: cmd.requisition_id,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    /// Rejection needs a reason and cannot reopen a finished requisition:
    /// a completed one has already committed its budget.
    fn handle_reject(
        &self,
        cmd: &RejectRequisition,
    ) -> Result<Vec<RequisitionEvent>, ProcurementError> {
        if cmd.comment.trim().is_empty() {
            return Err(ProcurementError::validation("comment is required"));
        }
        self.ensure_exists(cmd.tenant_id)?;

        if self.status.is_terminal() {
            return Err(ProcurementError::invalid_transition(format!(
                "requisition is already {}",
                self.status
            )));
        }

        Ok(vec![RequisitionEvent::RequisitionRejected(
            RequisitionRejected {
                tenant_id: cmd.tenant_id,
                requisition_id: cmd.requisition_id,
                comment: cmd.comment.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_delete(
        &self,
        cmd: &DeleteRequisition,
    ) -> Result<Vec<RequisitionEvent>, ProcurementError> {
        self.ensure_exists(cmd.tenant_id)?;

        Ok(vec![RequisitionEvent::RequisitionDeleted(
            RequisitionDeleted {
                tenant_id: cmd.tenant_id,
                requisition_id: cmd.requisition_id,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_post_comment(
        &self,
        cmd: &PostComment,
    ) -> Result<Vec<RequisitionEvent>, ProcurementError> {
        self.ensure_exists(cmd.tenant_id)?;

        if cmd.content.trim().is_empty() {
            return Err(ProcurementError::validation("comment content is required"));
        }
        if self.comment(cmd.comment_id).is_some() {
            return Err(ProcurementError::conflict("comment already exists"));
        }

        Ok(vec![RequisitionEvent::CommentPosted(CommentPosted {
            tenant_id: cmd.tenant_id,
            requisition_id: cmd.requisition_id,
            comment_id: cmd.comment_id,
            author: cmd.author,
            content: cmd.content.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_edit_comment(
        &self,
        cmd: &EditComment,
    ) -> Result<Vec<RequisitionEvent>, ProcurementError> {
        self.ensure_exists(cmd.tenant_id)?;
        self.ensure_comment(cmd.comment_id)?;

        if cmd.content.trim().is_empty() {
            return Err(ProcurementError::validation("comment content is required"));
        }

        Ok(vec![RequisitionEvent::CommentEdited(CommentEdited {
            tenant_id: cmd.tenant_id,
            requisition_id: cmd.requisition_id,
            comment_id: cmd.comment_id,
            content: cmd.content.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete_comment(
        &self,
        cmd: &DeleteComment,
    ) -> Result<Vec<RequisitionEvent>, ProcurementError> {
        self.ensure_exists(cmd.tenant_id)?;
        self.ensure_comment(cmd.comment_id)?;

        Ok(vec![RequisitionEvent::CommentDeleted(CommentDeleted {
            tenant_id: cmd.tenant_id,
            requisition_id: cmd.requisition_id,
            comment_id: cmd.comment_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
