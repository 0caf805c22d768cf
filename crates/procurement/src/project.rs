use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use procura_core::{Aggregate, AggregateId, AggregateRoot, Money, TenantId};
use procura_events::Event;

use crate::error::ProcurementError;
use crate::requisition::RequisitionId;

/// Project identifier (one event stream per project).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub AggregateId);

impl ProjectId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: Project, the budget envelope requisitions draw against.
///
/// Holds the running totals mutated when a requisition completes.
/// `current_purchase <= purchase_allowance` holds after every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    id: ProjectId,
    tenant_id: Option<TenantId>,
    name: String,
    code: String,
    label: String,
    is_default: bool,
    purchase_allowance: Money,
    current_purchase: Money,
    purchase_count: u64,
    version: u64,
    created: bool,
    deleted: bool,
}

impl Project {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ProjectId) -> Self {
        Self {
            id,
            tenant_id: None,
            name: String::new(),
            code: String::new(),
            label: String::new(),
            is_default: false,
            purchase_allowance: Money::ZERO,
            current_purchase: Money::ZERO,
            purchase_count: 0,
            version: 0,
            created: false,
            deleted: false,
        }
    }

    pub fn id_typed(&self) -> ProjectId {
        self.id
    }

    /// Created and not deleted.
    pub fn exists(&self) -> bool {
        self.created && !self.deleted
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn purchase_allowance(&self) -> Money {
        self.purchase_allowance
    }

    pub fn current_purchase(&self) -> Money {
        self.current_purchase
    }

    pub fn purchase_count(&self) -> u64 {
        self.purchase_count
    }

    /// Allowance not yet committed.
    pub fn remaining(&self) -> Money {
        Money::from_minor(self.purchase_allowance.minor() - self.current_purchase.minor())
    }
}

impl AggregateRoot for Project {
    type Id = ProjectId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProject {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub name: String,
    pub code: String,
    pub label: String,
    pub purchase_allowance: Money,
    /// Decided by the tenant's project directory (first project is default).
    pub is_default: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RenameProject. `None` keeps the current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameProject {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub name: Option<String>,
    pub label: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CommitPurchase (a requisition of this project completed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitPurchase {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub requisition_id: RequisitionId,
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkDefault {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmarkDefault {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteProject {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectCommand {
    CreateProject(CreateProject),
    RenameProject(RenameProject),
    CommitPurchase(CommitPurchase),
    MarkDefault(MarkDefault),
    UnmarkDefault(UnmarkDefault),
    DeleteProject(DeleteProject),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCreated {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub name: String,
    pub code: String,
    pub label: String,
    pub purchase_allowance: Money,
    pub is_default: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRenamed {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub name: String,
    pub label: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseCommitted. Carries the totals after the commit so the
/// ledger can be audited from the stream alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseCommitted {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub requisition_id: RequisitionId,
    pub amount: Money,
    pub current_purchase: Money,
    pub purchase_count: u64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDefaultChanged {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub is_default: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDeleted {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectEvent {
    ProjectCreated(ProjectCreated),
    ProjectRenamed(ProjectRenamed),
    PurchaseCommitted(PurchaseCommitted),
    ProjectDefaultChanged(ProjectDefaultChanged),
    ProjectDeleted(ProjectDeleted),
}

impl Event for ProjectEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProjectEvent::ProjectCreated(_) => "procurement.project.created",
            ProjectEvent::ProjectRenamed(_) => "procurement.project.renamed",
            ProjectEvent::PurchaseCommitted(_) => "procurement.project.purchase_committed",
            ProjectEvent::ProjectDefaultChanged(_) => "procurement.project.default_changed",
            ProjectEvent::ProjectDeleted(_) => "procurement.project.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProjectEvent::ProjectCreated(e) => e.occurred_at,
            ProjectEvent::ProjectRenamed(e) => e.occurred_at,
            ProjectEvent::PurchaseCommitted(e) => e.occurred_at,
            ProjectEvent::ProjectDefaultChanged(e) => e.occurred_at,
            ProjectEvent::ProjectDeleted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Project {
    const AGGREGATE_TYPE: &'static str = "procurement.project";

    type Command = ProjectCommand;
    type Event = ProjectEvent;
    type Error = ProcurementError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProjectEvent::ProjectCreated(e) => {
                self.id = e.project_id;
                self.tenant_id = Some(e.tenant_id);
                self.name = e.name.clone();
                self.code = e.code.clone();
                self.label = e.label.clone();
                self.purchase_allowance = e.purchase_allowance;
                self.is_default = e.is_default;
                self.current_purchase = Money::ZERO;
                self.purchase_count = 0;
                self.created = true;
            }
            ProjectEvent::ProjectRenamed(e) => {
                self.name = e.name.clone();
                self.label = e.label.clone();
            }
            ProjectEvent::PurchaseCommitted(e) => {
                self.current_purchase = e.current_purchase;
                self.purchase_count = e.purchase_count;
            }
            ProjectEvent::ProjectDefaultChanged(e) => {
                self.is_default = e.is_default;
            }
            ProjectEvent::ProjectDeleted(_) => {
                self.deleted = true;
                self.is_default = false;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProjectCommand::CreateProject(cmd) => self.handle_create(cmd),
            ProjectCommand::RenameProject(cmd) => self.handle_rename(cmd),
            ProjectCommand::CommitPurchase(cmd) => self.handle_commit(cmd),
            ProjectCommand::MarkDefault(cmd) => {
                self.handle_default(cmd.tenant_id, cmd.project_id, true, cmd.occurred_at)
            }
            ProjectCommand::UnmarkDefault(cmd) => {
                self.handle_default(cmd.tenant_id, cmd.project_id, false, cmd.occurred_at)
            }
            ProjectCommand::DeleteProject(cmd) => {
                self.ensure_exists(cmd.tenant_id)?;
                Ok(vec![ProjectEvent::ProjectDeleted(ProjectDeleted {
                    tenant_id: cmd.tenant_id,
                    project_id: cmd.project_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }
}

impl Project {
    fn ensure_exists(&self, tenant_id: TenantId) -> Result<(), ProcurementError> {
        if !self.exists() || self.tenant_id != Some(tenant_id) {
            return Err(ProcurementError::not_found(format!("project {}", self.id)));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateProject) -> Result<Vec<ProjectEvent>, ProcurementError> {
        if self.created {
            return Err(ProcurementError::conflict("project already exists"));
        }

        let name = cmd.name.trim();
        let code = cmd.code.trim();
        if name.is_empty() {
            return Err(ProcurementError::validation("project name is required"));
        }
        if code.is_empty() {
            return Err(ProcurementError::validation("project code is required"));
        }
        if cmd.purchase_allowance.is_negative() {
            return Err(ProcurementError::validation(
                "purchase allowance must not be negative",
            ));
        }

        Ok(vec![ProjectEvent::ProjectCreated(ProjectCreated {
            tenant_id: cmd.tenant_id,
            project_id: cmd.project_id,
            name: name.to_string(),
            code: code.to_string(),
            label: cmd.label.trim().to_string(),
            purchase_allowance: cmd.purchase_allowance,
            is_default: cmd.is_default,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_rename(&self, cmd: &RenameProject) -> Result<Vec<ProjectEvent>, ProcurementError> {
        self.ensure_exists(cmd.tenant_id)?;

        let name = match cmd.name.as_deref().map(str::trim) {
            Some("") => return Err(ProcurementError::validation("project name is required")),
            Some(n) => n.to_string(),
            None => self.name.clone(),
        };
        let label = cmd
            .label
            .as_deref()
            .map(|l| l.trim().to_string())
            .unwrap_or_else(|| self.label.clone());

        if name == self.name && label == self.label {
            return Ok(Vec::new());
        }

        Ok(vec![ProjectEvent::ProjectRenamed(ProjectRenamed {
            tenant_id: cmd.tenant_id,
            project_id: cmd.project_id,
            name,
            label,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_commit(&self, cmd: &CommitPurchase) -> Result<Vec<ProjectEvent>, ProcurementError> {
        self.ensure_exists(cmd.tenant_id)?;

        if cmd.amount.is_negative() {
            return Err(ProcurementError::validation(
                "purchase amount must not be negative",
            ));
        }

        let after = self.current_purchase.checked_add(cmd.amount)?;
        if after > self.purchase_allowance {
            return Err(ProcurementError::BudgetExceeded {
                allowance: self.purchase_allowance,
                current: self.current_purchase,
                requested: cmd.amount,
            });
        }

        Ok(vec![ProjectEvent::PurchaseCommitted(PurchaseCommitted {
            tenant_id: cmd.tenant_id,
            project_id: cmd.project_id,
            requisition_id: cmd.requisition_id,
            amount: cmd.amount,
            current_purchase: after,
            purchase_count: self.purchase_count + 1,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_default(
        &self,
        tenant_id: TenantId,
        project_id: ProjectId,
        is_default: bool,
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<ProjectEvent>, ProcurementError> {
        self.ensure_exists(tenant_id)?;

        if self.is_default == is_default {
            return Ok(Vec::new());
        }

        Ok(vec![ProjectEvent::ProjectDefaultChanged(
            ProjectDefaultChanged {
                tenant_id,
                project_id,
                is_default,
                occurred_at,
            },
        )])
    }
}
