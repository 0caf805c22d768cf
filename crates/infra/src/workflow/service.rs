use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, instrument, warn};

use procura_core::{Aggregate, AggregateId, AggregateRoot, Money, TenantId, UserId};
use procura_procurement::{
    ApproveRequisition, Comment, CommentId, CommitPurchase, CreateProject, CreateRequisition,
    DeleteComment, DeleteProject, DeleteRequisition, DirectoryCommand, EditComment, LineItem, MarkDefault,
    MoveDefault, PostComment, Priority, ProcurementError, ProductId, Project, ProjectCommand,
    ProjectDirectory, ProjectId, RegisterProject, RejectRequisition, RenameProject, Requisition,
    RequisitionCommand, RequisitionId, RequisitionPricing, RequisitionStatus, SetStatus,
    UnmarkDefault, UnregisterProject, VendorId,
};

use crate::catalog::PriceCatalog;
use crate::event_store::EventStore;
use crate::workflow::error::ServiceError;
use crate::workflow::repository::{load, stream_append};

/// Attempts per operation before a persistent write conflict is reported.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub code: String,
    pub label: String,
    pub purchase_allowance: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequisition {
    pub name: String,
    pub priority: Priority,
    pub project_code: String,
    pub target_date: NaiveDate,
    pub due_date: NaiveDate,
    pub lines: Vec<LineItem>,
}

/// A requisition with its live pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequisitionDetails {
    pub requisition: Requisition,
    pub project_code: String,
    pub pricing: RequisitionPricing,
}

/// Procurement workflow over an event store and a price catalog.
///
/// Budget effects of completing a requisition and default-project flips
/// touch several streams; those are committed in a single append so either
/// all of them advance or none does.
#[derive(Clone)]
pub struct ProcurementService {
    store: Arc<dyn EventStore>,
    catalog: Arc<dyn PriceCatalog>,
    max_attempts: u32,
}

impl std::fmt::Debug for ProcurementService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcurementService")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl ProcurementService {
    pub fn new(store: Arc<dyn EventStore>, catalog: Arc<dyn PriceCatalog>) -> Self {
        Self {
            store,
            catalog,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Attempts per operation; values below 1 are treated as 1.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    // ---- projects -------------------------------------------------------

    #[instrument(skip_all, fields(tenant_id = %tenant_id, code = %input.code))]
    pub async fn create_project(
        &self,
        tenant_id: TenantId,
        input: NewProject,
    ) -> Result<Project, ServiceError> {
        let project_id = ProjectId::new(AggregateId::new());
        let now = Utc::now();
        let input = &input;
        self.retrying("create_project", move || {
            self.try_create_project(tenant_id, project_id, input, now)
        })
        .await
    }

    async fn try_create_project(
        &self,
        tenant_id: TenantId,
        project_id: ProjectId,
        input: &NewProject,
        now: DateTime<Utc>,
    ) -> Result<Project, ServiceError> {
        let directory = self.load_directory(tenant_id).await?;
        let code = input.code.trim().to_string();

        let mut project = Project::empty(project_id);
        let project_events = project.handle(&ProjectCommand::CreateProject(CreateProject {
            tenant_id,
            project_id,
            name: input.name.clone(),
            code: code.clone(),
            label: input.label.clone(),
            purchase_allowance: input.purchase_allowance,
            is_default: directory.default_project().is_none(),
            occurred_at: now,
        }))?;
        let directory_events =
            directory.handle(&DirectoryCommand::RegisterProject(RegisterProject {
                tenant_id,
                project_id,
                code,
                occurred_at: now,
            }))?;

        self.store
            .append(vec![
                stream_append::<ProjectDirectory>(
                    tenant_id,
                    *directory.id(),
                    directory.version(),
                    &directory_events,
                )?,
                stream_append::<Project>(tenant_id, project_id.0, 0, &project_events)?,
            ])
            .await?;

        project.apply_all(&project_events);
        info!(project_id = %project_id, is_default = project.is_default(), "project created");
        Ok(project)
    }

    /// Projects of the tenant ordered by code.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn list_projects(&self, tenant_id: TenantId) -> Result<Vec<Project>, ServiceError> {
        let directory = self.load_directory(tenant_id).await?;
        let mut projects = Vec::with_capacity(directory.len());
        for (_, project_id) in directory.projects() {
            projects.push(self.load_project(tenant_id, project_id).await?);
        }
        Ok(projects)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn get_project(&self, tenant_id: TenantId, code: &str) -> Result<Project, ServiceError> {
        let directory = self.load_directory(tenant_id).await?;
        let project_id = project_for_code(&directory, code)?;
        self.load_project(tenant_id, project_id).await
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn rename_project(
        &self,
        tenant_id: TenantId,
        code: &str,
        name: Option<String>,
        label: Option<String>,
    ) -> Result<Project, ServiceError> {
        let now = Utc::now();
        let (name, label) = (&name, &label);
        self.retrying("rename_project", move || {
            self.try_rename_project(tenant_id, code, name, label, now)
        })
        .await
    }

    async fn try_rename_project(
        &self,
        tenant_id: TenantId,
        code: &str,
        name: &Option<String>,
        label: &Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Project, ServiceError> {
        let directory = self.load_directory(tenant_id).await?;
        let project_id = project_for_code(&directory, code)?;
        let mut project = self.load_project(tenant_id, project_id).await?;

        let events = project.handle(&ProjectCommand::RenameProject(RenameProject {
            tenant_id,
            project_id,
            name: name.clone(),
            label: label.clone(),
            occurred_at: now,
        }))?;
        if events.is_empty() {
            return Ok(project);
        }

        self.store
            .append(vec![stream_append::<Project>(
                tenant_id,
                project_id.0,
                project.version(),
                &events,
            )?])
            .await?;
        project.apply_all(&events);
        Ok(project)
    }

    /// Make the project with `code` the tenant's default.
    ///
    /// Returns `false` when it already was; nothing is written in that case.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn mark_default_project(
        &self,
        tenant_id: TenantId,
        code: &str,
    ) -> Result<bool, ServiceError> {
        let now = Utc::now();
        self.retrying("mark_default_project", move || {
            self.try_mark_default(tenant_id, code, now)
        })
        .await
    }

    async fn try_mark_default(
        &self,
        tenant_id: TenantId,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, ServiceError> {
        let directory = self.load_directory(tenant_id).await?;
        let target_id = project_for_code(&directory, code)?;
        let previous_id = directory.default_project();

        let directory_events = directory.handle(&DirectoryCommand::MoveDefault(MoveDefault {
            tenant_id,
            project_id: target_id,
            occurred_at: now,
        }))?;
        if directory_events.is_empty() {
            return Ok(false);
        }

        let target = self.load_project(tenant_id, target_id).await?;
        let target_events = target.handle(&ProjectCommand::MarkDefault(MarkDefault {
            tenant_id,
            project_id: target_id,
            occurred_at: now,
        }))?;

        let mut batch = vec![
            stream_append::<ProjectDirectory>(
                tenant_id,
                *directory.id(),
                directory.version(),
                &directory_events,
            )?,
            stream_append::<Project>(tenant_id, target_id.0, target.version(), &target_events)?,
        ];

        if let Some(previous_id) = previous_id.filter(|p| *p != target_id) {
            let previous = self.load_project(tenant_id, previous_id).await?;
            let previous_events =
                previous.handle(&ProjectCommand::UnmarkDefault(UnmarkDefault {
                    tenant_id,
                    project_id: previous_id,
                    occurred_at: now,
                }))?;
            batch.push(stream_append::<Project>(
                tenant_id,
                previous_id.0,
                previous.version(),
                &previous_events,
            )?);
        }

        self.store.append(batch).await?;
        info!(project_id = %target_id, previous = ?previous_id, "default project moved");
        Ok(true)
    }

    /// Delete the project with `code` and free the code.
    ///
    /// The default project can only go once it is the tenant's last one.
    /// Requisitions of the project stay readable but can no longer complete.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn delete_project(&self, tenant_id: TenantId, code: &str) -> Result<(), ServiceError> {
        let now = Utc::now();
        self.retrying("delete_project", move || {
            self.try_delete_project(tenant_id, code, now)
        })
        .await
    }

    async fn try_delete_project(
        &self,
        tenant_id: TenantId,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let directory = self.load_directory(tenant_id).await?;
        let project_id = project_for_code(&directory, code)?;
        let project = self.load_project(tenant_id, project_id).await?;

        let directory_events =
            directory.handle(&DirectoryCommand::UnregisterProject(UnregisterProject {
                tenant_id,
                project_id,
                occurred_at: now,
            }))?;
        let project_events = project.handle(&ProjectCommand::DeleteProject(DeleteProject {
            tenant_id,
            project_id,
            occurred_at: now,
        }))?;

        self.store
            .append(vec![
                stream_append::<ProjectDirectory>(
                    tenant_id,
                    *directory.id(),
                    directory.version(),
                    &directory_events,
                )?,
                stream_append::<Project>(tenant_id, project_id.0, project.version(), &project_events)?,
            ])
            .await?;

        info!(project_id = %project_id, "project deleted");
        Ok(())
    }

    // ---- price catalog --------------------------------------------------

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn set_price(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        vendor_id: VendorId,
        unit_price_minor: i64,
    ) -> Result<Money, ServiceError> {
        let unit_price = Money::non_negative(unit_price_minor)?;
        self.catalog
            .set_price(tenant_id, product_id, vendor_id, unit_price)
            .await?;
        Ok(unit_price)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn remove_price(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        vendor_id: VendorId,
    ) -> Result<(), ServiceError> {
        if !self
            .catalog
            .remove_price(tenant_id, product_id, vendor_id)
            .await?
        {
            return Err(ProcurementError::not_found(format!(
                "price for product {product_id} from vendor {vendor_id}"
            ))
            .into());
        }
        Ok(())
    }

    /// Current unit price of a pair, or `PriceNotFound`.
    pub async fn resolve_price(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        vendor_id: VendorId,
    ) -> Result<Money, ServiceError> {
        self.catalog
            .unit_price(tenant_id, product_id, vendor_id)
            .await?
            .ok_or_else(|| {
                ProcurementError::PriceNotFound {
                    product_id,
                    vendor_id,
                }
                .into()
            })
    }

    // ---- requisitions ---------------------------------------------------

    /// Create a DRAFT requisition owned by `requester` in the project with
    /// `input.project_code`. Every line must be priced in the catalog.
    #[instrument(skip_all, fields(tenant_id = %tenant_id, requester = %requester))]
    pub async fn create_requisition(
        &self,
        tenant_id: TenantId,
        requester: UserId,
        input: NewRequisition,
    ) -> Result<RequisitionDetails, ServiceError> {
        let directory = self.load_directory(tenant_id).await?;
        let project_id = project_for_code(&directory, &input.project_code)?;
        let project = self.load_project(tenant_id, project_id).await?;

        let requisition_id = RequisitionId::new(AggregateId::new());
        let mut requisition = Requisition::empty(requisition_id);
        let events = requisition.handle(&RequisitionCommand::CreateRequisition(
            CreateRequisition {
                tenant_id,
                requisition_id,
                project_id,
                requester,
                name: input.name,
                priority: input.priority,
                target_date: input.target_date,
                due_date: input.due_date,
                lines: input.lines,
                occurred_at: Utc::now(),
            },
        ))?;
        requisition.apply_all(&events);

        let pricing = self.price_lines(tenant_id, requisition.lines()).await?;

        self.store
            .append(vec![stream_append::<Requisition>(
                tenant_id,
                requisition_id.0,
                0,
                &events,
            )?])
            .await?;

        info!(requisition_id = %requisition_id, total = %pricing.total, "requisition created");
        Ok(RequisitionDetails {
            requisition,
            project_code: project.code().to_string(),
            pricing,
        })
    }

    /// Requisition with live line prices and total.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, requisition_id = %requisition_id))]
    pub async fn read_requisition(
        &self,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
    ) -> Result<RequisitionDetails, ServiceError> {
        let requisition = self.load_existing_requisition(tenant_id, requisition_id).await?;
        // Empty when the owning project has been deleted.
        let project_code = match requisition.project_id() {
            Some(project_id) => {
                let project =
                    load(&*self.store, tenant_id, project_id.0, Project::empty(project_id)).await?;
                if project.exists() {
                    project.code().to_string()
                } else {
                    String::new()
                }
            }
            None => String::new(),
        };
        let pricing = self.price_lines(tenant_id, requisition.lines()).await?;

        Ok(RequisitionDetails {
            requisition,
            project_code,
            pricing,
        })
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, requisition_id = %requisition_id))]
    pub async fn delete_requisition(
        &self,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
    ) -> Result<(), ServiceError> {
        let command = RequisitionCommand::Delete(DeleteRequisition {
            tenant_id,
            requisition_id,
            occurred_at: Utc::now(),
        });
        self.execute_requisition("delete_requisition", tenant_id, requisition_id, command)
            .await
            .map(|_| ())
    }

    /// Move a requisition to `status`.
    ///
    /// Completing it prices every line and commits the total against the
    /// owning project's allowance in the same append as the status change.
    #[instrument(
        skip(self),
        fields(tenant_id = %tenant_id, requisition_id = %requisition_id, status = %status)
    )]
    pub async fn set_status(
        &self,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
        status: RequisitionStatus,
    ) -> Result<Requisition, ServiceError> {
        let now = Utc::now();
        let result = self
            .retrying("set_status", move || {
                self.try_set_status(tenant_id, requisition_id, status, now)
            })
            .await;

        if let Err(ServiceError::Domain(err @ ProcurementError::BudgetExceeded { .. })) = &result {
            info!(error = %err, "completion rejected by project budget");
        }
        result
    }

    async fn try_set_status(
        &self,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
        status: RequisitionStatus,
        now: DateTime<Utc>,
    ) -> Result<Requisition, ServiceError> {
        let mut requisition = self.load_requisition(tenant_id, requisition_id).await?;
        let events = requisition.handle(&RequisitionCommand::SetStatus(SetStatus {
            tenant_id,
            requisition_id,
            status,
            occurred_at: now,
        }))?;

        let mut batch = vec![stream_append::<Requisition>(
            tenant_id,
            requisition_id.0,
            requisition.version(),
            &events,
        )?];

        if status == RequisitionStatus::Completed {
            let project_id = requisition.project_id().ok_or_else(|| {
                ProcurementError::not_found(format!("project of requisition {requisition_id}"))
            })?;
            let project = self.load_project(tenant_id, project_id).await?;
            let pricing = self.price_lines(tenant_id, requisition.lines()).await?;

            let project_events =
                project.handle(&ProjectCommand::CommitPurchase(CommitPurchase {
                    tenant_id,
                    project_id,
                    requisition_id,
                    amount: pricing.total,
                    occurred_at: now,
                }))?;
            batch.push(stream_append::<Project>(
                tenant_id,
                project_id.0,
                project.version(),
                &project_events,
            )?);
        }

        self.store.append(batch).await?;
        requisition.apply_all(&events);
        Ok(requisition)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, requisition_id = %requisition_id))]
    pub async fn approve(
        &self,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
    ) -> Result<Requisition, ServiceError> {
        let command = RequisitionCommand::Approve(ApproveRequisition {
            tenant_id,
            requisition_id,
            occurred_at: Utc::now(),
        });
        self.execute_requisition("approve", tenant_id, requisition_id, command)
            .await
    }

    #[instrument(skip(self, comment), fields(tenant_id = %tenant_id, requisition_id = %requisition_id))]
    pub async fn reject(
        &self,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
        comment: &str,
    ) -> Result<Requisition, ServiceError> {
        let command = RequisitionCommand::Reject(RejectRequisition {
            tenant_id,
            requisition_id,
            comment: comment.trim().to_string(),
            occurred_at: Utc::now(),
        });
        self.execute_requisition("reject", tenant_id, requisition_id, command)
            .await
    }

    // ---- comments -------------------------------------------------------

    #[instrument(skip(self, content), fields(tenant_id = %tenant_id, requisition_id = %requisition_id))]
    pub async fn post_comment(
        &self,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
        author: UserId,
        content: &str,
    ) -> Result<Comment, ServiceError> {
        let comment_id = CommentId::new();
        let command = RequisitionCommand::PostComment(PostComment {
            tenant_id,
            requisition_id,
            comment_id,
            author,
            content: content.to_string(),
            occurred_at: Utc::now(),
        });
        let requisition = self
            .execute_requisition("post_comment", tenant_id, requisition_id, command)
            .await?;
        comment_of(&requisition, comment_id)
    }

    /// Comments of a requisition, newest first.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, requisition_id = %requisition_id))]
    pub async fn list_comments(
        &self,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
    ) -> Result<Vec<Comment>, ServiceError> {
        let requisition = self.load_existing_requisition(tenant_id, requisition_id).await?;
        Ok(requisition.comments_newest_first())
    }

    #[instrument(skip(self, content), fields(tenant_id = %tenant_id, requisition_id = %requisition_id))]
    pub async fn edit_comment(
        &self,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
        comment_id: CommentId,
        content: &str,
    ) -> Result<Comment, ServiceError> {
        let command = RequisitionCommand::EditComment(EditComment {
            tenant_id,
            requisition_id,
            comment_id,
            content: content.to_string(),
            occurred_at: Utc::now(),
        });
        let requisition = self
            .execute_requisition("edit_comment", tenant_id, requisition_id, command)
            .await?;
        comment_of(&requisition, comment_id)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, requisition_id = %requisition_id))]
    pub async fn delete_comment(
        &self,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
        comment_id: CommentId,
    ) -> Result<(), ServiceError> {
        let command = RequisitionCommand::DeleteComment(DeleteComment {
            tenant_id,
            requisition_id,
            comment_id,
            occurred_at: Utc::now(),
        });
        self.execute_requisition("delete_comment", tenant_id, requisition_id, command)
            .await
            .map(|_| ())
    }

    // ---- plumbing -------------------------------------------------------

    /// Run `attempt` until it stops failing with a write conflict or the
    /// attempt budget is spent. Every attempt reloads its aggregates.
    async fn retrying<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let mut tries = 0;
        loop {
            tries += 1;
            match attempt().await {
                Err(err) if err.is_write_conflict() => {
                    if tries >= self.max_attempts {
                        warn!(operation, attempts = tries, error = %err, "giving up after repeated write conflicts");
                        return Err(ServiceError::Concurrency {
                            attempts: tries,
                            message: err.to_string(),
                        });
                    }
                    warn!(operation, attempt = tries, error = %err, "write conflict, retrying from a fresh load");
                }
                other => return other,
            }
        }
    }

    /// Single-stream requisition command with conflict retry.
    async fn execute_requisition(
        &self,
        operation: &'static str,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
        command: RequisitionCommand,
    ) -> Result<Requisition, ServiceError> {
        let command = &command;
        self.retrying(operation, move || {
            self.try_requisition(tenant_id, requisition_id, command)
        })
        .await
    }

    async fn try_requisition(
        &self,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
        command: &RequisitionCommand,
    ) -> Result<Requisition, ServiceError> {
        let mut requisition = self.load_requisition(tenant_id, requisition_id).await?;
        let events = requisition.handle(command)?;
        if !events.is_empty() {
            self.store
                .append(vec![stream_append::<Requisition>(
                    tenant_id,
                    requisition_id.0,
                    requisition.version(),
                    &events,
                )?])
                .await?;
            requisition.apply_all(&events);
        }
        Ok(requisition)
    }

    async fn price_lines(
        &self,
        tenant_id: TenantId,
        lines: &[LineItem],
    ) -> Result<RequisitionPricing, ServiceError> {
        let mut prices = HashMap::with_capacity(lines.len());
        for line in lines {
            if let Some(price) = self
                .catalog
                .unit_price(tenant_id, line.product_id, line.vendor_id)
                .await?
            {
                prices.insert((line.product_id, line.vendor_id), price);
            }
        }
        Ok(RequisitionPricing::compute(lines, |l| {
            prices.get(&(l.product_id, l.vendor_id)).copied()
        })?)
    }

    async fn load_directory(&self, tenant_id: TenantId) -> Result<ProjectDirectory, ServiceError> {
        let directory = ProjectDirectory::for_tenant(tenant_id);
        let id = *directory.id();
        load(&*self.store, tenant_id, id, directory).await
    }

    async fn load_project(
        &self,
        tenant_id: TenantId,
        project_id: ProjectId,
    ) -> Result<Project, ServiceError> {
        let project = load(&*self.store, tenant_id, project_id.0, Project::empty(project_id)).await?;
        if !project.exists() {
            return Err(ProcurementError::not_found(format!("project {project_id}")).into());
        }
        Ok(project)
    }

    async fn load_requisition(
        &self,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
    ) -> Result<Requisition, ServiceError> {
        load(
            &*self.store,
            tenant_id,
            requisition_id.0,
            Requisition::empty(requisition_id),
        )
        .await
    }

    async fn load_existing_requisition(
        &self,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
    ) -> Result<Requisition, ServiceError> {
        let requisition = self.load_requisition(tenant_id, requisition_id).await?;
        if !requisition.exists() || requisition.tenant_id() != Some(tenant_id) {
            return Err(
                ProcurementError::not_found(format!("purchase requisition {requisition_id}")).into(),
            );
        }
        Ok(requisition)
    }
}

fn project_for_code(directory: &ProjectDirectory, code: &str) -> Result<ProjectId, ServiceError> {
    directory
        .project_for_code(code.trim())
        .ok_or_else(|| ProcurementError::not_found(format!("project with code '{code}'")).into())
}

fn comment_of(requisition: &Requisition, comment_id: CommentId) -> Result<Comment, ServiceError> {
    requisition
        .comment(comment_id)
        .cloned()
        .ok_or_else(|| ProcurementError::not_found(format!("comment {comment_id}")).into())
}

