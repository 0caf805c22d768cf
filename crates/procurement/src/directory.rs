//! Per-tenant project directory.
//!
//! One stream per tenant (`AggregateId::singleton(tenant, DIRECTORY_SCOPE)`)
//! indexes project codes and tracks which project is the default. Every
//! project creation and default change appends here, so concurrent writers
//! are serialized on this stream's version: codes stay unique and there is
//! never more than one default.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use procura_core::{Aggregate, AggregateId, AggregateRoot, TenantId};
use procura_events::Event;

use crate::error::ProcurementError;
use crate::project::ProjectId;

pub const DIRECTORY_SCOPE: &str = "procurement.projects";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDirectory {
    id: AggregateId,
    codes: BTreeMap<String, ProjectId>,
    default_project: Option<ProjectId>,
    version: u64,
}

impl ProjectDirectory {
    pub fn empty(id: AggregateId) -> Self {
        Self {
            id,
            codes: BTreeMap::new(),
            default_project: None,
            version: 0,
        }
    }

    /// Stream id of the directory for `tenant_id`.
    pub fn stream_id(tenant_id: TenantId) -> AggregateId {
        AggregateId::singleton(tenant_id, DIRECTORY_SCOPE)
    }

    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self::empty(Self::stream_id(tenant_id))
    }

    pub fn project_for_code(&self, code: &str) -> Option<ProjectId> {
        self.codes.get(code).copied()
    }

    pub fn default_project(&self) -> Option<ProjectId> {
        self.default_project
    }

    /// Registered projects ordered by code.
    pub fn projects(&self) -> impl Iterator<Item = (&str, ProjectId)> {
        self.codes.iter().map(|(code, id)| (code.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl AggregateRoot for ProjectDirectory {
    type Id = AggregateId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterProject {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub code: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDefault {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnregisterProject {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryCommand {
    RegisterProject(RegisterProject),
    MoveDefault(MoveDefault),
    UnregisterProject(UnregisterProject),
}

/// Event: ProjectRegistered. `is_default` is true for the tenant's first project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRegistered {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub code: String,
    pub is_default: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultProjectMoved {
    pub tenant_id: TenantId,
    pub previous: Option<ProjectId>,
    pub current: ProjectId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProjectUnregistered. Frees the code; clears the default pointer
/// when it pointed at this project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUnregistered {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
    pub code: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryEvent {
    ProjectRegistered(ProjectRegistered),
    DefaultProjectMoved(DefaultProjectMoved),
    ProjectUnregistered(ProjectUnregistered),
}

impl Event for DirectoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DirectoryEvent::ProjectRegistered(_) => "procurement.directory.project_registered",
            DirectoryEvent::DefaultProjectMoved(_) => "procurement.directory.default_moved",
            DirectoryEvent::ProjectUnregistered(_) => "procurement.directory.project_unregistered",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DirectoryEvent::ProjectRegistered(e) => e.occurred_at,
            DirectoryEvent::DefaultProjectMoved(e) => e.occurred_at,
            DirectoryEvent::ProjectUnregistered(e) => e.occurred_at,
        }
    }
}

impl Aggregate for ProjectDirectory {
    const AGGREGATE_TYPE: &'static str = "procurement.directory";

    type Command = DirectoryCommand;
    type Event = DirectoryEvent;
    type Error = ProcurementError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            DirectoryEvent::ProjectRegistered(e) => {
                self.codes.insert(e.code.clone(), e.project_id);
                if e.is_default {
                    self.default_project = Some(e.project_id);
                }
            }
            DirectoryEvent::DefaultProjectMoved(e) => {
                self.default_project = Some(e.current);
            }
            DirectoryEvent::ProjectUnregistered(e) => {
                self.codes.remove(&e.code);
                if self.default_project == Some(e.project_id) {
                    self.default_project = None;
                }
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            DirectoryCommand::RegisterProject(cmd) => {
                if self.codes.contains_key(&cmd.code) {
                    return Err(ProcurementError::conflict(format!(
                        "project code '{}' is already in use",
                        cmd.code
                    )));
                }
                Ok(vec![DirectoryEvent::ProjectRegistered(ProjectRegistered {
                    tenant_id: cmd.tenant_id,
                    project_id: cmd.project_id,
                    code: cmd.code.clone(),
                    is_default: self.default_project.is_none(),
                    occurred_at: cmd.occurred_at,
                })])
            }
            DirectoryCommand::MoveDefault(cmd) => {
                if !self.codes.values().any(|id| *id == cmd.project_id) {
                    return Err(ProcurementError::not_found(format!(
                        "project {}",
                        cmd.project_id
                    )));
                }
                if self.default_project == Some(cmd.project_id) {
                    return Ok(Vec::new());
                }
                Ok(vec![DirectoryEvent::DefaultProjectMoved(
                    DefaultProjectMoved {
                        tenant_id: cmd.tenant_id,
                        previous: self.default_project,
                        current: cmd.project_id,
                        occurred_at: cmd.occurred_at,
                    },
                )])
            }
            DirectoryCommand::UnregisterProject(cmd) => {
                let code = self
                    .codes
                    .iter()
                    .find(|(_, id)| **id == cmd.project_id)
                    .map(|(code, _)| code.clone())
                    .ok_or_else(|| {
                        ProcurementError::not_found(format!("project {}", cmd.project_id))
                    })?;
                if self.default_project == Some(cmd.project_id) && self.codes.len() > 1 {
                    return Err(ProcurementError::validation(
                        "delete the remaining projects before deleting the default project",
                    ));
                }
                Ok(vec![DirectoryEvent::ProjectUnregistered(
                    ProjectUnregistered {
                        tenant_id: cmd.tenant_id,
                        project_id: cmd.project_id,
                        code,
                        occurred_at: cmd.occurred_at,
                    },
                )])
            }
        }
    }
}
