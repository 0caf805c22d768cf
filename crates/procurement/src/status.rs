use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Workflow status of a purchase requisition.
///
/// `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequisitionStatus {
    Draft,
    Ready,
    WaitingToApproval,
    ToDo,
    InProgress,
    OnHold,
    Cancelled,
    Completed,
}

impl RequisitionStatus {
    pub const ALL: [RequisitionStatus; 8] = [
        RequisitionStatus::Draft,
        RequisitionStatus::Ready,
        RequisitionStatus::WaitingToApproval,
        RequisitionStatus::ToDo,
        RequisitionStatus::InProgress,
        RequisitionStatus::OnHold,
        RequisitionStatus::Cancelled,
        RequisitionStatus::Completed,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, RequisitionStatus::Completed | RequisitionStatus::Cancelled)
    }

    /// Statuses that mean work has started or finished.
    pub fn requires_approval(self) -> bool {
        matches!(
            self,
            RequisitionStatus::Completed | RequisitionStatus::ToDo | RequisitionStatus::InProgress
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequisitionStatus::Draft => "DRAFT",
            RequisitionStatus::Ready => "READY",
            RequisitionStatus::WaitingToApproval => "WAITING_TO_APPROVAL",
            RequisitionStatus::ToDo => "TO_DO",
            RequisitionStatus::InProgress => "IN_PROGRESS",
            RequisitionStatus::OnHold => "ON_HOLD",
            RequisitionStatus::Cancelled => "CANCELLED",
            RequisitionStatus::Completed => "COMPLETED",
        }
    }
}

impl core::fmt::Display for RequisitionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequisitionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequisitionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown status '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}
