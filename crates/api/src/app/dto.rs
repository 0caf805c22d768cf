use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Deserialize;

use procura_infra::projections::RequisitionSummary;
use procura_infra::workflow::RequisitionDetails;
use procura_procurement::{Comment, LineItem, Priority, Project, ProductId, VendorId};

use crate::app::errors;

/// Wire format of calendar dates (`dd-mm-yyyy`).
pub const DATE_FORMAT: &str = "%d-%m-%Y";

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub label: String,
    /// Minor currency units.
    pub purchase_allowance: i64,
}

#[derive(Debug, Deserialize)]
pub struct RenameProjectRequest {
    pub name: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetPriceRequest {
    pub product_id: String,
    pub vendor_id: String,
    /// Minor currency units.
    pub unit_price: i64,
}

#[derive(Debug, Deserialize)]
pub struct LineItemRequest {
    pub product_id: String,
    pub vendor_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequisitionRequest {
    pub name: String,
    pub priority: Priority,
    pub project_code: String,
    pub target_date: String,
    pub due_date: String,
    #[serde(default)]
    pub lines: Vec<LineItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

// -------------------------
// Request parsing helpers
// -------------------------

pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, axum::response::Response> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_date",
            format!("{field} must be a dd-mm-yyyy date"),
        )
    })
}

pub fn parse_product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product_id"))
}

pub fn parse_vendor_id(raw: &str) -> Result<VendorId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid vendor_id"))
}

pub fn parse_lines(lines: &[LineItemRequest]) -> Result<Vec<LineItem>, axum::response::Response> {
    lines
        .iter()
        .map(|l| {
            Ok(LineItem {
                product_id: parse_product_id(&l.product_id)?,
                vendor_id: parse_vendor_id(&l.vendor_id)?,
                quantity: l.quantity,
            })
        })
        .collect()
}

// -------------------------
// JSON mapping helpers
// -------------------------

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

pub fn project_to_json(project: &Project) -> serde_json::Value {
    serde_json::json!({
        "id": project.id_typed().to_string(),
        "name": project.name(),
        "code": project.code(),
        "label": project.label(),
        "is_default": project.is_default(),
        "purchase_allowance": project.purchase_allowance().minor(),
        "current_purchase": project.current_purchase().minor(),
        "remaining": project.remaining().minor(),
        "purchase_count": project.purchase_count(),
    })
}

pub fn requisition_to_json(details: &RequisitionDetails) -> serde_json::Value {
    let r = &details.requisition;
    let lines = details
        .pricing
        .lines
        .iter()
        .map(|p| {
            serde_json::json!({
                "product_id": p.line.product_id.to_string(),
                "vendor_id": p.line.vendor_id.to_string(),
                "quantity": p.line.quantity,
                "unit_price": p.unit_price.minor(),
                "line_total": p.line_total.minor(),
            })
        })
        .collect::<Vec<_>>();

    serde_json::json!({
        "id": r.id_typed().to_string(),
        "name": r.name(),
        "priority": r.priority(),
        "status": r.status().as_str(),
        "is_approved": r.is_approved(),
        "is_rejected": r.is_rejected(),
        "rejected_comment": r.rejected_comment(),
        "project_code": details.project_code,
        "requester": r.requester().map(|u| u.to_string()),
        "target_date": format_date(r.target_date()),
        "due_date": format_date(r.due_date()),
        "created_at": r.created_at().map(|t| t.to_rfc3339()),
        "lines": lines,
        "total": details.pricing.total.minor(),
        "comment_count": r.comment_count(),
    })
}

pub fn summary_to_json(rm: RequisitionSummary) -> serde_json::Value {
    serde_json::json!({
        "id": rm.requisition_id.to_string(),
        "project_id": rm.project_id.to_string(),
        "requester": rm.requester.to_string(),
        "name": rm.name,
        "priority": rm.priority,
        "status": rm.status.as_str(),
        "is_approved": rm.is_approved,
        "is_rejected": rm.is_rejected,
        "target_date": format_date(Some(rm.target_date)),
        "due_date": format_date(Some(rm.due_date)),
        "line_count": rm.line_count,
        "comment_count": rm.comment_count,
        "created_at": rm.created_at.to_rfc3339(),
    })
}

pub fn comment_to_json(comment: &Comment) -> serde_json::Value {
    serde_json::json!({
        "id": comment.id.to_string(),
        "author": comment.author.to_string(),
        "content": comment.content,
        "created_at": comment.created_at.to_rfc3339(),
        "updated_at": comment.updated_at.to_rfc3339(),
        "is_updated": comment.is_updated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_use_day_month_year() {
        let date = parse_date("due_date", "05-03-2026").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 3, 5).unwrap());
        assert_eq!(format_date(Some(date)).as_deref(), Some("05-03-2026"));
    }

    #[test]
    fn iso_dates_are_rejected() {
        let res = parse_date("due_date", "2026-03-05").unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn malformed_line_ids_are_rejected() {
        let lines = vec![LineItemRequest {
            product_id: "nope".to_string(),
            vendor_id: uuid::Uuid::now_v7().to_string(),
            quantity: 1,
        }];
        assert_eq!(parse_lines(&lines).unwrap_err().status(), StatusCode::BAD_REQUEST);
    }
}
