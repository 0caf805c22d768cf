//! Live pricing of requisition lines.
//!
//! Totals are never stored on the requisition; they are recomputed from the
//! catalog every time, so a price change after creation shows up in the
//! next read or completion.

use serde::{Deserialize, Serialize};

use procura_core::Money;

use crate::error::{ProcurementError, ProcurementResult};
use crate::line_item::LineItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub line: LineItem,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Per-line prices plus the requisition total.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequisitionPricing {
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

impl RequisitionPricing {
    /// Price every line with `unit_price`, which answers `None` when the
    /// catalog has no entry for the line's `(product, vendor)` pair.
    pub fn compute<F>(lines: &[LineItem], mut unit_price: F) -> ProcurementResult<Self>
    where
        F: FnMut(&LineItem) -> Option<Money>,
    {
        let mut priced = Vec::with_capacity(lines.len());
        let mut total = Money::ZERO;

        for line in lines {
            let price = unit_price(line).ok_or(ProcurementError::PriceNotFound {
                product_id: line.product_id,
                vendor_id: line.vendor_id,
            })?;
            let line_total = price.checked_mul(line.quantity)?;
            total = total.checked_add(line_total)?;
            priced.push(PricedLine {
                line: *line,
                unit_price: price,
                line_total,
            });
        }

        Ok(Self {
            lines: priced,
            total,
        })
    }
}
