//! Unit prices per `(product, vendor)` pair.
//!
//! Requisition lines carry no price of their own; totals are computed from
//! whatever the catalog says at read or completion time.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use procura_core::{Money, TenantId};
use procura_procurement::{ProductId, VendorId};

pub use in_memory::InMemoryPriceCatalog;
pub use postgres::PostgresPriceCatalog;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("price catalog backend failure: {0}")]
    Backend(String),
}

#[async_trait]
pub trait PriceCatalog: Send + Sync {
    /// Current unit price, or `None` when the pair has no catalog entry.
    async fn unit_price(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        vendor_id: VendorId,
    ) -> Result<Option<Money>, CatalogError>;

    /// Insert or replace the unit price of a pair.
    async fn set_price(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        vendor_id: VendorId,
        unit_price: Money,
    ) -> Result<(), CatalogError>;

    /// Returns `false` if there was nothing to remove.
    async fn remove_price(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        vendor_id: VendorId,
    ) -> Result<bool, CatalogError>;
}

#[async_trait]
impl<C> PriceCatalog for Arc<C>
where
    C: PriceCatalog + ?Sized,
{
    async fn unit_price(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        vendor_id: VendorId,
    ) -> Result<Option<Money>, CatalogError> {
        (**self).unit_price(tenant_id, product_id, vendor_id).await
    }

    async fn set_price(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        vendor_id: VendorId,
        unit_price: Money,
    ) -> Result<(), CatalogError> {
        (**self)
            .set_price(tenant_id, product_id, vendor_id, unit_price)
            .await
    }

    async fn remove_price(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        vendor_id: VendorId,
    ) -> Result<bool, CatalogError> {
        (**self).remove_price(tenant_id, product_id, vendor_id).await
    }
}
