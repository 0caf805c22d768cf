use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use procura_core::{Money, TenantId};
use procura_procurement::{ProductId, VendorId};

use super::{CatalogError, PriceCatalog};

const CREATE_PRICES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS product_prices (
    tenant_id UUID NOT NULL,
    product_id UUID NOT NULL,
    vendor_id UUID NOT NULL,
    unit_price_minor BIGINT NOT NULL CHECK (unit_price_minor >= 0),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (tenant_id, product_id, vendor_id)
)
"#;

/// Price catalog stored in the `product_prices` table (amounts in cents).
#[derive(Debug, Clone)]
pub struct PostgresPriceCatalog {
    pool: Arc<PgPool>,
}

impl PostgresPriceCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn migrate(&self) -> Result<(), CatalogError> {
        sqlx::query(CREATE_PRICES_TABLE)
            .execute(&*self.pool)
            .await
            .map_err(|e| backend("migrate", e))?;
        Ok(())
    }
}

fn backend(operation: &str, err: sqlx::Error) -> CatalogError {
    CatalogError::Backend(format!("database error in {operation}: {err}"))
}

#[async_trait]
impl PriceCatalog for PostgresPriceCatalog {
    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn unit_price(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        vendor_id: VendorId,
    ) -> Result<Option<Money>, CatalogError> {
        let row = sqlx::query(
            r#"
            SELECT unit_price_minor
            FROM product_prices
            WHERE tenant_id = $1 AND product_id = $2 AND vendor_id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(vendor_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| backend("unit_price", e))?;

        row.map(|r| {
            r.try_get::<i64, _>("unit_price_minor")
                .map(Money::from_minor)
                .map_err(|e| backend("unit_price", e))
        })
        .transpose()
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn set_price(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        vendor_id: VendorId,
        unit_price: Money,
    ) -> Result<(), CatalogError> {
        sqlx::query(
            r#"
            INSERT INTO product_prices (tenant_id, product_id, vendor_id, unit_price_minor)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id, product_id, vendor_id)
            DO UPDATE SET
                unit_price_minor = EXCLUDED.unit_price_minor,
                updated_at = NOW()
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(vendor_id.as_uuid())
        .bind(unit_price.minor())
        .execute(&*self.pool)
        .await
        .map_err(|e| backend("set_price", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn remove_price(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        vendor_id: VendorId,
    ) -> Result<bool, CatalogError> {
        let result = sqlx::query(
            r#"
            DELETE FROM product_prices
            WHERE tenant_id = $1 AND product_id = $2 AND vendor_id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(vendor_id.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| backend("remove_price", e))?;
        Ok(result.rows_affected() > 0)
    }
}
