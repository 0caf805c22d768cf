use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use procura_core::{Money, TenantId};
use procura_procurement::{ProductId, VendorId};

use super::{CatalogError, PriceCatalog};

type PriceKey = (TenantId, ProductId, VendorId);

#[derive(Debug, Default)]
pub struct InMemoryPriceCatalog {
    prices: RwLock<HashMap<PriceKey, Money>>,
}

impl InMemoryPriceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> CatalogError {
        CatalogError::Backend("lock poisoned".to_string())
    }
}

#[async_trait]
impl PriceCatalog for InMemoryPriceCatalog {
    async fn unit_price(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        vendor_id: VendorId,
    ) -> Result<Option<Money>, CatalogError> {
        let prices = self.prices.read().map_err(|_| Self::poisoned())?;
        Ok(prices.get(&(tenant_id, product_id, vendor_id)).copied())
    }

    async fn set_price(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        vendor_id: VendorId,
        unit_price: Money,
    ) -> Result<(), CatalogError> {
        let mut prices = self.prices.write().map_err(|_| Self::poisoned())?;
        prices.insert((tenant_id, product_id, vendor_id), unit_price);
        Ok(())
    }

    async fn remove_price(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        vendor_id: VendorId,
    ) -> Result<bool, CatalogError> {
        let mut prices = self.prices.write().map_err(|_| Self::poisoned())?;
        Ok(prices.remove(&(tenant_id, product_id, vendor_id)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prices_are_tenant_scoped_and_replaceable() {
        let catalog = InMemoryPriceCatalog::new();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let product = ProductId::new();
        let vendor = VendorId::new();

        catalog
            .set_price(tenant_a, product, vendor, Money::from_minor(100))
            .await
            .unwrap();
        catalog
            .set_price(tenant_a, product, vendor, Money::from_minor(250))
            .await
            .unwrap();

        assert_eq!(
            catalog.unit_price(tenant_a, product, vendor).await.unwrap(),
            Some(Money::from_minor(250))
        );
        assert_eq!(catalog.unit_price(tenant_b, product, vendor).await.unwrap(), None);

        assert!(catalog.remove_price(tenant_a, product, vendor).await.unwrap());
        assert!(!catalog.remove_price(tenant_a, product, vendor).await.unwrap());
    }
}
