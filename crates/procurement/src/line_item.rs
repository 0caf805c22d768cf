use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use procura_core::DomainError;

macro_rules! catalog_id {
    ($t:ident, $name:literal) => {
        /// Catalog identifier; catalog entities themselves are managed elsewhere.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::from_str(s)
                    .map(Self)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))
            }
        }
    };
}

catalog_id!(ProductId, "ProductId");
catalog_id!(VendorId, "VendorId");

/// One requested purchase: a product bought from a specific vendor.
///
/// The unit price is not part of the line; it is looked up from the price
/// catalog for `(product_id, vendor_id)` whenever a total is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub vendor_id: VendorId,
    pub quantity: u32,
}
