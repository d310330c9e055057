//! Product Settings Repository Port
//!
//! Per-product local delivery flags and radii.

use crate::domain::entities::ProductDeliverySettings;
use async_trait::async_trait;

/// Repository for per-product delivery settings.
#[async_trait]
pub trait ProductSettingsRepository: Send + Sync {
    /// Get settings for a product, or None if it was never configured.
    async fn get_product_settings(
        &self,
        product_id: u64,
    ) -> anyhow::Result<Option<ProductDeliverySettings>>;

    /// Create or replace settings for a product.
    async fn save_product_settings(&self, settings: ProductDeliverySettings)
        -> anyhow::Result<()>;
}
