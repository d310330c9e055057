//! Local Delivery Service - Main application use case
//!
//! Orchestrates the delivery decision: store coordinate lookup, destination
//! geocoding, radius selection, rate creation and checkout validation.
//! This is the primary interface for the inbound adapter.

use crate::domain::entities::{
    Address, CartLine, DeliveryNotice, ProductDeliverySettings, ShippingRate,
};
use crate::domain::ports::{
    GeocodeError, Geocoder, NoticeStore, ProductSettingsRepository, StoreLocationRepository,
};
use crate::domain::services::DeliveryEligibility;
use crate::domain::value_objects::{
    Coordinate, DeliveryRadius, DistanceResult, RadiusPolicy, UnreachableReason,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Shipping method configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingMethodSettings {
    /// Label of the offered rate
    pub title: String,
    /// Flat cost of the offered rate
    pub cost: Decimal,
    pub policy: RadiusPolicy,
}

impl Default for ShippingMethodSettings {
    fn default() -> Self {
        Self {
            title: "Local Delivery".to_string(),
            cost: Decimal::new(500, 2),
            policy: RadiusPolicy::MaxCartItem,
        }
    }
}

/// Errors from operations that cannot simply fail closed.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("store address is incomplete")]
    IncompleteStoreAddress,
    #[error("could not geocode store address: {0}")]
    StoreGeocodeFailed(GeocodeError),
    #[error("invalid coordinate {0}")]
    InvalidCoordinate(Coordinate),
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Result of a shipping calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingQuote {
    /// The offered rate, if the destination is eligible
    pub rate: Option<ShippingRate>,
    /// Distance to the destination; None when no radius applied
    pub distance: Option<DistanceResult>,
    pub radius: Option<DeliveryRadius>,
}

/// Result of a checkout validation.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutValidation {
    /// The customer has not entered a city and postal code yet
    Skipped,
    Valid,
    Rejected {
        /// Display names of the products that cannot be delivered
        products: Vec<String>,
        notice: DeliveryNotice,
        /// False when the session already held this notice
        newly_added: bool,
    },
}

/// Local delivery service - main application use case.
pub struct LocalDeliveryService {
    geocoder: Arc<dyn Geocoder>,
    store_repo: Arc<dyn StoreLocationRepository>,
    product_repo: Arc<dyn ProductSettingsRepository>,
    notices: Arc<dyn NoticeStore>,
    settings: ShippingMethodSettings,
}

impl LocalDeliveryService {
    /// Create a new delivery service.
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        store_repo: Arc<dyn StoreLocationRepository>,
        product_repo: Arc<dyn ProductSettingsRepository>,
        notices: Arc<dyn NoticeStore>,
        settings: ShippingMethodSettings,
    ) -> Self {
        Self {
            geocoder,
            store_repo,
            product_repo,
            notices,
            settings,
        }
    }

    pub fn settings(&self) -> &ShippingMethodSettings {
        &self.settings
    }

    /// Distance from the store to an address.
    ///
    /// Never fails: a missing store coordinate, an incomplete address or a
    /// geocoding failure all produce [`DistanceResult::Unreachable`]. The
    /// store is checked first so no lookup is spent when it is unset.
    pub async fn distance_to(&self, address: &Address) -> DistanceResult {
        let store = match self.store_repo.get_store_location().await {
            Ok(Some(store)) => store,
            Ok(None) => {
                tracing::warn!("store coordinates not set, destination treated as unreachable");
                return DistanceResult::Unreachable(UnreachableReason::StoreCoordinatesUnset);
            }
            Err(e) => {
                tracing::error!("failed to read store coordinates: {:?}", e);
                return DistanceResult::Unreachable(UnreachableReason::StoreCoordinatesUnavailable);
            }
        };

        if !address.is_complete() {
            return DistanceResult::Unreachable(UnreachableReason::IncompleteAddress);
        }

        match self.geocoder.resolve(address).await {
            Ok(destination) => DeliveryEligibility::measure(Some(&store), &destination),
            Err(e) => DistanceResult::Unreachable(UnreachableReason::GeocodeFailure(e)),
        }
    }

    /// Load delivery settings for every cart line.
    ///
    /// Unconfigured products count as delivery disabled. The title is the
    /// one supplied with the cart line, else the stored title, else `#<id>`.
    async fn cart_settings(
        &self,
        cart: &[CartLine],
    ) -> Result<Vec<ProductDeliverySettings>, DeliveryError> {
        let mut products = Vec::with_capacity(cart.len());

        for line in cart {
            let mut settings = self
                .product_repo
                .get_product_settings(line.product_id)
                .await?
                .unwrap_or_else(|| ProductDeliverySettings::disabled(line.product_id));

            match line.title.as_deref().map(str::trim) {
                Some(title) if !title.is_empty() => settings.title = title.to_string(),
                _ if settings.title.trim().is_empty() => {
                    settings.title = format!("#{}", line.product_id)
                }
                _ => {}
            }

            products.push(settings);
        }

        Ok(products)
    }

    /// The radius that applies to a cart under the configured policy.
    pub async fn select_radius(
        &self,
        cart: &[CartLine],
    ) -> Result<Option<DeliveryRadius>, DeliveryError> {
        let products = self.cart_settings(cart).await?;
        Ok(DeliveryEligibility::select_radius(
            &self.settings.policy,
            &products,
        ))
    }

    /// Offer a local delivery rate if the destination is within the radius.
    pub async fn calculate_shipping(
        &self,
        destination: &Address,
        cart: &[CartLine],
    ) -> Result<ShippingQuote, DeliveryError> {
        let radius = self.select_radius(cart).await?;

        let Some(radius) = radius else {
            tracing::debug!("no local delivery radius applies to cart");
            return Ok(ShippingQuote {
                rate: None,
                distance: None,
                radius: None,
            });
        };

        let distance = self.distance_to(destination).await;
        let rate = if distance.is_within(radius) {
            Some(ShippingRate::local_delivery(
                self.settings.title.clone(),
                self.settings.cost,
            ))
        } else {
            None
        };

        tracing::debug!(
            "shipping quote distance={:?} radius={} offered={}",
            distance,
            radius,
            rate.is_some()
        );

        Ok(ShippingQuote {
            rate,
            distance: Some(distance),
            radius: Some(radius),
        })
    }

    /// Check that every local delivery product can reach the destination.
    ///
    /// A rejection records a notice for the session, once.
    pub async fn validate_checkout(
        &self,
        session_id: &str,
        destination: &Address,
        cart: &[CartLine],
    ) -> Result<CheckoutValidation, DeliveryError> {
        if !destination.has_locality() {
            return Ok(CheckoutValidation::Skipped);
        }

        let products = self.cart_settings(cart).await?;
        if !products.iter().any(|p| p.local_delivery_enabled) {
            return Ok(CheckoutValidation::Valid);
        }

        let radius = DeliveryEligibility::select_radius(&self.settings.policy, &products);
        let distance = self.distance_to(destination).await;
        let out_of_range: Vec<String> =
            DeliveryEligibility::out_of_range(&distance, radius, &products)
                .into_iter()
                .map(|p| p.title.clone())
                .collect();

        if out_of_range.is_empty() {
            return Ok(CheckoutValidation::Valid);
        }

        let notice = DeliveryNotice::out_of_range(&out_of_range);
        let newly_added = self.notices.add_unique(session_id, notice.clone());

        tracing::info!(
            "checkout rejected session={} products={} distance={:?}",
            session_id,
            out_of_range.len(),
            distance
        );

        Ok(CheckoutValidation::Rejected {
            products: out_of_range,
            notice,
            newly_added,
        })
    }

    /// Geocode the store address and persist the coordinate.
    ///
    /// Nothing is stored when the address is incomplete or the lookup fails.
    pub async fn initialize_store_coordinates(
        &self,
        store_address: &Address,
    ) -> Result<Coordinate, DeliveryError> {
        if !store_address.is_complete() {
            return Err(DeliveryError::IncompleteStoreAddress);
        }

        let coordinate = self
            .geocoder
            .resolve(store_address)
            .await
            .map_err(DeliveryError::StoreGeocodeFailed)?;

        self.store_repo.set_store_location(coordinate).await?;
        tracing::info!("store coordinates set to {}", coordinate);

        Ok(coordinate)
    }

    /// Establish the store location at startup.
    ///
    /// An explicit coordinate wins. Otherwise a configured address is
    /// geocoded on every start so a moved store is picked up; when that
    /// lookup fails the previously stored coordinate stays in use.
    pub async fn bootstrap_store_location(
        &self,
        coordinate: Option<Coordinate>,
        address: Option<&Address>,
    ) -> Result<Option<Coordinate>, DeliveryError> {
        if let Some(coordinate) = coordinate {
            self.set_store_coordinates(coordinate).await?;
            return Ok(Some(coordinate));
        }

        let Some(address) = address else {
            let stored = self.store_coordinates().await?;
            if stored.is_none() {
                tracing::warn!("store coordinates not set; local delivery will not be offered");
            }
            return Ok(stored);
        };

        match self.initialize_store_coordinates(address).await {
            Ok(coordinate) => Ok(Some(coordinate)),
            Err(DeliveryError::Storage(e)) => Err(DeliveryError::Storage(e)),
            Err(e) => {
                let previous = self.store_coordinates().await?;
                match previous {
                    Some(previous) => tracing::warn!(
                        "could not locate store address ({}); keeping previous store coordinates {}",
                        e,
                        previous
                    ),
                    None => tracing::error!(
                        "could not locate store address ({}); local delivery will not be offered",
                        e
                    ),
                }
                Ok(previous)
            }
        }
    }

    /// Set the store coordinate directly.
    pub async fn set_store_coordinates(&self, coordinate: Coordinate) -> Result<(), DeliveryError> {
        if !coordinate.is_valid() {
            return Err(DeliveryError::InvalidCoordinate(coordinate));
        }
        self.store_repo.set_store_location(coordinate).await?;
        tracing::info!("store coordinates set to {}", coordinate);
        Ok(())
    }

    /// The persisted store coordinate, if any.
    pub async fn store_coordinates(&self) -> Result<Option<Coordinate>, DeliveryError> {
        Ok(self.store_repo.get_store_location().await?)
    }

    pub async fn product_settings(
        &self,
        product_id: u64,
    ) -> Result<Option<ProductDeliverySettings>, DeliveryError> {
        Ok(self.product_repo.get_product_settings(product_id).await?)
    }

    pub async fn save_product_settings(
        &self,
        settings: ProductDeliverySettings,
    ) -> Result<(), DeliveryError> {
        let product_id = settings.product_id;
        self.product_repo.save_product_settings(settings).await?;
        tracing::debug!("saved delivery settings for product {}", product_id);
        Ok(())
    }

    pub fn notices(&self, session_id: &str) -> Vec<DeliveryNotice> {
        self.notices.list(session_id)
    }

    pub fn clear_notices(&self, session_id: &str) -> usize {
        self.notices.clear(session_id)
    }
}
