//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of local delivery.
//! They have no external dependencies and contain only business logic.

use crate::domain::value_objects::DeliveryRadius;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier of the shipping method and of the rates it produces.
pub const LOCAL_DELIVERY_METHOD_ID: &str = "local_delivery";

/// Free-text postal address supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// Street line
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
}

impl Address {
    pub fn new(
        line1: impl Into<String>,
        city: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            line1: line1.into(),
            city: city.into(),
            postal_code: postal_code.into(),
        }
    }

    /// True when street, city and postal code are all non-blank.
    pub fn is_complete(&self) -> bool {
        !self.line1.trim().is_empty()
            && !self.city.trim().is_empty()
            && !self.postal_code.trim().is_empty()
    }

    /// True once the customer has entered at least a city and postal code.
    pub fn has_locality(&self) -> bool {
        !self.city.trim().is_empty() && !self.postal_code.trim().is_empty()
    }

    /// Free-text query sent to the geocoder: `"line1, city, postal_code"`.
    pub fn query(&self) -> String {
        format!(
            "{}, {}, {}",
            self.line1.trim(),
            self.city.trim(),
            self.postal_code.trim()
        )
    }
}

/// Per-product local delivery configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDeliverySettings {
    pub product_id: u64,
    /// Display name used in customer notices
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub local_delivery_enabled: bool,
    /// Radius in miles; `None` counts as zero
    #[serde(default)]
    pub radius: Option<DeliveryRadius>,
}

impl ProductDeliverySettings {
    /// Settings for a product nobody configured: delivery disabled.
    pub fn disabled(product_id: u64) -> Self {
        Self {
            product_id,
            title: String::new(),
            local_delivery_enabled: false,
            radius: None,
        }
    }

    /// The radius this product contributes, if local delivery is enabled.
    pub fn effective_radius(&self) -> Option<DeliveryRadius> {
        if !self.local_delivery_enabled {
            return None;
        }
        Some(self.radius.unwrap_or_else(DeliveryRadius::zero))
    }
}

/// One line of the customer's cart.
///
/// Eligibility depends only on which products are in the cart. Other
/// fields a storefront sends, such as quantity, are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: u64,
    /// Name shown to the customer, if the caller has one
    #[serde(default)]
    pub title: Option<String>,
}

impl CartLine {
    pub fn new(product_id: u64) -> Self {
        Self {
            product_id,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A shipping rate offered to the customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingRate {
    pub id: String,
    pub label: String,
    pub cost: Decimal,
}

impl ShippingRate {
    pub fn local_delivery(label: impl Into<String>, cost: Decimal) -> Self {
        Self {
            id: LOCAL_DELIVERY_METHOD_ID.to_string(),
            label: label.into(),
            cost,
        }
    }
}

/// Error shown to a customer whose cart cannot be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryNotice {
    pub message: String,
}

impl DeliveryNotice {
    /// Build the notice naming every out-of-range product.
    pub fn out_of_range(products: &[String]) -> Self {
        Self {
            message: format!(
                "The following products cannot be delivered to your address and must be removed from the cart: {}",
                products.join(", ")
            ),
        }
    }
}
