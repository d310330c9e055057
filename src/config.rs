use crate::application::ShippingMethodSettings;
use crate::domain::entities::Address;
use crate::domain::value_objects::{Coordinate, DeliveryRadius, RadiusPolicy};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Service settings
    pub listen_addr: String,
    pub db_path: String,
    pub debug: bool,

    // Geocoder settings
    pub geocoder_url: String,
    pub geocoder_timeout_secs: u64,
    pub user_agent: String,
    pub geocode_cache_enabled: bool,
    pub geocode_cache_ttl_secs: u64,
    pub geocode_cache_gc_interval_secs: u64,

    // Session notices
    pub notice_ttl_secs: u64,
    pub notice_gc_interval_secs: u64,

    // Shipping method settings
    pub method_title: String,
    pub rate_cost: Decimal,
    pub radius_policy: String,
    pub method_radius_miles: f64,

    // Store location
    pub store_address: Option<String>,
    pub store_city: Option<String>,
    pub store_postcode: Option<String>,
    pub store_latitude: Option<f64>,
    pub store_longitude: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            db_path: "local_delivery.db".to_string(),
            debug: false,
            geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
            geocoder_timeout_secs: 10,
            user_agent: default_user_agent(),
            geocode_cache_enabled: false,
            geocode_cache_ttl_secs: 3600,
            geocode_cache_gc_interval_secs: 60,
            notice_ttl_secs: 1800,
            notice_gc_interval_secs: 60,
            method_title: "Local Delivery".to_string(),
            rate_cost: Decimal::new(500, 2),
            radius_policy: "max_cart_item".to_string(),
            method_radius_miles: 10.0,
            store_address: None,
            store_city: None,
            store_postcode: None,
            store_latitude: None,
            store_longitude: None,
        }
    }
}

fn default_user_agent() -> String {
    format!("local-delivery/{}", env!("CARGO_PKG_VERSION"))
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("method radius must be a non-negative number of miles, got {0}")]
    InvalidMethodRadius(f64),
    #[error("geocoder timeout must be at least one second")]
    ZeroGeocoderTimeout,
    #[error("notice TTL must be at least one second")]
    ZeroNoticeTtl,
    #[error("rate cost must not be negative, got {0}")]
    NegativeRateCost(Decimal),
    #[error("store latitude and longitude must be set together")]
    PartialStoreCoordinate,
    #[error("store coordinate out of range: {0}")]
    InvalidStoreCoordinate(Coordinate),
}

impl Config {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if DeliveryRadius::new(self.method_radius_miles).is_none() {
            return Err(ConfigError::InvalidMethodRadius(self.method_radius_miles));
        }
        if self.geocoder_timeout_secs == 0 {
            return Err(ConfigError::ZeroGeocoderTimeout);
        }
        if self.notice_ttl_secs == 0 {
            return Err(ConfigError::ZeroNoticeTtl);
        }
        if self.rate_cost.is_sign_negative() && !self.rate_cost.is_zero() {
            return Err(ConfigError::NegativeRateCost(self.rate_cost));
        }
        match (self.store_latitude, self.store_longitude) {
            (Some(_), None) | (None, Some(_)) => return Err(ConfigError::PartialStoreCoordinate),
            _ => {}
        }
        if let Some(coordinate) = self.store_coordinate() {
            if !coordinate.is_valid() {
                return Err(ConfigError::InvalidStoreCoordinate(coordinate));
            }
        }
        Ok(())
    }

    /// Shipping method settings derived from this configuration.
    ///
    /// Call after [`Config::validate`]; an invalid method radius falls back to zero.
    pub fn shipping_method(&self) -> ShippingMethodSettings {
        let method_radius =
            DeliveryRadius::new(self.method_radius_miles).unwrap_or_else(DeliveryRadius::zero);

        ShippingMethodSettings {
            title: self.method_title.clone(),
            cost: self.rate_cost,
            policy: RadiusPolicy::parse(&self.radius_policy, method_radius),
        }
    }

    /// Explicitly configured store coordinate, if both parts are set.
    pub fn store_coordinate(&self) -> Option<Coordinate> {
        match (self.store_latitude, self.store_longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        }
    }

    /// Store address to geocode at startup, if any part is set.
    pub fn store_address(&self) -> Option<Address> {
        if self.store_address.is_none() && self.store_city.is_none() && self.store_postcode.is_none()
        {
            return None;
        }

        Some(Address::new(
            self.store_address.clone().unwrap_or_default(),
            self.store_city.clone().unwrap_or_default(),
            self.store_postcode.clone().unwrap_or_default(),
        ))
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Build the configuration from a variable lookup.
///
/// Unparsable numbers fall back to their defaults.
pub fn load_config_from<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
    let flag = |key: &str| {
        lookup(key)
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false)
    };
    let number = |key: &str, default: u64| {
        lookup(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    };
    let degrees = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());

    let listen_addr = string("LOCAL_DELIVERY_LISTEN_ADDR", &defaults.listen_addr);
    let db_path = string("LOCAL_DELIVERY_DB_PATH", &defaults.db_path);
    let debug = lookup("DEBUG").is_some();

    // Geocoder settings
    let geocoder_url = string("LOCAL_DELIVERY_GEOCODER_URL", &defaults.geocoder_url);
    let geocoder_timeout_secs = number(
        "LOCAL_DELIVERY_GEOCODER_TIMEOUT_SECS",
        defaults.geocoder_timeout_secs,
    );
    let user_agent = string("LOCAL_DELIVERY_USER_AGENT", &defaults.user_agent);
    let geocode_cache_enabled = flag("LOCAL_DELIVERY_GEOCODE_CACHE_ENABLED");
    let geocode_cache_ttl_secs = number(
        "LOCAL_DELIVERY_GEOCODE_CACHE_TTL_SECS",
        defaults.geocode_cache_ttl_secs,
    );
    let geocode_cache_gc_interval_secs = number(
        "LOCAL_DELIVERY_GEOCODE_CACHE_GC_INTERVAL_SECS",
        defaults.geocode_cache_gc_interval_secs,
    );

    // Session notices
    let notice_ttl_secs = number("LOCAL_DELIVERY_NOTICE_TTL_SECS", defaults.notice_ttl_secs);
    let notice_gc_interval_secs = number(
        "LOCAL_DELIVERY_NOTICE_GC_INTERVAL_SECS",
        defaults.notice_gc_interval_secs,
    );

    // Shipping method settings
    let method_title = string("LOCAL_DELIVERY_METHOD_TITLE", &defaults.method_title);
    let rate_cost = lookup("LOCAL_DELIVERY_RATE_COST")
        .and_then(|v| Decimal::from_str(v.trim()).ok())
        .unwrap_or(defaults.rate_cost);
    let radius_policy = string("LOCAL_DELIVERY_RADIUS_POLICY", &defaults.radius_policy);
    let method_radius_miles = lookup("LOCAL_DELIVERY_METHOD_RADIUS_MILES")
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(defaults.method_radius_miles);

    // Store location
    let store_address = lookup("LOCAL_DELIVERY_STORE_ADDRESS");
    let store_city = lookup("LOCAL_DELIVERY_STORE_CITY");
    let store_postcode = lookup("LOCAL_DELIVERY_STORE_POSTCODE");
    let store_latitude = degrees("LOCAL_DELIVERY_STORE_LATITUDE");
    let store_longitude = degrees("LOCAL_DELIVERY_STORE_LONGITUDE");

    Ok(Config {
        listen_addr,
        db_path,
        debug,
        geocoder_url,
        geocoder_timeout_secs,
        user_agent,
        geocode_cache_enabled,
        geocode_cache_ttl_secs,
        geocode_cache_gc_interval_secs,
        notice_ttl_secs,
        notice_gc_interval_secs,
        method_title,
        rate_cost,
        radius_policy,
        method_radius_miles,
        store_address,
        store_city,
        store_postcode,
        store_latitude,
        store_longitude,
    })
}
