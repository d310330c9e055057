mod geocoder;
mod notice_store;
mod product_settings_repository;
mod store_location_repository;

pub use geocoder::{GeocodeError, Geocoder};
pub use notice_store::NoticeStore;
pub use product_settings_repository::ProductSettingsRepository;
pub use store_location_repository::StoreLocationRepository;
