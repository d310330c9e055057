mod dashmap_geocode_cache;
mod dashmap_notice_store;
mod nominatim_geocoder;
mod sqlite_settings_repo;

pub use dashmap_geocode_cache::CachingGeocoder;
pub use dashmap_notice_store::DashMapNoticeStore;
pub use nominatim_geocoder::{NominatimConfig, NominatimGeocoder};
pub use sqlite_settings_repo::SqliteSettingsRepository;
