//! Profile registry: static vertical and market catalogs
pub mod vertical;
pub mod market;

pub use self::vertical::{
    VerticalProfile, VERTICAL_PROFILES, BASE_VERTICAL_ID, get_vertical_profile,
    base_vertical_profile, map_category_to_vertical,
};
pub use self::market::{
    MarketProfile, MARKET_PROFILES, DEFAULT_MARKET_ID, get_market_profile,
    default_market_profile, normalize_locale,
};
