pub mod analytics_service;
pub mod chart_service;
pub mod currency_service;
pub mod holdings_service;
pub mod price_service;
pub mod snapshot_service;
pub mod totals_service;
