pub mod cache;
pub mod fetch;
pub mod holdings;
pub mod news;
pub mod price_store;
pub mod session;

pub use cache::PriceCache;
pub use fetch::{Fetch, ProxyRacer};
pub use holdings::HoldingsService;
pub use price_store::PriceStore;
pub use session::{RefreshOutcome, SectorSession};
