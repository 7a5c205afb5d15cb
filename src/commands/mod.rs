pub mod holdings;
pub mod refresh;
pub mod rotation;
pub mod status;

use std::sync::Arc;

use crate::error::Result;
use crate::models::RefreshConfig;
use crate::services::{PriceCache, ProxyRacer, SectorSession};
use crate::utils::get_cache_path;

/// Production session wiring shared by every subcommand
pub(crate) fn build_session(config: RefreshConfig) -> Result<SectorSession<ProxyRacer>> {
    let fetcher = Arc::new(ProxyRacer::new()?);
    let cache = PriceCache::open(get_cache_path());
    Ok(SectorSession::new(fetcher, cache, config))
}
