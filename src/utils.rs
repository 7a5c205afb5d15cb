use std::path::PathBuf;

/// Get the cache blob path from environment variable or use default
pub fn get_cache_path() -> PathBuf {
    std::env::var("SECTORCYCLE_CACHE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("sectorcycle_cache.json"))
}
