use chrono::Utc;

use crate::services::PriceCache;
use crate::utils::get_cache_path;

pub fn run() {
    let path = get_cache_path();
    println!("🗄️  Cache status ({})\n", path.display());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ Failed to create async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let cache = PriceCache::open(path);
    let snapshot = runtime.block_on(cache.snapshot());

    if snapshot.is_empty() {
        println!("⚠️  Cache is empty. Run 'refresh' first.");
        return;
    }

    let mut yahoo = 0;
    let mut stooq = 0;
    let mut holdings = 0;
    for (key, fetched_at) in &snapshot {
        match key.split(':').next() {
            Some("y") => yahoo += 1,
            Some("s") => stooq += 1,
            Some("h") => holdings += 1,
            _ => {}
        }
        let age_hours = (Utc::now() - *fetched_at).num_minutes() as f64 / 60.0;
        println!("   {:<10} fetched {:>5.1}h ago", key, age_hours);
    }

    println!(
        "\n📈 {} entries: {} yahoo, {} stooq, {} holdings",
        snapshot.len(),
        yahoo,
        stooq,
        holdings
    );
}
