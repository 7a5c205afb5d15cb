use crate::models::{RankedHolding, RefreshConfig, SortKey};

pub fn run(sector: String, sort_by: SortKey) {
    let session = match super::build_session(RefreshConfig::default()) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("❌ Setup failed: {}", e);
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ Failed to create async runtime: {}", e);
            std::process::exit(1);
        }
    };

    match runtime.block_on(session.holdings_ranking(&sector, sort_by)) {
        Ok(ranked) => print_ranked(&sector, &ranked),
        Err(e) => {
            eprintln!("❌ Holdings ranking failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_ranked(sector: &str, ranked: &[RankedHolding]) {
    println!("📋 {} holdings ({} ranked)\n", sector.to_uppercase(), ranked.len());
    println!(
        "   {:<3} {:<7} {:>7} {:>7} {:>8} {:>8} {:>9}",
        "#", "Ticker", "Wgt%", "Growth", "12m%", "Comove", "Mentions"
    );
    println!("   ────────────────────────────────────────────────────────");

    for (i, row) in ranked.iter().enumerate() {
        println!(
            "   {:<3} {:<7} {:>7.2} {:>7} {:>8} {:>8} {:>9}",
            i + 1,
            row.holding.ticker,
            row.holding.weight,
            opt_text(row.growth.as_ref().map(|g| g.score), 1),
            opt_text(row.metrics.ret_12m, 1),
            opt_text(row.metrics.comove, 2),
            row.metrics
                .news_mentions
                .map_or_else(|| "...".to_string(), |n| n.to_string()),
        );
    }

    if ranked.iter().any(|r| r.growth.as_ref().is_some_and(|g| g.sector_turn)) {
        println!("\n🔔 Sector-turn boost active: washout followed by recovery with relative strength above its MA");
    }
}

fn opt_text(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "...".to_string(), |v| format!("{:.*}", decimals, v))
}
