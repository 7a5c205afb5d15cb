use std::cmp::Ordering;

use crate::models::RefreshConfig;
use crate::services::RefreshOutcome;

pub fn run(return_years: f64, zscore_years: f64, benchmark: String) {
    println!(
        "📊 Refreshing sector Z-scores ({}y returns, {}y window, benchmark {})\n",
        return_years, zscore_years, benchmark
    );

    let config = RefreshConfig {
        return_period_years: return_years,
        zscore_window_years: zscore_years,
        benchmark_ticker: benchmark,
    };

    let session = match super::build_session(config) {
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

    match runtime.block_on(session.refresh_all()) {
        Ok(outcome) => print_outcome(session.sectors(), &outcome),
        Err(e) => {
            eprintln!("❌ Refresh failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_outcome(sectors: &[(String, String)], outcome: &RefreshOutcome) {
    let mut rows: Vec<(&str, &str, Option<f64>, Option<f64>)> = sectors
        .iter()
        .map(|(ticker, name)| {
            let z = outcome
                .zscores
                .get(ticker)
                .and_then(|zs| zs.last())
                .map(|p| p.value);
            let alignment = outcome.quality.get(ticker).map(|q| q.alignment_pct);
            (ticker.as_str(), name.as_str(), z, alignment)
        })
        .collect();

    // Most depressed sectors first; sectors without a score sink to the
    // bottom
    rows.sort_by(|a, b| match (a.2, b.2) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    println!("   {:<6} {:<18} {:>8} {:>8}", "Ticker", "Sector", "Z", "Align%");
    println!("   ─────────────────────────────────────────────");
    for (ticker, name, z, alignment) in rows {
        let z_text = z.map_or_else(|| "...".to_string(), |v| format!("{:+.2}", v));
        let align_text = alignment.map_or_else(|| "Gap".to_string(), |v| format!("{:.0}", v));
        println!("   {:<6} {:<18} {:>8} {:>8}", ticker, name, z_text, align_text);
    }

    let scored = outcome
        .zscores
        .values()
        .filter(|zs| !zs.is_empty())
        .count();
    println!("\n✅ Refresh complete: {}/{} sectors scored", scored, sectors.len());
}
