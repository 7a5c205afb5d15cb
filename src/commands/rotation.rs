use crate::models::RefreshConfig;

pub fn run(sector: String) {
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

    match runtime.block_on(session.rotation(&sector)) {
        Ok(Some(signal)) => {
            println!("🔄 Rotation signal for {}\n", sector.to_uppercase());
            println!("   Trigger:    {}", signal.trigger);
            println!("   Setup:      {:?}", signal.setup);
            println!("   Z-score:    {:+.2}", signal.zscore);
            println!(
                "   RS ratio:   {:.4} ({} 30-pt MA {:.4})",
                signal.ratio,
                if signal.above_ma { "above" } else { "below" },
                signal.ratio_ma
            );
            println!("   Trend:      {:?}", signal.trending);
            println!("   Confidence: {:.0}%", signal.confidence);
        }
        Ok(None) => {
            println!(
                "⚠️  {} lacks the history for a rotation signal (no current Z-score or too few aligned ratio points)",
                sector.to_uppercase()
            );
        }
        Err(e) => {
            eprintln!("❌ Rotation lookup failed: {}", e);
            std::process::exit(1);
        }
    }
}
