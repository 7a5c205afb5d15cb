//! Pipeline Constants
//!
//! Tolerances, warm-up lengths and minimum window sizes below are
//! empirically tuned policy knobs carried over from the production
//! dashboard, not mathematically derived values. Change them together
//! with the tests that pin their behavior.

/// Sector ETF universe: (ticker, display name)
pub const SECTORS: &[(&str, &str)] = &[
    ("XLB", "Materials"),
    ("XLE", "Energy"),
    ("XLF", "Financials"),
    ("XLI", "Industrials"),
    ("XLK", "Technology"),
    ("XLP", "Consumer Staples"),
    ("XLU", "Utilities"),
    ("XLV", "Healthcare"),
    ("XLY", "Consumer Disc"),
    ("XLRE", "Real Estate"),
    ("XLC", "Communication"),
    ("SMH", "Semiconductors"),
    ("XHB", "Homebuilders"),
    ("XOP", "Oil & Gas E&P"),
    ("XME", "Metals & Mining"),
    ("KRE", "Regional Banks"),
    ("XBI", "Biotech"),
    ("ITB", "Home Construction"),
    ("IYT", "Transportation"),
];

/// Price series cache TTL: 24 hours
pub const PRICE_CACHE_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Holdings cache TTL: 12 hours (holdings refresh on their own, shorter cycle)
pub const HOLDINGS_CACHE_TTL_MS: i64 = 12 * 60 * 60 * 1000;

/// Years of weekly history requested from upstream sources
pub const HISTORY_YEARS: f64 = 25.0;

/// Alignment tolerance for sector-vs-benchmark return lookup, in days.
/// Absorbs weekly-schedule misalignment between independently-fetched
/// series (holidays, source-specific business-day conventions).
pub const BENCH_ALIGN_TOLERANCE_DAYS: i64 = 10;

/// Alignment tolerance for stock-vs-sector weekly return pairing, in days
pub const STOCK_ALIGN_TOLERANCE_DAYS: i64 = 7;

/// Minimum relative-return history (weeks) before any Z-score is emitted
pub const ZSCORE_WARMUP_FLOOR_WEEKS: usize = 52;

/// Fraction of the requested window required when history is shorter
/// than the window itself
pub const ZSCORE_WARMUP_FRACTION: f64 = 0.6;

/// Minimum trailing-window length for a Z-score sample
pub const ZSCORE_MIN_WINDOW: usize = 30;

/// Windows with sample std below this are treated as degenerate and skipped
pub const ZSCORE_STD_FLOOR: f64 = 1e-6;

/// Z-score clamp bound (output is within [-CLAMP, CLAMP])
pub const ZSCORE_CLAMP: f64 = 6.0;

/// Moving-average length for the sector/benchmark relative-strength ratio
pub const RATIO_MA_POINTS: usize = 30;

/// Lookback (in ratio points, ~1 month of weekly data) for the trend check
pub const RATIO_TREND_LOOKBACK: usize = 5;

/// Trailing window (weeks) for holding-vs-sector co-movement stats
pub const COMOVE_WINDOW_WEEKS: usize = 110;

/// Minimum aligned weekly pairs required for a co-movement score
pub const COMOVE_MIN_PAIRS: usize = 8;

/// Maximum simultaneous in-flight sector price fetches
pub const SECTOR_FETCH_CONCURRENCY: usize = 5;

/// Maximum simultaneous in-flight per-holding metric fetches
pub const HOLDING_FETCH_CONCURRENCY: usize = 3;

/// Per-attempt network timeout, in seconds
pub const FETCH_TIMEOUT_SECS: u64 = 12;

/// Consecutive failures before a proxy route is skipped
pub const BREAKER_THRESHOLD: u32 = 3;

/// Cooldown before a broken proxy route is retried, in seconds
pub const BREAKER_COOLDOWN_SECS: u64 = 300;

/// Redundant CORS proxy routes: (name, base URL taking the target as a
/// query parameter named by the third field)
pub const PROXY_ROUTES: &[(&str, &str, &str)] = &[
    ("allorigins", "https://api.allorigins.win/raw", "url"),
    ("corsproxy", "https://corsproxy.io/", "url"),
    ("codetabs", "https://api.codetabs.com/v1/proxy", "quest"),
];

/// Browser user agents rotated across proxied requests
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15",
];

/// News mentions are counted over this trailing window, in days
pub const NEWS_MENTION_WINDOW_DAYS: i64 = 14;
