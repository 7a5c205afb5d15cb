pub mod align;
pub mod comove;
pub mod growth;
pub mod returns;
pub mod rotation;
pub mod stats;
pub mod zscore;

pub use align::ReturnIndex;
pub use comove::{comove_score, SectorComoveStats};
pub use growth::{detect_sector_turn, score_cross_section};
pub use returns::{rolling_return, weekly_return};
pub use rotation::rotation_signal;
pub use zscore::compute_sector_zscores;
