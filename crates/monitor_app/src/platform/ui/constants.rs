// Terminal layout constants.
pub const PROGRESS_BAR_WIDTH: usize = 20;
pub const PROGRESS_FILLED: &str = "#";
pub const PROGRESS_EMPTY: &str = "-";

pub const TICK_INTERVAL_MS: u64 = 75;
