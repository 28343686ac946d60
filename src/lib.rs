pub mod charts;
pub mod classifier;
pub mod colours;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod logging;
pub mod state;
pub mod win_pct;
