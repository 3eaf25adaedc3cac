//! airglow - PurpleAir PM2.5 to LIFX bulb color
//!
//! Each run polls the PurpleAir API for a fixed set of sensors, reduces the
//! readings to one humidity-corrected PM2.5 value, and pushes the matching
//! color to a LIFX bulb: sensor fetch → normalization (selection, humidity
//! correction, freshness) → aggregation → color mapping → bulb update →
//! status file.
//!
//! ## Modules
//!
//! - **Pure core**: `selector`, `humidity`, `color`, `normalizer`, `aggregation`
//! - **I/O**: `clients` (PurpleAir, LIFX, metadata CSV), `status`, `pipeline`

pub mod aggregation;
pub mod clients;
pub mod color;
pub mod config;
pub mod error;
pub mod humidity;
pub mod metadata;
pub mod normalizer;
pub mod pipeline;
pub mod selector;
pub mod status;
pub mod types;

pub use config::{AirglowConfig, Credentials};
pub use error::AirglowError;
pub use pipeline::{apply_manual_color, run_once, AirglowProcessor, RunOptions, RunReport};
pub use selector::{get_best_pm, select_best_pm, PmSelection};

/// airglow version embedded in the status file
pub const AIRGLOW_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for the status file
pub const PRODUCER_NAME: &str = "airglow";
