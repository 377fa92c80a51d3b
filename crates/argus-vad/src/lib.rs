pub mod config;
pub mod detector;
pub mod energy;

pub use config::VadConfig;
pub use detector::{EnergyVad, VadDetector};
pub use energy::EnergyMeter;
