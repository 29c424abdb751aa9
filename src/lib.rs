pub mod cli;
pub mod config;
mod constants;
pub mod controller;
pub mod error;
pub mod logging;
pub mod servo;
pub mod transport;
pub mod trigger;
mod types;

pub use config::Config;
pub use controller::{Controller, Outcome, RunStats};
pub use error::{Error, Result};
pub use servo::{PwmServo, RecordingServo, ServoDriver};
pub use transport::{Transport, TransportError};
pub use trigger::{bridge, BridgeStats, Detection, DetectionFilter, Trigger};
pub use types::{Angle, Command, Pose};

// Re-export commonly used items
pub use constants::{BAUD_RATE, TRIGGER_BYTE};
