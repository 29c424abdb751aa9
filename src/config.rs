//! Configuration loading and validation.
//!
//! Sources, lowest precedence first: built-in defaults, a TOML file, then
//! environment variables prefixed with `AMBULANCE_GATE_` (nested keys split on
//! `__`, e.g. `AMBULANCE_GATE_SERIAL__PORT`).

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::constants::{
    BAUD_RATE, CONFIDENCE_THRESHOLD, HOLD_MS, LINK_SETTLE_MS, MAX_ANGLE, MAX_PULSE_US,
    MIN_PULSE_US, PWM_PERIOD_US, RAISED_ANGLE, REST_ANGLE, RETRY_DELAY_MS, SIGNAL_RETRIES,
    TARGET_LABEL,
};
use crate::error::{Error, Result};
use crate::servo::PulseRange;
use crate::trigger::DetectionFilter;
use crate::types::Angle;

/// Default configuration file, relative to the working directory.
const CONFIG_FILE_NAME: &str = "ambulance_gate.toml";

const ENV_PREFIX: &str = "AMBULANCE_GATE_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub servo: ServoConfig,
    pub trigger: TriggerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM11`.
    pub port: String,
    pub baud_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    /// sysfs PWM chip directory.
    pub pwm_chip: PathBuf,
    pub pwm_channel: u32,
    pub period_us: u32,
    pub min_pulse_us: u32,
    pub max_pulse_us: u32,
    pub rest_angle: u8,
    pub raised_angle: u8,
    pub hold_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub label: String,
    pub confidence_threshold: f32,
    pub retries: u32,
    pub retry_delay_ms: u64,
    /// Wait after opening the port before the first write.
    pub settle_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: BAUD_RATE,
        }
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            pwm_chip: PathBuf::from("/sys/class/pwm/pwmchip0"),
            pwm_channel: 0,
            period_us: PWM_PERIOD_US,
            min_pulse_us: MIN_PULSE_US,
            max_pulse_us: MAX_PULSE_US,
            rest_angle: REST_ANGLE,
            raised_angle: RAISED_ANGLE,
            hold_ms: HOLD_MS,
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            label: TARGET_LABEL.to_string(),
            confidence_threshold: CONFIDENCE_THRESHOLD,
            retries: SIGNAL_RETRIES,
            retry_delay_ms: RETRY_DELAY_MS,
            settle_ms: LINK_SETTLE_MS,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE_NAME)
    }

    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.serial.baud_rate == 0 {
            return Err(Error::invalid_config("baud_rate must be greater than 0"));
        }

        let servo = &self.servo;
        for (name, angle) in [("rest_angle", servo.rest_angle), ("raised_angle", servo.raised_angle)] {
            if angle > MAX_ANGLE {
                return Err(Error::invalid_config(format!(
                    "{name} ({angle}) cannot exceed {MAX_ANGLE}"
                )));
            }
        }
        if servo.rest_angle == servo.raised_angle {
            return Err(Error::invalid_config(
                "rest_angle and raised_angle must differ",
            ));
        }
        // A reversed range (min above max) mirrors the horn's direction.
        if servo.min_pulse_us == servo.max_pulse_us {
            return Err(Error::invalid_config(format!(
                "min_pulse_us and max_pulse_us must differ (both {})",
                servo.min_pulse_us
            )));
        }
        let widest = servo.min_pulse_us.max(servo.max_pulse_us);
        if widest >= servo.period_us {
            return Err(Error::invalid_config(format!(
                "pulse width ({widest}) must be less than period_us ({})",
                servo.period_us
            )));
        }

        let trigger = &self.trigger;
        if trigger.retries == 0 {
            return Err(Error::invalid_config("retries must be at least 1"));
        }
        if !(0.0..=1.0).contains(&trigger.confidence_threshold) {
            return Err(Error::invalid_config(format!(
                "confidence_threshold ({}) must be between 0 and 1",
                trigger.confidence_threshold
            )));
        }

        Ok(())
    }
}

impl ServoConfig {
    #[must_use]
    pub fn pulse_range(&self) -> PulseRange {
        PulseRange {
            min_us: self.min_pulse_us,
            max_us: self.max_pulse_us,
            period_us: self.period_us,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the angle is past the servo's travel.
    pub fn rest(&self) -> Result<Angle> {
        Angle::new(self.rest_angle)
    }

    /// # Errors
    ///
    /// Returns an error if the angle is past the servo's travel.
    pub fn raised(&self) -> Result<Angle> {
        Angle::new(self.raised_angle)
    }

    #[must_use]
    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }
}

impl TriggerConfig {
    #[must_use]
    pub fn filter(&self) -> DetectionFilter {
        DetectionFilter::new(self.label.clone(), self.confidence_threshold)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
