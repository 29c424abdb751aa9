//! Servo output drivers.
//!
//! The controller only ever talks to a [`ServoDriver`]. [`PwmServo`] drives
//! real hardware through the Linux PWM sysfs interface; [`RecordingServo`]
//! keeps every command in memory for dry runs and tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::constants::{MAX_ANGLE, MAX_PULSE_US, MIN_PULSE_US, PWM_PERIOD_US};
use crate::error::{Error, Result};
use crate::types::Angle;

pub trait ServoDriver {
    /// Command the horn to `angle`. Returns once the command is issued, not
    /// once the horn has physically arrived.
    fn write_angle(&mut self, angle: Angle) -> Result<()>;

    /// Last commanded angle, if any.
    fn angle(&self) -> Option<Angle>;
}

/// Pulse timing for a hobby servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseRange {
    pub min_us: u32,
    pub max_us: u32,
    pub period_us: u32,
}

impl Default for PulseRange {
    fn default() -> Self {
        PulseRange {
            min_us: MIN_PULSE_US,
            max_us: MAX_PULSE_US,
            period_us: PWM_PERIOD_US,
        }
    }
}

/// Linear map of 0..=180° onto `min_us..=max_us`. `min_us` may be the larger
/// bound for a servo mounted the other way round.
pub fn pulse_width_us(angle: Angle, min_us: u32, max_us: u32) -> u32 {
    let degrees = i64::from(angle.degrees());
    let (min_us, max_us) = (i64::from(min_us), i64::from(max_us));
    let pulse = min_us + degrees * (max_us - min_us) / i64::from(MAX_ANGLE);
    // Always between the two bounds, so it fits back into u32.
    pulse as u32
}

/// A servo on one channel of a sysfs PWM chip, e.g.
/// `/sys/class/pwm/pwmchip0/pwm0`.
#[derive(Debug)]
pub struct PwmServo {
    channel_dir: PathBuf,
    range: PulseRange,
    angle: Option<Angle>,
}

impl PwmServo {
    pub fn open(chip_dir: impl AsRef<Path>, channel: u32, range: PulseRange) -> Result<Self> {
        let widest = range.min_us.max(range.max_us);
        if widest >= range.period_us {
            return Err(Error::invalid_config(format!(
                "pulse width {widest}us does not fit in period {}us",
                range.period_us
            )));
        }

        let chip_dir = chip_dir.as_ref();
        let channel_dir = chip_dir.join(format!("pwm{channel}"));

        if !channel_dir.exists() {
            debug!(chip = %chip_dir.display(), channel, "exporting pwm channel");
            write_attr(&chip_dir.join("export"), channel)?;
        }

        let servo = PwmServo {
            channel_dir,
            range,
            angle: None,
        };
        servo.write("period", u64::from(range.period_us) * 1000)?;
        servo.write("enable", 1)?;
        info!(channel = %servo.channel_dir.display(), "pwm servo ready");
        Ok(servo)
    }

    fn write(&self, attr: &str, value: impl ToString) -> Result<()> {
        write_attr(&self.channel_dir.join(attr), value)
    }
}

fn write_attr(path: &Path, value: impl ToString) -> Result<()> {
    let value = value.to_string();
    fs::write(path, &value).map_err(|source| Error::Pwm {
        path: path.to_path_buf(),
        value,
        source,
    })
}

impl ServoDriver for PwmServo {
    fn write_angle(&mut self, angle: Angle) -> Result<()> {
        let pulse_us = pulse_width_us(angle, self.range.min_us, self.range.max_us);
        self.write("duty_cycle", u64::from(pulse_us) * 1000)?;
        debug!(%angle, pulse_us, "servo commanded");
        self.angle = Some(angle);
        Ok(())
    }

    fn angle(&self) -> Option<Angle> {
        self.angle
    }
}

/// Shared log of `(when, angle)` pairs written by a [`RecordingServo`].
pub type History = Arc<Mutex<Vec<(Instant, Angle)>>>;

#[derive(Debug, Default, Clone)]
pub struct RecordingServo {
    history: History,
}

impl RecordingServo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle onto the history that stays valid after the servo is moved
    /// into a controller.
    pub fn history(&self) -> History {
        Arc::clone(&self.history)
    }

    pub fn angles(&self) -> Vec<u8> {
        self.history.lock().iter().map(|(_, a)| a.degrees()).collect()
    }
}

impl ServoDriver for RecordingServo {
    fn write_angle(&mut self, angle: Angle) -> Result<()> {
        info!(%angle, "servo commanded (dry run)");
        self.history.lock().push((Instant::now(), angle));
        Ok(())
    }

    fn angle(&self) -> Option<Angle> {
        self.history.lock().last().map(|&(_, angle)| angle)
    }
}
