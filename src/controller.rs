use std::future::Future;

use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Duration;
use tracing::{debug, info};

use crate::{
    constants::HOLD_MS,
    error::Result,
    servo::ServoDriver,
    transport::Transport,
    types::{Angle, Command, Pose},
};

/// What happened to a received byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Swept,
    Ignored,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub bytes: u64,
    pub sweeps: u64,
    pub ignored: u64,
}

/// The gate actuator: listens for the trigger byte and sweeps the servo.
#[derive(Debug)]
pub struct Controller<D> {
    servo: D,
    rest: Angle,
    raised: Angle,
    hold: Duration,
}

impl<D: ServoDriver> Controller<D> {
    /// Controller with the stock poses (0° rest, 90° raised, 2 s hold).
    pub fn new(servo: D) -> Result<Self> {
        Self::with_poses(
            servo,
            Pose::Rest.default_angle(),
            Pose::Raised.default_angle(),
            Duration::from_millis(HOLD_MS),
        )
    }

    /// Puts the servo at `rest` before returning.
    pub fn with_poses(servo: D, rest: Angle, raised: Angle, hold: Duration) -> Result<Self> {
        let mut controller = Controller {
            servo,
            rest,
            raised,
            hold,
        };
        controller.servo.write_angle(rest)?;
        info!(%rest, %raised, hold_ms = hold.as_millis() as u64, "gate at rest");
        Ok(controller)
    }

    pub async fn handle_byte(&mut self, byte: u8) -> Result<Outcome> {
        match Command::from_byte(byte) {
            Some(Command::Raise) => self.sweep().await,
            None => {
                debug!(byte, "ignoring byte");
                Ok(Outcome::Ignored)
            }
        }
    }

    /// Raise, hold, lower. Always runs to completion once started.
    pub async fn sweep(&mut self) -> Result<Outcome> {
        info!("raising gate");
        self.servo.write_angle(self.raised)?;
        tokio::time::sleep(self.hold).await;
        self.servo.write_angle(self.rest)?;
        info!("gate lowered");
        Ok(Outcome::Swept)
    }

    /// Serve the serial line until it closes or `shutdown` resolves.
    ///
    /// Shutdown is only observed between bytes, so a sweep in progress
    /// finishes and the gate is left at rest. Bytes that arrive during a
    /// hold stay buffered in the line and are handled afterwards.
    pub async fn run<S, F>(&mut self, transport: Transport<S>, shutdown: F) -> Result<RunStats>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        F: Future<Output = ()>,
    {
        let bytes = transport.bytes();
        tokio::pin!(bytes);
        tokio::pin!(shutdown);

        let mut stats = RunStats::default();
        loop {
            let next = tokio::select! {
                () = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                next = bytes.next() => next,
            };
            let Some(byte) = next else {
                info!("serial line closed");
                break;
            };

            stats.bytes += 1;
            match self.handle_byte(byte?).await? {
                Outcome::Swept => stats.sweeps += 1,
                Outcome::Ignored => stats.ignored += 1,
            }
        }

        info!(bytes = stats.bytes, sweeps = stats.sweeps, ignored = stats.ignored, "listener stopped");
        Ok(stats)
    }

    pub fn servo(&self) -> &D {
        &self.servo
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }
}
