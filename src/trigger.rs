//! Detector side of the link.
//!
//! An external detector prints one JSON array of detections per frame; the
//! bridge turns frames that contain an ambulance into trigger bytes on the
//! serial line.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite};
use tokio::time::Duration;
use tokio_serial::SerialStream;
use tracing::{debug, info, warn};

use crate::constants::{CONFIDENCE_THRESHOLD, RETRY_DELAY_MS, SIGNAL_RETRIES, TARGET_LABEL};
use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::types::Command;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
}

/// Decides which detections count as a sighting.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionFilter {
    label: String,
    threshold: f32,
}

impl Default for DetectionFilter {
    fn default() -> Self {
        DetectionFilter::new(TARGET_LABEL, CONFIDENCE_THRESHOLD)
    }
}

impl DetectionFilter {
    pub fn new(label: impl Into<String>, threshold: f32) -> Self {
        DetectionFilter {
            label: label.into(),
            threshold,
        }
    }

    /// Label compared case-insensitively; confidence must be strictly above
    /// the threshold.
    pub fn matches(&self, detection: &Detection) -> bool {
        detection.confidence > self.threshold && detection.label.eq_ignore_ascii_case(&self.label)
    }

    pub fn frame_triggers(&self, frame: &[Detection]) -> bool {
        frame.iter().any(|d| self.matches(d))
    }
}

/// Sends the trigger byte, retrying failed writes.
#[derive(Debug)]
pub struct Trigger<S = SerialStream> {
    transport: Transport<S>,
    retries: u32,
    retry_delay: Duration,
}

impl Trigger<SerialStream> {
    /// Open the port and wait `settle` before first use. Many boards reset
    /// when the port opens and drop anything sent while booting.
    pub async fn connect(port: &str, baud_rate: u32, settle: Duration) -> Result<Self> {
        let transport = Transport::open(port, baud_rate)?;
        debug!(settle_ms = settle.as_millis() as u64, "waiting for link to settle");
        tokio::time::sleep(settle).await;
        Ok(Trigger::new(transport))
    }
}

impl<S> Trigger<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(transport: Transport<S>) -> Self {
        Trigger {
            transport,
            retries: SIGNAL_RETRIES,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    pub fn with_retries(mut self, retries: u32, retry_delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Write the trigger byte. Returns how many attempts it took.
    pub async fn signal(&mut self) -> Result<u32> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.transport.send_byte(Command::Raise.byte()).await {
                Ok(()) => {
                    info!(attempt, "signal sent");
                    return Ok(attempt);
                }
                Err(e) if attempt < self.retries => {
                    warn!(attempt, error = %e, "signal failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(last) => {
                    return Err(Error::SignalFailed {
                        attempts: attempt,
                        last,
                    })
                }
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BridgeStats {
    pub frames: u64,
    pub signals: u64,
    pub malformed: u64,
    pub failed: u64,
}

/// Read newline-delimited detection frames and signal once per frame that
/// contains a sighting. Runs until input ends or `shutdown` resolves.
///
/// Bad lines and failed signals are logged and skipped; one dropped frame
/// should not stop the detector feed. Shutdown also interrupts a signal
/// that is still retrying.
pub async fn bridge<R, S, F>(
    input: R,
    filter: &DetectionFilter,
    trigger: &mut Trigger<S>,
    shutdown: F,
) -> Result<BridgeStats>
where
    R: AsyncBufRead + Unpin,
    S: AsyncRead + AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    let mut lines = input.lines();
    tokio::pin!(shutdown);

    let mut stats = BridgeStats::default();
    loop {
        let line = tokio::select! {
            () = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            info!("detector feed ended");
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let frame: Vec<Detection> = match serde_json::from_str(line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "skipping malformed frame");
                stats.malformed += 1;
                continue;
            }
        };
        stats.frames += 1;

        if !filter.frame_triggers(&frame) {
            continue;
        }
        // A failing signal can spend a while in retry sleeps; shutdown
        // cuts it short.
        let signalled = tokio::select! {
            () = &mut shutdown => {
                info!("shutdown requested while signalling");
                break;
            }
            signalled = trigger.signal() => signalled,
        };
        match signalled {
            Ok(_) => stats.signals += 1,
            Err(e) => {
                warn!(error = %e, "frame signal dropped");
                stats.failed += 1;
            }
        }
    }

    info!(
        frames = stats.frames,
        signals = stats.signals,
        malformed = stats.malformed,
        failed = stats.failed,
        "bridge stopped"
    );
    Ok(stats)
}
