pub const BAUD_RATE: u32 = 9600;
pub const TRIGGER_BYTE: u8 = b'A';

// Servo poses, in degrees
pub const REST_ANGLE: u8 = 0;
pub const RAISED_ANGLE: u8 = 90;
pub const MAX_ANGLE: u8 = 180;
pub const HOLD_MS: u64 = 2000;

// Hobby servo PWM timing (50 Hz)
pub const PWM_PERIOD_US: u32 = 20_000;
pub const MIN_PULSE_US: u32 = 500;
pub const MAX_PULSE_US: u32 = 2500;

// Detector-side signalling
pub const SIGNAL_RETRIES: u32 = 3;
pub const RETRY_DELAY_MS: u64 = 1000;
pub const LINK_SETTLE_MS: u64 = 2000;
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;
pub const TARGET_LABEL: &str = "ambulance";
