use std::fmt;

use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::constants::{MAX_ANGLE, RAISED_ANGLE, REST_ANGLE, TRIGGER_BYTE};
use crate::error::{Error, Result};

/// Servo angle in whole degrees, always within `0..=MAX_ANGLE`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Default)]
pub struct Angle(u8);

impl Angle {
    /// Build an angle, rejecting anything past the servo's travel.
    pub fn new(degrees: u8) -> Result<Self> {
        if degrees > MAX_ANGLE {
            return Err(Error::InvalidAngle { degrees });
        }
        Ok(Angle(degrees))
    }

    pub fn clamped(degrees: u8) -> Self {
        Angle(degrees.min(MAX_ANGLE))
    }

    pub fn degrees(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Pose {
    Rest,
    Raised,
}

impl Pose {
    pub fn default_angle(self) -> Angle {
        match self {
            Pose::Rest => Angle(REST_ANGLE),
            Pose::Raised => Angle(RAISED_ANGLE),
        }
    }
}

/// A command decoded from the serial line.
#[derive(Debug, EnumIter, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Command {
    Raise = TRIGGER_BYTE as isize,
}

impl Command {
    pub fn from_byte(byte: u8) -> Option<Command> {
        Command::iter().find(|command| command.byte() == byte)
    }

    pub fn byte(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_rejects_past_travel() {
        assert_eq!(Angle::new(180).unwrap().degrees(), 180);
        assert!(matches!(
            Angle::new(181),
            Err(Error::InvalidAngle { degrees: 181 })
        ));
    }

    #[test]
    fn angle_clamps() {
        assert_eq!(Angle::clamped(255).degrees(), MAX_ANGLE);
        assert_eq!(Angle::clamped(42).degrees(), 42);
    }

    #[test]
    fn angle_display() {
        assert_eq!(Angle::clamped(90).to_string(), "90°");
    }

    #[test]
    fn poses_map_to_defaults() {
        assert_eq!(Pose::Rest.default_angle().degrees(), 0);
        assert_eq!(Pose::Raised.default_angle().degrees(), 90);
    }

    #[test]
    fn only_capital_a_decodes() {
        assert_eq!(Command::from_byte(b'A'), Some(Command::Raise));
        assert_eq!(Command::from_byte(b'a'), None);
        assert_eq!(Command::from_byte(b'\n'), None);
        assert_eq!(Command::from_byte(0), None);

        let decoded = (0u8..=255).filter_map(Command::from_byte).count();
        assert_eq!(decoded, 1);
    }

    #[test]
    fn every_command_round_trips_its_byte() {
        for command in Command::iter() {
            assert_eq!(Command::from_byte(command.byte()), Some(command));
        }
    }
}
