//! # PV String Readings
//!
//! Ephemeral string readings derived from IO-log channels, used only during
//! anomaly evaluation.
//!
//! ## Channel Naming
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Masters name IO channels like:                                         │
//! │                                                                         │
//! │    "PV String 1"   "PV String 2"   ...   "Grid L1"   "Fan 1"           │
//! │                                                                         │
//! │  A channel is a PV string channel when its name contains "String";      │
//! │  the string position is the last whitespace-separated token, parsed     │
//! │  as an integer. Channels whose position does not parse are skipped.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::types::IoChannel;

/// The substring that marks an IO channel as a PV string channel.
pub const STRING_CHANNEL_MARKER: &str = "String";

/// A single PV string reading. Ephemeral - built from an IO-log block,
/// consumed by the anomaly rules, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringReading {
    /// Channel name as reported by the master.
    pub name: String,

    /// String position parsed from the channel name.
    pub position: u32,

    /// Measured voltage (V).
    pub voltage: f64,

    /// Measured current (A).
    pub current: f64,
}

impl StringReading {
    /// Derived power (W). A disconnected string reads zero on either
    /// voltage or current, so zero power marks a missing string.
    pub fn power(&self) -> f64 {
        self.voltage * self.current
    }

    /// Builds a reading from an IO channel, if the channel is a PV string
    /// channel with a parseable position.
    pub fn from_channel(channel: &IoChannel) -> Option<Self> {
        if !channel.name.contains(STRING_CHANNEL_MARKER) {
            return None;
        }
        let position = parse_position(&channel.name)?;
        Some(StringReading {
            name: channel.name.clone(),
            position,
            voltage: channel.voltage,
            current: channel.current,
        })
    }
}

/// Parses the string position out of a channel name: the last
/// whitespace-separated token, as an integer.
pub fn parse_position(name: &str) -> Option<u32> {
    name.split_whitespace().next_back()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(name: &str, voltage: f64, current: f64) -> IoChannel {
        IoChannel {
            name: name.to_string(),
            voltage,
            current,
        }
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("PV String 3"), Some(3));
        assert_eq!(parse_position("String 12"), Some(12));
        assert_eq!(parse_position("Grid L1"), None);
        assert_eq!(parse_position(""), None);
    }

    #[test]
    fn test_from_channel_filters_non_strings() {
        assert!(StringReading::from_channel(&channel("Grid L1", 230.0, 5.0)).is_none());
        assert!(StringReading::from_channel(&channel("PV String x", 300.0, 2.0)).is_none());

        let reading = StringReading::from_channel(&channel("PV String 4", 310.5, 2.0)).unwrap();
        assert_eq!(reading.position, 4);
        assert_eq!(reading.power(), 621.0);
    }

    #[test]
    fn test_zero_power_on_either_leg() {
        let no_volts = StringReading::from_channel(&channel("PV String 1", 0.0, 8.2)).unwrap();
        let no_amps = StringReading::from_channel(&channel("PV String 2", 421.0, 0.0)).unwrap();
        assert_eq!(no_volts.power(), 0.0);
        assert_eq!(no_amps.power(), 0.0);
    }
}
