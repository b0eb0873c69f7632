//! # PV String Anomaly Detection
//!
//! Validates one device's IO-log block against the installer's wiring
//! layout and emits fault records for strings that misbehave.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Rule A - missing string                                                │
//! │  ───────────────────────                                                │
//! │  A wired position reporting zero power (voltage or current is 0)        │
//! │  is treated as not connected.                                           │
//! │                                                                         │
//! │  Rule B - low power                                                     │
//! │  ──────────────────                                                     │
//! │  Within each roof-direction group, a producing string whose power       │
//! │  falls more than 10% short of the group average is flagged.             │
//! │                                                                         │
//! │      powers [100, 100, 100, 50]  →  average 87.5                        │
//! │      string at 50: shortfall (87.5-50)/87.5 = 42.8%  →  flagged         │
//! │      strings at 100: above average                   →  not flagged     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only the shortfall side trips Rule B; a string producing above its group
//! average is never a fault. Zero-power strings are Rule A's business and
//! are excluded from Rule B flagging (they still weigh the group average
//! down, which is what makes their neighbors look healthy rather than hot).
//!
//! Evaluation is pure: readings in, fault records out. Devices without a
//! wiring configuration are not validated at all - the caller skips them.

use chrono::{DateTime, Utc};

use solbridge_core::messages;
use solbridge_core::{FaultRecord, IoLogBlock, StringReading, WiringConfig};

/// Fractional shortfall from the group average that trips Rule B.
const LOW_POWER_SHORTFALL: f64 = 0.10;

/// Evaluates one device's IO block against its wiring configuration.
pub fn evaluate(
    dev_id: i64,
    block: &IoLogBlock,
    config: &WiringConfig,
    now: DateTime<Utc>,
) -> Vec<FaultRecord> {
    let readings: Vec<StringReading> = block
        .list
        .iter()
        .filter_map(StringReading::from_channel)
        .collect();

    let mut faults = Vec::new();
    missing_strings(dev_id, &readings, config, now, &mut faults);
    low_power_strings(dev_id, &readings, &config.first_direction, now, &mut faults);
    low_power_strings(dev_id, &readings, &config.second_direction, now, &mut faults);
    faults
}

/// Rule A: wired positions reporting zero power.
fn missing_strings(
    dev_id: i64,
    readings: &[StringReading],
    config: &WiringConfig,
    now: DateTime<Utc>,
    faults: &mut Vec<FaultRecord>,
) {
    for reading in readings {
        if config.is_wired(reading.position) && reading.power() == 0.0 {
            faults.push(FaultRecord::string_fault(
                dev_id,
                reading.position,
                format!("{}{}", reading.name, messages::STRING_NOT_CONNECTED),
                messages::MISSING_STRING_REASON,
                messages::MISSING_STRING_SUGGEST,
                now,
            ));
        }
    }
}

/// Rule B: producing strings well below their direction-group average.
fn low_power_strings(
    dev_id: i64,
    readings: &[StringReading],
    group: &[u32],
    now: DateTime<Utc>,
    faults: &mut Vec<FaultRecord>,
) {
    let members: Vec<&StringReading> = readings
        .iter()
        .filter(|r| group.contains(&r.position))
        .collect();
    if members.is_empty() {
        return;
    }

    let average = members.iter().map(|r| r.power()).sum::<f64>() / members.len().max(1) as f64;
    if average == 0.0 {
        // Whole group dark (night, or every string down) - nothing to
        // compare against.
        return;
    }

    for reading in members {
        let power = reading.power();
        if power > 0.0 && (average - power) / average > LOW_POWER_SHORTFALL {
            faults.push(FaultRecord::string_fault(
                dev_id,
                reading.position,
                format!("{}{}", reading.name, messages::LOW_STRING_POWER),
                messages::LOW_STRING_POWER_REASON,
                messages::LOW_STRING_POWER_SUGGEST,
                now,
            ));
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use solbridge_core::IoChannel;

    fn channel(position: u32, voltage: f64, current: f64) -> IoChannel {
        IoChannel {
            name: format!("PV String {position}"),
            voltage,
            current,
        }
    }

    fn block(channels: Vec<IoChannel>) -> IoLogBlock {
        IoLogBlock {
            dev_id: Some(1),
            list: channels,
        }
    }

    fn wiring(first: Vec<u32>, second: Vec<u32>) -> WiringConfig {
        WiringConfig {
            dev_id: 1,
            first_direction: first,
            second_direction: second,
        }
    }

    #[test]
    fn test_zero_power_wired_string_is_missing() {
        let block = block(vec![channel(1, 0.0, 8.0), channel(2, 310.0, 2.0)]);
        let config = wiring(vec![1, 2], vec![]);

        let faults = evaluate(1, &block, &config, Utc::now());
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].position, Some(1));
        assert_eq!(faults[0].description, "PV String 1 not connected");
    }

    #[test]
    fn test_zero_power_unwired_string_is_ignored() {
        let block = block(vec![channel(9, 0.0, 0.0)]);
        let config = wiring(vec![1, 2], vec![]);

        assert!(evaluate(1, &block, &config, Utc::now()).is_empty());
    }

    #[test]
    fn test_low_power_shortfall_in_group() {
        // Powers [100, 100, 100, 50]: average 87.5, only the 50 W string
        // falls more than 10% short.
        let block = block(vec![
            channel(1, 100.0, 1.0),
            channel(2, 100.0, 1.0),
            channel(3, 100.0, 1.0),
            channel(4, 50.0, 1.0),
        ]);
        let config = wiring(vec![1, 2, 3, 4], vec![]);

        let faults = evaluate(1, &block, &config, Utc::now());
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].position, Some(4));
        assert_eq!(faults[0].description, "PV String 4 low power");
    }

    #[test]
    fn test_groups_are_averaged_independently() {
        // First direction averages 100, second averages 20. The 18 W string
        // is only 10% short of ITS group, so no fault; pooling the groups
        // would have flagged it.
        let block = block(vec![
            channel(1, 100.0, 1.0),
            channel(2, 100.0, 1.0),
            channel(5, 22.0, 1.0),
            channel(6, 18.0, 1.0),
        ]);
        let config = wiring(vec![1, 2], vec![5, 6]);

        assert!(evaluate(1, &block, &config, Utc::now()).is_empty());
    }

    #[test]
    fn test_dark_group_emits_nothing_from_rule_b() {
        let block = block(vec![channel(1, 0.0, 0.0), channel(2, 0.0, 5.0)]);
        let config = wiring(vec![1, 2], vec![]);

        // Both strings trip Rule A, neither trips Rule B.
        let faults = evaluate(1, &block, &config, Utc::now());
        assert_eq!(faults.len(), 2);
        assert!(faults
            .iter()
            .all(|f| f.description.ends_with("not connected")));
    }

    #[test]
    fn test_above_average_string_is_not_flagged() {
        let block = block(vec![channel(1, 120.0, 1.0), channel(2, 100.0, 1.0)]);
        let config = wiring(vec![1, 2], vec![]);

        // Average 110: string 2 is 9.1% short, under the threshold.
        assert!(evaluate(1, &block, &config, Utc::now()).is_empty());
    }
}
