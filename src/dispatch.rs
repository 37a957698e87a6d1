// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topic routing and message dispatch.
//!
//! Inbound MQTT messages are classified by exact comparison against the
//! three derived topic strings, applied to the device state, and a log
//! line is emitted when the side value changed. Classification and state
//! transition are plain functions, so the whole decision core is
//! testable without a broker.

use crate::error::{DecodeError, Result};
use crate::logger::ChangeLogger;
use crate::state::DeviceState;

/// The sensor kinds the watcher subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// The rotating side indicator, the attribute watched for changes.
    Side,
    /// Battery level reports.
    BatteryLevel,
    /// Liveness markers published by the device.
    LastSeen,
}

/// The three subscription topics derived from a device name.
///
/// ESPHome publishes each sensor on `<device>/sensor/<name>/state`.
/// Inbound topics are matched against the full derived strings rather
/// than searched for a sensor-name substring, so a device name that
/// itself contains a sensor name cannot misroute a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSet {
    side: String,
    battery_level: String,
    last_seen: String,
}

impl TopicSet {
    /// Derives the subscription topics for a device name.
    #[must_use]
    pub fn new(device: &str) -> Self {
        Self {
            side: format!("{device}/sensor/chronodecahedron_side/state"),
            battery_level: format!("{device}/sensor/battery_level/state"),
            last_seen: format!("{device}/sensor/last_seen/state"),
        }
    }

    /// Classifies a topic, returning `None` for topics the watcher does
    /// not track.
    #[must_use]
    pub fn classify(&self, topic: &str) -> Option<SensorKind> {
        if topic == self.side {
            Some(SensorKind::Side)
        } else if topic == self.battery_level {
            Some(SensorKind::BatteryLevel)
        } else if topic == self.last_seen {
            Some(SensorKind::LastSeen)
        } else {
            None
        }
    }

    /// All topics to subscribe to, in subscription order.
    #[must_use]
    pub fn all(&self) -> [&str; 3] {
        [&self.side, &self.battery_level, &self.last_seen]
    }
}

/// Outcome of applying a single message to the device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The side value changed; a log event is due.
    SideChanged,
    /// The state was updated (or left as-is) without a loggable change.
    Unchanged,
}

/// Applies one inbound message to the state.
///
/// This is the whole state machine of the watcher: a side payload is
/// compared against the stored value (an unset side counts as different),
/// battery and last-seen payloads are stored unconditionally.
///
/// # Errors
///
/// Returns an error when the payload is not UTF-8, or does not parse as
/// a base-10 integer on a numeric topic.
pub fn apply(
    state: &mut DeviceState,
    kind: SensorKind,
    topic: &str,
    payload: &[u8],
) -> std::result::Result<Applied, DecodeError> {
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::NotUtf8 {
        topic: topic.to_string(),
    })?;

    match kind {
        SensorKind::Side => {
            let side = parse_int(topic, text)?;
            if state.side() == Some(side) {
                Ok(Applied::Unchanged)
            } else {
                state.set_side(side);
                Ok(Applied::SideChanged)
            }
        }
        SensorKind::BatteryLevel => {
            state.set_battery_level(parse_int(topic, text)?);
            Ok(Applied::Unchanged)
        }
        SensorKind::LastSeen => {
            state.set_last_seen(text.to_string());
            Ok(Applied::Unchanged)
        }
    }
}

/// Parses an integer payload, tolerating surrounding whitespace.
fn parse_int(topic: &str, text: &str) -> std::result::Result<i64, DecodeError> {
    text.trim().parse().map_err(|_| DecodeError::NotAnInteger {
        topic: topic.to_string(),
        payload: text.to_string(),
    })
}

/// Routes inbound messages to the device state and the change logger.
///
/// The dispatcher owns the single [`DeviceState`] and is the only code
/// that mutates it. Messages are handled strictly in arrival order.
#[derive(Debug)]
pub struct Dispatcher {
    topics: TopicSet,
    state: DeviceState,
    logger: ChangeLogger,
}

impl Dispatcher {
    /// Creates a dispatcher for a device name.
    #[must_use]
    pub fn new(device: &str, logger: ChangeLogger) -> Self {
        Self {
            topics: TopicSet::new(device),
            state: DeviceState::new(),
            logger,
        }
    }

    /// The topics this dispatcher expects messages on.
    #[must_use]
    pub fn topics(&self) -> &TopicSet {
        &self.topics
    }

    /// A read-only view of the tracked state.
    #[must_use]
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Handles one inbound message.
    ///
    /// Messages on untracked topics are silently ignored. A side change
    /// is written to the change logger.
    ///
    /// # Errors
    ///
    /// Returns an error when the payload cannot be decoded or the log
    /// file cannot be written; both terminate the watcher.
    pub fn on_message(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        let Some(kind) = self.topics.classify(topic) else {
            tracing::trace!(topic = %topic, "Ignoring untracked topic");
            return Ok(());
        };

        tracing::debug!(topic = %topic, ?kind, "Applying message");

        if apply(&mut self.state, kind, topic, payload)? == Applied::SideChanged {
            self.logger.log_state(&self.state)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const SIDE: &str = "timecube/sensor/chronodecahedron_side/state";
    const BATTERY: &str = "timecube/sensor/battery_level/state";
    const LAST_SEEN: &str = "timecube/sensor/last_seen/state";

    fn dispatcher() -> Dispatcher {
        Dispatcher::new("timecube", ChangeLogger::new(None))
    }

    #[test]
    fn topic_set_derives_templates() {
        let topics = TopicSet::new("kitchen_cube");
        assert_eq!(
            topics.all(),
            [
                "kitchen_cube/sensor/chronodecahedron_side/state",
                "kitchen_cube/sensor/battery_level/state",
                "kitchen_cube/sensor/last_seen/state",
            ]
        );
    }

    #[test]
    fn classify_known_topics() {
        let topics = TopicSet::new("timecube");
        assert_eq!(topics.classify(SIDE), Some(SensorKind::Side));
        assert_eq!(topics.classify(BATTERY), Some(SensorKind::BatteryLevel));
        assert_eq!(topics.classify(LAST_SEEN), Some(SensorKind::LastSeen));
    }

    #[test]
    fn classify_requires_exact_match() {
        let topics = TopicSet::new("timecube");
        assert_eq!(topics.classify("timecube/sensor/temperature/state"), None);
        assert_eq!(topics.classify("other/sensor/battery_level/state"), None);
        // A sensor name buried in a longer topic is not a match.
        assert_eq!(
            topics.classify("timecube/sensor/battery_level/state/extra"),
            None
        );
    }

    #[test]
    fn first_side_value_counts_as_change() {
        let mut state = DeviceState::new();
        let applied = apply(&mut state, SensorKind::Side, SIDE, b"3").unwrap();
        assert_eq!(applied, Applied::SideChanged);
        assert_eq!(state.side(), Some(3));
    }

    #[test]
    fn repeated_side_value_is_unchanged() {
        let mut state = DeviceState::new();
        apply(&mut state, SensorKind::Side, SIDE, b"3").unwrap();
        let applied = apply(&mut state, SensorKind::Side, SIDE, b"3").unwrap();
        assert_eq!(applied, Applied::Unchanged);
    }

    #[test]
    fn side_change_sequence_logs_once_per_distinct_value() {
        let mut state = DeviceState::new();
        let values = [3, 3, 5, 5, 5, 3];
        let changes = values
            .iter()
            .filter(|v| {
                apply(&mut state, SensorKind::Side, SIDE, v.to_string().as_bytes()).unwrap()
                    == Applied::SideChanged
            })
            .count();
        // 3 (new), 5 (changed), 3 (changed back).
        assert_eq!(changes, 3);
    }

    #[test]
    fn battery_updates_never_report_a_change() {
        let mut state = DeviceState::new();
        let applied = apply(&mut state, SensorKind::BatteryLevel, BATTERY, b"88").unwrap();
        assert_eq!(applied, Applied::Unchanged);
        assert_eq!(state.battery_level(), Some(88));
    }

    #[test]
    fn last_seen_stored_verbatim() {
        let mut state = DeviceState::new();
        let applied = apply(
            &mut state,
            SensorKind::LastSeen,
            LAST_SEEN,
            b"2024-01-01T00:00:00",
        )
        .unwrap();
        assert_eq!(applied, Applied::Unchanged);
        assert_eq!(state.last_seen(), Some("2024-01-01T00:00:00"));
    }

    #[test]
    fn integer_payloads_tolerate_whitespace() {
        let mut state = DeviceState::new();
        apply(&mut state, SensorKind::Side, SIDE, b" 7\n").unwrap();
        assert_eq!(state.side(), Some(7));
    }

    #[test]
    fn non_integer_side_payload_is_a_decode_error() {
        let mut state = DeviceState::new();
        let err = apply(&mut state, SensorKind::Side, SIDE, b"up").unwrap_err();
        assert_eq!(
            err,
            DecodeError::NotAnInteger {
                topic: SIDE.to_string(),
                payload: "up".to_string(),
            }
        );
    }

    #[test]
    fn non_utf8_payload_is_a_decode_error() {
        let mut state = DeviceState::new();
        let err = apply(&mut state, SensorKind::LastSeen, LAST_SEEN, &[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, DecodeError::NotUtf8 { .. }));
    }

    #[test]
    fn dispatcher_ignores_untracked_topics() {
        let mut dispatcher = dispatcher();
        dispatcher
            .on_message("timecube/sensor/temperature/state", b"21.5")
            .unwrap();
        assert_eq!(dispatcher.state(), &DeviceState::new());
    }

    #[test]
    fn dispatcher_surfaces_decode_errors() {
        let mut dispatcher = dispatcher();
        let err = dispatcher.on_message(BATTERY, b"full").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn side_change_scenario_appends_to_logfile() {
        let path = std::env::temp_dir().join(format!(
            "chronowatch_scenario_{}.log",
            std::process::id()
        ));
        std::fs::remove_file(&path).ok();

        let logger = ChangeLogger::new(Some(path.clone()));
        let mut dispatcher = Dispatcher::new("timecube", logger);

        dispatcher.on_message(SIDE, b"3").unwrap();
        dispatcher.on_message(BATTERY, b"88").unwrap();
        dispatcher.on_message(SIDE, b"3").unwrap();
        dispatcher.on_message(SIDE, b"5").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" 3  -1 Unknown"));
        assert!(lines[1].ends_with(" 5  88 Unknown"));

        std::fs::remove_file(&path).ok();
    }
}
