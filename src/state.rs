// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory state of the monitored device.

/// Tracked state of the monitored chronodecahedron.
///
/// All fields are optional because the device reports each sensor
/// independently; nothing is known until the first message arrives.
/// Exactly one instance exists per running watcher, and it is mutated
/// only by the message dispatcher.
///
/// # Examples
///
/// ```
/// use chronowatch::DeviceState;
///
/// let mut state = DeviceState::new();
/// assert_eq!(state.render(), "-1  -1 Unknown");
///
/// state.set_side(7);
/// state.set_battery_level(42);
/// assert_eq!(state.render(), " 7  42 Unknown");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceState {
    /// The side the device currently rests on.
    side: Option<i64>,
    /// Most recently reported battery level.
    battery_level: Option<i64>,
    /// Most recently reported liveness marker, kept as opaque text.
    last_seen: Option<String>,
}

impl DeviceState {
    /// Creates a new state with all fields unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current side, if the device has reported one.
    #[must_use]
    pub fn side(&self) -> Option<i64> {
        self.side
    }

    /// Stores a new side value.
    pub fn set_side(&mut self, side: i64) {
        self.side = Some(side);
    }

    /// The most recently reported battery level.
    #[must_use]
    pub fn battery_level(&self) -> Option<i64> {
        self.battery_level
    }

    /// Stores a new battery level.
    pub fn set_battery_level(&mut self, level: i64) {
        self.battery_level = Some(level);
    }

    /// The most recently reported liveness marker.
    #[must_use]
    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }

    /// Stores a new liveness marker.
    pub fn set_last_seen(&mut self, marker: String) {
        self.last_seen = Some(marker);
    }

    /// Renders the fixed-width summary used for log lines.
    ///
    /// The side is right-aligned in a 2-character field and the battery
    /// level in a 3-character field; unset numeric fields render as `-1`
    /// and an unset liveness marker as `Unknown`. Values are not range
    /// checked, so wide values simply grow past their field.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "{:>2} {:>3} {}",
            self.side.unwrap_or(-1),
            self.battery_level.unwrap_or(-1),
            self.last_seen.as_deref().unwrap_or("Unknown"),
        )
    }
}
