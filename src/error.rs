// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the chronowatch watcher.
//!
//! Every error in this crate is fatal: the watcher never retries a
//! connection and never skips a malformed message. The hierarchy exists
//! to report which stage failed, not to support recovery.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The watcher configuration is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// MQTT communication failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// An inbound payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The log file could not be opened or written.
    #[error("log file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to watcher configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The device name contains characters MQTT reserves for topic
    /// structure, which would corrupt the derived topic templates.
    #[error("invalid device name '{0}': must not contain '/', '+' or '#'")]
    InvalidDeviceName(String),
}

/// Errors related to MQTT communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A client request (subscribe, disconnect) failed.
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// The broker connection failed or was lost.
    #[error("MQTT connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    /// The broker acknowledged the connection with a refusal code.
    #[error("connection refused by broker: {0:?}")]
    ConnectionRefused(rumqttc::ConnectReturnCode),
}

/// Errors decoding an inbound message payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload was not valid UTF-8.
    #[error("payload on '{topic}' is not valid UTF-8")]
    NotUtf8 {
        /// The topic the payload arrived on.
        topic: String,
    },

    /// A payload on a numeric topic did not parse as an integer.
    #[error("payload '{payload}' on '{topic}' is not an integer")]
    NotAnInteger {
        /// The topic the payload arrived on.
        topic: String,
        /// The offending payload text.
        payload: String,
    },
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidDeviceName("time/cube".to_string());
        assert_eq!(
            err.to_string(),
            "invalid device name 'time/cube': must not contain '/', '+' or '#'"
        );
    }

    #[test]
    fn decode_error_display() {
        let err = DecodeError::NotAnInteger {
            topic: "timecube/sensor/battery_level/state".to_string(),
            payload: "full".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "payload 'full' on 'timecube/sensor/battery_level/state' is not an integer"
        );
    }

    #[test]
    fn error_from_decode_error() {
        let decode_err = DecodeError::NotUtf8 {
            topic: "t/sensor/last_seen/state".to_string(),
        };
        let err: Error = decode_err.into();
        assert!(matches!(err, Error::Decode(DecodeError::NotUtf8 { .. })));
    }

    #[test]
    fn error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
