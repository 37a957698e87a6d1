// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Durable change logging.
//!
//! Whenever the watched side attribute changes, one line of the form
//! `<timestamp> <state summary>` goes to stdout and, when a log file is
//! configured, is appended to it verbatim.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::Result;
use crate::state::DeviceState;

/// Timestamp layout for log lines: local time, second precision.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Writes timestamped state lines to stdout and, optionally, a log file.
#[derive(Debug, Clone)]
pub struct ChangeLogger {
    logfile: Option<PathBuf>,
}

impl ChangeLogger {
    /// Creates a logger; pass a path to also append every line to a file.
    #[must_use]
    pub fn new(logfile: Option<PathBuf>) -> Self {
        Self { logfile }
    }

    /// The configured log file path, if any.
    #[must_use]
    pub fn logfile(&self) -> Option<&Path> {
        self.logfile.as_deref()
    }

    /// Logs the current state.
    ///
    /// The timestamp is computed once per call, so the stdout line and
    /// the file line are byte-identical. The file is opened in append
    /// mode (created if absent) and closed again on every call; rotating
    /// or truncating it between events is picked up on the next append.
    ///
    /// # Errors
    ///
    /// Returns an error when the log file cannot be opened or written.
    pub fn log_state(&self, state: &DeviceState) -> Result<()> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let line = render_line(&timestamp, state);

        println!("{line}");

        if let Some(path) = &self.logfile {
            let mut file = OpenOptions::new().append(true).create(true).open(path)?;
            writeln!(file, "{line}")?;
        }

        Ok(())
    }
}

/// Composes a log line from a timestamp and a state snapshot.
fn render_line(timestamp: &str, state: &DeviceState) -> String {
    format!("{timestamp} {}", state.render())
}
