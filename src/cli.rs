// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::error::ConfigError;
use crate::watcher::WatcherConfig;

/// Watch MQTT topics of a given device for nonvolatile logs.
#[derive(Debug, Parser)]
#[command(name = "chronowatch", version, about)]
pub struct Args {
    /// MQTT host.
    #[arg(short = 's', long, default_value = "localhost")]
    pub server: String,

    /// MQTT port.
    #[arg(short = 'p', long, default_value_t = 1883)]
    pub port: u16,

    /// MQTT user.
    #[arg(short = 'u', long, env = "CHRONO_MQTT_USER")]
    pub user: Option<String>,

    /// MQTT password.
    #[arg(short = 'w', long, env = "CHRONO_MQTT_PASS")]
    pub password: Option<String>,

    /// ESPHome hostname, used for MQTT topics.
    #[arg(short = 'd', long, default_value = "timecube")]
    pub device: String,

    /// Path to logfile.
    #[arg(short = 'l', long)]
    pub logfile: Option<PathBuf>,
}

impl Args {
    /// Validates the arguments and converts them into a watcher config.
    ///
    /// Authentication is driven by the username alone: a password
    /// supplied without a username is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error when the device name contains MQTT topic
    /// separators or wildcards.
    pub fn into_config(self) -> std::result::Result<WatcherConfig, ConfigError> {
        if self.device.contains(['/', '+', '#']) {
            return Err(ConfigError::InvalidDeviceName(self.device));
        }

        let credentials = self
            .user
            .map(|user| (user, self.password.unwrap_or_default()));

        Ok(WatcherConfig {
            host: self.server,
            port: self.port,
            credentials,
            device: self.device,
            logfile: self.logfile,
        })
    }
}
