// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! chronowatch - a durable side-change log for a chronodecahedron.
//!
//! The watcher connects to an MQTT broker, subscribes to the three state
//! topics a chronodecahedron publishes (its current side, its battery
//! level, and a last-seen marker), and writes a timestamped line to
//! stdout and an optional logfile every time the side changes. Battery
//! and last-seen updates are tracked silently and included in the next
//! side-change line.
//!
//! # Quick Start
//!
//! ```no_run
//! use chronowatch::{Watcher, WatcherConfig};
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> chronowatch::Result<()> {
//!     let config = WatcherConfig {
//!         host: "192.168.1.50".to_string(),
//!         ..WatcherConfig::default()
//!     };
//!
//!     let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!     let mut watcher = Watcher::connect(config).await?;
//!     watcher.run(shutdown_rx).await
//! }
//! ```

pub mod cli;
pub mod dispatch;
pub mod error;
pub mod logger;
pub mod state;
pub mod watcher;

pub use cli::Args;
pub use dispatch::{Applied, Dispatcher, SensorKind, TopicSet, apply};
pub use error::{ConfigError, DecodeError, Error, ProtocolError, Result};
pub use logger::ChangeLogger;
pub use state::DeviceState;
pub use watcher::{Watcher, WatcherConfig};
