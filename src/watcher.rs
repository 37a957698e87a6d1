// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection bootstrap and the receive loop.
//!
//! The watcher opens one connection to the broker, authenticates when a
//! username is configured, subscribes to the three device topics, and
//! then hands every inbound publish to the dispatcher until a fatal
//! error or a shutdown signal. The event loop is polled inline, never
//! from a spawned task, so message handling stays serialized and the
//! device state needs no locking.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::broadcast;

use crate::dispatch::Dispatcher;
use crate::error::{ProtocolError, Result};
use crate::logger::ChangeLogger;
use crate::state::DeviceState;

/// Global counter for generating unique client IDs.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Keep-alive interval for the broker connection.
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Configuration for a [`Watcher`].
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Broker host.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Username and password. The password is empty when only a username
    /// was supplied; no credentials are sent at all without a username.
    pub credentials: Option<(String, String)>,
    /// Device name substituted into the topic templates.
    pub device: String,
    /// Optional path for the durable log append.
    pub logfile: Option<PathBuf>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            credentials: None,
            device: "timecube".to_string(),
            logfile: None,
        }
    }
}

/// A connected, subscribed watcher ready to process messages.
pub struct Watcher {
    client: AsyncClient,
    event_loop: EventLoop,
    dispatcher: Dispatcher,
}

impl Watcher {
    /// Connects to the broker and subscribes to the three device topics.
    ///
    /// Prints the bootstrap progress lines to stdout. A refused or
    /// unreachable broker is fatal; there is no retry.
    ///
    /// # Errors
    ///
    /// Returns an error when the broker is unreachable, rejects the
    /// connection, or a subscription request fails.
    pub async fn connect(config: WatcherConfig) -> Result<Self> {
        let counter = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let client_id = format!("chronowatch_{}_{}", std::process::id(), counter);

        let mut options = MqttOptions::new(client_id, &config.host, config.port);
        options.set_keep_alive(KEEP_ALIVE);
        options.set_clean_session(true);
        if let Some((username, password)) = &config.credentials {
            options.set_credentials(username, password);
        }

        println!("Connecting");
        tracing::info!(host = %config.host, port = config.port, "Connecting to MQTT broker");

        let (client, mut event_loop) = AsyncClient::new(options, 10);

        // The first polls drive the TCP connect and the CONNECT/CONNACK
        // exchange; anything but a success acknowledgment is fatal.
        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code == ConnectReturnCode::Success {
                        break;
                    }
                    return Err(ProtocolError::ConnectionRefused(ack.code).into());
                }
                Ok(_) => {}
                Err(e) => return Err(ProtocolError::Connection(e).into()),
            }
        }

        println!("Connected to MQTT");
        tracing::info!(host = %config.host, port = config.port, "Connected to MQTT broker");

        let logger = ChangeLogger::new(config.logfile.clone());
        let dispatcher = Dispatcher::new(&config.device, logger);

        for topic in dispatcher.topics().all() {
            client
                .subscribe(topic, QoS::AtMostOnce)
                .await
                .map_err(ProtocolError::Client)?;
            tracing::debug!(topic = %topic, "Subscription requested");
        }

        println!("Completed Subscription");

        Ok(Self {
            client,
            event_loop,
            dispatcher,
        })
    }

    /// Runs the receive loop until a fatal error or shutdown.
    ///
    /// Every inbound publish is handed to the dispatcher in arrival
    /// order. When the shutdown channel fires, the watcher disconnects
    /// from the broker and returns cleanly.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection is lost, a payload cannot be
    /// decoded, or the log file cannot be written.
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown requested, disconnecting");
                    self.client
                        .disconnect()
                        .await
                        .map_err(ProtocolError::Client)?;
                    return Ok(());
                }
                event = self.event_loop.poll() => match event {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        self.dispatcher.on_message(&publish.topic, &publish.payload)?;
                    }
                    Ok(Event::Incoming(Packet::SubAck(ack))) => {
                        tracing::debug!(?ack, "Subscription acknowledged");
                    }
                    Ok(_) => {}
                    Err(e) => return Err(ProtocolError::Connection(e).into()),
                },
            }
        }
    }

    /// A read-only view of the tracked device state.
    #[must_use]
    pub fn state(&self) -> &DeviceState {
        self.dispatcher.state()
    }
}
