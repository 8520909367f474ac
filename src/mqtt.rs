//! MQTT feed for live heat points
//!
//! Connects to a broker, subscribes to a topic and forwards every point in
//! each payload to the main loop. A payload is one point record or an array
//! of them, in the same shapes the point files use.

use crate::error::{HeatError, Result};
use crate::points::{parse_points, HeatPoint};
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 1883;
pub const DEFAULT_TOPIC: &str = "heatwall/points";

/// Receives points on a background thread
pub struct PointFeed {
    receiver: Receiver<HeatPoint>,
    _thread: thread::JoinHandle<()>,
}

impl PointFeed {
    /// Connect and subscribe. Fails immediately if the broker is unreachable.
    pub fn connect(host: &str, port: u16, topic: &str) -> Result<Self> {
        let host = if host.is_empty() { DEFAULT_HOST } else { host };
        let topic = if topic.is_empty() { DEFAULT_TOPIC } else { topic };

        let mut options = MqttOptions::new("heatwall", host, port);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut connection) = Client::new(options, 10);
        client
            .subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| HeatError::Mqtt(format!("subscribe to '{}' failed: {}", topic, e)))?;

        // Poll once so an unreachable broker fails fast
        match connection.iter().next() {
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                return Err(HeatError::Mqtt(format!(
                    "cannot connect to {}:{}: {}",
                    host, port, e
                )));
            }
            None => {
                return Err(HeatError::Mqtt(format!(
                    "cannot connect to {}:{}: connection closed",
                    host, port
                )));
            }
        }

        let (sender, receiver) = mpsc::channel();
        let topic_owned = topic.to_string();
        let handle = thread::spawn(move || {
            Self::message_loop(connection, sender, &topic_owned);
        });

        log::info!("mqtt: connected to {}:{}, subscribed to '{}'", host, port, topic);
        Ok(Self {
            receiver,
            _thread: handle,
        })
    }

    fn message_loop(mut connection: Connection, sender: Sender<HeatPoint>, topic: &str) {
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(Packet::Publish(publish))) if publish.topic == topic => {
                    let Some(points) = decode_payload(&publish.payload) else {
                        continue;
                    };
                    for p in points {
                        if sender.send(p).is_err() {
                            // Receiver dropped
                            return;
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    // rumqttc reconnects on the next iteration
                    log::warn!("mqtt: {}", e);
                }
            }
        }
    }

    /// Drain every point received since the last poll (non-blocking)
    pub fn poll(&self) -> Vec<HeatPoint> {
        self.receiver.try_iter().collect()
    }
}

/// Points in one payload, `None` (logged) if it isn't valid UTF-8 point JSON
fn decode_payload(payload: &[u8]) -> Option<Vec<HeatPoint>> {
    let text = std::str::from_utf8(payload).ok()?.trim();
    if text.is_empty() {
        return None;
    }
    match parse_points(text) {
        Ok(points) => Some(points),
        Err(e) => {
            log::warn!("mqtt: ignoring payload: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_single_and_batch() {
        assert_eq!(
            decode_payload(br#"{"lat": 1, "lng": 2}"#),
            Some(vec![HeatPoint::new(1.0, 2.0)])
        );
        assert_eq!(
            decode_payload(b"[[1, 2, 0.5], [3, 4]]"),
            Some(vec![HeatPoint::weighted(1.0, 2.0, 0.5), HeatPoint::new(3.0, 4.0)])
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(decode_payload(b"   "), None);
        assert_eq!(decode_payload(b"hello"), None);
        assert_eq!(decode_payload(&[0xff, 0xfe]), None);
    }
}
