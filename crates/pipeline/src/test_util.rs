//! Test doubles shared by the driver and staged pipeline tests

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use flightfeed_sinks::{PublishError, Publisher};
use flightfeed_sources::{LineSource, SourceError};

pub(crate) const SAMPLE: &str = "clock\t1526120887\thexid\t4CC270\tident\tICE470  \tsquawk\t1427\talt\t13950\tspeed\t319\tairGround\tA\tlat\t51.28232\tlon\t-0.71182\theading\t135";

pub(crate) const SAMPLE_JSON: &str = r#"{"timestamp":1526120887,"hexId":"4CC270","ident":"ICE470","squawk":1427,"alt":13950,"speed":319,"airground":"A","lat":51.28232,"lon":-0.71182,"heading":135}"#;

/// A sample line with a different timestamp
pub(crate) fn sample_at(timestamp: i64) -> String {
    SAMPLE.replace("1526120887", &timestamp.to_string())
}

// =============================================================================
// Source
// =============================================================================

/// One step of a scripted feed
pub(crate) enum Event {
    Line(String),
    End,
    Fail,
}

/// Source that replays events, then blocks forever
pub(crate) struct ScriptedSource {
    events: VecDeque<Event>,
    reconnectable: bool,
    reconnect_fails: bool,
}

impl ScriptedSource {
    pub(crate) fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
            reconnectable: false,
            reconnect_fails: false,
        }
    }

    pub(crate) fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(lines.into_iter().map(|l| Event::Line(l.into())))
    }

    pub(crate) fn reconnectable(mut self) -> Self {
        self.reconnectable = true;
        self
    }

    pub(crate) fn reconnect_fails(mut self) -> Self {
        self.reconnectable = true;
        self.reconnect_fails = true;
        self
    }
}

#[async_trait]
impl LineSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        match self.events.pop_front() {
            Some(Event::Line(line)) => Ok(Some(line)),
            Some(Event::End) => Ok(None),
            Some(Event::Fail) => Err(SourceError::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "reset",
            ))),
            None => std::future::pending().await,
        }
    }

    fn can_reconnect(&self) -> bool {
        self.reconnectable
    }

    async fn reconnect(&mut self) -> Result<(), SourceError> {
        if self.reconnect_fails {
            return Err(SourceError::Connect {
                address: "127.0.0.1:1".into(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Publisher
// =============================================================================

/// Publisher that records payloads and can be told to fail
#[derive(Default)]
pub(crate) struct RecordingPublisher {
    published: Mutex<Vec<(String, Bytes)>>,
    transient_failures: AtomicU32,
    permanent_failure: AtomicBool,
    delay: Option<Duration>,
    attempts: AtomicU32,
    closed: AtomicBool,
}

impl RecordingPublisher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` attempts with a retryable 503
    pub(crate) fn failing_transiently(n: u32) -> Self {
        Self {
            transient_failures: AtomicU32::new(n),
            ..Default::default()
        }
    }

    /// Fail every attempt with a permanent 400
    pub(crate) fn failing() -> Self {
        Self {
            permanent_failure: AtomicBool::new(true),
            ..Default::default()
        }
    }

    /// Sleep before acknowledging each payload
    pub(crate) fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    /// Start failing permanently from now on
    pub(crate) fn fail_from_now(&self) {
        self.permanent_failure.store(true, Ordering::SeqCst);
    }

    pub(crate) fn payloads(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(_, payload)| String::from_utf8(payload.to_vec()).unwrap())
            .collect()
    }

    pub(crate) fn topics(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(topic, _)| topic.clone())
            .collect()
    }

    pub(crate) fn count(&self) -> usize {
        self.published.lock().unwrap().len()
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    fn name(&self) -> &str {
        "recording"
    }

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.permanent_failure.load(Ordering::SeqCst) {
            return Err(PublishError::Rejected {
                status: 400,
                body: "bad request".into(),
            });
        }

        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(PublishError::Rejected {
                status: 503,
                body: "unavailable".into(),
            });
        }

        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Ok(())
    }

    async fn close(&self) -> Result<(), PublishError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Poll until `condition` holds, panicking after a second
pub(crate) async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
