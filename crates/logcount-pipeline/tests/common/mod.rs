//! Shared test helpers: a recording runner and settings builders.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_yaml::Mapping;

use logcount_core::error::{ErrorCode, LogCountError, Result};
use logcount_core::message::Message;
use logcount_pipeline::plugin::FilterRunner;
use logcount_pipeline::runner::{OutputPack, PackPool};

/// Runner that keeps injected messages in memory.
pub struct RecordingRunner {
    pub pool: PackPool,
    pub injected: Mutex<Vec<Message>>,
    pub errors: Mutex<Vec<ErrorCode>>,
    pub refuse_inject: AtomicBool,
}

impl RecordingRunner {
    pub fn new(pool_size: usize) -> Arc<Self> {
        Arc::new(Self {
            pool: PackPool::new(pool_size),
            injected: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            refuse_inject: AtomicBool::new(false),
        })
    }

    pub fn payloads(&self) -> Vec<String> {
        self.injected.lock().iter().map(|m| m.payload.clone()).collect()
    }

    pub fn last(&self) -> Message {
        self.injected.lock().last().cloned().expect("nothing injected")
    }
}

impl FilterRunner for RecordingRunner {
    fn name(&self) -> &str {
        "counter"
    }

    fn new_pack(&self) -> Result<OutputPack> {
        self.pool.acquire()
    }

    fn inject(&self, mut pack: OutputPack) -> Result<()> {
        if self.refuse_inject.load(Ordering::SeqCst) {
            return Err(LogCountError::ResourceUnavailable("refused".into()));
        }
        pack.message.set_logger("counter");
        self.injected.lock().push(pack.message.clone());
        Ok(())
    }

    fn log_error(&self, err: &LogCountError) {
        self.errors.lock().push(err.code());
    }
}

pub fn settings(yaml: &str) -> Mapping {
    serde_yaml::from_str(yaml).expect("settings yaml")
}

pub fn svc_settings() -> Mapping {
    settings(
        r#"
influx_measurement: svc
influx_ip: 1.2.3.4
influx_topic: events
"#,
    )
}

/// Payload without the trailing timestamp and newline.
pub fn strip_ts(payload: &str) -> &str {
    payload.trim_end_matches('\n').rsplit_once(' ').map(|(head, _)| head).unwrap_or(payload)
}
