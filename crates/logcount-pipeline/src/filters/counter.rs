//! Message counter filter.
//!
//! Counts every message routed to it and, on each tick, injects one
//! line-protocol report of the count since the last successful report:
//!
//! `<measurement>[,vip=<vip>],ip=<ip>,topic=<topic> size=<n>,value=1 <ts_nanos>\n`
//!
//! The report carries a `payload_name` field so downstream outputs can match
//! on it. If the host has no pack to give or refuses the injection, the count
//! is kept and folded into the next tick's report.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};

use logcount_core::clock::{Clock, SystemClock};
use logcount_core::error::{LogCountError, Result};
use logcount_core::line::MetricPrefix;
use logcount_core::message::{Field, Message};

use crate::plugin::{Filter, FilterRunner};

/// Name the filter is registered under.
pub const PLUGIN_NAME: &str = "LogCounterFilter";

const PAYLOAD_FIELD: &str = "payload_name";
const PAYLOAD_FIELD_DESC: &str = "Payload name for match";

/// Settings accepted by [`LogCounterFilter`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CounterFilterConfig {
    /// Routing is the host's job; accepted so it can live next to the other settings.
    #[serde(default)]
    pub message_matcher: Option<String>,

    /// Seconds between reports. 0 disables the ticker.
    #[serde(default = "default_ticker_interval")]
    pub ticker_interval: u64,

    #[serde(default, deserialize_with = "label")]
    pub influx_measurement: String,
    #[serde(default, deserialize_with = "label")]
    pub influx_vip: String,
    #[serde(default, deserialize_with = "label")]
    pub influx_ip: String,
    #[serde(default, deserialize_with = "label")]
    pub influx_topic: String,

    #[serde(default = "default_payload_name", deserialize_with = "label")]
    pub payload_name: String,
}

impl Default for CounterFilterConfig {
    fn default() -> Self {
        Self {
            message_matcher: None,
            ticker_interval: default_ticker_interval(),
            influx_measurement: String::new(),
            influx_vip: String::new(),
            influx_ip: String::new(),
            influx_topic: String::new(),
            payload_name: default_payload_name(),
        }
    }
}

impl CounterFilterConfig {
    pub fn from_settings(settings: &Mapping) -> Result<Self> {
        let cfg: Self = serde_yaml::from_value(Value::Mapping(settings.clone()))
            .map_err(|e| LogCountError::Configuration(format!("invalid counter settings: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.influx_measurement.is_empty()
            || self.influx_ip.is_empty()
            || self.influx_topic.is_empty()
        {
            return Err(LogCountError::Configuration(
                "influx_measurement influx_ip influx_topic can't be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn prefix(&self) -> MetricPrefix {
        MetricPrefix::new(
            &self.influx_measurement,
            Some(self.influx_vip.as_str()),
            &self.influx_ip,
            &self.influx_topic,
        )
    }
}

/// Labels may be written unquoted, so YAML numbers and booleans are taken
/// as their text.
fn label<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected a string label, found {other:?}"
        ))),
    }
}

fn default_ticker_interval() -> u64 {
    5
}
fn default_payload_name() -> String {
    "local_report".into()
}

struct Active {
    conf: CounterFilterConfig,
    prefix: MetricPrefix,
    runner: Option<Arc<dyn FilterRunner>>,
}

enum Lifecycle {
    Uninitialized,
    Active(Active),
    Terminated,
}

/// Counts routed messages and reports the count once per tick.
pub struct LogCounterFilter {
    count: AtomicU64,
    state: RwLock<Lifecycle>,
    // Serialises read -> inject -> reset across concurrent ticks.
    tick: Mutex<()>,
    clock: Arc<dyn Clock>,
}

impl Default for LogCounterFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl LogCounterFilter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            count: AtomicU64::new(0),
            state: RwLock::new(Lifecycle::Uninitialized),
            tick: Mutex::new(()),
            clock,
        }
    }

    /// Messages counted since the last successful report.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_configured(&self) -> bool {
        matches!(*self.state.read(), Lifecycle::Active(_))
    }

    /// Derived tag prefix, if configured.
    pub fn prefix(&self) -> Option<MetricPrefix> {
        match &*self.state.read() {
            Lifecycle::Active(a) => Some(a.prefix.clone()),
            _ => None,
        }
    }

    fn reset(&self, next: Lifecycle) {
        let mut state = self.state.write();
        // Terminated is final.
        if !matches!(*state, Lifecycle::Terminated) {
            *state = next;
        }
        self.count.store(0, Ordering::Release);
    }
}

impl Filter for LogCounterFilter {
    fn configure(&self, settings: &Mapping) -> Result<()> {
        let conf = CounterFilterConfig::from_settings(settings)?;
        let prefix = conf.prefix();

        let mut state = self.state.write();
        if matches!(*state, Lifecycle::Terminated) {
            return Err(LogCountError::Internal("counter filter already cleaned up".into()));
        }
        tracing::debug!(prefix = %prefix, interval = conf.ticker_interval, "counter filter configured");
        *state = Lifecycle::Active(Active {
            conf,
            prefix,
            runner: None,
        });
        Ok(())
    }

    fn prepare(&self, runner: Arc<dyn FilterRunner>) -> Result<()> {
        match &mut *self.state.write() {
            Lifecycle::Active(a) => {
                a.runner = Some(runner);
                Ok(())
            }
            _ => Err(LogCountError::NotConfigured),
        }
    }

    fn observe(&self, _msg: &Message) -> Result<()> {
        // Held across the increment so a concurrent restart cannot leave a stale count.
        let state = self.state.read();
        if !matches!(*state, Lifecycle::Active(_)) {
            return Err(LogCountError::NotConfigured);
        }
        self.count.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn on_tick(&self) -> Result<()> {
        let _tick = self.tick.lock();
        let state = self.state.read();
        let Lifecycle::Active(active) = &*state else {
            return Err(LogCountError::NotConfigured);
        };
        let runner = active
            .runner
            .as_ref()
            .ok_or_else(|| LogCountError::Internal("counter filter ticked before prepare".into()))?;

        let count = self.count.load(Ordering::Acquire);
        let ts = self.clock.now_nanos();

        let mut pack = match runner.new_pack() {
            Ok(p) => p,
            Err(e) => {
                runner.log_error(&e);
                return Err(e);
            }
        };
        pack.message.set_type("txt");
        pack.message.set_payload(active.prefix.render(count, ts));
        pack.message.add_field(Field::new(
            PAYLOAD_FIELD,
            active.conf.payload_name.as_str(),
            PAYLOAD_FIELD_DESC,
        ));

        if let Err(e) = runner.inject(pack) {
            runner.log_error(&e);
            return Err(e);
        }

        // Only what was reported; increments since the load carry over.
        self.count.fetch_sub(count, Ordering::AcqRel);
        tracing::trace!(filter = runner.name(), count, "count reported");
        Ok(())
    }

    fn ticker_interval(&self) -> Option<Duration> {
        match &*self.state.read() {
            Lifecycle::Active(a) if a.conf.ticker_interval > 0 => {
                Some(Duration::from_secs(a.conf.ticker_interval))
            }
            _ => None,
        }
    }

    fn cleanup_for_restart(&self) {
        self.reset(Lifecycle::Uninitialized);
    }

    fn clean_up(&self) {
        self.reset(Lifecycle::Terminated);
    }
}
