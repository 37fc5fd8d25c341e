//! Line-protocol rendering for count reports.
//!
//! A report line looks like
//! `<measurement>[,vip=<vip>],ip=<ip>,topic=<topic> size=<count>,value=1 <ts_nanos>\n`.
//! The tag portion is fixed for the lifetime of a configuration, so it is
//! built once into a [`MetricPrefix`] and only the fields and timestamp are
//! formatted per report.

use std::fmt;

/// Precomputed measurement + tag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricPrefix(String);

impl MetricPrefix {
    /// Build the prefix. An empty `vip` is treated the same as `None`.
    pub fn new(measurement: &str, vip: Option<&str>, ip: &str, topic: &str) -> Self {
        match vip.filter(|v| !v.is_empty()) {
            Some(vip) => Self(format!("{measurement},vip={vip},ip={ip},topic={topic}")),
            None => Self(format!("{measurement},ip={ip},topic={topic}")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render one report line, trailing newline included.
    pub fn render(&self, count: u64, timestamp_nanos: i64) -> String {
        format!("{} size={count},value=1 {timestamp_nanos}\n", self.0)
    }
}

impl fmt::Display for MetricPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
