//! Plugin contracts between the host and filter plugins.
//!
//! A filter is a passive reactor: the host calls [`Filter::observe`] once per
//! routed message and [`Filter::on_tick`] once per ticker interval, possibly
//! from different tasks. Everything a filter needs from the host (output
//! packs, injection, error logging) comes through the [`FilterRunner`] it is
//! handed in [`Filter::prepare`].

use std::sync::Arc;
use std::time::Duration;

use serde_yaml::Mapping;

use logcount_core::error::{LogCountError, Result};
use logcount_core::message::Message;

use crate::runner::OutputPack;

/// Lifecycle implemented by filter plugins.
pub trait Filter: Send + Sync {
    /// Validate plugin settings and become ready.
    fn configure(&self, settings: &Mapping) -> Result<()>;

    /// Receive the host runner. Only valid once configured.
    fn prepare(&self, runner: Arc<dyn FilterRunner>) -> Result<()>;

    /// Account for one routed message.
    fn observe(&self, msg: &Message) -> Result<()>;

    /// Periodic timer event.
    fn on_tick(&self) -> Result<()>;

    /// How often the host should call `on_tick`; `None` disables the ticker.
    fn ticker_interval(&self) -> Option<Duration>;

    /// Drop configuration and state so the instance can be configured again.
    fn cleanup_for_restart(&self);

    /// Permanent teardown.
    fn clean_up(&self);
}

/// Host facilities exposed to a running filter.
pub trait FilterRunner: Send + Sync {
    /// Configured instance name.
    fn name(&self) -> &str;

    /// Take an empty pack from the host pool.
    fn new_pack(&self) -> Result<OutputPack>;

    /// Hand a filled pack back to the host for routing and output.
    fn inject(&self, pack: OutputPack) -> Result<()>;

    /// Report an error through the host's logging.
    fn log_error(&self, err: &LogCountError);
}
