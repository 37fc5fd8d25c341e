use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

use logcount_core::error::{LogCountError, Result};

use crate::plugin::FilterRunner;
use crate::runner::{OutputPack, PackPool};

/// Runner that pushes injected packs onto the pipeline's output queue.
pub struct ChannelRunner {
    name: Arc<str>,
    pool: PackPool,
    tx: mpsc::Sender<OutputPack>,
}

impl ChannelRunner {
    pub fn new(name: impl Into<Arc<str>>, pool: PackPool, tx: mpsc::Sender<OutputPack>) -> Self {
        Self {
            name: name.into(),
            pool,
            tx,
        }
    }
}

impl FilterRunner for ChannelRunner {
    fn name(&self) -> &str {
        &self.name
    }

    fn new_pack(&self) -> Result<OutputPack> {
        self.pool.acquire()
    }

    fn inject(&self, mut pack: OutputPack) -> Result<()> {
        pack.message.set_logger(self.name.as_ref());
        self.tx.try_send(pack).map_err(|e| match e {
            TrySendError::Full(_) => LogCountError::ResourceUnavailable("output queue full".into()),
            TrySendError::Closed(_) => {
                LogCountError::ResourceUnavailable("output queue closed".into())
            }
        })
    }

    fn log_error(&self, err: &LogCountError) {
        tracing::error!(filter = %self.name, code = err.code().as_str(), error = %err, "filter error");
    }
}
