use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use logcount_core::error::{LogCountError, Result};
use logcount_core::message::Message;

/// Bounded pool of output packs shared by all filters of a pipeline.
///
/// A pack holds one pool slot until it is dropped, which happens once the
/// output side has finished with it. When every slot is in flight,
/// [`PackPool::acquire`] fails instead of waiting.
#[derive(Clone)]
pub struct PackPool {
    slots: Arc<Semaphore>,
}

impl PackPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
        }
    }

    /// Packs that can be handed out right now.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn acquire(&self) -> Result<OutputPack> {
        let permit = Arc::clone(&self.slots)
            .try_acquire_owned()
            .map_err(|e| match e {
                TryAcquireError::NoPermits => {
                    LogCountError::ResourceUnavailable("output pack pool exhausted".into())
                }
                TryAcquireError::Closed => {
                    LogCountError::ResourceUnavailable("output pack pool closed".into())
                }
            })?;
        Ok(OutputPack {
            message: Message::default(),
            _slot: permit,
        })
    }

    /// Refuse all further acquisitions.
    pub fn close(&self) {
        self.slots.close();
    }
}

/// A message on its way out of a filter, holding one pool slot.
pub struct OutputPack {
    pub message: Message,
    _slot: OwnedSemaphorePermit,
}

impl std::fmt::Debug for OutputPack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputPack")
            .field("message", &self.message)
            .finish()
    }
}
