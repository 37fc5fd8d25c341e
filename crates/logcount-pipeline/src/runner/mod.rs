//! Host-side runner pieces: the output pack pool and the channel-backed
//! [`FilterRunner`](crate::plugin::FilterRunner).

mod channel;
mod pool;

pub use channel::ChannelRunner;
pub use pool::{OutputPack, PackPool};
