//! Message matching for filter subscriptions.
//!
//! Only a handful of expressions are understood; anything else is rejected
//! when the pipeline starts.

use logcount_core::error::{LogCountError, Result};
use logcount_core::message::Message;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageMatcher {
    /// `"TRUE"`
    All,
    /// `"FALSE"`
    Nothing,
    /// Default: everything except messages the filter injected itself.
    ExceptLogger(String),
}

impl MessageMatcher {
    pub fn compile(expr: Option<&str>, own_name: &str) -> Result<Self> {
        match expr.map(str::trim) {
            None | Some("") => Ok(MessageMatcher::ExceptLogger(own_name.to_string())),
            Some("TRUE") => Ok(MessageMatcher::All),
            Some("FALSE") => Ok(MessageMatcher::Nothing),
            Some(other) => Err(LogCountError::InvalidConfig(format!(
                "unsupported message_matcher for {own_name}: {other}"
            ))),
        }
    }

    pub fn matches(&self, msg: &Message) -> bool {
        match self {
            MessageMatcher::All => true,
            MessageMatcher::Nothing => false,
            MessageMatcher::ExceptLogger(name) => msg.logger != *name,
        }
    }
}
