//! Destinations for aggregate records.

use crate::core::aggregate::UserInputAggregate;
use crossbeam_channel::Sender;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("sink receiver disconnected")]
    Disconnected,
    #[error("sink failed: {0}")]
    Failed(String),
}

/// Receives one aggregate per tick, on the tick's thread.
///
/// Implementations should return promptly; the next tick waits for this one.
pub trait AggregateSink: Send {
    fn on_aggregate(&mut self, aggregate: &UserInputAggregate) -> Result<(), SinkError>;
}

impl<F> AggregateSink for F
where
    F: FnMut(&UserInputAggregate) + Send,
{
    fn on_aggregate(&mut self, aggregate: &UserInputAggregate) -> Result<(), SinkError> {
        self(aggregate);
        Ok(())
    }
}

/// Forwards aggregates into a crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<UserInputAggregate>,
}

impl ChannelSink {
    pub fn new(sender: Sender<UserInputAggregate>) -> Self {
        Self { sender }
    }
}

impl AggregateSink for ChannelSink {
    fn on_aggregate(&mut self, aggregate: &UserInputAggregate) -> Result<(), SinkError> {
        self.sender
            .send(aggregate.clone())
            .map_err(|_| SinkError::Disconnected)
    }
}
