//! Transcript observer

use crate::message::Message;

/// Out-of-band events the human should see
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// The judge found the answer incomplete; the model will continue
    FollowUp(String),
    /// Automatic turns hit the limit; waiting for the user
    LoopLimit { max: u32 },
    /// An in-loop failure, already recorded in the conversation
    Error(String),
}

pub trait TranscriptSink: Send + Sync {
    /// Called after every append to the conversation
    fn message(&self, message: &Message);

    fn notice(&self, notice: &Notice);
}

/// Discards everything
pub struct NullTranscript;

impl TranscriptSink for NullTranscript {
    fn message(&self, _message: &Message) {}

    fn notice(&self, _notice: &Notice) {}
}
