//! Recipient-local receive time.

use chrono::NaiveDateTime;
use std::fmt::Debug;

use crate::domain::Message;

/// Computes when a message would be received in the recipient's local time.
pub trait ReceiveTimeCalculator: Send + Sync + Debug {
    fn calculate_receive_time(&self, message: &Message) -> NaiveDateTime;
}

/// Receive time relative to a reference time fixed for the whole cycle.
///
/// `receive_time = reference_time - client_timezone_offset`
#[derive(Debug, Clone, Copy)]
pub struct LocalTimeReceiveTimeCalculator {
    reference_time: NaiveDateTime,
}

impl LocalTimeReceiveTimeCalculator {
    pub fn new(reference_time: NaiveDateTime) -> Self {
        Self { reference_time }
    }

    pub fn reference_time(&self) -> NaiveDateTime {
        self.reference_time
    }
}

impl ReceiveTimeCalculator for LocalTimeReceiveTimeCalculator {
    fn calculate_receive_time(&self, message: &Message) -> NaiveDateTime {
        self.reference_time - message.client_timezone_offset
    }
}
