//! Priority window classification.

use chrono::NaiveTime;
use std::fmt::Debug;
use std::sync::Arc;

use crate::domain::Message;
use crate::planning::receive_time::ReceiveTimeCalculator;

/// Decides whether a message falls inside a template's favorable window.
pub trait PriorityMessageChecker: Send + Sync + Debug {
    fn is_prioritized(&self, message: &Message) -> bool;
}

/// A message is prioritized when its local receive time-of-day lies in
/// `[start, end]`, both bounds inclusive.
#[derive(Debug, Clone)]
pub struct IntervalPriorityMessageChecker {
    start: NaiveTime,
    end: NaiveTime,
    calculator: Arc<dyn ReceiveTimeCalculator>,
}

impl IntervalPriorityMessageChecker {
    pub fn new(start: NaiveTime, end: NaiveTime, calculator: Arc<dyn ReceiveTimeCalculator>) -> Self {
        Self { start, end, calculator }
    }

    /// 00:00 - 12:00
    pub fn morning(calculator: Arc<dyn ReceiveTimeCalculator>) -> Self {
        Self::new(hms(0, 0, 0), hms(12, 0, 0), calculator)
    }

    /// 12:00 - 17:00
    pub fn daytime(calculator: Arc<dyn ReceiveTimeCalculator>) -> Self {
        Self::new(hms(12, 0, 0), hms(17, 0, 0), calculator)
    }

    /// 17:00 - 23:59:59
    pub fn evening(calculator: Arc<dyn ReceiveTimeCalculator>) -> Self {
        Self::new(hms(17, 0, 0), hms(23, 59, 59), calculator)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Whether a time of day falls in the window.
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }
}

impl PriorityMessageChecker for IntervalPriorityMessageChecker {
    fn is_prioritized(&self, message: &Message) -> bool {
        let receive_time = self.calculator.calculate_receive_time(message).time();
        self.contains(receive_time)
    }
}

fn hms(hour: u32, min: u32, sec: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, min, sec).unwrap_or(NaiveTime::MIN)
}
