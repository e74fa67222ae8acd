//! Pending outbound message.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message waiting to be sent.
///
/// Read-only input to a scheduling cycle. Belongs to exactly one template
/// through `template_code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,

    /// Code of the owning template
    pub template_code: String,

    /// Beginning of the window in which the message may be sent
    pub start_time: NaiveDateTime,

    /// End of the sending window
    pub end_time: NaiveDateTime,

    /// Recipient timezone offset, stored on disk as signed minutes
    #[serde(rename = "client_timezone_offset_minutes", with = "offset_minutes")]
    pub client_timezone_offset: TimeDelta,
}

impl Message {
    pub fn new(
        id: Uuid,
        template_code: impl Into<String>,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        client_timezone_offset: TimeDelta,
    ) -> Self {
        Self {
            id,
            template_code: template_code.into(),
            start_time,
            end_time,
            client_timezone_offset,
        }
    }

    /// Create a message whose offset is a whole number of hours.
    pub fn with_offset_hours(
        id: Uuid,
        template_code: impl Into<String>,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        offset_hours: i64,
    ) -> Self {
        Self::new(id, template_code, start_time, end_time, TimeDelta::hours(offset_hours))
    }

    /// Sort key shared by the uniform strategy and the tier merge:
    /// earlier start first, then earlier end.
    pub fn window_key(&self) -> (NaiveDateTime, NaiveDateTime) {
        (self.start_time, self.end_time)
    }
}

mod offset_minutes {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(offset: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(offset.num_minutes())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let minutes = i64::deserialize(deserializer)?;
        TimeDelta::try_minutes(minutes).ok_or_else(|| serde::de::Error::custom("timezone offset out of range"))
    }
}
