use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::ApiError;

/// One row of the robot listing.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Robot {
    pub robot_id: String,
    #[serde(default)]
    pub robot_name: String,
    #[serde(default)]
    pub serial_number: u32,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pagination {
    #[serde(default)]
    pub total: u64,
    #[serde(rename = "totalPages", default)]
    pub total_pages: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Statistics {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub enabled: u64,
    #[serde(default)]
    pub disabled: u64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RobotPage {
    #[serde(default)]
    pub data: Vec<Robot>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub statistics: Option<Statistics>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewRobot {
    pub robot_name: String,
    pub serial_number: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchRobot {
    pub robot_name: String,
    pub serial_number: u32,
    pub enabled: bool,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct BatchAddBody<'a> {
    pub robots: &'a [BatchRobot],
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct BatchDeleteBody<'a> {
    pub robot_ids: &'a [String],
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct StatusBody {
    pub enabled: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScheduleParams {
    pub schedule_id: u8,
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub run_count: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AlarmValues {
    #[serde(default)]
    pub alarm_fa: u32,
    #[serde(default)]
    pub alarm_fb: u32,
    #[serde(default)]
    pub alarm_fc: u32,
    #[serde(default)]
    pub alarm_fd: u32,
}

/// Bodies that carry `success` and, on failure, `error`.
pub trait Envelope: Sized {
    fn succeeded(&self) -> bool;
    fn error_text(&self) -> Option<&str>;

    fn ensure_success(self) -> Result<Self, ApiError> {
        if self.succeeded() {
            return Ok(self);
        }
        let message = self
            .error_text()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or("request rejected without an error message")
            .to_string();
        warn!(%message, "backend rejected request");
        Err(ApiError::Rejected { message })
    }
}

macro_rules! impl_envelope {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Envelope for $ty {
                fn succeeded(&self) -> bool {
                    self.success
                }

                fn error_text(&self) -> Option<&str> {
                    self.error.as_deref()
                }
            }
        )*
    };
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct BatchAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CommandAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub robot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ScheduleAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub robot_id: Option<String>,
    #[serde(default)]
    pub schedule_id: Option<u8>,
    #[serde(default)]
    pub weekday: Option<u8>,
    #[serde(default)]
    pub hour: Option<u8>,
    #[serde(default)]
    pub minute: Option<u8>,
    #[serde(default)]
    pub run_count: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AlarmState {
    #[serde(default)]
    pub success: bool,
    #[serde(flatten)]
    pub values: AlarmValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl_envelope!(Ack, BatchAck, CommandAck, ScheduleAck, AlarmState);

/// Last reported state of one robot. `last_data` is backend-defined and
/// rendered without validation.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RobotSnapshot {
    #[serde(default)]
    pub robot_id: Option<String>,
    #[serde(default)]
    pub serial_number: Option<u32>,
    #[serde(default)]
    pub robot_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RobotSnapshot {
    /// Some backends ship `last_data` as a JSON-encoded string.
    pub fn normalize(mut self) -> Self {
        if let Value::String(raw) = &self.last_data {
            if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
                self.last_data = parsed;
            }
        }
        self
    }

    pub fn is_running(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("running"))
            .unwrap_or(false)
    }
}
