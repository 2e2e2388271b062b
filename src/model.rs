use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a task. Survives deletion, restoration, and reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "timestamp")]
    pub added_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub reminder: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reminder_notified: bool,
    /// Only present while the task sits in the deleted collection.
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(text: &str, added_at: DateTime<Utc>, reminder: Option<DateTime<Utc>>) -> Self {
        Self {
            id: TaskId::new(),
            text: text.to_string(),
            completed: false,
            added_at,
            completed_at: None,
            reminder,
            reminder_notified: false,
            deleted_at: None,
        }
    }

    /// True when the reminder should fire at `now`: set, not yet fired, task still pending.
    pub fn reminder_due(&self, now: DateTime<Utc>) -> bool {
        match self.reminder {
            Some(at) => !self.completed && !self.reminder_notified && at <= now,
            None => false,
        }
    }

    /// Returns display icon: x=completed, !=reminder pending, .=open
    pub fn icon(&self) -> &'static str {
        if self.completed {
            "x"
        } else if self.reminder.is_some() && !self.reminder_notified {
            "!"
        } else {
            "."
        }
    }
}

/// Timestamps are written as RFC 3339 in UTC and read back from either
/// RFC 3339 strings or epoch milliseconds.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Millis(i64),
    }

    fn convert<E: de::Error>(raw: Raw) -> Result<DateTime<Utc>, E> {
        match raw {
            Raw::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| E::custom(format!("invalid timestamp '{s}': {e}"))),
            Raw::Millis(ms) => Utc
                .timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| E::custom(format!("timestamp {ms} is out of range"))),
        }
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        convert(Raw::deserialize(d)?)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<Raw>::deserialize(d)?
                .map(convert::<D::Error>)
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn serializes_camel_case_and_omits_deleted_at() {
        let task = Task::new("buy milk", at(0), Some(at(60)));
        let value = serde_json::to_value(&task).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj["text"], "buy milk");
        assert_eq!(obj["completed"], false);
        assert!(obj["completedAt"].is_null());
        assert_eq!(obj["reminderNotified"], false);
        assert!(obj["addedAt"].as_str().unwrap().ends_with('Z'));
        assert!(!obj.contains_key("deletedAt"));
    }

    #[test]
    fn deleted_at_is_written_when_present() {
        let mut task = Task::new("t", at(0), None);
        task.deleted_at = Some(at(5));
        let value = serde_json::to_value(&task).unwrap();
        assert!(value.get("deletedAt").unwrap().is_string());
    }

    #[test]
    fn reads_legacy_records_without_id_or_flags() {
        let json = r#"{
            "text": "call mom",
            "completed": false,
            "addedAt": "2024-03-01T10:15:00.000Z",
            "completedAt": null,
            "reminder": "2024-03-01T11:00:00.000Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.text, "call mom");
        assert!(!task.reminder_notified);
        assert!(task.deleted_at.is_none());
        assert_eq!(
            task.reminder,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap())
        );
    }

    #[test]
    fn reads_epoch_millis() {
        let json = r#"{"text": "t", "addedAt": 1700000000000, "deletedAt": 1700000005000}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.added_at, at(0));
        assert_eq!(task.deleted_at, Some(at(5)));
        assert!(!task.completed);
    }

    #[test]
    fn rejects_garbage_timestamp() {
        let json = r#"{"text": "t", "addedAt": "yesterday-ish"}"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn sub_second_precision_survives() {
        let task = Task::new("t", Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap(), None);
        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn reminder_due_rules() {
        let mut task = Task::new("t", at(0), Some(at(10)));
        assert!(!task.reminder_due(at(9)));
        assert!(task.reminder_due(at(10)));
        task.reminder_notified = true;
        assert!(!task.reminder_due(at(20)));

        let mut done = Task::new("t", at(0), Some(at(10)));
        done.completed = true;
        assert!(!done.reminder_due(at(20)));

        assert!(!Task::new("t", at(0), None).reminder_due(at(20)));
    }
}
