use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::ServiceError;

pub type RecordId = i64;

/// Platform value of a version requirement that applies to every platform.
pub const PLATFORM_WILDCARD: &str = "all";

/// A row handed over by the data service.
///
/// Patients, consultations, exams, prescriptions and appointments are not
/// interpreted by the client beyond picking fields for display, so they stay
/// as JSON objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value returned by the data service.
    ///
    /// # Errors
    /// Returns [`ServiceError::Malformed`] when the value is not an object.
    pub fn from_value(value: Value) -> Result<Self, ServiceError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ServiceError::malformed(
                "record",
                format!("expected object, got {}", json_kind(&other)),
            )),
        }
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Numeric `id` of the row. MySQL drivers sometimes hand ids over as
    /// strings, so both forms are accepted.
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        match self.0.get("id")? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Render a field for a table cell: strings verbatim, scalars via their
    /// JSON form, and `-` for null or missing values.
    #[must_use]
    pub fn display_field(&self, key: &str) -> String {
        match self.0.get(key) {
            None | Some(Value::Null) => "-".to_string(),
            Some(Value::String(s)) if s.is_empty() => "-".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Case-insensitive substring match over the given string fields.
    #[must_use]
    pub fn matches_query(&self, keys: &[&str], query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        keys.iter()
            .filter_map(|key| self.str_field(key))
            .any(|value| value.to_lowercase().contains(&needle))
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Minimum app version the clinic requires on a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub platform: String,
    pub version: String,
    #[serde(default, rename = "value", alias = "notes")]
    pub release_notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub priority: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl VersionRequirement {
    #[must_use]
    pub fn new(platform: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: None,
            platform: platform.into(),
            version: version.into(),
            release_notes: None,
            priority: false,
            created_at: None,
        }
    }

    #[must_use]
    pub fn applies_to(&self, platform: &str) -> bool {
        let own = self.platform.trim();
        own.eq_ignore_ascii_case(PLATFORM_WILDCARD) || own.eq_ignore_ascii_case(platform.trim())
    }

    /// A requirement without a version string imposes nothing.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.version.trim().is_empty()
    }

    /// Release notes with blank text folded into `None`.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.release_notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
    }

    /// Pick the newest requirement that applies to `platform`. Rows are
    /// ordered by creation time, then id, then their position in the input.
    ///
    /// This is the rule a `latest_version` lookup follows; in-process
    /// [`crate::DataService`] implementations can answer with it directly.
    pub fn latest_for<'a, I>(requirements: I, platform: &str) -> Option<&'a Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        requirements
            .into_iter()
            .filter(|requirement| requirement.applies_to(platform))
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then(a.id.cmp(&b.id))
            })
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(flag)) => flag,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true" | "TRUE" | "True"),
        _ => false,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamKind {
    #[serde(rename = "ECG")]
    Ecg,
    #[serde(rename = "ETT")]
    Ett,
}

impl ExamKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ecg => "ECG",
            Self::Ett => "ETT",
        }
    }
}

impl fmt::Display for ExamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentDraft {
    pub patient_db_id: RecordId,
    #[serde(default)]
    pub doctor_db_id: Option<RecordId>,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub posted_by: Option<String>,
    #[serde(default)]
    pub created_by_role: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn record_from_value_rejects_non_objects() {
        let error = Record::from_value(json!([1, 2])).expect_err("array is not a record");
        assert_eq!(error.to_string(), "Malformed record: expected object, got array");
    }

    #[test]
    fn record_id_accepts_numeric_strings() {
        let numeric = Record::new().with("id", 7);
        let stringly = Record::new().with("id", " 12 ");
        let missing = Record::new().with("full_name", "Jane");

        assert_eq!(numeric.id(), Some(7));
        assert_eq!(stringly.id(), Some(12));
        assert_eq!(missing.id(), None);
    }

    #[test]
    fn display_field_maps_missing_and_scalar_values() {
        let record = Record::new()
            .with("full_name", "Jane Doe")
            .with("weight", 72.5)
            .with("consent", true)
            .with("email", Value::Null)
            .with("phone", "");

        assert_eq!(record.display_field("full_name"), "Jane Doe");
        assert_eq!(record.display_field("weight"), "72.5");
        assert_eq!(record.display_field("consent"), "true");
        assert_eq!(record.display_field("email"), "-");
        assert_eq!(record.display_field("phone"), "-");
        assert_eq!(record.display_field("address"), "-");
    }

    #[test]
    fn matches_query_is_case_insensitive() {
        let record = Record::new()
            .with("full_name", "Jeanne Mballa")
            .with("patient_id", "PAT-0042");

        assert!(record.matches_query(&["full_name", "patient_id"], "mBALLa"));
        assert!(record.matches_query(&["full_name", "patient_id"], "0042"));
        assert!(!record.matches_query(&["full_name"], "0042"));
        assert!(record.matches_query(&["full_name"], "  "));
    }

    #[test]
    fn version_requirement_deserializes_database_row() {
        let row = json!({
            "id": 3,
            "platform": "windows",
            "version": "1.4.0",
            "value": "Fixes prescription printing",
            "priority": 1,
            "created_at": "2025-02-01 09:30:00"
        });

        let requirement: VersionRequirement =
            serde_json::from_value(row).expect("row should deserialize");

        assert_eq!(requirement.id, Some(3));
        assert!(requirement.priority);
        assert_eq!(requirement.notes(), Some("Fixes prescription printing"));
        assert!(requirement.applies_to("Windows"));
        assert!(!requirement.applies_to("linux"));
    }

    #[test]
    fn version_requirement_priority_defaults_to_false() {
        let requirement: VersionRequirement =
            serde_json::from_value(json!({ "platform": "all", "version": "0.1.0", "priority": null }))
                .expect("row should deserialize");

        assert!(!requirement.priority);
        assert!(requirement.applies_to("macos"));
        assert_eq!(requirement.notes(), None);
    }

    #[test]
    fn latest_for_prefers_newest_applicable_row() {
        let mut all = VersionRequirement::new("all", "0.1.0");
        all.id = Some(1);
        all.created_at = Some("2025-01-01 00:00:00".to_string());
        let mut linux = VersionRequirement::new("linux", "0.3.0");
        linux.id = Some(2);
        linux.created_at = Some("2025-03-01 00:00:00".to_string());
        let mut windows = VersionRequirement::new("windows", "0.9.0");
        windows.id = Some(3);
        windows.created_at = Some("2025-06-01 00:00:00".to_string());
        let rows = vec![all, linux, windows];

        let latest = VersionRequirement::latest_for(&rows, "linux").expect("linux row applies");
        assert_eq!(latest.version, "0.3.0");

        let latest = VersionRequirement::latest_for(&rows, "macos").expect("wildcard applies");
        assert_eq!(latest.version, "0.1.0");

        assert!(VersionRequirement::latest_for(&rows[1..2], "macos").is_none());
    }

    #[test]
    fn blank_requirement_is_detected() {
        assert!(VersionRequirement::new("all", "  ").is_blank());
        assert!(!VersionRequirement::new("all", "1.0").is_blank());
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let credentials = Credentials {
            username: "admin".to_string(),
            password: "hunter2".to_string(),
        };

        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn appointment_draft_uses_wire_field_names() {
        let draft = AppointmentDraft {
            patient_db_id: 5,
            doctor_db_id: None,
            appointment_date: NaiveDate::from_ymd_opt(2025, 4, 12).expect("valid date"),
            appointment_time: NaiveTime::from_hms_opt(9, 30, 0).expect("valid time"),
            kind: "Consultation".to_string(),
            notes: None,
            posted_by: Some("Hospital".to_string()),
            created_by_role: None,
        };

        let value = serde_json::to_value(&draft).expect("draft should serialize");
        assert_eq!(value["type"], "Consultation");
        assert_eq!(value["appointment_date"], "2025-04-12");
        assert_eq!(value["appointment_time"], "09:30:00");
        assert_eq!(ExamKind::Ett.to_string(), "ETT");
    }
}
