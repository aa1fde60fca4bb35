use async_trait::async_trait;
use chrono::NaiveDate;
use log::info;
use serde_json::{Value, json};

use cardiomed_backend::{
    AppointmentDraft, Credentials, DataService, ExamKind, Record, RecordId, ServiceError,
    VersionRequirement,
};

use crate::client::RpcClient;

/// Data service reached over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteDataService {
    rpc: RpcClient,
}

impl RemoteDataService {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            rpc: RpcClient::new(client, endpoint).with_token(token),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.rpc.endpoint()
    }

    async fn records(
        &self,
        operation: &'static str,
        params: Value,
    ) -> Result<Vec<Record>, ServiceError> {
        let value = self.rpc.call(operation, params).await?;
        records_from(operation, value)
    }

    async fn optional_record(
        &self,
        operation: &'static str,
        params: Value,
    ) -> Result<Option<Record>, ServiceError> {
        let value = self.rpc.call(operation, params).await?;
        optional_record_from(value)
    }

    async fn created_id(
        &self,
        operation: &'static str,
        params: Value,
    ) -> Result<RecordId, ServiceError> {
        let value = self.rpc.call(operation, params).await?;
        record_id_from(operation, &value)
    }

    async fn unit(&self, operation: &'static str, params: Value) -> Result<(), ServiceError> {
        self.rpc.call(operation, params).await.map(|_| ())
    }
}

fn records_from(operation: &'static str, value: Value) -> Result<Vec<Record>, ServiceError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(rows) => rows.into_iter().map(Record::from_value).collect(),
        other => Err(ServiceError::malformed(
            "response",
            format!("{operation} returned {other} instead of a list"),
        )),
    }
}

fn optional_record_from(value: Value) -> Result<Option<Record>, ServiceError> {
    match value {
        Value::Null => Ok(None),
        other => Record::from_value(other).map(Some),
    }
}

/// Inserts answer with a bare id or an object carrying `id`/`insertId`.
fn record_id_from(operation: &'static str, value: &Value) -> Result<RecordId, ServiceError> {
    let id = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(map) => map
            .get("id")
            .or_else(|| map.get("insertId"))
            .and_then(|id| record_id_from(operation, id).ok()),
        _ => None,
    };
    id.ok_or_else(|| {
        ServiceError::malformed("response", format!("{operation} returned no id: {value}"))
    })
}

fn to_params<T: serde::Serialize>(what: &'static str, value: &T) -> Result<Value, ServiceError> {
    serde_json::to_value(value).map_err(|error| ServiceError::malformed(what, error.to_string()))
}

#[async_trait]
impl DataService for RemoteDataService {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn latest_version(
        &self,
        platform: &str,
    ) -> Result<Option<VersionRequirement>, ServiceError> {
        let value = self
            .rpc
            .call("latest_version", json!({ "platform": platform }))
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|error| ServiceError::malformed("version requirement", error.to_string()))
    }

    async fn list_patients(&self) -> Result<Vec<Record>, ServiceError> {
        self.records("list_patients", json!({})).await
    }

    async fn get_patient(&self, id: RecordId) -> Result<Option<Record>, ServiceError> {
        self.optional_record("get_patient", json!({ "id": id })).await
    }

    async fn search_patients(&self, query: &str) -> Result<Vec<Record>, ServiceError> {
        self.records("search_patients", json!({ "query": query })).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<Record, ServiceError> {
        let user = self
            .optional_record("login", to_params("credentials", credentials)?)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;
        info!("Signed in as {}", credentials.username);
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<Record>, ServiceError> {
        self.records("list_users", json!({})).await
    }

    async fn create_patient(&self, patient: &Record) -> Result<RecordId, ServiceError> {
        self.created_id("create_patient", json!({ "patient": patient }))
            .await
    }

    async fn update_patient(&self, id: RecordId, patient: &Record) -> Result<(), ServiceError> {
        self.unit("update_patient", json!({ "id": id, "patient": patient }))
            .await
    }

    async fn list_consultations(&self) -> Result<Vec<Record>, ServiceError> {
        self.records("list_consultations", json!({})).await
    }

    async fn consultations_by_patient(
        &self,
        patient_db_id: RecordId,
    ) -> Result<Vec<Record>, ServiceError> {
        self.records(
            "consultations_by_patient",
            json!({ "patient_db_id": patient_db_id }),
        )
        .await
    }

    async fn consultation_details(&self, id: RecordId) -> Result<Option<Record>, ServiceError> {
        self.optional_record("consultation_details", json!({ "id": id }))
            .await
    }

    async fn create_consultation(&self, consultation: &Record) -> Result<RecordId, ServiceError> {
        self.created_id(
            "create_consultation",
            json!({ "consultation": consultation }),
        )
        .await
    }

    async fn add_standalone_exam(
        &self,
        patient_db_id: RecordId,
        kind: ExamKind,
        exam: &Record,
    ) -> Result<(), ServiceError> {
        self.unit(
            "add_standalone_exam",
            json!({ "patient_db_id": patient_db_id, "type": kind, "data": exam }),
        )
        .await
    }

    async fn list_exams(&self) -> Result<Vec<Record>, ServiceError> {
        self.records("list_exams", json!({})).await
    }

    async fn exams_by_patient(&self, patient_db_id: RecordId) -> Result<Vec<Record>, ServiceError> {
        self.records("exams_by_patient", json!({ "patient_db_id": patient_db_id }))
            .await
    }

    async fn get_exam(&self, id: RecordId) -> Result<Option<Record>, ServiceError> {
        self.optional_record("get_exam", json!({ "id": id })).await
    }

    async fn save_prescription(
        &self,
        medications: &[Record],
        consultation_id: Option<RecordId>,
    ) -> Result<(), ServiceError> {
        self.unit(
            "save_prescription",
            json!({ "medications": medications, "consultation_id": consultation_id }),
        )
        .await
    }

    async fn prescriptions_by_patient(
        &self,
        patient_db_id: RecordId,
    ) -> Result<Vec<Record>, ServiceError> {
        self.records(
            "prescriptions_by_patient",
            json!({ "patient_db_id": patient_db_id }),
        )
        .await
    }

    async fn list_templates(&self) -> Result<Vec<Record>, ServiceError> {
        self.records("list_templates", json!({})).await
    }

    async fn save_template(
        &self,
        label: &str,
        medications: &[Record],
    ) -> Result<RecordId, ServiceError> {
        self.created_id(
            "save_template",
            json!({ "label": label, "medications": medications }),
        )
        .await
    }

    async fn delete_template(&self, id: RecordId) -> Result<(), ServiceError> {
        self.unit("delete_template", json!({ "id": id })).await
    }

    async fn list_appointments(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Record>, ServiceError> {
        let date = date.map(|date| date.format("%Y-%m-%d").to_string());
        self.records("list_appointments", json!({ "date": date }))
            .await
    }

    async fn get_appointment(&self, id: RecordId) -> Result<Option<Record>, ServiceError> {
        self.optional_record("get_appointment", json!({ "id": id }))
            .await
    }

    async fn create_appointment(
        &self,
        appointment: &AppointmentDraft,
    ) -> Result<RecordId, ServiceError> {
        let params = to_params("appointment", appointment)?;
        self.created_id("create_appointment", params).await
    }

    async fn update_appointment_status(
        &self,
        id: RecordId,
        status: &str,
    ) -> Result<(), ServiceError> {
        self.unit(
            "update_appointment_status",
            json!({ "id": id, "status": status }),
        )
        .await
    }

    async fn system_settings(&self) -> Result<Record, ServiceError> {
        let value = self.rpc.call("system_settings", json!({})).await?;
        optional_record_from(value).map(Option::unwrap_or_default)
    }

    async fn update_system_setting(&self, key: &str, value: &str) -> Result<(), ServiceError> {
        self.unit(
            "update_system_setting",
            json!({ "key": key, "value": value }),
        )
        .await
    }

    async fn version_requirements(&self) -> Result<Vec<VersionRequirement>, ServiceError> {
        let value = self.rpc.call("version_requirements", json!({})).await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(value)
            .map_err(|error| ServiceError::malformed("version requirements", error.to_string()))
    }

    async fn add_version_requirement(
        &self,
        requirement: &VersionRequirement,
    ) -> Result<(), ServiceError> {
        let params = to_params("version requirement", requirement)?;
        self.unit("add_version_requirement", params).await
    }
}
