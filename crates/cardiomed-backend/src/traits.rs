use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::ServiceError;
use crate::types::{AppointmentDraft, Credentials, ExamKind, Record, RecordId, VersionRequirement};

const PATIENT_SEARCH_FIELDS: &[&str] = &["full_name", "patient_id", "phone", "cni"];

/// Reports facts about the running application.
#[async_trait]
pub trait PlatformBridge: Send + Sync {
    async fn app_version(&self) -> Result<String, ServiceError>;

    async fn platform(&self) -> Result<String, ServiceError>;
}

/// The database service behind the clinic UI.
///
/// Only the lookups every implementation must serve are required; the rest
/// report [`ServiceError::Unsupported`] unless overridden, which lets
/// read-only or partial services plug in.
#[async_trait]
pub trait DataService: Send + Sync {
    fn name(&self) -> &'static str;

    /// Newest version requirement that applies to `platform` (or to every
    /// platform), if any.
    async fn latest_version(
        &self,
        platform: &str,
    ) -> Result<Option<VersionRequirement>, ServiceError>;

    async fn list_patients(&self) -> Result<Vec<Record>, ServiceError>;

    async fn get_patient(&self, id: RecordId) -> Result<Option<Record>, ServiceError>;

    async fn search_patients(&self, query: &str) -> Result<Vec<Record>, ServiceError> {
        let all = self.list_patients().await?;
        Ok(all
            .into_iter()
            .filter(|patient| patient.matches_query(PATIENT_SEARCH_FIELDS, query))
            .collect())
    }

    async fn login(&self, _credentials: &Credentials) -> Result<Record, ServiceError> {
        Err(ServiceError::Unsupported { operation: "login" })
    }

    async fn list_users(&self) -> Result<Vec<Record>, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "list_users",
        })
    }

    async fn create_patient(&self, _patient: &Record) -> Result<RecordId, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "create_patient",
        })
    }

    async fn update_patient(&self, _id: RecordId, _patient: &Record) -> Result<(), ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "update_patient",
        })
    }

    async fn list_consultations(&self) -> Result<Vec<Record>, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "list_consultations",
        })
    }

    async fn consultations_by_patient(
        &self,
        _patient_db_id: RecordId,
    ) -> Result<Vec<Record>, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "consultations_by_patient",
        })
    }

    async fn consultation_details(&self, _id: RecordId) -> Result<Option<Record>, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "consultation_details",
        })
    }

    async fn create_consultation(&self, _consultation: &Record) -> Result<RecordId, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "create_consultation",
        })
    }

    async fn add_standalone_exam(
        &self,
        _patient_db_id: RecordId,
        _kind: ExamKind,
        _exam: &Record,
    ) -> Result<(), ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "add_standalone_exam",
        })
    }

    async fn list_exams(&self) -> Result<Vec<Record>, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "list_exams",
        })
    }

    async fn exams_by_patient(&self, _patient_db_id: RecordId) -> Result<Vec<Record>, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "exams_by_patient",
        })
    }

    async fn get_exam(&self, _id: RecordId) -> Result<Option<Record>, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "get_exam",
        })
    }

    async fn save_prescription(
        &self,
        _medications: &[Record],
        _consultation_id: Option<RecordId>,
    ) -> Result<(), ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "save_prescription",
        })
    }

    async fn prescriptions_by_patient(
        &self,
        _patient_db_id: RecordId,
    ) -> Result<Vec<Record>, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "prescriptions_by_patient",
        })
    }

    async fn list_templates(&self) -> Result<Vec<Record>, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "list_templates",
        })
    }

    async fn save_template(
        &self,
        _label: &str,
        _medications: &[Record],
    ) -> Result<RecordId, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "save_template",
        })
    }

    async fn delete_template(&self, _id: RecordId) -> Result<(), ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "delete_template",
        })
    }

    async fn list_appointments(
        &self,
        _date: Option<NaiveDate>,
    ) -> Result<Vec<Record>, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "list_appointments",
        })
    }

    async fn get_appointment(&self, _id: RecordId) -> Result<Option<Record>, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "get_appointment",
        })
    }

    async fn create_appointment(
        &self,
        _appointment: &AppointmentDraft,
    ) -> Result<RecordId, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "create_appointment",
        })
    }

    async fn update_appointment_status(
        &self,
        _id: RecordId,
        _status: &str,
    ) -> Result<(), ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "update_appointment_status",
        })
    }

    async fn system_settings(&self) -> Result<Record, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "system_settings",
        })
    }

    async fn update_system_setting(&self, _key: &str, _value: &str) -> Result<(), ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "update_system_setting",
        })
    }

    async fn version_requirements(&self) -> Result<Vec<VersionRequirement>, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "version_requirements",
        })
    }

    async fn add_version_requirement(
        &self,
        _requirement: &VersionRequirement,
    ) -> Result<(), ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "add_version_requirement",
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct MockService {
        patients: Vec<Record>,
    }

    impl MockService {
        fn new() -> Self {
            Self {
                patients: vec![
                    Record::new()
                        .with("id", 1)
                        .with("patient_id", "PAT-001")
                        .with("full_name", "Jeanne Mballa"),
                    Record::new()
                        .with("id", 2)
                        .with("patient_id", "PAT-002")
                        .with("full_name", "Paul Essomba"),
                ],
            }
        }
    }

    #[async_trait]
    impl DataService for MockService {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn latest_version(
            &self,
            _platform: &str,
        ) -> Result<Option<VersionRequirement>, ServiceError> {
            Ok(None)
        }

        async fn list_patients(&self) -> Result<Vec<Record>, ServiceError> {
            Ok(self.patients.clone())
        }

        async fn get_patient(&self, id: RecordId) -> Result<Option<Record>, ServiceError> {
            Ok(self.patients.iter().find(|p| p.id() == Some(id)).cloned())
        }
    }

    #[tokio::test]
    async fn search_patients_default_filters_by_name_and_code() {
        let service = MockService::new();

        let by_name = service
            .search_patients("essomba")
            .await
            .expect("search should succeed");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id(), Some(2));

        let by_code = service
            .search_patients("pat-00")
            .await
            .expect("search should succeed");
        assert_eq!(by_code.len(), 2);
    }

    #[tokio::test]
    async fn unimplemented_operations_report_unsupported() {
        let service = MockService::new();

        let result = service.list_appointments(None).await;

        assert!(
            matches!(
                result,
                Err(ServiceError::Unsupported {
                    operation: "list_appointments"
                })
            ),
            "expected Unsupported(list_appointments), got {result:?}"
        );
    }

    #[tokio::test]
    async fn boxed_service_is_usable_as_trait_object() {
        let boxed: Box<dyn DataService> = Box::new(MockService::new());

        let patient = boxed
            .get_patient(1)
            .await
            .expect("lookup should succeed")
            .expect("patient 1 exists");
        assert_eq!(patient.str_field("full_name"), Some("Jeanne Mballa"));
        assert_eq!(boxed.name(), "mock");
    }
}
