use std::process::ExitCode;

use log::warn;

use cardiomed_backend::{DataService, Record, ServiceError, VersionRequirement};
use cardiomed_core::VersionTuple;
use cardiomed_platform::PlatformId;

use crate::cli::{AppointmentsCommand, PatientsCommand, VersionsCommand};
use crate::commands::Context;
use crate::error::AppError;

const PATIENT_COLUMNS: &[(&str, &str)] = &[
    ("ID", "id"),
    ("Code", "patient_id"),
    ("Name", "full_name"),
    ("Phone", "phone"),
];

const APPOINTMENT_COLUMNS: &[(&str, &str)] = &[
    ("ID", "id"),
    ("Date", "appointment_date"),
    ("Time", "appointment_time"),
    ("Patient", "patient_name"),
    ("Type", "type"),
    ("Status", "status"),
];

pub async fn patients(ctx: &Context, command: PatientsCommand) -> Result<ExitCode, AppError> {
    let service = ctx.data_service();
    match command {
        PatientsCommand::List => {
            let rows = service
                .list_patients()
                .await
                .map_err(|error| AppError::operation_failed("List patients", error))?;
            print_records(PATIENT_COLUMNS, &rows, "No patients found.");
        }
        PatientsCommand::Search { query } => {
            let rows = service
                .search_patients(&query)
                .await
                .map_err(|error| AppError::operation_failed("Search patients", error))?;
            print_records(PATIENT_COLUMNS, &rows, "No matching patients.");
        }
        PatientsCommand::Show { id } => {
            let patient = service
                .get_patient(id)
                .await
                .map_err(|error| AppError::operation_failed("Load patient", error))?
                .ok_or_else(|| AppError::not_found("Patient", id))?;
            for (key, _) in patient.fields() {
                println!("{key:>20}: {}", patient.display_field(key));
            }

            if let Some(consultations) =
                optional_list(service.consultations_by_patient(id).await, "consultations")?
            {
                println!("\nConsultations ({}):", consultations.len());
                print_records(
                    &[("Date", "consultation_date"), ("Reason", "reason")],
                    &consultations,
                    "  none",
                );
            }
            if let Some(exams) = optional_list(service.exams_by_patient(id).await, "exams")? {
                println!("\nExams ({}):", exams.len());
                print_records(&[("Date", "created_at"), ("Type", "type")], &exams, "  none");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Services that do not serve a list yet should not break the patient view.
fn optional_list(
    result: Result<Vec<Record>, ServiceError>,
    what: &'static str,
) -> Result<Option<Vec<Record>>, AppError> {
    match result {
        Ok(rows) => Ok(Some(rows)),
        Err(ServiceError::Unsupported { operation }) => {
            warn!("Skipping {what}: {operation} not supported");
            Ok(None)
        }
        Err(error) => Err(AppError::operation_failed("Load patient history", error)),
    }
}

pub async fn appointments(
    ctx: &Context,
    command: AppointmentsCommand,
) -> Result<ExitCode, AppError> {
    let service = ctx.data_service();
    match command {
        AppointmentsCommand::List { date } => {
            let rows = service
                .list_appointments(date)
                .await
                .map_err(|error| AppError::operation_failed("List appointments", error))?;
            print_records(APPOINTMENT_COLUMNS, &rows, "No appointments.");
        }
        AppointmentsCommand::SetStatus { id, status } => {
            service
                .update_appointment_status(id, &status)
                .await
                .map_err(|error| AppError::operation_failed("Update appointment", error))?;
            println!("Appointment {id} is now {status}.");
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn versions(ctx: &Context, command: VersionsCommand) -> Result<ExitCode, AppError> {
    let service = ctx.data_service();
    match command {
        VersionsCommand::List { platform } => {
            let requirements = service
                .version_requirements()
                .await
                .map_err(|error| AppError::operation_failed("List versions", error))?;
            let platform = platform.unwrap_or_else(PlatformId::current);
            print!("{}", render_requirements(&requirements, platform.as_str()));
        }
        VersionsCommand::Publish {
            platform,
            version,
            notes,
            priority,
        } => {
            let parsed: VersionTuple = version
                .parse()
                .map_err(|error| AppError::invalid_input("version", error))?;
            let mut requirement = VersionRequirement::new(platform.trim(), parsed.to_string());
            requirement.release_notes = notes;
            requirement.priority = priority;

            service
                .add_version_requirement(&requirement)
                .await
                .map_err(|error| AppError::operation_failed("Publish version", error))?;
            println!(
                "Published {} for {} ({}).",
                requirement.version,
                requirement.platform,
                if priority { "priority" } else { "optional" }
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// One line per requirement; `*` marks the row the version gate applies on
/// `platform`.
fn render_requirements(requirements: &[VersionRequirement], platform: &str) -> String {
    if requirements.is_empty() {
        return "No version requirements published.\n".to_string();
    }
    let in_force = VersionRequirement::latest_for(requirements, platform);

    let mut out = String::new();
    for requirement in requirements {
        let marker = if in_force.is_some_and(|chosen| std::ptr::eq(chosen, requirement)) {
            '*'
        } else {
            ' '
        };
        let line = format!(
            "{marker} {:<8} {:<10} {:<9} {}  {}",
            requirement.platform,
            requirement.version,
            if requirement.priority { "priority" } else { "optional" },
            requirement.created_at.as_deref().unwrap_or("-"),
            requirement.notes().unwrap_or("")
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn print_records(columns: &[(&str, &str)], rows: &[Record], empty: &str) {
    if rows.is_empty() {
        println!("{empty}");
        return;
    }
    print!("{}", render_table(columns, rows));
}

fn render_table(columns: &[(&str, &str)], rows: &[Record]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|(_, key)| row.display_field(key)).collect())
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(idx, (header, _))| {
            cells
                .iter()
                .map(|row| row[idx].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let headers = columns.iter().map(|(header, _)| (*header).to_string());
    for line in std::iter::once(headers.collect::<Vec<_>>()).chain(cells) {
        let padded: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published(id: i64, platform: &str, version: &str, created_at: &str) -> VersionRequirement {
        let mut requirement = VersionRequirement::new(platform, version);
        requirement.id = Some(id);
        requirement.created_at = Some(created_at.to_string());
        requirement
    }

    #[test]
    fn requirement_list_marks_the_row_in_force() {
        let mut linux = published(2, "linux", "1.4.0", "2025-03-01");
        linux.priority = true;
        let rows = vec![
            published(1, "all", "1.2.0", "2025-01-01"),
            linux,
            published(3, "windows", "1.5.0", "2025-06-01"),
        ];

        assert_eq!(
            render_requirements(&rows, "linux"),
            "  all      1.2.0      optional  2025-01-01\n\
             * linux    1.4.0      priority  2025-03-01\n\
             \x20 windows  1.5.0      optional  2025-06-01\n"
        );

        let macos = render_requirements(&rows, "macos");
        assert!(macos.starts_with("* all"));
        assert_eq!(macos.matches('*').count(), 1);
    }

    #[test]
    fn empty_requirement_list_says_so() {
        assert_eq!(
            render_requirements(&[], "linux"),
            "No version requirements published.\n"
        );
    }

    #[test]
    fn table_pads_columns_and_fills_missing_fields() {
        let rows = vec![
            Record::new()
                .with("id", 1)
                .with("patient_id", "PAT-001")
                .with("full_name", "Jeanne Mballa"),
            Record::new()
                .with("id", 12)
                .with("patient_id", "PAT-012")
                .with("full_name", "Paul Essomba")
                .with("phone", "699000111"),
        ];

        let table = render_table(PATIENT_COLUMNS, &rows);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "ID  Code     Name           Phone");
        assert_eq!(lines[1], "1   PAT-001  Jeanne Mballa  -");
        assert_eq!(lines[2], "12  PAT-012  Paul Essomba   699000111");
    }

    #[test]
    fn unsupported_history_is_skipped() {
        let result = optional_list(
            Err(ServiceError::Unsupported {
                operation: "exams_by_patient",
            }),
            "exams",
        );
        assert_eq!(result, Ok(None));

        let failure = optional_list(
            Err(ServiceError::transport("exams_by_patient", "offline")),
            "exams",
        );
        assert!(failure.is_err());
    }
}
