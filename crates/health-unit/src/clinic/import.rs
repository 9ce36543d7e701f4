//! CSV exports of appointments and visits, used by the offline report command.
//!
//! Appointment columns: `id` (optional), `patient_id`, `professional_id`,
//! `scheduled_at`, `status`. Visit columns: `id` (optional), `patient_id`,
//! `professional_id`, `visit_type`, `performed_at`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

use super::domain::{Appointment, AppointmentStatus, RecordId, Visit};

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { line: usize, message: String },
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "failed to read clinic export: {}", err),
            ImportError::Csv(err) => write!(f, "invalid clinic CSV data: {}", err),
            ImportError::Row { line, message } => write!(f, "line {}: {}", line, message),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            ImportError::Csv(err) => Some(err),
            ImportError::Row { .. } => None,
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::Io(err)
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Csv(err)
    }
}

#[derive(Debug, Deserialize)]
struct AppointmentRow {
    #[serde(default)]
    id: Option<RecordId>,
    patient_id: RecordId,
    professional_id: RecordId,
    scheduled_at: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VisitRow {
    #[serde(default)]
    id: Option<RecordId>,
    patient_id: RecordId,
    professional_id: RecordId,
    visit_type: String,
    performed_at: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
}

pub struct ClinicCsvImporter;

impl ClinicCsvImporter {
    pub fn appointments_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<Appointment>, ImportError> {
        let file = File::open(path)?;
        Self::appointments_from_reader(file)
    }

    /// Rows without an `id` are numbered by position. A blank status means pending.
    pub fn appointments_from_reader<R: Read>(reader: R) -> Result<Vec<Appointment>, ImportError> {
        let mut appointments = Vec::new();
        for (index, row) in csv_reader(reader)
            .deserialize::<AppointmentRow>()
            .enumerate()
        {
            let row = row?;
            let line = index + 2;
            let status = match row.status.as_deref() {
                None => AppointmentStatus::Pending,
                Some(raw) => AppointmentStatus::parse(raw).ok_or_else(|| ImportError::Row {
                    line,
                    message: format!("unknown appointment status '{raw}'"),
                })?,
            };

            appointments.push(Appointment {
                id: row.id.unwrap_or(index as RecordId + 1),
                patient_id: row.patient_id,
                professional_id: row.professional_id,
                scheduled_at: required_datetime(&row.scheduled_at, line)?,
                status,
            });
        }
        Ok(appointments)
    }

    pub fn visits_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Visit>, ImportError> {
        let file = File::open(path)?;
        Self::visits_from_reader(file)
    }

    pub fn visits_from_reader<R: Read>(reader: R) -> Result<Vec<Visit>, ImportError> {
        let mut visits = Vec::new();
        for (index, row) in csv_reader(reader).deserialize::<VisitRow>().enumerate() {
            let row = row?;
            let line = index + 2;
            visits.push(Visit {
                id: row.id.unwrap_or(index as RecordId + 1),
                patient_id: row.patient_id,
                professional_id: row.professional_id,
                visit_type: row.visit_type,
                performed_at: required_datetime(&row.performed_at, line)?,
                status: row.status,
                notes: None,
            });
        }
        Ok(visits)
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn required_datetime(raw: &str, line: usize) -> Result<NaiveDateTime, ImportError> {
    parse_datetime(raw).ok_or_else(|| ImportError::Row {
        line,
        message: format!("unrecognised timestamp '{raw}'"),
    })
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]`, `YYYY-MM-DDTHH:MM[:SS]` or a bare date.
pub(crate) fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_datetime_supports_common_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5)
            .and_then(|date| date.and_hms_opt(14, 30, 0))
            .expect("valid timestamp");
        assert_eq!(parse_datetime("2024-01-05 14:30:00"), Some(expected));
        assert_eq!(parse_datetime("2024-01-05T14:30"), Some(expected));
        assert_eq!(parse_datetime("2024-01-05T14:30:00-03:00"), Some(expected));
        assert_eq!(
            parse_datetime("2024-01-05").map(|dt| dt.date()),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
        assert_eq!(parse_datetime("05/01/2024"), None);
        assert_eq!(parse_datetime("  "), None);
    }

    #[test]
    fn appointments_accept_labels_and_blank_status() {
        let csv = "patient_id,professional_id,scheduled_at,status\n\
                   1,2,2024-01-05 09:00,Não Compareceu\n\
                   1,2,2024-01-06 09:00,\n\
                   3,2,2024-01-06 10:00,cancelled\n";
        let appointments =
            ClinicCsvImporter::appointments_from_reader(csv.as_bytes()).expect("csv parses");

        let statuses: Vec<AppointmentStatus> =
            appointments.iter().map(|appointment| appointment.status).collect();
        assert_eq!(
            statuses,
            vec![
                AppointmentStatus::NoShow,
                AppointmentStatus::Pending,
                AppointmentStatus::Cancelled
            ]
        );
        assert_eq!(appointments[2].id, 3);
    }

    #[test]
    fn unknown_status_reports_line() {
        let csv = "patient_id,professional_id,scheduled_at,status\n\
                   1,2,2024-01-05 09:00,Confirmado\n\
                   1,2,2024-01-06 09:00,Remarcado\n";
        match ClinicCsvImporter::appointments_from_reader(csv.as_bytes()) {
            Err(ImportError::Row { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected row error, got {other:?}"),
        }
    }

    #[test]
    fn visits_require_valid_timestamps() {
        let csv = "patient_id,professional_id,visit_type,performed_at\n1,2,Consulta,ontem\n";
        assert!(matches!(
            ClinicCsvImporter::visits_from_reader(csv.as_bytes()),
            Err(ImportError::Row { line: 2, .. })
        ));
    }

    #[test]
    fn from_path_propagates_io_errors() {
        match ClinicCsvImporter::visits_from_path("/definitely/missing/visits.csv") {
            Err(ImportError::Io(_)) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
