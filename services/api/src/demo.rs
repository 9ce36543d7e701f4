use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::Args;
use health_unit::clinic::auth::hash_password;
use health_unit::clinic::domain::{
    Appointment, AppointmentInput, AppointmentStatus, PatientInput, ProfessionalInput, QueueInput,
    Visit, VisitInput,
};
use health_unit::clinic::report::{
    build_daily_buckets, no_show_trend, ranked_counts, weekly_activity,
};
use health_unit::clinic::{
    ClinicCsvImporter, ClinicError, ClinicService, ClinicStore, FixedClock, QueuePriority,
    TokenIssuer,
};
use health_unit::config::AuthConfig;
use health_unit::error::AppError;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Appointment export (CSV)
    #[arg(long)]
    pub(crate) appointments: PathBuf,
    /// Visit export (CSV)
    #[arg(long)]
    pub(crate) visits: Option<PathBuf>,
    /// Evaluation date for the report (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct HashPasswordArgs {
    /// Plain-text password to hash
    pub(crate) password: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the demo date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let appointments = ClinicCsvImporter::appointments_from_path(&args.appointments)?;
    let visits = match &args.visits {
        Some(path) => ClinicCsvImporter::visits_from_path(path)?,
        None => Vec::new(),
    };

    for line in report_lines(today, &appointments, &visits) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn run_hash_password(args: HashPasswordArgs) -> Result<(), AppError> {
    let hash = hash_password(&args.password).map_err(ClinicError::from)?;
    println!("{hash}");
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let now = at(today, 10, 0);
    let service = ClinicService::new(
        ClinicStore::in_memory(),
        Arc::new(TokenIssuer::from_config(&AuthConfig::development())),
        Arc::new(FixedClock(now)),
    );

    seed_demo_clinic(&service, today)?;

    println!("Health unit demo ({today})");
    let stats = service.dashboard_stats()?;
    println!(
        "- {} active patients | {} appointments today | {} visits today | {:.1}% attendance",
        stats.active_patients, stats.appointments_today, stats.visits_today, stats.attendance_rate
    );
    println!("Upcoming confirmed appointments:");
    for appointment in &stats.upcoming {
        println!(
            "  - {} {} with {}",
            appointment.scheduled_at.format("%d/%m %H:%M"),
            appointment.patient_name,
            appointment.professional_name
        );
    }

    println!("Waiting queue:");
    for (position, entry) in service.waiting_queue()?.iter().enumerate() {
        println!(
            "  {}. {} [{}] since {}",
            position + 1,
            entry.patient_name.as_deref().unwrap_or("?"),
            entry.record.priority.label(),
            entry.record.entered_at.format("%H:%M")
        );
    }

    let appointments = service
        .store()
        .appointments
        .list()
        .map_err(ClinicError::from)?;
    let visits = service.store().visits.list().map_err(ClinicError::from)?;
    println!();
    for line in report_lines(today, &appointments, &visits) {
        println!("{line}");
    }
    Ok(())
}

/// Plain-text rendering of the weekly and monthly series.
pub(crate) fn report_lines(
    today: NaiveDate,
    appointments: &[Appointment],
    visits: &[Visit],
) -> Vec<String> {
    let mut lines = vec![format!("Visits, last 7 days (through {today})")];
    for bucket in build_daily_buckets(today, visits) {
        lines.push(format!("  {:<4} {}", bucket.label, bucket.count));
    }

    lines.push("Scheduled vs performed".to_string());
    for entry in weekly_activity(today, appointments, visits) {
        lines.push(format!(
            "  {:<4} {} / {}",
            entry.label, entry.scheduled, entry.performed
        ));
    }

    lines.push("No-show rate, last 6 months".to_string());
    for bucket in no_show_trend(today, appointments) {
        lines.push(format!("  {:<4} {:.1}%", bucket.label, bucket.rate));
    }

    let types = ranked_counts(visits.iter().map(|visit| visit.visit_type.clone()));
    if !types.is_empty() {
        lines.push("Visit types".to_string());
        for entry in types {
            lines.push(format!("  {} {}", entry.name, entry.value));
        }
    }
    lines
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN))
}

fn seed_demo_clinic(service: &ClinicService, today: NaiveDate) -> Result<(), ClinicError> {
    let professional = service.create_professional(ProfessionalInput {
        full_name: "Dra. Ana Ribeiro".to_string(),
        cpf: Some("987.654.321-00".to_string()),
        specialty: "Clínica Geral".to_string(),
        ..ProfessionalInput::default()
    })?;

    let mut patients = Vec::new();
    for (name, cpf) in [
        ("Maria Souza", "529.982.247-25"),
        ("João Lima", "123.456.789-09"),
        ("Carla Dias", "390.533.447-05"),
    ] {
        patients.push(service.create_patient(PatientInput {
            full_name: name.to_string(),
            cpf: Some(cpf.to_string()),
            ..PatientInput::default()
        })?);
    }

    let history = [
        (1, AppointmentStatus::Completed),
        (2, AppointmentStatus::NoShow),
        (3, AppointmentStatus::Completed),
        (5, AppointmentStatus::Cancelled),
        (6, AppointmentStatus::Completed),
    ];
    for (offset, (days_ago, status)) in history.into_iter().enumerate() {
        let patient = &patients[offset % patients.len()];
        let date = today - chrono::Duration::days(days_ago);
        service.create_appointment(AppointmentInput {
            patient_id: patient.id,
            professional_id: professional.id,
            scheduled_at: at(date, 9, 0),
            status: Some(status),
        })?;
        if status == AppointmentStatus::Completed {
            service.create_visit(VisitInput {
                patient_id: patient.id,
                professional_id: professional.id,
                visit_type: (if offset == 0 { "Retorno" } else { "Consulta" }).to_string(),
                performed_at: at(date, 9, 20),
                status: None,
                notes: None,
            })?;
        }
    }

    service.create_appointment(AppointmentInput {
        patient_id: patients[0].id,
        professional_id: professional.id,
        scheduled_at: at(today, 15, 30),
        status: Some(AppointmentStatus::Confirmed),
    })?;

    for (patient, priority) in [
        (&patients[1], QueuePriority::Normal),
        (&patients[2], QueuePriority::Urgent),
    ] {
        service.enqueue(QueueInput {
            patient_id: patient.id,
            professional_id: professional.id,
            priority,
            notification_channel: Some("SMS".to_string()),
        })?;
    }
    Ok(())
}
