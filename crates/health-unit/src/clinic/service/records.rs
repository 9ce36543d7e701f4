use tracing::{debug, info};

use super::{
    conflict_as, newest_first, optional_text, remove_or_missing, required_text, CertificateDetail,
    ClinicError, ClinicService, PartyView, PatientChart,
};
use crate::clinic::auth::hash_password;
use crate::clinic::domain::{
    Appointment, AppointmentInput, CertificateInput, ClinicalNote, ClinicalNoteInput,
    InstructionInput, MedicalCertificate, Patient, PatientInput, PostVisitInstruction,
    Professional, ProfessionalInput, RecordId, SchedulePreference, SchedulePreferenceInput, User,
    UserInput, Visit, VisitInput,
};
use crate::clinic::validation::{is_valid_email, is_valid_tax_id, normalize_tax_id};

const DUPLICATE_CPF: &str = "Este CPF já está cadastrado no sistema.";
const DUPLICATE_USERNAME: &str = "Este nome de usuário já está em uso.";
const INVALID_CPF: &str = "O CPF fornecido é inválido.";
const INVALID_EMAIL: &str = "O formato do e-mail fornecido é inválido.";

fn checked_tax_id(raw: Option<&str>, missing: &str) -> Result<String, ClinicError> {
    let cpf = raw
        .map(str::trim)
        .filter(|cpf| !cpf.is_empty())
        .ok_or_else(|| ClinicError::Validation(missing.to_string()))?;
    if is_valid_tax_id(cpf) {
        Ok(cpf.to_string())
    } else {
        Err(ClinicError::Validation(INVALID_CPF.to_string()))
    }
}

fn checked_email(raw: Option<String>) -> Result<Option<String>, ClinicError> {
    match optional_text(raw) {
        Some(email) if !is_valid_email(&email) => {
            Err(ClinicError::Validation(INVALID_EMAIL.to_string()))
        }
        email => Ok(email),
    }
}

/// The CPF is fixed at registration; a differing value on update is rejected.
fn unchanged_tax_id(stored: &str, submitted: Option<&str>) -> Result<(), ClinicError> {
    match submitted.map(normalize_tax_id) {
        Some(digits) if !digits.is_empty() && digits != normalize_tax_id(stored) => Err(
            ClinicError::Validation("O CPF não pode ser alterado.".to_string()),
        ),
        _ => Ok(()),
    }
}

impl ClinicService {
    pub fn create_patient(&self, input: PatientInput) -> Result<Patient, ClinicError> {
        const MISSING: &str = "Nome completo e CPF são obrigatórios.";
        let full_name = required_text(&input.full_name, MISSING)?;
        let cpf = checked_tax_id(input.cpf.as_deref(), MISSING)?;
        let email = checked_email(input.email)?;

        let patient = self
            .store
            .patients
            .insert(Patient {
                id: 0,
                full_name,
                cpf,
                birth_date: input.birth_date,
                sex: optional_text(input.sex),
                phone: optional_text(input.phone),
                email,
                insurance: optional_text(input.insurance),
                status: input.status.unwrap_or_default(),
            })
            .map_err(conflict_as(DUPLICATE_CPF))?;

        info!(patient_id = patient.id, "patient registered");
        Ok(patient)
    }

    pub fn list_patients(&self) -> Result<Vec<Patient>, ClinicError> {
        let mut patients = self.store.patients.list()?;
        patients.sort_by(|left, right| left.full_name.cmp(&right.full_name));
        debug!(count = patients.len(), "listed patients");
        Ok(patients)
    }

    pub fn update_patient(&self, id: RecordId, input: PatientInput) -> Result<(), ClinicError> {
        let existing = self.patient(id)?;
        unchanged_tax_id(&existing.cpf, input.cpf.as_deref())?;
        let email = checked_email(input.email)?;

        self.store.patients.update(Patient {
            id,
            full_name: required_text(&input.full_name, "Nome completo é obrigatório.")?,
            cpf: existing.cpf,
            birth_date: input.birth_date,
            sex: optional_text(input.sex),
            phone: optional_text(input.phone),
            email,
            insurance: optional_text(input.insurance),
            status: input.status.unwrap_or_default(),
        })?;

        info!(patient_id = id, "patient updated");
        Ok(())
    }

    pub fn delete_patient(&self, id: RecordId) -> Result<(), ClinicError> {
        let _links = self.store.link_guard()?;
        if self.patient_is_referenced(id)? {
            return Err(ClinicError::Conflict(
                "Não é possível excluir. O paciente possui registros vinculados.".to_string(),
            ));
        }
        remove_or_missing(&*self.store.patients, id, "Paciente não encontrado")?;
        info!(patient_id = id, "patient deleted");
        Ok(())
    }

    fn patient_is_referenced(&self, id: RecordId) -> Result<bool, ClinicError> {
        let store = &self.store;
        Ok(store.appointments.list()?.iter().any(|row| row.patient_id == id)
            || store.visits.list()?.iter().any(|row| row.patient_id == id)
            || store.clinical_notes.list()?.iter().any(|row| row.patient_id == id)
            || store.certificates.list()?.iter().any(|row| row.patient_id == id)
            || store.instructions.list()?.iter().any(|row| row.patient_id == id)
            || store
                .schedule_preferences
                .list()?
                .iter()
                .any(|row| row.patient_id == id)
            || store.queue.list()?.iter().any(|row| row.patient_id == id)
            || store
                .inter_unit_accesses
                .list()?
                .iter()
                .any(|row| row.patient_id == id))
    }

    /// The patient with visits, clinical notes and certificates, newest first.
    pub fn patient_chart(&self, id: RecordId) -> Result<PatientChart, ClinicError> {
        let patient = self.patient(id)?;
        let directory = self.directory()?;

        let mut visits: Vec<Visit> = self
            .store
            .visits
            .list()?
            .into_iter()
            .filter(|visit| visit.patient_id == id)
            .collect();
        newest_first(&mut visits, |visit| (visit.performed_at, visit.id));

        let mut notes: Vec<ClinicalNote> = self
            .store
            .clinical_notes
            .list()?
            .into_iter()
            .filter(|note| note.patient_id == id)
            .collect();
        newest_first(&mut notes, |note| (note.recorded_at, note.id));

        let mut certificates: Vec<MedicalCertificate> = self
            .store
            .certificates
            .list()?
            .into_iter()
            .filter(|certificate| certificate.patient_id == id)
            .collect();
        newest_first(&mut certificates, |certificate| {
            (certificate.issued_at, certificate.id)
        });

        Ok(PatientChart {
            patient,
            visits: visits
                .into_iter()
                .map(|visit| {
                    let professional_id = visit.professional_id;
                    directory.view(visit, None, Some(professional_id))
                })
                .collect(),
            clinical_notes: notes
                .into_iter()
                .map(|note| {
                    let professional_id = note.professional_id;
                    directory.view(note, None, Some(professional_id))
                })
                .collect(),
            certificates: certificates
                .into_iter()
                .map(|certificate| {
                    let professional_id = certificate.professional_id;
                    directory.view(certificate, None, Some(professional_id))
                })
                .collect(),
        })
    }

    pub fn create_professional(
        &self,
        input: ProfessionalInput,
    ) -> Result<Professional, ClinicError> {
        const MISSING: &str = "Nome, CPF e Especialidade são obrigatórios.";
        let full_name = required_text(&input.full_name, MISSING)?;
        let specialty = required_text(&input.specialty, MISSING)?;
        let cpf = checked_tax_id(input.cpf.as_deref(), MISSING)?;
        let email = checked_email(input.email)?;

        let professional = self
            .store
            .professionals
            .insert(Professional {
                id: 0,
                full_name,
                cpf,
                specialty,
                email,
                phone: optional_text(input.phone),
                status: input.status.unwrap_or_default(),
            })
            .map_err(conflict_as(DUPLICATE_CPF))?;

        info!(professional_id = professional.id, "professional registered");
        Ok(professional)
    }

    pub fn list_professionals(&self) -> Result<Vec<Professional>, ClinicError> {
        let mut professionals = self.store.professionals.list()?;
        professionals.sort_by(|left, right| left.full_name.cmp(&right.full_name));
        Ok(professionals)
    }

    pub fn update_professional(
        &self,
        id: RecordId,
        input: ProfessionalInput,
    ) -> Result<(), ClinicError> {
        let existing = self
            .store
            .professionals
            .fetch(id)?
            .ok_or_else(|| ClinicError::NotFound("Profissional não encontrado".to_string()))?;
        unchanged_tax_id(&existing.cpf, input.cpf.as_deref())?;
        let email = checked_email(input.email)?;

        self.store.professionals.update(Professional {
            id,
            full_name: required_text(&input.full_name, "Nome é obrigatório.")?,
            cpf: existing.cpf,
            specialty: required_text(&input.specialty, "Especialidade é obrigatória.")?,
            email,
            phone: optional_text(input.phone),
            status: input.status.unwrap_or_default(),
        })?;

        info!(professional_id = id, "professional updated");
        Ok(())
    }

    pub fn delete_professional(&self, id: RecordId) -> Result<(), ClinicError> {
        let _links = self.store.link_guard()?;
        if self.professional_is_referenced(id)? {
            return Err(ClinicError::Conflict(
                "Não é possível excluir. O profissional possui registros vinculados.".to_string(),
            ));
        }
        remove_or_missing(&*self.store.professionals, id, "Profissional não encontrado")?;
        info!(professional_id = id, "professional deleted");
        Ok(())
    }

    fn professional_is_referenced(&self, id: RecordId) -> Result<bool, ClinicError> {
        let store = &self.store;
        Ok(store
            .appointments
            .list()?
            .iter()
            .any(|row| row.professional_id == id)
            || store.visits.list()?.iter().any(|row| row.professional_id == id)
            || store
                .clinical_notes
                .list()?
                .iter()
                .any(|row| row.professional_id == id)
            || store
                .certificates
                .list()?
                .iter()
                .any(|row| row.professional_id == id)
            || store
                .instructions
                .list()?
                .iter()
                .any(|row| row.professional_id == id)
            || store.queue.list()?.iter().any(|row| row.professional_id == id)
            || store
                .inter_unit_accesses
                .list()?
                .iter()
                .any(|row| row.professional_id == id)
            || store
                .users
                .list()?
                .iter()
                .any(|row| row.professional_id == Some(id))
            || store
                .health_units
                .list()?
                .iter()
                .any(|unit| unit.professional_ids.contains(&id)))
    }

    pub fn create_user(&self, input: UserInput) -> Result<User, ClinicError> {
        const MISSING: &str = "Nome de usuário, senha e papel são obrigatórios.";
        let username = required_text(&input.username, MISSING)?;
        let password = input
            .password
            .filter(|password| !password.trim().is_empty())
            .ok_or_else(|| ClinicError::Validation(MISSING.to_string()))?;
        let password_hash = hash_password(&password)?;

        let _links = self.store.link_guard()?;
        if let Some(professional_id) = input.professional_id {
            self.ensure_professional(professional_id)?;
        }

        let user = self
            .store
            .users
            .insert(User {
                id: 0,
                username,
                password_hash,
                role: input.role,
                professional_id: input.professional_id,
                last_access: None,
            })
            .map_err(conflict_as(DUPLICATE_USERNAME))?;

        info!(user_id = user.id, role = user.role.label(), "user created");
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<User>, ClinicError> {
        let mut users = self.store.users.list()?;
        users.sort_by(|left, right| left.username.cmp(&right.username));
        Ok(users)
    }

    /// A blank password keeps the stored hash.
    pub fn update_user(&self, id: RecordId, input: UserInput) -> Result<(), ClinicError> {
        let _links = self.store.link_guard()?;
        let existing = self
            .store
            .users
            .fetch(id)?
            .ok_or_else(|| ClinicError::NotFound("Usuário não encontrado".to_string()))?;
        if let Some(professional_id) = input.professional_id {
            self.ensure_professional(professional_id)?;
        }

        let password_hash = match input.password.filter(|password| !password.trim().is_empty()) {
            Some(password) => hash_password(&password)?,
            None => existing.password_hash,
        };

        self.store
            .users
            .update(User {
                id,
                username: required_text(&input.username, "Nome de usuário é obrigatório.")?,
                password_hash,
                role: input.role,
                professional_id: input.professional_id,
                last_access: existing.last_access,
            })
            .map_err(conflict_as(DUPLICATE_USERNAME))?;

        info!(user_id = id, "user updated");
        Ok(())
    }

    pub fn delete_user(&self, id: RecordId) -> Result<(), ClinicError> {
        remove_or_missing(&*self.store.users, id, "Usuário não encontrado")?;
        info!(user_id = id, "user deleted");
        Ok(())
    }

    pub fn create_appointment(&self, input: AppointmentInput) -> Result<Appointment, ClinicError> {
        let _links = self.store.link_guard()?;
        self.ensure_parties(input.patient_id, input.professional_id)?;

        let appointment = self.store.appointments.insert(Appointment {
            id: 0,
            patient_id: input.patient_id,
            professional_id: input.professional_id,
            scheduled_at: input.scheduled_at,
            status: input.status.unwrap_or_default(),
        })?;

        info!(
            appointment_id = appointment.id,
            status = appointment.status.label(),
            "appointment scheduled"
        );
        Ok(appointment)
    }

    pub fn list_appointments(&self) -> Result<Vec<PartyView<Appointment>>, ClinicError> {
        let directory = self.directory()?;
        let mut appointments = self.store.appointments.list()?;
        newest_first(&mut appointments, |appointment| {
            (appointment.scheduled_at, appointment.id)
        });
        Ok(appointments
            .into_iter()
            .map(|appointment| {
                let (patient_id, professional_id) =
                    (appointment.patient_id, appointment.professional_id);
                directory.view(appointment, Some(patient_id), Some(professional_id))
            })
            .collect())
    }

    /// An omitted status keeps the stored one.
    pub fn update_appointment(
        &self,
        id: RecordId,
        input: AppointmentInput,
    ) -> Result<(), ClinicError> {
        let _links = self.store.link_guard()?;
        let existing = self
            .store
            .appointments
            .fetch(id)?
            .ok_or_else(|| ClinicError::NotFound("Agendamento não encontrado".to_string()))?;
        self.ensure_parties(input.patient_id, input.professional_id)?;

        self.store.appointments.update(Appointment {
            id,
            patient_id: input.patient_id,
            professional_id: input.professional_id,
            scheduled_at: input.scheduled_at,
            status: input.status.unwrap_or(existing.status),
        })?;

        info!(appointment_id = id, "appointment updated");
        Ok(())
    }

    pub fn delete_appointment(&self, id: RecordId) -> Result<(), ClinicError> {
        remove_or_missing(&*self.store.appointments, id, "Agendamento não encontrado")?;
        info!(appointment_id = id, "appointment deleted");
        Ok(())
    }

    pub fn create_visit(&self, input: VisitInput) -> Result<Visit, ClinicError> {
        let _links = self.store.link_guard()?;
        self.ensure_parties(input.patient_id, input.professional_id)?;
        let visit_type = required_text(&input.visit_type, "Tipo de atendimento é obrigatório.")?;

        let visit = self.store.visits.insert(Visit {
            id: 0,
            patient_id: input.patient_id,
            professional_id: input.professional_id,
            visit_type,
            performed_at: input.performed_at,
            status: optional_text(input.status),
            notes: optional_text(input.notes),
        })?;

        info!(visit_id = visit.id, "visit recorded");
        Ok(visit)
    }

    pub fn list_visits(&self) -> Result<Vec<PartyView<Visit>>, ClinicError> {
        let directory = self.directory()?;
        let mut visits = self.store.visits.list()?;
        newest_first(&mut visits, |visit| (visit.performed_at, visit.id));
        Ok(visits
            .into_iter()
            .map(|visit| {
                let (patient_id, professional_id) = (visit.patient_id, visit.professional_id);
                directory.view(visit, Some(patient_id), Some(professional_id))
            })
            .collect())
    }

    pub fn update_visit(&self, id: RecordId, input: VisitInput) -> Result<(), ClinicError> {
        let _links = self.store.link_guard()?;
        if self.store.visits.fetch(id)?.is_none() {
            return Err(ClinicError::NotFound("Atendimento não encontrado".to_string()));
        }
        self.ensure_parties(input.patient_id, input.professional_id)?;

        self.store.visits.update(Visit {
            id,
            patient_id: input.patient_id,
            professional_id: input.professional_id,
            visit_type: required_text(&input.visit_type, "Tipo de atendimento é obrigatório.")?,
            performed_at: input.performed_at,
            status: optional_text(input.status),
            notes: optional_text(input.notes),
        })?;

        info!(visit_id = id, "visit updated");
        Ok(())
    }

    pub fn delete_visit(&self, id: RecordId) -> Result<(), ClinicError> {
        let _links = self.store.link_guard()?;
        let referenced = self
            .store
            .clinical_notes
            .list()?
            .iter()
            .any(|note| note.visit_id == Some(id))
            || self
                .store
                .certificates
                .list()?
                .iter()
                .any(|certificate| certificate.visit_id == Some(id))
            || self
                .store
                .instructions
                .list()?
                .iter()
                .any(|instruction| instruction.visit_id == Some(id));
        if referenced {
            return Err(ClinicError::Conflict(
                "Não é possível excluir. O atendimento possui registros vinculados.".to_string(),
            ));
        }

        remove_or_missing(&*self.store.visits, id, "Atendimento não encontrado")?;
        info!(visit_id = id, "visit deleted");
        Ok(())
    }

    pub fn create_clinical_note(
        &self,
        input: ClinicalNoteInput,
    ) -> Result<ClinicalNote, ClinicError> {
        let _links = self.store.link_guard()?;
        self.ensure_parties(input.patient_id, input.professional_id)?;
        self.ensure_visit(input.visit_id)?;
        let notes = required_text(&input.notes, "O texto da evolução é obrigatório.")?;

        let note = self.store.clinical_notes.insert(ClinicalNote {
            id: 0,
            patient_id: input.patient_id,
            professional_id: input.professional_id,
            visit_id: input.visit_id,
            notes,
            recorded_at: self.clock.now(),
        })?;

        info!(note_id = note.id, patient_id = note.patient_id, "clinical note recorded");
        Ok(note)
    }

    pub fn list_clinical_notes(&self) -> Result<Vec<PartyView<ClinicalNote>>, ClinicError> {
        let directory = self.directory()?;
        let mut notes = self.store.clinical_notes.list()?;
        newest_first(&mut notes, |note| (note.recorded_at, note.id));
        Ok(notes
            .into_iter()
            .map(|note| {
                let (patient_id, professional_id) = (note.patient_id, note.professional_id);
                directory.view(note, Some(patient_id), Some(professional_id))
            })
            .collect())
    }

    /// The original recording time is kept.
    pub fn update_clinical_note(
        &self,
        id: RecordId,
        input: ClinicalNoteInput,
    ) -> Result<(), ClinicError> {
        let _links = self.store.link_guard()?;
        let existing = self
            .store
            .clinical_notes
            .fetch(id)?
            .ok_or_else(|| ClinicError::NotFound("Evolução não encontrada".to_string()))?;
        self.ensure_parties(input.patient_id, input.professional_id)?;
        self.ensure_visit(input.visit_id)?;

        self.store.clinical_notes.update(ClinicalNote {
            id,
            patient_id: input.patient_id,
            professional_id: input.professional_id,
            visit_id: input.visit_id,
            notes: required_text(&input.notes, "O texto da evolução é obrigatório.")?,
            recorded_at: existing.recorded_at,
        })?;

        info!(note_id = id, "clinical note updated");
        Ok(())
    }

    pub fn delete_clinical_note(&self, id: RecordId) -> Result<(), ClinicError> {
        remove_or_missing(&*self.store.clinical_notes, id, "Evolução não encontrada")?;
        info!(note_id = id, "clinical note deleted");
        Ok(())
    }

    pub fn issue_certificate(
        &self,
        input: CertificateInput,
    ) -> Result<MedicalCertificate, ClinicError> {
        const MISSING: &str =
            "Paciente, Profissional, Dias de Afastamento e Texto são obrigatórios.";
        if input.leave_days == 0 {
            return Err(ClinicError::Validation(MISSING.to_string()));
        }
        let text = required_text(&input.text, MISSING)?;
        let _links = self.store.link_guard()?;
        self.ensure_parties(input.patient_id, input.professional_id)?;
        self.ensure_visit(input.visit_id)?;

        let certificate = self.store.certificates.insert(MedicalCertificate {
            id: 0,
            patient_id: input.patient_id,
            professional_id: input.professional_id,
            visit_id: input.visit_id,
            leave_days: input.leave_days,
            icd_code: optional_text(input.icd_code),
            text,
            issued_at: self.clock.now(),
        })?;

        info!(
            certificate_id = certificate.id,
            leave_days = certificate.leave_days,
            "certificate issued"
        );
        Ok(certificate)
    }

    pub fn certificate(&self, id: RecordId) -> Result<CertificateDetail, ClinicError> {
        let certificate = self
            .store
            .certificates
            .fetch(id)?
            .ok_or_else(|| ClinicError::NotFound("Atestado não encontrado".to_string()))?;
        let (patient_id, professional_id) = (certificate.patient_id, certificate.professional_id);
        Ok(self
            .directory()?
            .view(certificate, Some(patient_id), Some(professional_id)))
    }

    pub fn create_instruction(
        &self,
        input: InstructionInput,
    ) -> Result<PostVisitInstruction, ClinicError> {
        let _links = self.store.link_guard()?;
        self.ensure_parties(input.patient_id, input.professional_id)?;
        self.ensure_visit(input.visit_id)?;
        let text = required_text(&input.text, "O texto da instrução é obrigatório.")?;

        let instruction = self.store.instructions.insert(PostVisitInstruction {
            id: 0,
            patient_id: input.patient_id,
            professional_id: input.professional_id,
            visit_id: input.visit_id,
            text,
            channel: optional_text(input.channel),
            sent_at: self.clock.now(),
        })?;

        info!(instruction_id = instruction.id, "post-visit instruction sent");
        Ok(instruction)
    }

    pub fn list_instructions(&self) -> Result<Vec<PartyView<PostVisitInstruction>>, ClinicError> {
        let directory = self.directory()?;
        let mut instructions = self.store.instructions.list()?;
        newest_first(&mut instructions, |instruction| {
            (instruction.sent_at, instruction.id)
        });
        Ok(instructions
            .into_iter()
            .map(|instruction| {
                let (patient_id, professional_id) =
                    (instruction.patient_id, instruction.professional_id);
                directory.view(instruction, Some(patient_id), Some(professional_id))
            })
            .collect())
    }

    pub fn delete_instruction(&self, id: RecordId) -> Result<(), ClinicError> {
        remove_or_missing(&*self.store.instructions, id, "Instrução não encontrada")?;
        info!(instruction_id = id, "post-visit instruction deleted");
        Ok(())
    }

    pub fn create_schedule_preference(
        &self,
        input: SchedulePreferenceInput,
    ) -> Result<SchedulePreference, ClinicError> {
        let _links = self.store.link_guard()?;
        self.ensure_patient(input.patient_id)?;

        let preference = self.store.schedule_preferences.insert(SchedulePreference {
            id: 0,
            patient_id: input.patient_id,
            preferred_at: input.preferred_at,
        })?;

        info!(preference_id = preference.id, "schedule preference saved");
        Ok(preference)
    }

    pub fn list_schedule_preferences(
        &self,
    ) -> Result<Vec<PartyView<SchedulePreference>>, ClinicError> {
        let directory = self.directory()?;
        let mut preferences = self.store.schedule_preferences.list()?;
        newest_first(&mut preferences, |preference| {
            (preference.preferred_at, preference.id)
        });
        Ok(preferences
            .into_iter()
            .map(|preference| {
                let patient_id = preference.patient_id;
                directory.view(preference, Some(patient_id), None)
            })
            .collect())
    }

    pub fn update_schedule_preference(
        &self,
        id: RecordId,
        input: SchedulePreferenceInput,
    ) -> Result<(), ClinicError> {
        let _links = self.store.link_guard()?;
        if self.store.schedule_preferences.fetch(id)?.is_none() {
            return Err(ClinicError::NotFound("Preferência não encontrada".to_string()));
        }
        self.ensure_patient(input.patient_id)?;

        self.store.schedule_preferences.update(SchedulePreference {
            id,
            patient_id: input.patient_id,
            preferred_at: input.preferred_at,
        })?;

        info!(preference_id = id, "schedule preference updated");
        Ok(())
    }

    pub fn delete_schedule_preference(&self, id: RecordId) -> Result<(), ClinicError> {
        remove_or_missing(&*self.store.schedule_preferences, id, "Preferência não encontrada")?;
        info!(preference_id = id, "schedule preference deleted");
        Ok(())
    }
}
