use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use super::{
    newest_first, optional_text, remove_or_missing, required_text, AccessLogView, ClinicError,
    ClinicService, HealthUnitView, InterUnitAccessView, LinkedProfessional, MaterialView,
};
use crate::clinic::domain::{
    HealthUnit, HealthUnitInput, InterUnitAccess, InterUnitAccessInput, MaterialAccess, RecordId,
    TrainingMaterial, TrainingMaterialInput,
};

/// Audit listings are capped to the most recent rows.
pub const RECENT_LIMIT: usize = 100;

const UNIT_NAME_REQUIRED: &str = "Nome da Unidade é obrigatório";
const UNIT_NOT_FOUND: &str = "Unidade não encontrada";

impl ClinicService {
    pub fn list_health_units(&self) -> Result<Vec<HealthUnitView>, ClinicError> {
        let directory = self.directory()?;
        let units = self.store.health_units.list()?;
        Ok(units
            .into_iter()
            .map(|unit| HealthUnitView {
                professionals: unit
                    .professional_ids
                    .iter()
                    .filter_map(|id| {
                        directory.professional_name(*id).map(|name| LinkedProfessional {
                            id: *id,
                            name,
                        })
                    })
                    .collect(),
                id: unit.id,
                name: unit.name,
                address: unit.address,
                phone: unit.phone,
                email: unit.email,
            })
            .collect())
    }

    pub fn create_health_unit(&self, input: HealthUnitInput) -> Result<HealthUnit, ClinicError> {
        let name = required_text(&input.name, UNIT_NAME_REQUIRED)?;
        let _links = self.store.link_guard()?;
        let professional_ids = self.checked_links(&input.professional_ids)?;

        let unit = self.store.health_units.insert(HealthUnit {
            id: 0,
            name,
            address: optional_text(input.address),
            phone: optional_text(input.phone),
            email: optional_text(input.email),
            professional_ids,
        })?;

        info!(
            unit_id = unit.id,
            linked = unit.professional_ids.len(),
            "health unit created"
        );
        Ok(unit)
    }

    /// Replace the unit's fields and its professional links in a single write.
    ///
    /// Every link is validated first, so a bad id leaves the stored unit untouched.
    pub fn update_health_unit(
        &self,
        id: RecordId,
        input: HealthUnitInput,
    ) -> Result<(), ClinicError> {
        let name = required_text(&input.name, UNIT_NAME_REQUIRED)?;
        let _links = self.store.link_guard()?;
        if self.store.health_units.fetch(id)?.is_none() {
            return Err(ClinicError::NotFound(UNIT_NOT_FOUND.to_string()));
        }
        let professional_ids = self.checked_links(&input.professional_ids)?;

        self.store.health_units.update(HealthUnit {
            id,
            name,
            address: optional_text(input.address),
            phone: optional_text(input.phone),
            email: optional_text(input.email),
            professional_ids,
        })?;

        info!(unit_id = id, "health unit and links updated");
        Ok(())
    }

    pub fn delete_health_unit(&self, id: RecordId) -> Result<(), ClinicError> {
        let _links = self.store.link_guard()?;
        let referenced = self
            .store
            .inter_unit_accesses
            .list()?
            .iter()
            .any(|access| access.origin_unit_id == id || access.destination_unit_id == id);
        if referenced {
            return Err(ClinicError::Conflict(
                "Não é possível excluir. A unidade está vinculada a outros registros (como acessos interunidades)."
                    .to_string(),
            ));
        }

        remove_or_missing(&*self.store.health_units, id, UNIT_NOT_FOUND)?;
        info!(unit_id = id, "health unit deleted");
        Ok(())
    }

    /// Deduplicated links, in first-seen order, all pointing at existing professionals.
    fn checked_links(&self, ids: &[RecordId]) -> Result<Vec<RecordId>, ClinicError> {
        let mut seen = BTreeSet::new();
        let mut links = Vec::with_capacity(ids.len());
        for id in ids {
            if seen.insert(*id) {
                self.ensure_professional(*id)?;
                links.push(*id);
            }
        }
        Ok(links)
    }

    pub fn list_training_materials(&self) -> Result<Vec<MaterialView>, ClinicError> {
        let mut counts: BTreeMap<RecordId, u64> = BTreeMap::new();
        for access in self.store.material_accesses.list()? {
            *counts.entry(access.material_id).or_default() += 1;
        }

        let mut materials = self.store.training_materials.list()?;
        newest_first(&mut materials, |material| (material.uploaded_at, material.id));
        Ok(materials
            .into_iter()
            .map(|material| MaterialView {
                accesses: counts.get(&material.id).copied().unwrap_or(0),
                material,
            })
            .collect())
    }

    pub fn create_training_material(
        &self,
        input: TrainingMaterialInput,
    ) -> Result<TrainingMaterial, ClinicError> {
        const MISSING: &str = "Título e arquivo são obrigatórios.";
        let material = self.store.training_materials.insert(TrainingMaterial {
            id: 0,
            title: required_text(&input.title, MISSING)?,
            category: optional_text(input.category),
            file_url: required_text(&input.file_url, MISSING)?,
            uploaded_at: self.clock.now(),
        })?;

        info!(material_id = material.id, "training material published");
        Ok(material)
    }

    /// Deletes the material together with its access history.
    pub fn delete_training_material(&self, id: RecordId) -> Result<(), ClinicError> {
        let _links = self.store.link_guard()?;
        if self.store.training_materials.fetch(id)?.is_none() {
            return Err(ClinicError::NotFound("Material não encontrado".to_string()));
        }

        for access in self.store.material_accesses.list()? {
            if access.material_id == id {
                self.store.material_accesses.remove(access.id)?;
            }
        }
        remove_or_missing(&*self.store.training_materials, id, "Material não encontrado")?;

        info!(material_id = id, "training material deleted");
        Ok(())
    }

    pub fn record_material_access(
        &self,
        material_id: RecordId,
        user_id: RecordId,
    ) -> Result<MaterialAccess, ClinicError> {
        let _links = self.store.link_guard()?;
        if self.store.training_materials.fetch(material_id)?.is_none() {
            return Err(ClinicError::InvalidReference(format!(
                "Material {material_id} não encontrado"
            )));
        }

        let access = self.store.material_accesses.insert(MaterialAccess {
            id: 0,
            material_id,
            user_id,
            accessed_at: self.clock.now(),
        })?;
        Ok(access)
    }

    pub fn recent_access_logs(&self) -> Result<Vec<AccessLogView>, ClinicError> {
        let usernames: BTreeMap<RecordId, String> = self
            .store
            .users
            .list()?
            .into_iter()
            .map(|user| (user.id, user.username))
            .collect();

        let mut logs = self.store.access_logs.list()?;
        newest_first(&mut logs, |log| (log.occurred_at, log.id));
        logs.truncate(RECENT_LIMIT);
        Ok(logs
            .into_iter()
            .map(|log| AccessLogView {
                username: log.user_id.and_then(|id| usernames.get(&id).cloned()),
                log,
            })
            .collect())
    }

    pub fn record_inter_unit_access(
        &self,
        input: InterUnitAccessInput,
    ) -> Result<InterUnitAccess, ClinicError> {
        let _links = self.store.link_guard()?;
        self.ensure_parties(input.patient_id, input.professional_id)?;
        for unit_id in [input.origin_unit_id, input.destination_unit_id] {
            if self.store.health_units.fetch(unit_id)?.is_none() {
                return Err(ClinicError::InvalidReference(format!(
                    "Unidade {unit_id} não encontrada"
                )));
            }
        }

        let access = self.store.inter_unit_accesses.insert(InterUnitAccess {
            id: 0,
            patient_id: input.patient_id,
            professional_id: input.professional_id,
            origin_unit_id: input.origin_unit_id,
            destination_unit_id: input.destination_unit_id,
            accessed_at: self.clock.now(),
        })?;

        info!(
            access_id = access.id,
            origin = access.origin_unit_id,
            destination = access.destination_unit_id,
            "inter-unit access recorded"
        );
        Ok(access)
    }

    pub fn recent_inter_unit_accesses(&self) -> Result<Vec<InterUnitAccessView>, ClinicError> {
        let directory = self.directory()?;
        let unit_names: BTreeMap<RecordId, String> = self
            .store
            .health_units
            .list()?
            .into_iter()
            .map(|unit| (unit.id, unit.name))
            .collect();

        let mut accesses = self.store.inter_unit_accesses.list()?;
        newest_first(&mut accesses, |access| (access.accessed_at, access.id));
        accesses.truncate(RECENT_LIMIT);
        Ok(accesses
            .into_iter()
            .map(|access| InterUnitAccessView {
                patient_name: directory.patient_name(access.patient_id),
                professional_name: directory.professional_name(access.professional_id),
                origin_unit_name: unit_names.get(&access.origin_unit_id).cloned(),
                destination_unit_name: unit_names.get(&access.destination_unit_id).cloned(),
                access,
            })
            .collect())
    }
}
