use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use outpost_types::{MalfunctionFlag, Malfunctionable};

/// A patient waiting for (or receiving) treatment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    /// Medicine skill needed to treat the condition.
    pub required_skill: u32,
    pub treatment_remaining: f64,
}

impl Patient {
    pub fn new(name: impl Into<String>, required_skill: u32, treatment_time: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            required_skill,
            treatment_remaining: treatment_time.max(0.0),
        }
    }
}

/// Medical care function of a building. Illness progression is not
/// modeled; a patient is just an amount of treatment time.
#[derive(Debug)]
pub struct SickBay {
    building_id: Uuid,
    name: String,
    beds: usize,
    patients: Mutex<Vec<Patient>>,
    malfunction: MalfunctionFlag,
}

impl SickBay {
    pub fn new(building_id: Uuid, name: impl Into<String>, beds: usize) -> Self {
        Self {
            building_id,
            name: name.into(),
            beds,
            patients: Mutex::new(Vec::new()),
            malfunction: MalfunctionFlag::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Patient>> {
        self.patients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn beds(&self) -> usize {
        self.beds
    }

    /// Admit a patient if a bed is free.
    pub fn admit(&self, patient: Patient) -> bool {
        let mut patients = self.lock();
        if patients.len() >= self.beds {
            return false;
        }
        tracing::debug!(patient = %patient.name, sick_bay = %self.name, "patient admitted");
        patients.push(patient);
        true
    }

    pub fn patients(&self) -> Vec<Patient> {
        self.lock().clone()
    }

    pub fn patient_count(&self) -> usize {
        self.lock().len()
    }

    /// Lowest skill that can treat anyone here.
    pub fn min_required_skill(&self) -> Option<u32> {
        self.lock().iter().map(|p| p.required_skill).min()
    }

    /// Apply treatment time to the first patient the caller is skilled
    /// enough for. Recovered patients are discharged. Returns the time used.
    pub fn treat(&self, amount: f64, skill: u32) -> f64 {
        if amount <= 0.0 || self.malfunction.is_active() {
            return 0.0;
        }
        let mut patients = self.lock();
        let Some(pos) = patients.iter().position(|p| p.required_skill <= skill) else {
            return 0.0;
        };
        let patient = &mut patients[pos];
        let used = amount.min(patient.treatment_remaining);
        patient.treatment_remaining -= used;
        if patient.treatment_remaining <= 1e-9 {
            let discharged = patients.remove(pos);
            tracing::info!(patient = %discharged.name, sick_bay = %self.name, "patient discharged");
        }
        used
    }

    pub fn set_malfunction(&self, active: bool) {
        self.malfunction.set(active);
    }
}

impl Malfunctionable for SickBay {
    fn resource_id(&self) -> Uuid {
        self.building_id
    }

    fn resource_name(&self) -> &str {
        &self.name
    }

    fn has_malfunction(&self) -> bool {
        self.malfunction.is_active()
    }

    fn record_accident(&self) {
        tracing::warn!(sick_bay = %self.name, "accident in sick bay");
        self.malfunction.record_accident();
    }
}
