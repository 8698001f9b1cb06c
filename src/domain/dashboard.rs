// Dashboard domain model
use super::dataset::AlignedDataset;
use super::electricity::AlignedElectricity;
use serde::Serialize;

/// Everything a dashboard page plots, built fresh for each request
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub observations: AlignedDataset,
    pub electricity: Option<AlignedElectricity>,
}

impl Dashboard {
    pub fn new(observations: AlignedDataset, electricity: Option<AlignedElectricity>) -> Self {
        Self {
            observations,
            electricity,
        }
    }
}
