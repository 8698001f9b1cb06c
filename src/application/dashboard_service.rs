// Dashboard service - Use case for building aligned chart data
use crate::application::aligner::{Aligner, AlignmentOptions, DisplayZone};
use crate::application::electricity::align_electricity;
use crate::application::observation_repository::ObservationRepository;
use crate::domain::dashboard::Dashboard;
use crate::domain::dataset::AlignedDataset;
use crate::domain::electricity::AlignedElectricity;
use crate::domain::observation::DateRange;
use crate::infrastructure::config::AlignmentSettings;
use chrono::Utc;
use std::sync::Arc;

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn ObservationRepository>,
    settings: AlignmentSettings,
    zone: DisplayZone,
}

impl DashboardService {
    pub fn new(
        repository: Arc<dyn ObservationRepository>,
        settings: AlignmentSettings,
    ) -> anyhow::Result<Self> {
        let zone = settings.display_zone()?;
        Ok(Self {
            repository,
            settings,
            zone,
        })
    }

    pub async fn get_observations(&self, range: &DateRange) -> anyhow::Result<AlignedDataset> {
        let batch = self.repository.fetch_display_data(range).await?;

        tracing::debug!(
            "Fetched {} observations and {} device readings ({:?} mode)",
            batch.observations.len(),
            batch.device_readings.len(),
            batch.mode
        );

        let options = AlignmentOptions::for_mode(batch.mode, &self.settings, self.zone);
        let dataset = Aligner::new(options).align(&batch)?;

        if dataset.is_empty() {
            tracing::debug!("No observations in the requested range");
        }
        for (category, series) in &dataset.categories {
            tracing::debug!("Category {} has {} samples", category.as_str(), series.len());
        }
        for warning in &dataset.warnings {
            tracing::debug!("Alignment warning: {:?}", warning);
        }

        Ok(dataset)
    }

    pub async fn get_electricity(
        &self,
        range: &DateRange,
    ) -> anyhow::Result<Option<AlignedElectricity>> {
        let Some(batch) = self.repository.fetch_electricity_data(range).await? else {
            return Ok(None);
        };

        let now_ms = Utc::now().timestamp_millis();

        Ok(Some(align_electricity(&batch, now_ms, &self.zone, range)))
    }

    /// Observations and electricity data fetched concurrently. Electricity
    /// is optional on the page, so its failure only drops that part.
    pub async fn get_dashboard(&self, range: &DateRange) -> anyhow::Result<Dashboard> {
        let (observations, electricity) =
            futures::future::join(self.get_observations(range), self.get_electricity(range)).await;

        let electricity = match electricity {
            Ok(electricity) => electricity,
            Err(e) => {
                tracing::error!("Error fetching electricity data: {:#}", e);
                None
            }
        };

        Ok(Dashboard::new(observations?, electricity))
    }
}
