// Repository trait for upstream observation data access
use crate::domain::electricity::ElectricityBatch;
use crate::domain::observation::{DateRange, ObservationBatch};
use async_trait::async_trait;

#[async_trait]
pub trait ObservationRepository: Send + Sync {
    /// Sensor, device and weather observations for the range. An open range
    /// lets the upstream pick its default window.
    async fn fetch_display_data(&self, range: &DateRange) -> anyhow::Result<ObservationBatch>;

    /// Electricity prices and consumption, or None when the upstream has
    /// electricity data disabled
    async fn fetch_electricity_data(
        &self,
        range: &DateRange,
    ) -> anyhow::Result<Option<ElectricityBatch>>;
}
