// Domain layer - Observation and chart data models
pub mod dashboard;
pub mod dataset;
pub mod electricity;
pub mod error;
pub mod labels;
pub mod observation;
pub mod weather;
