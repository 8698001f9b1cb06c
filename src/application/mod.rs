// Application layer - Alignment and dashboard use cases
pub mod aligner;
pub mod dashboard_service;
pub mod electricity;
pub mod observation_repository;
