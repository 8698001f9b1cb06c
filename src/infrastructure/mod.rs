// Infrastructure layer - External dependencies and adapters
pub mod api_repository;
pub mod config;
pub mod http_response;
pub mod wire_mapper;
