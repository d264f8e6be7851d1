// Application layer - Use cases and the seams to the backend
pub mod auth_service;
pub mod machine_api;
pub mod maintenance_service;
pub mod monitor_service;
pub mod scheduler;
pub mod telemetry_client;

#[cfg(test)]
pub mod testing;
