// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod client_store;
pub mod config;
pub mod http_machine_api;
pub mod http_response;
