// Domain layer - Pure data and calculations, no I/O
pub mod aggregate;
pub mod auth;
pub mod component;
pub mod downtime;
pub mod duration;
pub mod fmea;
pub mod history;
pub mod prediction;
