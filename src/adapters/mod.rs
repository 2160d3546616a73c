// Adapters layer: concrete implementations for external systems.

pub mod csv_export;
pub mod http_source;
