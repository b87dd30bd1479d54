pub mod config;
pub mod crm_client;
pub mod csv;
pub mod formats;
pub mod xlsx;
