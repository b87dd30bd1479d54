pub mod contact;
pub mod crm;
pub mod error;
pub mod file;
