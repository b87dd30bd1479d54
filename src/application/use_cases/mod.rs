pub mod contact_export;
pub mod contact_import;

#[cfg(test)]
pub(crate) mod fake_crm;
