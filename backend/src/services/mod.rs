pub mod admissions;
pub mod mail;
pub mod site;
