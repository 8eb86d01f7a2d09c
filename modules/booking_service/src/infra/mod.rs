//! Infrastructure layer

pub mod crm;
