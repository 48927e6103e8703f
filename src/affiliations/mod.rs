pub mod identifiers;
pub mod legacy;
pub mod records;
pub mod store;
pub mod validation;
