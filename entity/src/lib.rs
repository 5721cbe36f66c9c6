//! sea-orm entities for the HR store.

pub mod employees;
