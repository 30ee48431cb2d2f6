pub mod document;
pub mod local;
pub mod plan_store;
pub mod records;
