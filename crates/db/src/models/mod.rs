pub mod document;
pub mod employee;
pub mod lifecycle_event;
