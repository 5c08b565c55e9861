//! Domain layer of the operations portal lifecycle engine.
//!
//! Projects, sprints and their embedded work items, the state machines that
//! govern them, membership composition with department-head escalation,
//! health classification, attachment reference resolution, and the
//! collaborator traits the engine is written against. No HTTP and no SQL.

pub mod aggregate;
pub mod attachment;
pub mod deliverable;
pub mod directory;
pub mod engine;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod member;
pub mod membership;
pub mod naming;
pub mod project;
pub mod sprint;
pub mod store;
pub mod thread;
pub mod types;
