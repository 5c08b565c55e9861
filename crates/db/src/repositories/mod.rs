//! Repositories and collaborator adapters over the Postgres pool.

pub mod directory_repo;
pub mod document_repo;
pub mod lifecycle_event_repo;

pub use directory_repo::PgDirectory;
pub use document_repo::PgEntityStore;
pub use lifecycle_event_repo::LifecycleEventRepo;
