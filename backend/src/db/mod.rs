//! Meeting storage.
//!
//! Storage is reached through the [`MeetingRepository`] trait so the
//! workflow in `services::meetings` never depends on a concrete backend:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  HTTP handlers / services::meetings           │
//! └───────────────────┬──────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────┐
//! │  MeetingRepository (repository/mod.rs)        │
//! └───────────────────┬──────────────────────────┘
//!          ┌──────────┴───────────┐
//!   LocalRepository        PostgresRepository
//!    (in-memory)          (Diesel, postgres-repo)
//! ```
//!
//! Use [`RepositoryFactory`] or [`RepositoryBuilder`] to pick a backend at
//! runtime from a [`RepositoryConfig`] or the environment.

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::PostgresConfig;
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::{PostgresSettings, RepositoryConfig, RepositorySettings};
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{ErrorContext, MeetingRepository, RepositoryError, RepositoryResult};
