//! Repository implementations over any [`DocumentStore`](crate::domain::DocumentStore)

pub mod handle_repository;
pub mod profile_repository;

pub use handle_repository::HandleRepository;
pub use profile_repository::ProfileRepository;
