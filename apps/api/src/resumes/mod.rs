// Resume storage and the single-primary-resume rule.
// Every mutation of a user's resume set goes through PrimaryResumeManager.

pub mod handlers;
pub mod manager;
#[cfg(test)]
pub mod memory_store;
pub mod pg_store;
pub mod primary;
pub mod store;

pub use manager::PrimaryResumeManager;
