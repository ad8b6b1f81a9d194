//! Storage contracts consumed by the lifecycle manager, with an in-memory and
//! a SQLite implementation.

pub mod memory;
pub mod sqlite;

pub use memory::{InMemoryProfileRepository, InMemoryTypingTestRepository};
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::model::{Completion, NewTypingTest, PersistedTypingTest, Profile};
use uuid::Uuid;

pub trait ProfileRepository: Send + Sync {
    fn get(&self, id: Uuid) -> Result<Option<Profile>>;
}

/// Persistence of typing tests. Listings are ordered oldest first.
pub trait TypingTestRepository: Send + Sync {
    /// Store a new test and assign its id.
    fn create(&self, test: NewTypingTest) -> Result<PersistedTypingTest>;

    /// Overwrite a stored test. Fails with not-found for unknown ids.
    fn update(&self, test: &PersistedTypingTest) -> Result<()>;

    /// Look up a test regardless of its state.
    fn get(&self, id: Uuid) -> Result<Option<PersistedTypingTest>>;

    fn get_by_profile_id(&self, profile_id: Uuid) -> Result<Vec<PersistedTypingTest>>;

    fn get_by_language(&self, language: &str) -> Result<Vec<PersistedTypingTest>>;

    /// Most recently created non-completed test of a profile.
    fn get_last_non_completed_by_profile_id(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<PersistedTypingTest>>;

    /// Remove every non-completed test of a profile, returning how many went.
    fn delete_non_completed_by_profile_id(&self, profile_id: Uuid) -> Result<usize>;

    fn get_completed_by_id(&self, id: Uuid) -> Result<Option<PersistedTypingTest>>;

    /// Attach `completion` to a non-completed test as one atomic step.
    ///
    /// Fails with a conflict if the test is already completed, leaving it
    /// untouched, and with not-found if there is no such test.
    fn complete(&self, id: Uuid, completion: Completion) -> Result<PersistedTypingTest>;
}
