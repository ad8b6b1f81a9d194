use super::{ProfileRepository, TypingTestRepository};
use crate::error::{Error, Result};
use crate::model::{Completion, NewTypingTest, PersistedTypingTest, Profile};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Typing tests held in a vector in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryTypingTestRepository {
    tests: Mutex<Vec<PersistedTypingTest>>,
}

impl InMemoryTypingTestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn tests(&self) -> MutexGuard<'_, Vec<PersistedTypingTest>> {
        self.tests.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn filtered(&self, keep: impl Fn(&PersistedTypingTest) -> bool) -> Vec<PersistedTypingTest> {
        let mut found: Vec<PersistedTypingTest> =
            self.tests().iter().filter(|t| keep(t)).cloned().collect();
        // stable, so equal timestamps keep insertion order
        found.sort_by_key(|t| t.created_at);
        found
    }
}

impl TypingTestRepository for InMemoryTypingTestRepository {
    fn create(&self, test: NewTypingTest) -> Result<PersistedTypingTest> {
        let persisted = test.with_id(Uuid::new_v4());
        self.tests().push(persisted.clone());
        Ok(persisted)
    }

    fn update(&self, test: &PersistedTypingTest) -> Result<()> {
        let mut tests = self.tests();
        let stored = tests
            .iter_mut()
            .find(|t| t.id == test.id)
            .ok_or_else(|| Error::not_found("typing test", test.id))?;
        *stored = test.clone();
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<PersistedTypingTest>> {
        Ok(self.tests().iter().find(|t| t.id == id).cloned())
    }

    fn get_by_profile_id(&self, profile_id: Uuid) -> Result<Vec<PersistedTypingTest>> {
        Ok(self.filtered(|t| t.profile_id == profile_id))
    }

    fn get_by_language(&self, language: &str) -> Result<Vec<PersistedTypingTest>> {
        Ok(self.filtered(|t| t.language == language))
    }

    fn get_last_non_completed_by_profile_id(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<PersistedTypingTest>> {
        Ok(self
            .filtered(|t| t.profile_id == profile_id && !t.is_completed())
            .pop())
    }

    fn delete_non_completed_by_profile_id(&self, profile_id: Uuid) -> Result<usize> {
        let mut tests = self.tests();
        let before = tests.len();
        tests.retain(|t| t.profile_id != profile_id || t.is_completed());
        Ok(before - tests.len())
    }

    fn get_completed_by_id(&self, id: Uuid) -> Result<Option<PersistedTypingTest>> {
        Ok(self
            .tests()
            .iter()
            .find(|t| t.id == id && t.is_completed())
            .cloned())
    }

    fn complete(&self, id: Uuid, completion: Completion) -> Result<PersistedTypingTest> {
        let mut tests = self.tests();
        let stored = tests
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::not_found("typing test", id))?;
        if stored.is_completed() {
            return Err(Error::Conflict(format!("typing test {id} is already completed")));
        }
        stored.completion = Some(completion);
        Ok(stored.clone())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    profiles: Mutex<HashMap<Uuid, Profile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, name: impl Into<String>) -> Profile {
        let profile = Profile {
            id: Uuid::new_v4(),
            name: name.into(),
        };
        self.profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile.id, profile.clone());
        profile
    }
}

impl ProfileRepository for InMemoryProfileRepository {
    fn get(&self, id: Uuid) -> Result<Option<Profile>> {
        Ok(self
            .profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned())
    }
}
