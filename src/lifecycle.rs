//! Creation and completion of persisted typing tests.
//!
//! A test starts out non-completed and can be completed exactly once. A
//! profile has at most one non-completed test: requesting a new one purges
//! the previous ones first.

use crate::composer::TestComposer;
use crate::dictionary::{Dictionary, DictionaryRepository, WordLoader};
use crate::error::{Error, Result};
use crate::merge::Merger;
use crate::model::{
    Completion, NewTypingTest, PersistedTypingTest, SourceRequest, TestRequest, TestResults,
    TypingTest,
};
use crate::modifier::ModifierChain;
use crate::storage::{ProfileRepository, TypingTestRepository};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

pub struct TypingTestService {
    tests: Arc<dyn TypingTestRepository>,
    profiles: Arc<dyn ProfileRepository>,
    dictionaries: Arc<dyn DictionaryRepository>,
    loader: Arc<dyn WordLoader>,
    rng: Mutex<StdRng>,
    // Serializes purge-then-create per profile within this instance. Separate
    // processes sharing one store can still race.
    profile_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl TypingTestService {
    pub fn new(
        tests: Arc<dyn TypingTestRepository>,
        profiles: Arc<dyn ProfileRepository>,
        dictionaries: Arc<dyn DictionaryRepository>,
        loader: Arc<dyn WordLoader>,
    ) -> Self {
        Self {
            tests,
            profiles,
            dictionaries,
            loader,
            rng: Mutex::new(StdRng::from_entropy()),
            profile_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Use a deterministic random source for composing tests.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn profile_lock(&self, profile_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self
            .profile_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(profile_id).or_default())
    }

    // Drops the map entry once no other request holds or waits on it. Clones
    // are only taken under the map lock, so the count cannot grow meanwhile.
    fn release_profile_lock(&self, profile_id: Uuid, lock: Arc<Mutex<()>>) {
        let mut locks = self
            .profile_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&profile_id);
        }
    }

    fn resolve_dictionary(&self, language: &str, name: &str) -> Result<Dictionary> {
        self.dictionaries
            .get_dictionary_by_language_and_name(language, name)?
            .ok_or_else(|| Error::not_found("dictionary", format!("{language}/{name}")))
    }

    fn composer(
        &self,
        language: &str,
        sources: &[SourceRequest],
        modifiers: ModifierChain,
        word_count: usize,
    ) -> Result<TestComposer> {
        let (first, rest) = sources
            .split_first()
            .ok_or_else(|| Error::configuration("at least one source must be requested"))?;
        if let Some(merger) = &first.merger {
            return Err(Error::validation(format!(
                "the first source `{}` cannot have a merger (`{merger}`)",
                first.dictionary
            )));
        }
        if word_count == 0 {
            return Err(Error::validation("word count must be greater than zero"));
        }

        let mergers = rest
            .iter()
            .map(|source| source.merger.as_deref().map(Merger::parse).transpose())
            .collect::<Result<Vec<_>>>()?;

        let mut composer = TestComposer::new()
            .with_loader(Arc::clone(&self.loader))
            .with_modifiers(modifiers)
            .with_word_count(word_count)
            .with_source(self.resolve_dictionary(language, &first.dictionary)?)?;
        for (source, merger) in rest.iter().zip(mergers) {
            let dictionary = self.resolve_dictionary(language, &source.dictionary)?;
            composer = composer.with_merged_source(dictionary, merger)?;
        }
        Ok(composer)
    }

    /// Compose a test without persisting it.
    pub fn preview_test(
        &self,
        language: &str,
        sources: &[SourceRequest],
        modifiers: &[String],
        word_count: usize,
    ) -> Result<TypingTest<String>> {
        let modifiers = ModifierChain::parse(modifiers)?;
        let composer = self.composer(language, sources, modifiers, word_count)?;
        let mut rng = self.rng();
        composer.build(&mut *rng)
    }

    /// Create a new non-completed test, replacing any the profile still has.
    pub fn request_test(&self, request: &TestRequest) -> Result<PersistedTypingTest> {
        let modifiers = ModifierChain::parse(&request.modifiers)?;
        self.profiles
            .get(request.profile_id)?
            .ok_or_else(|| Error::not_found("profile", request.profile_id))?;
        let composer = self.composer(
            &request.language,
            &request.sources,
            modifiers,
            request.word_count,
        )?;

        let lock = self.profile_lock(request.profile_id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.replace_pending_test(request, &composer)
        };
        self.release_profile_lock(request.profile_id, lock);
        result
    }

    fn replace_pending_test(
        &self,
        request: &TestRequest,
        composer: &TestComposer,
    ) -> Result<PersistedTypingTest> {
        let purged = self
            .tests
            .delete_non_completed_by_profile_id(request.profile_id)?;
        if purged > 0 {
            tracing::info!(
                "purged {} non-completed test(s) of profile {}",
                purged,
                request.profile_id
            );
        }

        let test = {
            let mut rng = self.rng();
            composer.build(&mut *rng)?
        };
        if test.words.len() < request.word_count {
            tracing::debug!(
                "composed {} of {} requested words",
                test.words.len(),
                request.word_count
            );
        }

        let persisted = self.tests.create(NewTypingTest {
            profile_id: request.profile_id,
            created_at: Utc::now(),
            language: request.language.clone(),
            word_count: request.word_count,
            time_limit: request.time_limit,
            test,
        })?;
        tracing::info!(
            "created typing test {} for profile {}",
            persisted.id,
            persisted.profile_id
        );
        Ok(persisted)
    }

    /// Complete a test. A test that is already completed is left untouched.
    pub fn submit_results(
        &self,
        test_id: Uuid,
        results: TestResults,
    ) -> Result<PersistedTypingTest> {
        results.validate()?;
        let test = self
            .tests
            .get(test_id)?
            .ok_or_else(|| Error::not_found("typing test", test_id))?;
        if test.is_completed() {
            return Err(Error::Conflict(format!(
                "typing test {test_id} is already completed"
            )));
        }

        let completed = self.tests.complete(
            test_id,
            Completion {
                completed_at: Utc::now(),
                results,
            },
        )?;
        tracing::info!("completed typing test {}", test_id);
        Ok(completed)
    }

    /// Only completed tests are visible by id.
    pub fn get_test_by_id(&self, test_id: Uuid) -> Result<PersistedTypingTest> {
        self.tests
            .get_completed_by_id(test_id)?
            .ok_or_else(|| Error::not_found("typing test", test_id))
    }

    /// The profile's current non-completed test.
    pub fn get_last_test(&self, profile_id: Uuid) -> Result<PersistedTypingTest> {
        self.tests
            .get_last_non_completed_by_profile_id(profile_id)?
            .ok_or_else(|| Error::not_found("non-completed typing test for profile", profile_id))
    }

    pub fn get_tests_by_profile_id(&self, profile_id: Uuid) -> Result<Vec<PersistedTypingTest>> {
        self.tests.get_by_profile_id(profile_id)
    }

    pub fn get_tests_by_language(&self, language: &str) -> Result<Vec<PersistedTypingTest>> {
        self.tests.get_by_language(language)
    }

    pub fn list_dictionaries(&self, language: Option<&str>) -> Result<Vec<Dictionary>> {
        match language {
            Some(language) => self.dictionaries.get_dictionaries_by_language(language),
            None => self.dictionaries.get_all_dictionaries(),
        }
    }
}
