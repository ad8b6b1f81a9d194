use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use uuid::Uuid;

/// Words to type plus the provenance they were composed from.
///
/// `sources` and `modifiers` are descriptive only; they are not guaranteed
/// to reproduce `words`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingTest<T> {
    pub sources: BTreeSet<Dictionary>,
    /// Modifier names in application order.
    pub modifiers: Vec<String>,
    pub words: Vec<T>,
}

impl<T> TypingTest<T> {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TestState {
    NonCompleted,
    Completed,
}

/// Results a client reports after finishing a test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResults {
    pub accuracy: f64,
    pub raw_accuracy: f64,
    /// Seconds spent on the test.
    pub test_time: f64,
    pub error_count: u32,
    pub error_word_indices: Vec<usize>,
}

impl TestResults {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("accuracy", self.accuracy), ("raw accuracy", self.raw_accuracy)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(Error::validation(format!(
                    "{field} must be within [0, 100], got {value}"
                )));
            }
        }
        if !self.test_time.is_finite() || self.test_time < 0.0 {
            return Err(Error::validation(format!(
                "test time must be a non-negative number of seconds, got {}",
                self.test_time
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub completed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub results: TestResults,
}

/// Payload handed to storage; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTypingTest {
    pub profile_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub language: String,
    pub word_count: usize,
    pub time_limit: Option<u32>,
    pub test: TypingTest<String>,
}

impl NewTypingTest {
    pub fn with_id(self, id: Uuid) -> PersistedTypingTest {
        PersistedTypingTest {
            id,
            profile_id: self.profile_id,
            created_at: self.created_at,
            language: self.language,
            word_count: self.word_count,
            time_limit: self.time_limit,
            test: self.test,
            completion: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedTypingTest {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub language: String,
    /// Requested number of words; `test.words` may hold fewer.
    pub word_count: usize,
    /// Client-side time limit in seconds.
    pub time_limit: Option<u32>,
    pub test: TypingTest<String>,
    pub completion: Option<Completion>,
}

impl PersistedTypingTest {
    pub fn state(&self) -> TestState {
        match self.completion {
            Some(_) => TestState::Completed,
            None => TestState::NonCompleted,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completion.is_some()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completion.as_ref().map(|c| c.completed_at)
    }

    pub fn results(&self) -> Option<&TestResults> {
        self.completion.as_ref().map(|c| &c.results)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
}

/// One dictionary in a test request, with the merger joining it to the
/// sources before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRequest {
    pub dictionary: String,
    pub merger: Option<String>,
}

impl SourceRequest {
    pub fn new(dictionary: impl Into<String>) -> Self {
        Self {
            dictionary: dictionary.into(),
            merger: None,
        }
    }

    pub fn merged_with(dictionary: impl Into<String>, merger: impl Into<String>) -> Self {
        Self {
            dictionary: dictionary.into(),
            merger: Some(merger.into()),
        }
    }
}

/// Parses `NAME` or `NAME:MERGER`, e.g. `rare:probabilistic(100, 0.3)`.
impl FromStr for SourceRequest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (dictionary, merger) = match s.split_once(':') {
            Some((dictionary, merger)) => (dictionary.trim(), Some(merger.trim())),
            None => (s.trim(), None),
        };
        if dictionary.is_empty() {
            return Err(Error::validation(format!("missing dictionary name in `{s}`")));
        }
        Ok(Self {
            dictionary: dictionary.to_string(),
            merger: merger.filter(|m| !m.is_empty()).map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRequest {
    pub profile_id: Uuid,
    pub language: String,
    pub sources: Vec<SourceRequest>,
    pub modifiers: Vec<String>,
    pub word_count: usize,
    pub time_limit: Option<u32>,
}
