use crate::dictionary::{Dictionary, WordLoader};
use crate::error::{Error, Result};
use crate::merge::Merger;
use crate::model::TypingTest;
use crate::modifier::ModifierChain;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_WORD_COUNT: usize = 15;

#[derive(Debug, Clone, PartialEq)]
struct Source {
    dictionary: Dictionary,
    merger: Option<Merger>,
}

/// Immutable description of how to compose a [`TypingTest`].
///
/// Every `with_*` call consumes the composer and returns a new one, so a
/// configured composer can be cloned and reused for any number of builds.
#[derive(Clone)]
pub struct TestComposer {
    loader: Option<Arc<dyn WordLoader>>,
    sources: Vec<Source>,
    modifiers: ModifierChain,
    word_count: usize,
}

impl Default for TestComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TestComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestComposer")
            .field("has_loader", &self.loader.is_some())
            .field("sources", &self.sources)
            .field("modifiers", &self.modifiers)
            .field("word_count", &self.word_count)
            .finish()
    }
}

impl TestComposer {
    pub fn new() -> Self {
        Self {
            loader: None,
            sources: Vec::new(),
            modifiers: ModifierChain::new(),
            word_count: DEFAULT_WORD_COUNT,
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn WordLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the first source. Fails if a source is already set.
    pub fn with_source(mut self, dictionary: Dictionary) -> Result<Self> {
        if let Some(existing) = self.sources.first() {
            return Err(Error::configuration(format!(
                "a source is already set ({}/{})",
                existing.dictionary.language, existing.dictionary.name
            )));
        }
        self.sources.push(Source {
            dictionary,
            merger: None,
        });
        Ok(self)
    }

    /// Append a source joined to the words before it by `merger`.
    ///
    /// A source without a merger is accepted but contributes nothing to the
    /// built test.
    pub fn with_merged_source(
        mut self,
        dictionary: Dictionary,
        merger: Option<Merger>,
    ) -> Result<Self> {
        if self.sources.is_empty() {
            return Err(Error::configuration(format!(
                "cannot merge {}/{} before a first source is set",
                dictionary.language, dictionary.name
            )));
        }
        self.sources.push(Source { dictionary, merger });
        Ok(self)
    }

    pub fn with_sources<I>(self, first: Dictionary, rest: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Dictionary, Option<Merger>)>,
    {
        rest.into_iter()
            .try_fold(self.with_source(first)?, |composer, (dictionary, merger)| {
                composer.with_merged_source(dictionary, merger)
            })
    }

    pub fn with_modifiers(mut self, modifiers: ModifierChain) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_word_count(mut self, word_count: usize) -> Self {
        self.word_count = word_count;
        self
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Compose a fresh test.
    ///
    /// Each source's words are shuffled anew, folded left to right through
    /// their mergers, run through the modifier chain, and finally truncated to
    /// the requested word count. The result may be shorter than requested.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TypingTest<String>> {
        let loader = self
            .loader
            .as_ref()
            .ok_or_else(|| Error::configuration("no word loader set"))?;
        let (first, rest) = self
            .sources
            .split_first()
            .ok_or_else(|| Error::configuration("at least one source must be set"))?;

        let mut used = BTreeSet::new();
        used.insert(first.dictionary.clone());
        let mut words = shuffled_words(loader.as_ref(), &first.dictionary, rng);

        for source in rest {
            let Some(merger) = &source.merger else {
                tracing::debug!(
                    "skipping source {}/{} without a merger",
                    source.dictionary.language,
                    source.dictionary.name
                );
                continue;
            };
            let next = shuffled_words(loader.as_ref(), &source.dictionary, rng);
            tracing::debug!(
                "merging {} words from {}/{} with {}",
                next.len(),
                source.dictionary.language,
                source.dictionary.name,
                merger
            );
            words = merger.merge(words, next, rng)?;
            used.insert(source.dictionary.clone());
        }

        let mut words = self.modifiers.apply(words);
        words.truncate(self.word_count);

        Ok(TypingTest {
            sources: used,
            modifiers: self.modifiers.names(),
            words,
        })
    }
}

fn shuffled_words<R: Rng + ?Sized>(
    loader: &dyn WordLoader,
    dictionary: &Dictionary,
    rng: &mut R,
) -> Vec<String> {
    let mut words = loader.load_words(dictionary);
    words.shuffle(rng);
    words
}
