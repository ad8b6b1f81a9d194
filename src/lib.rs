// Library surface for the CLI and integration tests.
pub mod app_dirs;
pub mod call;
pub mod composer;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod lifecycle;
pub mod merge;
pub mod model;
pub mod modifier;
pub mod storage;

pub use composer::TestComposer;
pub use dictionary::{Dictionary, DictionaryLoader, DictionaryRepository, WordLoader};
pub use error::{Error, ErrorKind, Result};
pub use lifecycle::TypingTestService;
pub use merge::Merger;
pub use model::{
    PersistedTypingTest, Profile, SourceRequest, TestRequest, TestResults, TestState, TypingTest,
};
pub use modifier::{Modifier, ModifierChain};
