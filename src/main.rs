use chrono::{DateTime, Local, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use typist::{
    config::{Config, ConfigStore, FileConfigStore},
    dictionary::DirectoryDictionaryRepository,
    storage::{ProfileRepository, SqliteStore},
    DictionaryLoader, Error, ErrorKind, PersistedTypingTest, Result, SourceRequest, TestRequest,
    TestResults, TestState, TypingTestService,
};
use uuid::Uuid;

/// compose practice typing tests from word dictionaries
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Compose practice typing tests by merging and transforming word dictionaries, and keep track of which tests are still waiting for results."
)]
pub struct Cli {
    /// config file to use instead of the platform default
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// database file tests are stored in
    #[clap(long, global = true)]
    database: Option<PathBuf>,

    /// directory of word lists laid out as <language>/<name>.<txt|json>
    #[clap(long, global = true)]
    dictionary_dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// list available dictionaries
    Dictionaries {
        /// only show dictionaries of this language
        #[clap(short = 'l', long)]
        language: Option<String>,
    },
    /// compose a test and print its words without saving it
    Compose {
        #[clap(flatten)]
        composition: CompositionArgs,

        /// seed for a reproducible composition
        #[clap(long)]
        seed: Option<u64>,
    },
    /// request a new test, replacing the one still waiting for results
    Request {
        #[clap(flatten)]
        composition: CompositionArgs,

        /// time limit shown to the typist, in seconds
        #[clap(short = 't', long)]
        time_limit: Option<u32>,
    },
    /// submit results for a test
    Submit(SubmitArgs),
    /// show a completed test
    Show { id: Uuid },
    /// show the test still waiting for results
    Last,
    /// list tests of the local profile, or all tests of a language
    History {
        #[clap(short = 'l', long)]
        language: Option<String>,
    },
}

#[derive(Args, Debug)]
struct CompositionArgs {
    /// language the dictionaries belong to
    #[clap(short = 'l', long)]
    language: Option<String>,

    /// dictionary to draw from, as NAME or NAME:MERGER (e.g. rare:probabilistic(100, 0.3)); the first source takes no merger
    #[clap(short = 's', long = "source", required = true)]
    sources: Vec<SourceRequest>,

    /// modifier to apply, in order (e.g. capitalize, addSuffix(.))
    #[clap(short = 'm', long = "modifier")]
    modifiers: Vec<String>,

    /// number of words in the test
    #[clap(short = 'w', long)]
    number_of_words: Option<usize>,
}

#[derive(Args, Debug)]
struct SubmitArgs {
    id: Uuid,

    /// accuracy in percent
    #[clap(long)]
    accuracy: f64,

    /// accuracy before corrections, in percent
    #[clap(long)]
    raw_accuracy: f64,

    /// seconds spent typing
    #[clap(long)]
    time: f64,

    /// number of errors made
    #[clap(long, default_value_t = 0)]
    errors: u32,

    /// index of a word typed with errors; repeat for several
    #[clap(long = "error-word")]
    error_words: Vec<usize>,
}

impl CompositionArgs {
    fn language(&self, config: &Config) -> String {
        self.language
            .clone()
            .unwrap_or_else(|| config.language.clone())
    }

    fn modifiers(&self, config: &Config) -> Vec<String> {
        if self.modifiers.is_empty() {
            config.modifiers.clone()
        } else {
            self.modifiers.clone()
        }
    }

    fn number_of_words(&self, config: &Config) -> usize {
        self.number_of_words.unwrap_or(config.number_of_words)
    }
}

struct App {
    config: Config,
    config_store: FileConfigStore,
    store: Arc<SqliteStore>,
    service: TypingTestService,
}

impl App {
    fn new(cli: &Cli) -> Result<Self> {
        let config_store = cli
            .config
            .as_ref()
            .map(FileConfigStore::with_path)
            .unwrap_or_default();
        let config = config_store.load();

        let database = cli
            .database
            .clone()
            .unwrap_or_else(|| config.database_path());
        let dictionary_dir = cli
            .dictionary_dir
            .clone()
            .unwrap_or_else(|| config.dictionary_dir());
        tracing::debug!(
            "using database {} and dictionaries in {}",
            database.display(),
            dictionary_dir.display()
        );

        let store = Arc::new(SqliteStore::open(&database)?);
        let mut service = TypingTestService::new(
            store.clone(),
            store.clone(),
            Arc::new(DirectoryDictionaryRepository::new(dictionary_dir)),
            Arc::new(DictionaryLoader::new()),
        );
        if let Command::Compose {
            seed: Some(seed), ..
        } = &cli.command
        {
            service = service.with_seed(*seed);
        }

        Ok(Self {
            config,
            config_store,
            store,
            service,
        })
    }

    /// The profile remembered in the config, created on first use.
    fn local_profile(&mut self) -> Result<Uuid> {
        if let Some(id) = self.config.profile_id {
            if self.store.get(id)?.is_some() {
                return Ok(id);
            }
        }

        let profile = self.store.create_profile("local")?;
        self.config.profile_id = Some(profile.id);
        self.config_store.save(&self.config)?;
        Ok(profile.id)
    }

    fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Dictionaries { language } => {
                for dictionary in self.service.list_dictionaries(language.as_deref())? {
                    println!(
                        "{}/{}\t{}",
                        dictionary.language,
                        dictionary.name,
                        dictionary.file_path.display()
                    );
                }
            }
            Command::Compose { composition, .. } => {
                let language = composition.language(&self.config);
                let modifiers = composition.modifiers(&self.config);
                let word_count = composition.number_of_words(&self.config);
                let test = self.service.preview_test(
                    &language,
                    &composition.sources,
                    &modifiers,
                    word_count,
                )?;
                println!("{}", test.words.join(" "));
            }
            Command::Request {
                composition,
                time_limit,
            } => {
                let request = TestRequest {
                    profile_id: self.local_profile()?,
                    language: composition.language(&self.config),
                    sources: composition.sources.clone(),
                    modifiers: composition.modifiers(&self.config),
                    word_count: composition.number_of_words(&self.config),
                    time_limit: time_limit.or(self.config.time_limit_secs),
                };
                print_test(&self.service.request_test(&request)?);
            }
            Command::Submit(args) => {
                let results = TestResults {
                    accuracy: args.accuracy,
                    raw_accuracy: args.raw_accuracy,
                    test_time: args.time,
                    error_count: args.errors,
                    error_word_indices: args.error_words,
                };
                print_test(&self.service.submit_results(args.id, results)?);
            }
            Command::Show { id } => print_test(&self.service.get_test_by_id(id)?),
            Command::Last => {
                let profile_id = self.local_profile()?;
                print_test(&self.service.get_last_test(profile_id)?);
            }
            Command::History { language } => {
                let tests = match language {
                    Some(language) => self.service.get_tests_by_language(&language)?,
                    None => {
                        let profile_id = self.local_profile()?;
                        self.service.get_tests_by_profile_id(profile_id)?
                    }
                };
                for test in &tests {
                    print_summary(test);
                }
            }
        }
        Ok(())
    }
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn print_test(test: &PersistedTypingTest) {
    let sources: Vec<&str> = test.test.sources.iter().map(|d| d.name.as_str()).collect();
    println!("id:         {}", test.id);
    println!("language:   {}", test.language);
    println!("created:    {}", local_time(test.created_at));
    println!("sources:    {}", sources.join(", "));
    if !test.test.modifiers.is_empty() {
        println!("modifiers:  {}", test.test.modifiers.join(", "));
    }
    println!(
        "words:      {} of {} requested",
        test.test.words.len(),
        test.word_count
    );
    if let Some(limit) = test.time_limit {
        println!("time limit: {limit}s");
    }
    println!("state:      {}", test.state());
    if let (Some(completed_at), Some(results)) = (test.completed_at(), test.results()) {
        println!("completed:  {}", local_time(completed_at));
        println!(
            "accuracy:   {:.1}% ({:.1}% raw)",
            results.accuracy, results.raw_accuracy
        );
        println!("time:       {:.1}s", results.test_time);
        println!("errors:     {}", results.error_count);
    }
    println!();
    println!("{}", test.test.words.join(" "));
}

fn print_summary(test: &PersistedTypingTest) {
    let outcome = match (test.state(), test.results()) {
        (TestState::Completed, Some(results)) => format!("{:.1}%", results.accuracy),
        _ => "pending".to_string(),
    };
    println!(
        "{}  {}  {:<10} {:>4} words  {}",
        test.id,
        local_time(test.created_at),
        test.language,
        test.test.words.len(),
        outcome
    );
}

fn exit_code(error: &Error) -> i32 {
    match error.kind() {
        ErrorKind::NotFound => 3,
        ErrorKind::Conflict => 4,
        ErrorKind::Storage => 5,
        ErrorKind::Configuration | ErrorKind::Validation | ErrorKind::Exhaustion => 2,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = App::new(&cli).and_then(|mut app| app.run(cli.command));
    if let Err(e) = result {
        eprintln!("typist: {e}");
        std::process::exit(exit_code(&e));
    }
}
