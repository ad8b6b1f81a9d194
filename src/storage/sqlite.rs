use super::{ProfileRepository, TypingTestRepository};
use crate::error::{Error, Result};
use crate::model::{
    Completion, NewTypingTest, PersistedTypingTest, Profile, TestResults, TypingTest,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

const TEST_COLUMNS: &str = "id, profile_id, created_at, language, word_count, time_limit, \
     sources, modifiers, words, completed_at, accuracy, raw_accuracy, test_time, \
     error_count, error_word_indices";

/// Profiles and typing tests in one SQLite database.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and its tables.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS typing_tests (
                id TEXT PRIMARY KEY,
                profile_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                language TEXT NOT NULL,
                word_count INTEGER NOT NULL,
                time_limit INTEGER,
                sources TEXT NOT NULL,
                modifiers TEXT NOT NULL,
                words TEXT NOT NULL,
                completed_at TEXT,
                accuracy REAL,
                raw_accuracy REAL,
                test_time REAL,
                error_count INTEGER,
                error_word_indices TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_typing_tests_profile ON typing_tests(profile_id);
            CREATE INDEX IF NOT EXISTS idx_typing_tests_language ON typing_tests(language);
            "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create_profile(&self, name: &str) -> Result<Profile> {
        let profile = Profile {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.conn().execute(
            "INSERT INTO profiles (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![profile.id.to_string(), profile.name, timestamp(&Utc::now())],
        )?;
        tracing::info!("created profile {} ({})", profile.name, profile.id);
        Ok(profile)
    }

    fn query_tests(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<PersistedTypingTest>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TEST_COLUMNS} FROM typing_tests WHERE {filter} ORDER BY created_at, rowid"
        ))?;
        let rows = stmt.query_map(params, read_test)?;

        let mut tests = Vec::new();
        for test in rows {
            tests.push(test?);
        }
        Ok(tests)
    }

    fn query_test(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> Result<Option<PersistedTypingTest>> {
        let conn = self.conn();
        let test = conn
            .query_row(
                &format!(
                    "SELECT {TEST_COLUMNS} FROM typing_tests WHERE {filter} \
                     ORDER BY created_at DESC, rowid DESC LIMIT 1"
                ),
                params,
                read_test,
            )
            .optional()?;
        Ok(test)
    }
}

impl ProfileRepository for SqliteStore {
    fn get(&self, id: Uuid) -> Result<Option<Profile>> {
        let profile = self
            .conn()
            .query_row(
                "SELECT id, name FROM profiles WHERE id = ?1",
                [id.to_string()],
                |row| {
                    Ok(Profile {
                        id: parse_column(row, 0, Uuid::parse_str)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }
}

impl TypingTestRepository for SqliteStore {
    fn create(&self, test: NewTypingTest) -> Result<PersistedTypingTest> {
        let persisted = test.with_id(Uuid::new_v4());
        self.conn().execute(
            r#"
            INSERT INTO typing_tests
            (id, profile_id, created_at, language, word_count, time_limit, sources, modifiers, words)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                persisted.id.to_string(),
                persisted.profile_id.to_string(),
                timestamp(&persisted.created_at),
                persisted.language,
                persisted.word_count,
                persisted.time_limit,
                serde_json::to_string(&persisted.test.sources)?,
                serde_json::to_string(&persisted.test.modifiers)?,
                serde_json::to_string(&persisted.test.words)?,
            ],
        )?;
        Ok(persisted)
    }

    fn update(&self, test: &PersistedTypingTest) -> Result<()> {
        let results = test.results();
        let error_word_indices = results
            .map(|r| serde_json::to_string(&r.error_word_indices))
            .transpose()?;

        let changed = self.conn().execute(
            r#"
            UPDATE typing_tests SET
                profile_id = ?2, created_at = ?3, language = ?4, word_count = ?5,
                time_limit = ?6, sources = ?7, modifiers = ?8, words = ?9,
                completed_at = ?10, accuracy = ?11, raw_accuracy = ?12, test_time = ?13,
                error_count = ?14, error_word_indices = ?15
            WHERE id = ?1
            "#,
            params![
                test.id.to_string(),
                test.profile_id.to_string(),
                timestamp(&test.created_at),
                test.language,
                test.word_count,
                test.time_limit,
                serde_json::to_string(&test.test.sources)?,
                serde_json::to_string(&test.test.modifiers)?,
                serde_json::to_string(&test.test.words)?,
                test.completed_at().map(|at| timestamp(&at)),
                results.map(|r| r.accuracy),
                results.map(|r| r.raw_accuracy),
                results.map(|r| r.test_time),
                results.map(|r| r.error_count),
                error_word_indices,
            ],
        )?;

        if changed == 0 {
            return Err(Error::not_found("typing test", test.id));
        }
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<PersistedTypingTest>> {
        self.query_test("id = ?1", [id.to_string()])
    }

    fn get_by_profile_id(&self, profile_id: Uuid) -> Result<Vec<PersistedTypingTest>> {
        self.query_tests("profile_id = ?1", [profile_id.to_string()])
    }

    fn get_by_language(&self, language: &str) -> Result<Vec<PersistedTypingTest>> {
        self.query_tests("language = ?1", [language])
    }

    fn get_last_non_completed_by_profile_id(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<PersistedTypingTest>> {
        self.query_test(
            "profile_id = ?1 AND completed_at IS NULL",
            [profile_id.to_string()],
        )
    }

    fn delete_non_completed_by_profile_id(&self, profile_id: Uuid) -> Result<usize> {
        let deleted = self.conn().execute(
            "DELETE FROM typing_tests WHERE profile_id = ?1 AND completed_at IS NULL",
            [profile_id.to_string()],
        )?;
        Ok(deleted)
    }

    fn get_completed_by_id(&self, id: Uuid) -> Result<Option<PersistedTypingTest>> {
        self.query_test("id = ?1 AND completed_at IS NOT NULL", [id.to_string()])
    }

    fn complete(&self, id: Uuid, completion: Completion) -> Result<PersistedTypingTest> {
        let results = &completion.results;
        let changed = self.conn().execute(
            r#"
            UPDATE typing_tests SET
                completed_at = ?2, accuracy = ?3, raw_accuracy = ?4, test_time = ?5,
                error_count = ?6, error_word_indices = ?7
            WHERE id = ?1 AND completed_at IS NULL
            "#,
            params![
                id.to_string(),
                timestamp(&completion.completed_at),
                results.accuracy,
                results.raw_accuracy,
                results.test_time,
                results.error_count,
                serde_json::to_string(&results.error_word_indices)?,
            ],
        )?;

        let stored = TypingTestRepository::get(self, id)?
            .ok_or_else(|| Error::not_found("typing test", id))?;
        if changed == 0 {
            return Err(Error::Conflict(format!("typing test {id} is already completed")));
        }
        Ok(stored)
    }
}

// Fixed precision keeps lexical order equal to chronological order.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_column<T, E>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> std::result::Result<T, E>,
) -> rusqlite::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    parse(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_time(raw: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|at| at.with_timezone(&Utc))
}

fn read_test(row: &Row<'_>) -> rusqlite::Result<PersistedTypingTest> {
    let completed_at: Option<String> = row.get(9)?;
    let completion = match completed_at {
        None => None,
        Some(raw) => Some(Completion {
            completed_at: parse_time(&raw).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e))
            })?,
            results: TestResults {
                accuracy: row.get(10)?,
                raw_accuracy: row.get(11)?,
                test_time: row.get(12)?,
                error_count: row.get(13)?,
                error_word_indices: parse_column(row, 14, |raw| serde_json::from_str(raw))?,
            },
        }),
    };

    Ok(PersistedTypingTest {
        id: parse_column(row, 0, Uuid::parse_str)?,
        profile_id: parse_column(row, 1, Uuid::parse_str)?,
        created_at: parse_column(row, 2, parse_time)?,
        language: row.get(3)?,
        word_count: row.get(4)?,
        time_limit: row.get(5)?,
        test: TypingTest {
            sources: parse_column(row, 6, |raw| serde_json::from_str(raw))?,
            modifiers: parse_column(row, 7, |raw| serde_json::from_str(raw))?,
            words: parse_column(row, 8, |raw| serde_json::from_str(raw))?,
        },
        completion,
    })
}
