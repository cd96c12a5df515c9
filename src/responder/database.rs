//! SQLite storage for the book corpus and the horoscope cache.

use rusqlite::{Connection, OptionalExtension, params};
use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::responder::horoscope::{HoroscopeData, HoroscopeMeta};

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// A thread panicked while holding the connection.
    Poisoned,
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::Sqlite(e) => write!(f, "database error: {e}"),
            DbError::Poisoned => write!(f, "database connection lock poisoned"),
        }
    }
}

impl std::error::Error for DbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DbError::Sqlite(e) => Some(e),
            DbError::Poisoned => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        DbError::Sqlite(e)
    }
}

/// A row of the `book` table.
#[derive(Debug, Clone, PartialEq)]
pub struct BookLine {
    pub chapter: String,
    pub verse: String,
    pub text: String,
}

impl BookLine {
    /// `"GEN. 1:1 In the beginning..."`
    pub fn format(&self) -> String {
        format!("{}. {} {}", self.chapter.to_uppercase(), self.verse, self.text)
    }
}

/// Shared SQLite connection.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at `url` and make sure the tables exist.
    pub fn open(url: &str) -> Result<Self, DbError> {
        let conn = Connection::open(Path::new(url))?;
        let db = Self { conn: Mutex::new(conn) };
        db.init_schema()?;
        let (lines, signs) = db.get_counts()?;
        info!("Opened database {url} ({lines} book lines, {signs} cached horoscopes)");
        Ok(db)
    }

    /// Create a new in-memory database.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn: Mutex::new(conn) };
        db.init_schema()?;
        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn init_schema(&self) -> Result<(), DbError> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS book (
                chapter TEXT NOT NULL,
                verse TEXT NOT NULL,
                text TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS horoscope (
                signstring TEXT PRIMARY KEY,
                datestring TEXT NOT NULL DEFAULT '',
                text TEXT NOT NULL DEFAULT '',
                intensity TEXT NOT NULL DEFAULT '',
                keywords TEXT NOT NULL DEFAULT '',
                mood TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_book_chapter_verse ON book(chapter, verse);
        "#,
        )?;
        Ok(())
    }

    fn get_counts(&self) -> Result<(i64, i64), DbError> {
        let conn = self.lock()?;
        let lines = conn.query_row("SELECT COUNT(*) FROM book", [], |row| row.get(0))?;
        let signs = conn.query_row("SELECT COUNT(*) FROM horoscope", [], |row| row.get(0))?;
        Ok((lines, signs))
    }

    /// Whether the connection answers a trivial query.
    pub fn ping(&self) -> bool {
        match self.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).is_ok(),
            Err(_) => false,
        }
    }

    // ==================== BOOK ====================

    /// Text of one specific line.
    pub fn book_line(&self, chapter: &str, verse: &str) -> Result<Option<String>, DbError> {
        let conn = self.lock()?;
        let text = conn
            .query_row(
                "SELECT text FROM book WHERE chapter = ?1 AND verse = ?2",
                params![chapter, verse],
                |row| row.get(0),
            )
            .optional()?;
        Ok(text)
    }

    /// A uniformly random line, or `None` for an empty table.
    pub fn random_book_line(&self) -> Result<Option<BookLine>, DbError> {
        let conn = self.lock()?;
        let line = conn
            .query_row(
                "SELECT chapter, verse, text FROM book ORDER BY RANDOM() LIMIT 1",
                [],
                |row| {
                    Ok(BookLine {
                        chapter: row.get(0)?,
                        verse: row.get(1)?,
                        text: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(line)
    }

    pub fn insert_book_line(&self, line: &BookLine) -> Result<(), DbError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO book (chapter, verse, text) VALUES (?1, ?2, ?3)",
            params![line.chapter, line.verse, line.text],
        )?;
        Ok(())
    }

    pub fn book_line_count(&self) -> Result<usize, DbError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM book", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ==================== HOROSCOPE ====================

    /// Cached horoscope for a lower-case sign name.
    pub fn horoscope(&self, sign: &str) -> Result<Option<HoroscopeData>, DbError> {
        let conn = self.lock()?;
        let data = conn
            .query_row(
                "SELECT datestring, signstring, text, intensity, keywords, mood
                 FROM horoscope WHERE signstring = ?1",
                params![sign],
                |row| {
                    Ok(HoroscopeData {
                        date: row.get(0)?,
                        sunsign: row.get(1)?,
                        text: row.get(2)?,
                        meta: HoroscopeMeta {
                            intensity: row.get(3)?,
                            keywords: row.get(4)?,
                            mood: row.get(5)?,
                        },
                    })
                },
            )
            .optional()?;
        // Rows created by hand with only the sign filled in count as a miss.
        Ok(data.filter(|d| !d.text.is_empty()))
    }

    /// Insert or replace the cached horoscope of `data.sunsign`.
    pub fn upsert_horoscope(&self, data: &HoroscopeData) -> Result<(), DbError> {
        let sign = data.sunsign.to_lowercase();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO horoscope (signstring, datestring, text, intensity, keywords, mood)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(signstring) DO UPDATE SET
                datestring = excluded.datestring,
                text = excluded.text,
                intensity = excluded.intensity,
                keywords = excluded.keywords,
                mood = excluded.mood",
            params![
                sign,
                data.date,
                data.text,
                data.meta.intensity,
                data.meta.keywords,
                data.meta.mood
            ],
        )?;
        debug!("Stored horoscope for {sign} ({})", data.date);
        Ok(())
    }
}
