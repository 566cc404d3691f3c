//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the CRUD and paginated listing boundary for note aggregates.
//! - Keep SQL and JSON document storage details inside the repository.
//!
//! # Invariants
//! - Write paths call `Note::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Lists are ordered `updated_at DESC, uuid ASC` and capped at 50 rows.
//! - `update_note` is last-write-wins; there is no version check.

use crate::db::DbError;
use crate::model::block::Block;
use crate::model::note::{Note, NoteId, NoteValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NOTES_DEFAULT_LIMIT: u32 = 10;
const NOTES_LIMIT_MAX: u32 = 50;

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    owner_id,
    title,
    document,
    is_public,
    created_at,
    updated_at
FROM notes";

const NOTE_COLUMNS: [&str; 7] = [
    "uuid",
    "owner_id",
    "title",
    "document",
    "is_public",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Note failed validation before write or after read.
    Validation(NoteValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// No note with this id.
    NotFound(NoteId),
    /// Persisted data cannot be converted into a valid note.
    InvalidData(String),
    /// Required table is missing from the connection schema.
    MissingRequiredTable(&'static str),
    /// Required column is missing from an expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "note repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "note repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::InvalidData(_)
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Pagination options for note list use-cases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    /// Maximum rows to return. Defaults to 10 and clamps to 50.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

impl NoteListQuery {
    pub fn new(limit: Option<u32>, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// Effective row limit after defaulting and capping.
    pub fn applied_limit(&self) -> u32 {
        normalize_note_limit(self.limit)
    }
}

/// Repository interface for note aggregates.
pub trait NoteRepository {
    /// Persists a new note and returns its id.
    fn create_note(&mut self, note: &Note) -> RepoResult<NoteId>;
    /// Loads one note; `RepoError::NotFound` when absent.
    fn get_note(&self, id: NoteId) -> RepoResult<Note>;
    /// Lists notes owned by `owner_id`, most recently updated first.
    fn list_by_owner(&self, owner_id: &str, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
    /// Lists public notes of any owner, most recently updated first.
    fn list_public(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
    /// Overwrites a stored note (last write wins).
    fn update_note(&mut self, note: &Note) -> RepoResult<()>;
    /// Hard-deletes a note.
    fn delete_note(&mut self, id: NoteId) -> RepoResult<()>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the connection
    ///   has not been bootstrapped through `db::open_db*`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_note_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_notes(
        &self,
        filter: &str,
        mut bind_values: Vec<Value>,
        query: &NoteListQuery,
    ) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE {filter}");
        sql.push_str(" ORDER BY updated_at DESC, uuid ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(query.applied_limit())));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&mut self, note: &Note) -> RepoResult<NoteId> {
        note.validate()?;
        let document = encode_document(&note.document)?;

        self.conn.execute(
            "INSERT INTO notes (
                uuid,
                owner_id,
                title,
                document,
                is_public,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                note.id.to_string(),
                note.owner_id.as_str(),
                note.title.as_str(),
                document,
                bool_to_int(note.is_public),
                note.created_at,
                note.updated_at,
            ],
        )?;

        Ok(note.id)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Note> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => parse_note_row(row),
            None => Err(RepoError::NotFound(id)),
        }
    }

    fn list_by_owner(&self, owner_id: &str, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        self.query_notes(
            "owner_id = ?",
            vec![Value::Text(owner_id.to_string())],
            query,
        )
    }

    fn list_public(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        self.query_notes("is_public = 1", Vec::new(), query)
    }

    fn update_note(&mut self, note: &Note) -> RepoResult<()> {
        note.validate()?;
        let document = encode_document(&note.document)?;

        // Identity, owner and creation time are immutable: never rewritten.
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = ?2,
                document = ?3,
                is_public = ?4,
                updated_at = ?5
             WHERE uuid = ?1;",
            params![
                note.id.to_string(),
                note.title.as_str(),
                document,
                bool_to_int(note.is_public),
                note.updated_at,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(note.id));
        }
        Ok(())
    }

    fn delete_note(&mut self, id: NoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

/// Normalizes list limit according to the notes contract.
pub fn normalize_note_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => NOTES_DEFAULT_LIMIT,
        Some(value) if value > NOTES_LIMIT_MAX => NOTES_LIMIT_MAX,
        Some(value) => value,
    }
}

fn encode_document(document: &[Block]) -> RepoResult<String> {
    serde_json::to_string(document)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode note document: {err}")))
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in notes.uuid"))
    })?;

    let document_text: String = row.get("document")?;
    let document: Vec<Block> = serde_json::from_str(&document_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid document json for note {id}: {err}"))
    })?;

    let is_public = match row.get::<_, i64>("is_public")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_public value `{other}` in notes.is_public"
            )));
        }
    };

    let note = Note {
        id,
        title: row.get("title")?,
        document,
        owner_id: row.get("owner_id")?,
        is_public,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    note.validate()?;
    Ok(note)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_note_connection_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, "notes")? {
        return Err(RepoError::MissingRequiredTable("notes"));
    }
    for column in NOTE_COLUMNS {
        if !table_has_column(conn, "notes", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "notes",
                column,
            });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
