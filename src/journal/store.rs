use anyhow::Result;
use libsql::Connection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub study_id: Option<String>,
    pub reference: Option<String>,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    pub study_id: Option<String>,
    pub reference: String,
    pub note: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct NoteInput {
    pub study_id: Option<String>,
    pub reference: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct BookmarkInput {
    pub study_id: Option<String>,
    pub reference: String,
    pub note: Option<String>,
}

/// Per-user notes, bookmarks, and study progress. Every query is scoped to
/// the user the journal was opened for.
pub struct Journal<'a> {
    conn: &'a Connection,
    user_id: i64,
}

impl<'a> Journal<'a> {
    pub fn new(conn: &'a Connection, user_id: i64) -> Self {
        Self { conn, user_id }
    }

    // ------------------------------------------------------------------
    // Progress
    // ------------------------------------------------------------------

    pub async fn completed_days(&self, study_id: &str) -> Result<Vec<i64>> {
        let query = r#"
            SELECT day FROM study_progress
            WHERE user_id = ? AND study_id = ?
            ORDER BY day
        "#;

        let mut rows = self
            .conn
            .query(query, libsql::params![self.user_id, study_id])
            .await?;

        let mut days = Vec::new();
        while let Some(row) = rows.next().await? {
            days.push(row.get(0)?);
        }
        Ok(days)
    }

    /// Marks `day` done or not done and returns the refreshed day list.
    pub async fn set_day_completed(&self, study_id: &str, day: i64, completed: bool) -> Result<Vec<i64>> {
        if completed {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO study_progress (user_id, study_id, day) VALUES (?, ?, ?)",
                    libsql::params![self.user_id, study_id, day],
                )
                .await?;
        } else {
            self.conn
                .execute(
                    "DELETE FROM study_progress WHERE user_id = ? AND study_id = ? AND day = ?",
                    libsql::params![self.user_id, study_id, day],
                )
                .await?;
        }

        self.completed_days(study_id).await
    }

    // ------------------------------------------------------------------
    // Notes
    // ------------------------------------------------------------------

    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let query = r#"
            SELECT id, study_id, reference, content, created_at, updated_at
            FROM notes
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
        "#;

        let mut rows = self.conn.query(query, libsql::params![self.user_id]).await?;

        let mut notes = Vec::new();
        while let Some(row) = rows.next().await? {
            notes.push(Self::row_to_note(&row)?);
        }
        Ok(notes)
    }

    pub async fn create_note(&self, input: NoteInput) -> Result<Note> {
        let query = r#"
            INSERT INTO notes (user_id, study_id, reference, content)
            VALUES (?, ?, ?, ?)
            RETURNING id, study_id, reference, content, created_at, updated_at
        "#;

        let mut rows = self
            .conn
            .query(
                query,
                libsql::params![self.user_id, input.study_id, input.reference, input.content],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Self::row_to_note(&row)?)
        } else {
            anyhow::bail!("Failed to create note")
        }
    }

    pub async fn get_note(&self, id: i64) -> Result<Option<Note>> {
        let query = r#"
            SELECT id, study_id, reference, content, created_at, updated_at
            FROM notes WHERE id = ? AND user_id = ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![id, self.user_id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_note(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Replaces a note's fields. Returns `None` when the note does not belong
    /// to this user.
    pub async fn update_note(&self, id: i64, input: NoteInput) -> Result<Option<Note>> {
        let updated = self
            .conn
            .execute(
                "UPDATE notes SET content = ?, study_id = ?, reference = ? WHERE id = ? AND user_id = ?",
                libsql::params![input.content, input.study_id, input.reference, id, self.user_id],
            )
            .await?;

        if updated == 0 {
            return Ok(None);
        }
        self.get_note(id).await
    }

    pub async fn delete_note(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM notes WHERE id = ? AND user_id = ?",
                libsql::params![id, self.user_id],
            )
            .await?;
        Ok(deleted > 0)
    }

    fn row_to_note(row: &libsql::Row) -> Result<Note> {
        Ok(Note {
            id: row.get(0)?,
            study_id: row.get(1)?,
            reference: row.get(2)?,
            content: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    // ------------------------------------------------------------------
    // Bookmarks
    // ------------------------------------------------------------------

    pub async fn list_bookmarks(&self) -> Result<Vec<Bookmark>> {
        let query = r#"
            SELECT id, study_id, reference, note, created_at
            FROM bookmarks
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
        "#;

        let mut rows = self.conn.query(query, libsql::params![self.user_id]).await?;

        let mut bookmarks = Vec::new();
        while let Some(row) = rows.next().await? {
            bookmarks.push(Self::row_to_bookmark(&row)?);
        }
        Ok(bookmarks)
    }

    pub async fn create_bookmark(&self, input: BookmarkInput) -> Result<Bookmark> {
        let query = r#"
            INSERT INTO bookmarks (user_id, study_id, reference, note)
            VALUES (?, ?, ?, ?)
            RETURNING id, study_id, reference, note, created_at
        "#;

        let mut rows = self
            .conn
            .query(
                query,
                libsql::params![self.user_id, input.study_id, input.reference, input.note],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Self::row_to_bookmark(&row)?)
        } else {
            anyhow::bail!("Failed to create bookmark")
        }
    }

    pub async fn delete_bookmark(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM bookmarks WHERE id = ? AND user_id = ?",
                libsql::params![id, self.user_id],
            )
            .await?;
        Ok(deleted > 0)
    }

    fn row_to_bookmark(row: &libsql::Row) -> Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            study_id: row.get(1)?,
            reference: row.get(2)?,
            note: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}
