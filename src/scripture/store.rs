use anyhow::Result;
use libsql::Connection;
use serde::{Deserialize, Serialize};

use crate::content::TopicSeed;
use crate::reference::VerseCoordinate;

/// Maximum rows returned by a full-text search.
pub const SEARCH_LIMIT: i64 = 50;

/// Verses on either side of a looked-up verse.
pub const CONTEXT_RADIUS: i64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    pub id: i64,
    pub book: String,
    pub chapter: i64,
    pub verse: i64,
    pub text: String,
    pub testament: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextVerse {
    pub verse: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRef {
    pub slug: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub filters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub book: String,
    pub chapter: i64,
    pub verse: i64,
    pub text: String,
    pub testament: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: i64,
    pub book: String,
    pub chapter: i64,
    pub verse: i64,
    pub text: String,
    pub testament: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub testament: Option<String>,
    pub book: Option<String>,
    /// Topic slug the verse must be linked to.
    pub topic: Option<String>,
    /// Substring of a linked topic's filter list.
    pub focus: Option<String>,
}

pub struct Scripture<'a> {
    conn: &'a Connection,
}

impl<'a> Scripture<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ------------------------------------------------------------------
    // Verses
    // ------------------------------------------------------------------

    pub async fn find_verse(&self, book: &str, chapter: i64, verse: i64) -> Result<Option<Verse>> {
        let query = r#"
            SELECT id, book, chapter, verse, text, testament
            FROM bible
            WHERE book = ? AND chapter = ? AND verse = ?
        "#;

        let mut rows = self
            .conn
            .query(query, libsql::params![book, chapter, verse])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Verse {
                id: row.get(0)?,
                book: row.get(1)?,
                chapter: row.get(2)?,
                verse: row.get(3)?,
                text: row.get(4)?,
                testament: row.get(5)?,
            }))
        } else {
            Ok(None)
        }
    }

    pub async fn verse_id(&self, coord: &VerseCoordinate) -> Result<Option<i64>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id FROM bible WHERE book = ? AND chapter = ? AND verse = ?",
                libsql::params![coord.book.as_str(), i64::from(coord.chapter), i64::from(coord.verse)],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    /// The verses within [`CONTEXT_RADIUS`] of `verse` in the same chapter.
    pub async fn context(&self, book: &str, chapter: i64, verse: i64) -> Result<Vec<ContextVerse>> {
        let start = (verse - CONTEXT_RADIUS).max(1);
        let end = verse + CONTEXT_RADIUS;
        let query = r#"
            SELECT verse, text FROM bible
            WHERE book = ? AND chapter = ? AND verse BETWEEN ? AND ?
            ORDER BY verse
        "#;

        let mut rows = self
            .conn
            .query(query, libsql::params![book, chapter, start, end])
            .await?;

        let mut context = Vec::new();
        while let Some(row) = rows.next().await? {
            context.push(ContextVerse {
                verse: row.get(0)?,
                text: row.get(1)?,
            });
        }
        Ok(context)
    }

    pub async fn topics_for_verse(&self, bible_id: i64) -> Result<Vec<TopicRef>> {
        let query = r#"
            SELECT t.slug, t.title
            FROM topic_passages tp
            JOIN topics t ON t.id = tp.topic_id
            WHERE tp.bible_id = ?
            ORDER BY t.title
        "#;

        let mut rows = self.conn.query(query, libsql::params![bible_id]).await?;

        let mut topics = Vec::new();
        while let Some(row) = rows.next().await? {
            topics.push(TopicRef {
                slug: row.get(0)?,
                title: row.get(1)?,
            });
        }
        Ok(topics)
    }

    pub async fn search(&self, text: &str, filters: &SearchFilters) -> Result<Vec<SearchHit>> {
        let mut sql = String::from(
            r#"
SELECT b.id, b.book, b.chapter, b.verse, b.text, b.testament,
       snippet(bible_fts, -1, '<mark>', '</mark>', ' … ', 8) AS snippet
FROM bible_fts
JOIN bible b ON b.id = bible_fts.rowid
"#,
        );
        let mut conditions = vec!["bible_fts MATCH ?".to_string()];
        let mut params: Vec<libsql::Value> = vec![text.to_string().into()];

        if let Some(testament) = &filters.testament {
            conditions.push("b.testament = ?".to_string());
            params.push(testament.clone().into());
        }
        if let Some(book) = &filters.book {
            conditions.push("b.book = ?".to_string());
            params.push(book.clone().into());
        }

        let mut topic_conditions = Vec::new();
        if let Some(slug) = &filters.topic {
            topic_conditions.push("t.slug = ?");
            params.push(slug.clone().into());
        }
        if let Some(focus) = &filters.focus {
            topic_conditions.push("t.filters LIKE ?");
            params.push(format!("%{}%", focus).into());
        }
        if !topic_conditions.is_empty() {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM topic_passages tp JOIN topics t ON t.id = tp.topic_id WHERE tp.bible_id = b.id AND {})",
                topic_conditions.join(" AND ")
            ));
        }

        sql.push_str(&format!(
            "WHERE {}\nORDER BY b.book, b.chapter, b.verse\nLIMIT {}",
            conditions.join(" AND "),
            SEARCH_LIMIT
        ));

        // Everything but `text` is bound as a plain value, so a failure to
        // prepare or step this statement comes from the MATCH expression.
        let mut rows = self.conn.query(&sql, params).await.map_err(InvalidSearchQuery)?;

        let mut hits = Vec::new();
        while let Some(row) = rows.next().await.map_err(InvalidSearchQuery)? {
            hits.push(SearchHit {
                id: row.get(0)?,
                book: row.get(1)?,
                chapter: row.get(2)?,
                verse: row.get(3)?,
                text: row.get(4)?,
                testament: row.get(5)?,
                snippet: row.get(6)?,
            });
        }
        Ok(hits)
    }

    // ------------------------------------------------------------------
    // Topics
    // ------------------------------------------------------------------

    pub async fn list_topics(&self, filter: Option<&str>, search: Option<&str>) -> Result<Vec<Topic>> {
        let mut sql = String::from("SELECT id, slug, title, summary, filters FROM topics");
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(filter) = filter {
            conditions.push("filters LIKE ?");
            params.push(format!("%{}%", filter).into());
        }
        if let Some(search) = search {
            conditions.push("(title LIKE ? OR summary LIKE ?)");
            params.push(format!("%{}%", search).into());
            params.push(format!("%{}%", search).into());
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY title");

        let mut rows = self.conn.query(&sql, params).await?;

        let mut topics = Vec::new();
        while let Some(row) = rows.next().await? {
            topics.push(Self::row_to_topic(&row)?);
        }
        Ok(topics)
    }

    pub async fn find_topic(&self, slug: &str) -> Result<Option<Topic>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, slug, title, summary, filters FROM topics WHERE slug = ?",
                libsql::params![slug],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_topic(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn passages(&self, topic_id: i64) -> Result<Vec<Passage>> {
        let query = r#"
            SELECT b.book, b.chapter, b.verse, b.text, b.testament
            FROM topic_passages tp
            JOIN bible b ON b.id = tp.bible_id
            WHERE tp.topic_id = ?
            ORDER BY b.book, b.chapter, b.verse
        "#;

        let mut rows = self.conn.query(query, libsql::params![topic_id]).await?;

        let mut passages = Vec::new();
        while let Some(row) = rows.next().await? {
            passages.push(Passage {
                book: row.get(0)?,
                chapter: row.get(1)?,
                verse: row.get(2)?,
                text: row.get(3)?,
                testament: row.get(4)?,
            });
        }
        Ok(passages)
    }

    /// Inserts the topic or refreshes its title, summary, and filters.
    pub async fn upsert_topic(&self, seed: &TopicSeed) -> Result<i64> {
        let query = r#"
            INSERT INTO topics (slug, title, summary, filters)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(slug) DO UPDATE SET
                title = excluded.title,
                summary = excluded.summary,
                filters = excluded.filters
            RETURNING id
        "#;

        let filters = serde_json::to_string(&seed.filters)?;
        let mut rows = self
            .conn
            .query(
                query,
                libsql::params![seed.slug.as_str(), seed.title.as_str(), seed.summary.as_str(), filters],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(row.get(0)?)
        } else {
            anyhow::bail!("Failed to upsert topic {}", seed.slug)
        }
    }

    /// Links a verse to a topic. Returns `false` if the link already existed.
    pub async fn link_passage(&self, topic_id: i64, bible_id: i64) -> Result<bool> {
        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO topic_passages (topic_id, bible_id) VALUES (?, ?)",
                libsql::params![topic_id, bible_id],
            )
            .await?;
        Ok(inserted > 0)
    }

    fn row_to_topic(row: &libsql::Row) -> Result<Topic> {
        let slug: String = row.get(1)?;
        let raw_filters: Option<String> = row.get(4)?;
        let filters = match raw_filters.as_deref() {
            Some(raw) if !raw.is_empty() => serde_json::from_str(raw).unwrap_or_else(|e| {
                tracing::warn!(topic = %slug, error = %e, "topic filters are not a JSON list");
                vec![]
            }),
            _ => vec![],
        };

        Ok(Topic {
            id: row.get(0)?,
            slug,
            title: row.get(2)?,
            summary: row.get(3)?,
            filters,
        })
    }
}

/// SQLite refused the text handed to [`Scripture::search`]: bad FTS5 syntax,
/// an unknown column filter such as `John:3`, and the like.
#[derive(Debug, thiserror::Error)]
#[error("invalid search query: {0}")]
pub struct InvalidSearchQuery(#[source] libsql::Error);

pub fn is_match_syntax_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<InvalidSearchQuery>().is_some()
}
