use anyhow::Result;
use libsql::Connection;

use super::Scripture;
use crate::content::{TopicSeed, topic_catalogue};
use crate::db::Database;
use crate::reference::expand_reference;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedStats {
    pub topics: usize,
    pub linked: usize,
    pub missing: usize,
}

/// Seeds the topic catalogue bundled under `data/topics.yaml`.
pub async fn seed_bundled_topics(db: &Database) -> Result<SeedStats> {
    let topics = topic_catalogue()?;
    seed_topics(db, &topics).await
}

/// Upserts each topic and links every verse its references expand to.
/// Verses that are not in the store are counted and skipped. Safe to rerun.
pub async fn seed_topics(db: &Database, topics: &[TopicSeed]) -> Result<SeedStats> {
    let tx = db.begin().await?;
    let result = seed_all(tx.connection(), topics).await;
    let stats = tx.finish(result).await?;

    tracing::info!(
        topics = stats.topics,
        linked = stats.linked,
        missing = stats.missing,
        "seeded topics"
    );
    Ok(stats)
}

async fn seed_all(conn: &Connection, topics: &[TopicSeed]) -> Result<SeedStats> {
    let scripture = Scripture::new(conn);
    let mut stats = SeedStats::default();

    for topic in topics {
        let topic_id = scripture.upsert_topic(topic).await?;
        stats.topics += 1;

        for reference in &topic.references {
            let verses = expand_reference(reference);
            if verses.is_empty() {
                tracing::warn!(topic = %topic.slug, reference = %reference, "reference expands to nothing");
                continue;
            }

            for coord in verses {
                match scripture.verse_id(&coord).await? {
                    Some(bible_id) => {
                        if scripture.link_passage(topic_id, bible_id).await? {
                            stats.linked += 1;
                        }
                    }
                    None => {
                        stats.missing += 1;
                        tracing::debug!(
                            topic = %topic.slug,
                            book = %coord.book,
                            chapter = coord.chapter,
                            verse = coord.verse,
                            "verse not in store"
                        );
                    }
                }
            }
        }
    }

    Ok(stats)
}
