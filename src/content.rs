//! Bundled study plans and the topic catalogue, embedded from `data/`.

use anyhow::Result;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};

#[derive(Embed)]
#[folder = "data"]
pub struct Content;

/// Catalogue order of the bundled study plans.
pub const STUDY_SLUGS: &[&str] = &["matthew", "esther", "fasting"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub reference: String,
    pub focus: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub question: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub prompt_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyDay {
    pub day: u32,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub readings: Vec<Reading>,
    #[serde(default)]
    pub prompts: Vec<Prompt>,
    #[serde(default)]
    pub reflection: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub estimated_minutes: u32,
    pub days: Vec<StudyDay>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicSeed {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default)]
    pub references: Vec<String>,
}

/// Loads every bundled plan in catalogue order. Plans that are missing or
/// fail to decode are skipped.
pub fn load_studies() -> Vec<StudyPlan> {
    STUDY_SLUGS
        .iter()
        .filter_map(|slug| match load_study(slug) {
            Ok(plan) => Some(plan),
            Err(e) => {
                tracing::warn!(study = *slug, error = %e, "skipping study plan");
                None
            }
        })
        .collect()
}

fn load_study(slug: &str) -> Result<StudyPlan> {
    let path = format!("studies/{slug}.json");
    let file = Content::get(&path).ok_or_else(|| anyhow::anyhow!("{path} is not bundled"))?;
    Ok(serde_json::from_slice(&file.data)?)
}

pub fn find_study(id: &str) -> Option<StudyPlan> {
    load_studies().into_iter().find(|plan| plan.id == id)
}

pub fn topic_catalogue() -> Result<Vec<TopicSeed>> {
    let file = Content::get("topics.yaml").ok_or_else(|| anyhow::anyhow!("topics.yaml is not bundled"))?;
    Ok(serde_yaml::from_slice(&file.data)?)
}
