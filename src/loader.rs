//! JSON loaders for the content source, log store and vocabulary store
//!
//! The curation core only sees already-resolved inputs; every file access
//! and its failure handling lives here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::DataConfig;
use crate::error::{Error, Result};
use crate::recommendation::{
    ContentCatalog, ContentItem, LearnerSnapshot, PerformanceLogEntry, TopicPreferences,
};

/// Task log document as written by the log store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskLogDocument {
    #[serde(default, alias = "completedTasks")]
    pub completed_tasks: usize,
    #[serde(default)]
    pub entries: Vec<PerformanceLogEntry>,
}

/// Parse and validate the content catalog
///
/// Any invalid item fails the whole load.
pub fn load_catalog(path: &Path) -> Result<ContentCatalog> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let items: Vec<ContentItem> = serde_json::from_str(&contents)?;
    debug!("Parsed {} content items from {}", items.len(), path.display());
    ContentCatalog::new(items)
}

/// Read the task log document; a missing file means no history yet
pub fn load_logs(path: &Path) -> Result<TaskLogDocument> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Task log {} not found, starting without history", path.display());
            return Ok(TaskLogDocument::default());
        }
        Err(e) => return Err(Error::io(path, e)),
    };

    let document: TaskLogDocument = serde_json::from_str(&contents)?;
    info!(
        "📝 Loaded {} task logs ({} completed tasks)",
        document.entries.len(),
        document.completed_tasks
    );
    Ok(document)
}

/// Word -> mastery map; never fails, any problem yields an empty map
pub fn load_vocabulary(path: Option<&Path>) -> HashMap<String, f32> {
    let Some(path) = path else {
        return HashMap::new();
    };

    let parsed = std::fs::read_to_string(path)
        .map_err(|e| Error::io(path, e))
        .and_then(|contents| {
            serde_json::from_str::<HashMap<String, f32>>(&contents).map_err(Error::from)
        });

    match parsed {
        Ok(mastery) => {
            debug!("Loaded mastery for {} words", mastery.len());
            mastery
        }
        Err(err) => {
            warn!("Vocabulary unavailable, scoring without mastery data: {}", err);
            HashMap::new()
        }
    }
}

/// Assemble a learner snapshot from the configured files
pub fn load_snapshot(
    data: &DataConfig,
    topic_preferences: TopicPreferences,
) -> Result<LearnerSnapshot> {
    let logs = load_logs(&data.logs_path)?;
    Ok(LearnerSnapshot {
        logs: logs.entries,
        completed_tasks: logs.completed_tasks,
        vocabulary_mastery: load_vocabulary(data.vocabulary_path.as_deref()),
        topic_preferences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const CATALOG: &str = r#"[
        {
            "id": "r1",
            "title": "Morning News",
            "difficulty": "B1+",
            "estimated_minutes": 8,
            "topics": ["News", "Daily Life"],
            "vocabulary_focus": ["headline"],
            "word_count": 420,
            "average_sentence_length": 14.5,
            "eligible_weeks": {"start": 5, "end": 12},
            "source_type": "news_article"
        }
    ]"#;

    #[test]
    fn test_load_catalog() {
        let file = file_with(CATALOG);
        let catalog = load_catalog(file.path()).unwrap();
        let item = catalog.get("r1").unwrap();
        assert_eq!(item.topics, vec!["news", "daily life"]);
        assert_eq!(item.eligible_weeks.end, 12);
    }

    #[test]
    fn test_load_catalog_rejects_negative_minutes() {
        let file =
            file_with(&CATALOG.replace("\"estimated_minutes\": 8", "\"estimated_minutes\": -8"));
        let err = load_catalog(file.path()).unwrap_err();
        assert_eq!(err.error_code(), "CONTENT_ERROR");
    }

    #[test]
    fn test_load_catalog_malformed_json() {
        let file = file_with("[{");
        assert_eq!(load_catalog(file.path()).unwrap_err().error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_load_logs_accepts_camel_case() {
        let file = file_with(
            r#"{"completedTasks": 42, "entries": [
                {"category": "reading", "correct": true, "timestampMillis": 1000, "minutesSpent": 9}
            ]}"#,
        );
        let document = load_logs(file.path()).unwrap();
        assert_eq!(document.completed_tasks, 42);
        assert_eq!(document.entries[0].minutes_spent, 9);
    }

    #[test]
    fn test_missing_logs_mean_no_history() {
        let document = load_logs(Path::new("/nonexistent/task_logs.json")).unwrap();
        assert!(document.entries.is_empty());
        assert_eq!(document.completed_tasks, 0);
    }

    #[test]
    fn test_vocabulary_failures_yield_empty_map() {
        assert!(load_vocabulary(None).is_empty());
        assert!(load_vocabulary(Some(Path::new("/nonexistent/vocab.json"))).is_empty());
        let garbage = file_with("not json");
        assert!(load_vocabulary(Some(garbage.path())).is_empty());

        let good = file_with(r#"{"headline": 0.9, "forecast": 0.2}"#);
        let mastery = load_vocabulary(Some(good.path()));
        assert_eq!(mastery.get("headline"), Some(&0.9));
    }
}
