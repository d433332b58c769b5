use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, categorized group of shell command lines
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Snippet {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub commands: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub date_created: DateTime<Local>,
    pub last_modified: DateTime<Local>,
}

impl Snippet {
    pub fn new(
        name: String,
        description: String,
        category: String,
        commands: Vec<String>,
        tags: Vec<String>,
    ) -> Self {
        let now = Local::now();
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            category,
            commands,
            tags,
            date_created: now,
            last_modified: now,
        }
    }

    /// Refresh the modification timestamp after an edit
    pub fn touch(&mut self) {
        self.last_modified = Local::now();
    }

    /// All command lines joined into a single runnable block
    pub fn command_block(&self) -> String {
        self.commands.join("\n")
    }

    /// Case-insensitive substring match over all textual fields
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();

        self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.category.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
            || self
                .commands
                .iter()
                .any(|c| c.to_lowercase().contains(&query))
    }

    pub fn formatted_age(&self) -> String {
        let now = Local::now();
        let duration = now.signed_duration_since(self.last_modified);

        if duration.num_seconds() < 60 {
            format!("{}s ago", duration.num_seconds())
        } else if duration.num_minutes() < 60 {
            format!("{}m ago", duration.num_minutes())
        } else if duration.num_hours() < 24 {
            format!("{}h ago", duration.num_hours())
        } else {
            format!("{}d ago", duration.num_days())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snippet {
        Snippet::new(
            "Deploy api".to_string(),
            "Ship the API service".to_string(),
            "ops".to_string(),
            vec!["git pull".to_string(), "make deploy".to_string()],
            vec!["api".to_string(), "production".to_string()],
        )
    }

    #[test]
    fn matches_is_case_insensitive_across_fields() {
        let s = sample();
        assert!(s.matches("DEPLOY"));
        assert!(s.matches("ship"));
        assert!(s.matches("OPS"));
        assert!(s.matches("production"));
        assert!(s.matches("make dep"));
        assert!(!s.matches("kubernetes"));
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(sample().matches(""));
    }

    #[test]
    fn command_block_preserves_line_order() {
        assert_eq!(sample().command_block(), "git pull\nmake deploy");
    }

    #[test]
    fn touch_advances_last_modified() {
        let mut s = sample();
        let before = s.last_modified;
        std::thread::sleep(std::time::Duration::from_millis(5));
        s.touch();
        assert!(s.last_modified > before);
        assert_eq!(s.date_created, before);
    }
}
