use serde::{Deserialize, Serialize};

/// Colors handed out to new tags, round-robin by tag count
pub const DEFAULT_COLORS: [&str; 10] = [
    "#6366f1", "#ec4899", "#f59e0b", "#22c55e", "#06b6d4", "#8b5cf6", "#ef4444", "#14b8a6",
    "#f97316", "#64748b",
];

/// A named, colored label. Tags are advisory and not attached to tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl Tag {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Tag {
            id: id.into(),
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Tags present in a fresh store
pub fn seed_tags() -> Vec<Tag> {
    vec![
        Tag::new("1", "urgent", "#ef4444"),
        Tag::new("2", "important", "#f59e0b"),
        Tag::new("3", "later", "#64748b"),
    ]
}

/// Palette color for the next tag given how many exist already
pub fn palette_color(existing: usize) -> &'static str {
    DEFAULT_COLORS[existing % DEFAULT_COLORS.len()]
}
