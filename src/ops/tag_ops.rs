use std::sync::LazyLock;

use regex::Regex;

use crate::model::tag::{Tag, palette_color};

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid color regex"));

/// Error type for tag operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TagError {
    #[error("tag not found: {0}")]
    NotFound(String),
    #[error("invalid color '{0}' (expected #rrggbb)")]
    InvalidColor(String),
    #[error("tag name cannot be empty")]
    EmptyName,
}

/// Add a tag named `name` with the next palette color.
/// Returns the new tag, or `None` if the name is blank.
pub fn add_tag(tags: &mut Vec<Tag>, name: &str, id: String) -> Option<Tag> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let tag = Tag::new(id, name, palette_color(tags.len()));
    tags.push(tag.clone());
    Some(tag)
}

/// Remove a tag. Returns false if no tag has that id.
pub fn remove_tag(tags: &mut Vec<Tag>, id: &str) -> bool {
    let before = tags.len();
    tags.retain(|t| t.id != id);
    tags.len() != before
}

/// Rename and/or recolor a tag
pub fn update_tag(
    tags: &mut [Tag],
    id: &str,
    name: Option<&str>,
    color: Option<&str>,
) -> Result<(), TagError> {
    let name = name.map(str::trim);
    if name == Some("") {
        return Err(TagError::EmptyName);
    }
    if let Some(c) = color
        && !COLOR_RE.is_match(c)
    {
        return Err(TagError::InvalidColor(c.to_string()));
    }
    let tag = tags
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| TagError::NotFound(id.to_string()))?;
    if let Some(n) = name {
        tag.name = n.to_string();
    }
    if let Some(c) = color {
        tag.color = c.to_lowercase();
    }
    Ok(())
}

/// Find a tag by exact id or by name
pub fn find_tag<'a>(tags: &'a [Tag], reference: &str) -> Option<&'a Tag> {
    tags.iter()
        .find(|t| t.id == reference)
        .or_else(|| tags.iter().find(|t| t.name == reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tag::seed_tags;

    #[test]
    fn add_uses_palette_by_count() {
        let mut tags = seed_tags();
        let tag = add_tag(&mut tags, " errands ", "4".into()).unwrap();
        assert_eq!(tag.name, "errands");
        assert_eq!(tag.color, "#22c55e");
        assert_eq!(tags.len(), 4);
    }

    #[test]
    fn add_blank_is_ignored() {
        let mut tags = Vec::new();
        assert!(add_tag(&mut tags, "  ", "x".into()).is_none());
        assert!(tags.is_empty());
    }

    #[test]
    fn remove() {
        let mut tags = seed_tags();
        assert!(remove_tag(&mut tags, "2"));
        assert!(!remove_tag(&mut tags, "2"));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn update_name_and_color() {
        let mut tags = seed_tags();
        update_tag(&mut tags, "1", Some("asap"), Some("#ABCDEF")).unwrap();
        assert_eq!(tags[0].name, "asap");
        assert_eq!(tags[0].color, "#abcdef");
    }

    #[test]
    fn update_rejects_bad_input() {
        let mut tags = seed_tags();
        assert_eq!(
            update_tag(&mut tags, "1", None, Some("red")),
            Err(TagError::InvalidColor("red".into()))
        );
        assert_eq!(
            update_tag(&mut tags, "1", Some(" "), None),
            Err(TagError::EmptyName)
        );
        assert_eq!(
            update_tag(&mut tags, "9", Some("x"), None),
            Err(TagError::NotFound("9".into()))
        );
        assert_eq!(tags, seed_tags());
    }

    #[test]
    fn find_by_id_or_name() {
        let tags = seed_tags();
        assert_eq!(find_tag(&tags, "3").unwrap().name, "later");
        assert_eq!(find_tag(&tags, "urgent").unwrap().id, "1");
        assert!(find_tag(&tags, "nope").is_none());
    }
}
