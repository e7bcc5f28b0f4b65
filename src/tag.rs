//! Defines the [`Tag`] type, which represents an [`crate::item::Item`]
//! category rendered as an ikiwiki tag.

use crate::wxr::Category;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// A category of an item. Only categories carrying a `nicename` become tags;
/// the export repeats every category without one.
#[derive(Clone, Debug)]
pub struct Tag {
    /// The category's nicename, which identifies it.
    pub key: String,

    /// The tag as written into the page: the category name lower-cased, with
    /// spaces and slashes turned into hyphens.
    pub name: String,
}

impl Tag {
    /// Builds a tag from a category, or `None` when the category has no
    /// nicename.
    pub fn from_category(category: &Category) -> Option<Tag> {
        let key = category.nicename.as_deref()?;
        let display = if category.name.trim().is_empty() {
            key
        } else {
            category.name.trim()
        };
        Some(Tag {
            key: key.to_owned(),
            name: display.to_lowercase().replace([' ', '/'], "-"),
        })
    }
}

impl Hash for Tag {
    /// Implements [`Hash`] for [`Tag`] by delegating directly to the `key`
    /// field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state)
    }
}

impl PartialEq for Tag {
    /// Implements [`PartialEq`] and [`Eq`] for [`Tag`] by delegating directly
    /// to the `key` field.
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for Tag {}

/// Returns the distinct tags of `categories` in document order.
pub fn tags(categories: &[Category]) -> Vec<Tag> {
    let mut seen: HashSet<Tag> = HashSet::new();
    categories
        .iter()
        .filter_map(Tag::from_category)
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn category(nicename: Option<&str>, name: &str) -> Category {
        Category {
            nicename: nicename.map(str::to_owned),
            name: name.to_owned(),
        }
    }

    #[test]
    fn test_duplicate_display_form_yields_one_tag() {
        let found = tags(&[category(None, "Health"), category(Some("health"), "Health")]);
        assert_eq!(1, found.len());
        assert_eq!("health", found[0].name);
    }

    #[test]
    fn test_repeated_nicename_yields_one_tag() {
        let found = tags(&[
            category(Some("news"), "News"),
            category(Some("misc"), "Misc"),
            category(Some("news"), "News"),
        ]);
        let names: Vec<&str> = found.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(vec!["news", "misc"], names);
    }

    #[test]
    fn test_spaces_and_slashes_become_hyphens() {
        let found = tags(&[category(Some("rust-lang"), "Rust Lang/Tips")]);
        assert_eq!("rust-lang-tips", found[0].name);
    }

    #[test]
    fn test_empty_name_uses_nicename() {
        let found = tags(&[category(Some("misc"), "")]);
        assert_eq!("misc", found[0].name);
    }
}
