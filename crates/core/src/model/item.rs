use thiserror::Error;

use crate::model::{ItemId, Label};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ItemError {
    #[error("item text cannot be empty")]
    EmptyText,
}

//
// ─── ITEM ─────────────────────────────────────────────────────────────────────
//

/// One text to be annotated, together with its gold label.
///
/// The headline is only present for tasks that carry one; an empty headline
/// in the source data is normalized away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    id: ItemId,
    text: String,
    headline: Option<String>,
    gold: Label,
}

impl Item {
    /// Build a validated item.
    ///
    /// # Errors
    ///
    /// Returns `ItemError::EmptyText` if `text` is empty or whitespace-only.
    pub fn new(
        id: ItemId,
        text: impl Into<String>,
        headline: Option<String>,
        gold: Label,
    ) -> Result<Self, ItemError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ItemError::EmptyText);
        }
        let headline = headline.filter(|h| !h.trim().is_empty());
        Ok(Self {
            id,
            text,
            headline,
            gold,
        })
    }

    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn headline(&self) -> Option<&str> {
        self.headline.as_deref()
    }

    #[must_use]
    pub fn gold(&self) -> Label {
        self.gold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_fails_if_text_empty() {
        let err = Item::new(ItemId::new(1), "   ", None, Label::Positive).unwrap_err();
        assert!(matches!(err, ItemError::EmptyText));
    }

    #[test]
    fn empty_headline_is_normalized_to_none() {
        let item = Item::new(
            ItemId::new(1),
            "some tweet",
            Some(String::new()),
            Label::Negative,
        )
        .unwrap();
        assert_eq!(item.headline(), None);
    }

    #[test]
    fn headline_is_kept_when_present() {
        let item = Item::new(
            ItemId::new(2),
            "body",
            Some("Breaking".to_string()),
            Label::Positive,
        )
        .unwrap();
        assert_eq!(item.headline(), Some("Breaking"));
    }
}
