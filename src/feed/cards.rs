use std::ops::Range;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;
use url::Url;

use crate::api::Reel;
use crate::util::{resolve_media_url, sanitize_display, UrlValidationError};

const UNTITLED: &str = "Untitled Reel";
const UNKNOWN_DATE: &str = "Unknown date";
const INVALID_DATE: &str = "Invalid Date";

/// A reel that could not be turned into a card.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("reel {reel_id} has no media URL")]
    MissingMedia { reel_id: i64 },
    #[error("reel {reel_id} has an unusable media URL: {source}")]
    BadMediaUrl {
        reel_id: i64,
        #[source]
        source: UrlValidationError,
    },
}

/// Display model for one rendered feed position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReelCard {
    /// Position in the rendered feed.
    pub index: usize,
    pub reel_id: i64,
    pub media_url: Url,
    pub title: String,
    pub description: Option<String>,
    pub date_label: String,
    /// Registered with the visibility tracker.
    pub wired: bool,
}

/// Build the card for `reel` at rendered position `index`.
pub fn render_card(index: usize, reel: &Reel, base_url: &Url) -> Result<ReelCard, RenderError> {
    if reel.url.trim().is_empty() {
        return Err(RenderError::MissingMedia { reel_id: reel.id });
    }
    let media_url =
        resolve_media_url(base_url, &reel.url).map_err(|source| RenderError::BadMediaUrl {
            reel_id: reel.id,
            source,
        })?;

    Ok(ReelCard {
        index,
        reel_id: reel.id,
        media_url,
        title: non_blank(reel.title.as_deref()).unwrap_or_else(|| UNTITLED.to_string()),
        description: non_blank(reel.description.as_deref()),
        date_label: format_date(reel.created_at.as_deref()),
        wired: false,
    })
}

fn non_blank(text: Option<&str>) -> Option<String> {
    let clean = sanitize_display(text?);
    let trimmed = clean.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Format a backend timestamp like `Jan 5, 2026`.
///
/// Accepts RFC 3339, naive ISO 8601 (`2026-01-05T10:30:00`, with `T` or a
/// space) and bare dates.
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return UNKNOWN_DATE.to_string();
    };
    match parse_date(raw) {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => INVALID_DATE.to_string(),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// The rendered cards, kept index-aligned with the rendered feed.
#[derive(Debug)]
pub struct CardList {
    base_url: Url,
    cards: Vec<ReelCard>,
}

impl CardList {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            cards: Vec::new(),
        }
    }

    /// Throw away every card and render `items` from scratch.
    ///
    /// On failure the list is left empty.
    pub fn rerender(&mut self, items: &[Reel]) -> Result<(), RenderError> {
        self.cards.clear();
        let cards = items
            .iter()
            .enumerate()
            .map(|(index, reel)| render_card(index, reel, &self.base_url))
            .collect::<Result<Vec<_>, _>>()?;
        self.cards = cards;
        Ok(())
    }

    /// Render the items at `range` of `items`, which must start at the
    /// current end of the list.
    pub fn append(&mut self, items: &[Reel], range: Range<usize>) -> Result<(), RenderError> {
        debug_assert_eq!(range.start, self.cards.len());
        let mut added = Vec::with_capacity(range.len());
        for index in range {
            if let Some(reel) = items.get(index) {
                added.push(render_card(index, reel, &self.base_url)?);
            }
        }
        self.cards.extend(added);
        Ok(())
    }

    /// Cards not yet registered with the tracker, marked as wired.
    pub fn wire_pending(&mut self) -> Vec<(usize, i64)> {
        self.cards
            .iter_mut()
            .filter(|card| !card.wired)
            .map(|card| {
                card.wired = true;
                (card.index, card.reel_id)
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    pub fn get(&self, index: usize) -> Option<&ReelCard> {
        self.cards.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReelCard> {
        self.cards.iter()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base() -> Url {
        Url::parse("http://localhost:5000/").unwrap()
    }

    fn reel(id: i64, url: &str) -> Reel {
        Reel {
            id,
            url: url.to_string(),
            title: Some(format!("Reel {id}")),
            description: None,
            created_at: Some("2026-01-05T10:30:00".to_string()),
        }
    }

    #[test]
    fn test_render_card_fields() {
        let mut r = reel(3, "/static/videos/cat.mp4");
        r.description = Some("  A cat\nnapping  ".to_string());
        let card = render_card(7, &r, &base()).unwrap();
        assert_eq!(
            card,
            ReelCard {
                index: 7,
                reel_id: 3,
                media_url: Url::parse("http://localhost:5000/static/videos/cat.mp4").unwrap(),
                title: "Reel 3".to_string(),
                description: Some("A cat napping".to_string()),
                date_label: "Jan 5, 2026".to_string(),
                wired: false,
            }
        );
    }

    #[test]
    fn test_missing_title_defaults() {
        let mut r = reel(1, "a.mp4");
        r.title = None;
        assert_eq!(render_card(0, &r, &base()).unwrap().title, "Untitled Reel");
        r.title = Some("   ".to_string());
        assert_eq!(render_card(0, &r, &base()).unwrap().title, "Untitled Reel");
    }

    #[test]
    fn test_blank_media_url_is_error() {
        let r = reel(9, "  ");
        assert!(matches!(
            render_card(0, &r, &base()),
            Err(RenderError::MissingMedia { reel_id: 9 })
        ));
    }

    #[test]
    fn test_non_http_media_url_is_error() {
        let r = reel(9, "file:///etc/passwd");
        assert!(matches!(
            render_card(0, &r, &base()),
            Err(RenderError::BadMediaUrl { reel_id: 9, .. })
        ));
    }

    #[test]
    fn test_format_date_variants() {
        assert_eq!(format_date(Some("2026-10-16T08:00:00+00:00")), "Oct 16, 2026");
        assert_eq!(format_date(Some("2026-10-16 08:00:00")), "Oct 16, 2026");
        assert_eq!(format_date(Some("2026-03-01")), "Mar 1, 2026");
        assert_eq!(format_date(Some("2026-03-01T08:00:00.123456")), "Mar 1, 2026");
        assert_eq!(format_date(None), "Unknown date");
        assert_eq!(format_date(Some("")), "Unknown date");
        assert_eq!(format_date(Some("yesterday")), "Invalid Date");
    }

    #[test]
    fn test_rerender_replaces_and_unwires() {
        let mut cards = CardList::new(base());
        cards.rerender(&[reel(1, "a.mp4"), reel(2, "b.mp4")]).unwrap();
        assert_eq!(cards.wire_pending(), vec![(0, 1), (1, 2)]);

        cards.rerender(&[reel(5, "e.mp4")]).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards.wire_pending(), vec![(0, 5)]);
    }

    #[test]
    fn test_append_wires_only_new_cards() {
        let items = vec![reel(1, "a.mp4"), reel(2, "b.mp4"), reel(2, "b.mp4"), reel(1, "a.mp4")];
        let mut cards = CardList::new(base());
        cards.rerender(&items[..2]).unwrap();
        cards.wire_pending();

        cards.append(&items, 2..4).unwrap();
        assert_eq!(cards.wire_pending(), vec![(2, 2), (3, 1)]);
        assert!(cards.wire_pending().is_empty());
    }

    #[test]
    fn test_rerender_failure_leaves_list_empty() {
        let mut cards = CardList::new(base());
        cards.rerender(&[reel(1, "a.mp4")]).unwrap();
        let err = cards.rerender(&[reel(2, "b.mp4"), reel(3, "")]).unwrap_err();
        assert!(err.to_string().contains("reel 3"));
        assert!(cards.is_empty());
    }
}
