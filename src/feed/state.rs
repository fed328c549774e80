use std::collections::HashSet;
use std::ops::Range;

use rand::Rng;

use crate::api::Reel;
use crate::feed::shuffle;

/// Outcome of a growth request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Growth {
    /// Nothing was fetched, so there is nothing to resample.
    Empty,
    /// A previous growth has not finished; this request was dropped.
    Busy,
    /// A fresh shuffle was appended at these rendered indices.
    Appended(Range<usize>),
}

/// What [`FeedState::mark_viewed`] recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOutcome {
    /// The id was not in the viewed set before this call.
    pub first_view: bool,
    /// This call made the viewed set cover every fetched reel.
    pub all_viewed_now: bool,
}

/// Feed data for one load session.
///
/// `original` is the backend order from the last successful fetch and is
/// only replaced by the next fetch. `rendered` is what the user scrolls
/// through: it starts as a shuffle of `original` and only ever grows by
/// appending further shuffles, so items repeat once the feed wraps.
#[derive(Debug, Default)]
pub struct FeedState {
    original: Vec<Reel>,
    rendered: Vec<Reel>,
    viewed: HashSet<i64>,
    distinct_ids: usize,
    all_viewed: bool,
    growing: bool,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a freshly fetched list.
    pub fn apply_load<R: Rng + ?Sized>(&mut self, reels: Vec<Reel>, rng: &mut R) {
        self.rendered = shuffle(&reels, rng);
        self.distinct_ids = reels.iter().map(|r| r.id).collect::<HashSet<_>>().len();
        self.original = reels;
        self.viewed.clear();
        self.all_viewed = false;
        self.growing = false;
    }

    /// Append one more shuffle of the original list.
    ///
    /// The growth guard stays held until [`finish_growth`](Self::finish_growth).
    pub fn grow<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Growth {
        if self.original.is_empty() {
            return Growth::Empty;
        }
        if self.growing {
            return Growth::Busy;
        }
        self.growing = true;
        let start = self.rendered.len();
        let batch = shuffle(&self.original, rng);
        self.rendered.extend(batch);
        tracing::debug!(start, added = self.original.len(), "Appended reels");
        Growth::Appended(start..self.rendered.len())
    }

    /// Release the growth guard.
    pub fn finish_growth(&mut self) {
        self.growing = false;
    }

    pub fn is_growing(&self) -> bool {
        self.growing
    }

    pub fn mark_viewed(&mut self, reel_id: i64) -> ViewOutcome {
        let first_view = self.viewed.insert(reel_id);
        let mut all_viewed_now = false;
        if first_view && !self.all_viewed && self.viewed.len() >= self.distinct_ids {
            self.all_viewed = true;
            all_viewed_now = true;
        }
        ViewOutcome {
            first_view,
            all_viewed_now,
        }
    }

    pub fn has_viewed(&self, reel_id: i64) -> bool {
        self.viewed.contains(&reel_id)
    }

    pub fn viewed_count(&self) -> usize {
        self.viewed.len()
    }

    pub fn all_viewed(&self) -> bool {
        self.all_viewed
    }

    pub fn original(&self) -> &[Reel] {
        &self.original
    }

    pub fn rendered(&self) -> &[Reel] {
        &self.rendered
    }

    pub fn get(&self, index: usize) -> Option<&Reel> {
        self.rendered.get(index)
    }

    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn reels(n: i64) -> Vec<Reel> {
        (1..=n)
            .map(|id| Reel {
                id,
                url: format!("/static/videos/{id}.mp4"),
                title: None,
                description: None,
                created_at: None,
            })
            .collect()
    }

    fn sorted_ids(items: &[Reel]) -> Vec<i64> {
        let mut ids: Vec<i64> = items.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_load_renders_permutation_and_clears_views() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = FeedState::new();
        state.apply_load(reels(4), &mut rng);
        state.mark_viewed(1);

        state.apply_load(reels(5), &mut rng);
        assert_eq!(state.len(), 5);
        assert_eq!(state.viewed_count(), 0);
        assert_eq!(sorted_ids(state.rendered()), vec![1, 2, 3, 4, 5]);
        assert_eq!(sorted_ids(state.original()), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_growth_appends_full_shuffles() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut state = FeedState::new();
        state.apply_load(reels(3), &mut rng);
        let before: Vec<Reel> = state.rendered().to_vec();

        for k in 1..=4 {
            assert_eq!(state.grow(&mut rng), Growth::Appended(3 * k..3 * (k + 1)));
            state.finish_growth();
        }
        assert_eq!(state.len(), 15);
        assert_eq!(&state.rendered()[..3], before.as_slice());
        for chunk in state.rendered().chunks(3) {
            assert_eq!(sorted_ids(chunk), vec![1, 2, 3]);
        }
    }

    #[test]
    fn test_growth_dropped_while_busy() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = FeedState::new();
        state.apply_load(reels(2), &mut rng);
        assert!(matches!(state.grow(&mut rng), Growth::Appended(_)));
        assert_eq!(state.grow(&mut rng), Growth::Busy);
        assert_eq!(state.len(), 4);
        state.finish_growth();
        assert!(matches!(state.grow(&mut rng), Growth::Appended(_)));
    }

    #[test]
    fn test_growth_on_empty_feed() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut state = FeedState::new();
        state.apply_load(Vec::new(), &mut rng);
        assert_eq!(state.grow(&mut rng), Growth::Empty);
        assert!(state.is_empty());
        assert!(!state.is_growing());
    }

    #[test]
    fn test_reload_releases_growth_guard() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = FeedState::new();
        state.apply_load(reels(2), &mut rng);
        let _ = state.grow(&mut rng);
        state.apply_load(reels(2), &mut rng);
        assert!(!state.is_growing());
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_views_recorded_once() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut state = FeedState::new();
        state.apply_load(reels(2), &mut rng);

        let first = state.mark_viewed(1);
        assert!(first.first_view);
        assert!(!first.all_viewed_now);
        assert!(!state.mark_viewed(1).first_view);

        let last = state.mark_viewed(2);
        assert!(last.all_viewed_now);
        assert!(state.all_viewed());
        assert!(!state.mark_viewed(2).all_viewed_now);
        assert_eq!(state.viewed_count(), 2);
    }

    #[test]
    fn test_duplicate_ids_count_once_for_all_viewed() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut state = FeedState::new();
        let mut list = reels(2);
        list.push(list[0].clone());
        state.apply_load(list, &mut rng);
        state.mark_viewed(1);
        assert!(state.mark_viewed(2).all_viewed_now);
    }
}
