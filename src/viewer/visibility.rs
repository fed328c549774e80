use std::collections::BTreeMap;
use std::ops::Range;

/// An item counts as in view once strictly more than half of it is visible.
pub const VISIBILITY_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Playing,
}

/// A threshold crossing for one observed element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityEvent {
    pub index: usize,
    pub reel_id: i64,
    /// `true` on entering view, `false` on leaving it.
    pub visible: bool,
}

#[derive(Debug, Clone, Copy)]
struct Observed {
    reel_id: i64,
    state: Visibility,
}

/// Per-element Hidden/Playing state machine fed with intersection ratios.
///
/// Events are only produced on transitions, so repeatedly observing an
/// element that stays in view is silent.
#[derive(Debug, Default)]
pub struct VisibilityTracker {
    observed: BTreeMap<usize, Observed>,
}

impl VisibilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start observing element `index`. Returns `false` if it already was.
    pub fn register(&mut self, index: usize, reel_id: i64) -> bool {
        if self.observed.contains_key(&index) {
            return false;
        }
        self.observed.insert(
            index,
            Observed {
                reel_id,
                state: Visibility::Hidden,
            },
        );
        true
    }

    pub fn unregister(&mut self, index: usize) -> bool {
        self.observed.remove(&index).is_some()
    }

    pub fn clear(&mut self) {
        self.observed.clear();
    }

    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    pub fn state(&self, index: usize) -> Option<Visibility> {
        self.observed.get(&index).map(|o| o.state)
    }

    /// Feed one ratio sample for element `index`.
    pub fn observe(&mut self, index: usize, ratio: f64) -> Option<VisibilityEvent> {
        let entry = self.observed.get_mut(&index)?;
        let next = if ratio > VISIBILITY_THRESHOLD {
            Visibility::Playing
        } else {
            Visibility::Hidden
        };
        if next == entry.state {
            return None;
        }
        entry.state = next;
        Some(VisibilityEvent {
            index,
            reel_id: entry.reel_id,
            visible: next == Visibility::Playing,
        })
    }

    /// Observe every element in `window` plus any playing element outside
    /// it, in index order.
    pub fn observe_window<F>(&mut self, window: Range<usize>, ratio: F) -> Vec<VisibilityEvent>
    where
        F: Fn(usize) -> f64,
    {
        let mut indices: Vec<usize> = self
            .observed
            .iter()
            .filter(|(i, o)| o.state == Visibility::Playing && !window.contains(*i))
            .map(|(i, _)| *i)
            .collect();
        indices.extend(window.filter(|i| self.observed.contains_key(i)));
        indices.sort_unstable();

        indices
            .into_iter()
            .filter_map(|i| self.observe(i, ratio(i)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let mut tracker = VisibilityTracker::new();
        assert!(tracker.register(0, 10));
        assert!(!tracker.register(0, 99));
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.state(0), Some(Visibility::Hidden));
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut tracker = VisibilityTracker::new();
        tracker.register(0, 10);
        assert_eq!(tracker.observe(0, 0.5), None);
        let event = tracker.observe(0, 0.51).unwrap();
        assert_eq!(
            event,
            VisibilityEvent {
                index: 0,
                reel_id: 10,
                visible: true
            }
        );
        assert_eq!(tracker.observe(0, 1.0), None);
        assert!(!tracker.observe(0, 0.5).unwrap().visible);
    }

    #[test]
    fn test_unregistered_elements_ignored() {
        let mut tracker = VisibilityTracker::new();
        assert_eq!(tracker.observe(3, 1.0), None);
        tracker.register(3, 1);
        tracker.unregister(3);
        assert_eq!(tracker.observe(3, 1.0), None);
    }

    #[test]
    fn test_window_includes_playing_items_outside() {
        let mut tracker = VisibilityTracker::new();
        for i in 0..5 {
            tracker.register(i, i as i64 + 100);
        }
        tracker.observe(0, 1.0);

        // Jumped straight to item 4: item 0 must still be told it left.
        let events = tracker.observe_window(4..5, |i| if i == 4 { 1.0 } else { 0.0 });
        assert_eq!(
            events,
            vec![
                VisibilityEvent { index: 0, reel_id: 100, visible: false },
                VisibilityEvent { index: 4, reel_id: 104, visible: true },
            ]
        );
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut tracker = VisibilityTracker::new();
        tracker.register(0, 1);
        tracker.observe(0, 1.0);
        tracker.clear();
        assert!(tracker.is_empty());
        assert!(tracker.register(0, 1));
    }
}
