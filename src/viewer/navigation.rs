use std::time::Duration;

/// Misalignment beyond which a settled scroll snaps to the nearest reel.
pub const SNAP_THRESHOLD_PX: u64 = 50;
/// Minimum vertical drag that counts as a swipe.
pub const SWIPE_THRESHOLD_PX: i64 = 50;
/// Grow the feed once the current reel is this close to the end.
pub const GROWTH_MARGIN: usize = 3;

pub const SCROLL_SETTLE: Duration = Duration::from_millis(150);
pub const WHEEL_SETTLE: Duration = Duration::from_millis(100);
/// How long a programmatic scroll holds the animation lock.
pub const SNAP_LOCK: Duration = Duration::from_millis(500);
/// Delay before retrying a scroll target that needed the feed to grow.
pub const RETRY_DELAY: Duration = Duration::from_millis(100);
/// Delay between a muted autoplay start and the unmute attempt.
pub const UNMUTE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavigationState {
    /// Best-effort pointer into the rendered feed.
    pub current_index: usize,
    /// Set while a programmatic scroll owns the viewport.
    pub is_animating_scroll: bool,
}

/// A discrete navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavIntent {
    Next,
    Previous,
    First,
    /// Grow the feed, then jump to its new end.
    Last,
    /// Vertical drag from `start_y` to `end_y` in pixels.
    Swipe { start_y: i64, end_y: i64 },
}

impl NavIntent {
    /// Reduce a swipe to `Next`/`Previous`, or `None` when it is too short.
    ///
    /// Dragging upwards (finger moves up) advances the feed.
    pub fn resolve(self) -> Option<NavIntent> {
        match self {
            NavIntent::Swipe { start_y, end_y } => {
                let diff = start_y - end_y;
                if diff.abs() <= SWIPE_THRESHOLD_PX {
                    None
                } else if diff > 0 {
                    Some(NavIntent::Next)
                } else {
                    Some(NavIntent::Previous)
                }
            }
            other => Some(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swipe_up_advances() {
        let swipe = NavIntent::Swipe { start_y: 400, end_y: 200 };
        assert_eq!(swipe.resolve(), Some(NavIntent::Next));
    }

    #[test]
    fn test_swipe_down_goes_back() {
        let swipe = NavIntent::Swipe { start_y: 100, end_y: 300 };
        assert_eq!(swipe.resolve(), Some(NavIntent::Previous));
    }

    #[test]
    fn test_short_swipe_ignored() {
        assert_eq!(NavIntent::Swipe { start_y: 100, end_y: 150 }.resolve(), None);
        assert_eq!(NavIntent::Swipe { start_y: 100, end_y: 49 }.resolve(), Some(NavIntent::Next));
    }

    #[test]
    fn test_other_intents_pass_through() {
        assert_eq!(NavIntent::Last.resolve(), Some(NavIntent::Last));
    }
}
