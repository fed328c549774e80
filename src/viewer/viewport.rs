use std::ops::Range;
use std::time::Duration;

/// Length of a programmatic smooth scroll.
pub const SCROLL_ANIMATION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScrollAnimation {
    from: u64,
    to: u64,
    started: Duration,
}

/// Pixel model of the scrolling feed container.
///
/// Items are stacked top to bottom, each `item_height` tall. The terminal
/// layer maps rows to pixels; everything here is plain arithmetic so the
/// "which reel is in view" rules can be exercised without a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    height: u64,
    item_height: u64,
    item_count: usize,
    scroll_top: u64,
    animation: Option<ScrollAnimation>,
}

impl Viewport {
    pub fn new(height: u64, item_height: u64) -> Self {
        Self {
            height,
            item_height,
            item_count: 0,
            scroll_top: 0,
            animation: None,
        }
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn item_height(&self) -> u64 {
        self.item_height
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn scroll_top(&self) -> u64 {
        self.scroll_top
    }

    pub fn item_top(&self, index: usize) -> u64 {
        index as u64 * self.item_height
    }

    fn content_height(&self) -> u64 {
        self.item_count as u64 * self.item_height
    }

    pub fn max_scroll(&self) -> u64 {
        self.content_height().saturating_sub(self.height)
    }

    /// Fraction of item `index` inside the container, in `0.0..=1.0`.
    pub fn intersection_ratio(&self, index: usize) -> f64 {
        if self.item_height == 0 || index >= self.item_count {
            return 0.0;
        }
        let top = self.item_top(index);
        let bottom = top + self.item_height;
        let view_bottom = self.scroll_top + self.height;
        let visible = bottom.min(view_bottom).saturating_sub(top.max(self.scroll_top));
        visible as f64 / self.item_height as f64
    }

    /// Items that overlap the container at all.
    pub fn visible_range(&self) -> Range<usize> {
        if self.item_height == 0 || self.item_count == 0 {
            return 0..0;
        }
        let start = (self.scroll_top / self.item_height) as usize;
        let end = (self.scroll_top + self.height).div_ceil(self.item_height) as usize;
        start.min(self.item_count)..end.min(self.item_count)
    }

    /// Item whose top edge is closest to the container's top edge.
    ///
    /// On a tie the earlier item wins.
    pub fn nearest_index(&self) -> usize {
        if self.item_height == 0 || self.item_count == 0 {
            return 0;
        }
        let below = (self.scroll_top / self.item_height) as usize;
        let below = below.min(self.item_count - 1);
        let above = below + 1;
        if above < self.item_count && self.misalignment(above) < self.misalignment(below) {
            above
        } else {
            below
        }
    }

    /// Distance between item `index`'s top edge and the container top.
    pub fn misalignment(&self, index: usize) -> u64 {
        self.item_top(index).abs_diff(self.scroll_top)
    }

    /// User scroll by `delta` pixels. Cancels any running animation.
    ///
    /// Returns whether `scroll_top` moved.
    pub fn scroll_by(&mut self, delta: i64) -> bool {
        self.animation = None;
        let target = self.scroll_top.saturating_add_signed(delta).min(self.max_scroll());
        let moved = target != self.scroll_top;
        self.scroll_top = target;
        moved
    }

    /// Start over at the top with `item_count` items.
    pub fn reset(&mut self, item_count: usize) {
        self.item_count = item_count;
        self.scroll_top = 0;
        self.animation = None;
    }

    /// Restore a previously saved offset (clamped).
    pub fn restore_scroll_top(&mut self, scroll_top: u64) {
        self.scroll_top = scroll_top.min(self.max_scroll());
    }

    pub fn set_item_count(&mut self, count: usize) {
        self.item_count = count;
        let max = self.max_scroll();
        self.scroll_top = self.scroll_top.min(max);
        if let Some(anim) = &mut self.animation {
            anim.to = anim.to.min(max);
        }
    }

    /// Change the container size, keeping the nearest item aligned.
    pub fn resize(&mut self, height: u64, item_height: u64) {
        let index = self.nearest_index();
        self.height = height;
        self.item_height = item_height;
        self.animation = None;
        self.scroll_top = self.item_top(index).min(self.max_scroll());
    }

    /// Start a smooth scroll that puts item `index` at the top.
    pub fn animate_to(&mut self, index: usize, now: Duration) {
        let to = self.item_top(index).min(self.max_scroll());
        self.animation = Some(ScrollAnimation {
            from: self.scroll_top,
            to,
            started: now,
        });
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Step the animation to `now`. Returns whether `scroll_top` moved.
    pub fn advance(&mut self, now: Duration) -> bool {
        let Some(anim) = self.animation else {
            return false;
        };
        let elapsed = now.saturating_sub(anim.started);
        let next = if elapsed >= SCROLL_ANIMATION {
            self.animation = None;
            anim.to
        } else {
            let t = elapsed.as_secs_f64() / SCROLL_ANIMATION.as_secs_f64();
            let eased = 1.0 - (1.0 - t).powi(3);
            let span = anim.to as f64 - anim.from as f64;
            (anim.from as f64 + span * eased).round() as u64
        };
        let moved = next != self.scroll_top;
        self.scroll_top = next;
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(count: usize) -> Viewport {
        let mut vp = Viewport::new(400, 400);
        vp.set_item_count(count);
        vp
    }

    #[test]
    fn test_ratios_at_rest() {
        let vp = viewport(3);
        assert_eq!(vp.intersection_ratio(0), 1.0);
        assert_eq!(vp.intersection_ratio(1), 0.0);
        assert_eq!(vp.intersection_ratio(5), 0.0);
        assert_eq!(vp.visible_range(), 0..1);
    }

    #[test]
    fn test_ratios_mid_scroll() {
        let mut vp = viewport(3);
        vp.scroll_by(100);
        assert_eq!(vp.intersection_ratio(0), 0.75);
        assert_eq!(vp.intersection_ratio(1), 0.25);
        assert_eq!(vp.visible_range(), 0..2);

        vp.scroll_by(100);
        assert_eq!(vp.intersection_ratio(0), 0.5);
        assert_eq!(vp.intersection_ratio(1), 0.5);
    }

    #[test]
    fn test_nearest_index_tie_prefers_first() {
        let mut vp = viewport(3);
        vp.scroll_by(200);
        assert_eq!(vp.nearest_index(), 0);
        vp.scroll_by(1);
        assert_eq!(vp.nearest_index(), 1);
        assert_eq!(vp.misalignment(1), 199);
    }

    #[test]
    fn test_scroll_clamped() {
        let mut vp = viewport(3);
        assert!(!vp.scroll_by(-10));
        assert!(vp.scroll_by(10_000));
        assert_eq!(vp.scroll_top(), 800);
        assert_eq!(vp.nearest_index(), 2);
    }

    #[test]
    fn test_empty_viewport() {
        let vp = viewport(0);
        assert_eq!(vp.nearest_index(), 0);
        assert_eq!(vp.visible_range(), 0..0);
        assert_eq!(vp.max_scroll(), 0);
    }

    #[test]
    fn test_animation_eases_to_target() {
        let mut vp = viewport(5);
        let start = Duration::from_secs(1);
        vp.animate_to(2, start);
        assert!(vp.is_animating());

        assert!(vp.advance(start + Duration::from_millis(150)));
        // Ease-out covers more than half the distance at half time.
        assert!(vp.scroll_top() > 400 && vp.scroll_top() < 800);

        assert!(vp.advance(start + SCROLL_ANIMATION));
        assert_eq!(vp.scroll_top(), 800);
        assert!(!vp.is_animating());
        assert!(!vp.advance(start + Duration::from_secs(5)));
    }

    #[test]
    fn test_user_scroll_cancels_animation() {
        let mut vp = viewport(5);
        vp.animate_to(3, Duration::ZERO);
        vp.scroll_by(10);
        assert!(!vp.is_animating());
    }

    #[test]
    fn test_resize_keeps_current_item_aligned() {
        let mut vp = viewport(5);
        vp.scroll_by(810);
        vp.resize(300, 300);
        assert_eq!(vp.scroll_top(), 600);
        assert_eq!(vp.nearest_index(), 2);
    }

    #[test]
    fn test_growth_keeps_offset() {
        let mut vp = viewport(3);
        vp.scroll_by(800);
        vp.set_item_count(6);
        assert_eq!(vp.scroll_top(), 800);
        assert_eq!(vp.max_scroll(), 2000);
    }

    #[test]
    fn test_shrinking_clamps_running_animation() {
        let mut vp = viewport(6);
        vp.animate_to(5, Duration::ZERO);
        vp.set_item_count(3);
        assert!(vp.is_animating());
        vp.advance(SCROLL_ANIMATION);
        assert_eq!(vp.scroll_top(), 800);
    }
}
