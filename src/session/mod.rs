//! One viewing session: feed, scrolling, playback and the view quota.
//!
//! [`FeedSession`] owns every piece of client state and contains no I/O.
//! Network work leaves it as [`Effect`]s (drained with
//! [`FeedSession::take_effects`]); the app runs them in background tasks and
//! hands each result back through the matching `apply_*` method, in arrival
//! order. Timers run on a virtual [`Scheduler`] advanced by
//! [`FeedSession::tick`], so the whole session can be driven step by step in
//! tests.

mod quota;

pub use quota::{AuthKind, AuthTab, LoginOverlay, QuotaGate, SessionStatus};

use std::time::Duration;

use rand::rngs::StdRng;
use url::Url;

use crate::api::{ApiError, AuthStatus, Credentials, NewReel, ReelsPage, TrackViewResponse};
use crate::feed::{CardList, FeedState, Growth, ReelCard};
use crate::scheduler::{Scheduler, TimerId};
use crate::viewer::navigation::{
    GROWTH_MARGIN, RETRY_DELAY, SCROLL_SETTLE, SNAP_LOCK, SNAP_THRESHOLD_PX, UNMUTE_DELAY,
    WHEEL_SETTLE,
};
use crate::viewer::{
    NavIntent, NavigationState, PlaybackController, StartOutcome, Viewport, VisibilityEvent,
    VisibilityTracker,
};

/// Network work requested by the session.
#[derive(Debug)]
pub enum Effect {
    CheckAuthStatus,
    LoadFeed,
    TrackView { reel_id: i64 },
    Login(Credentials),
    Register(Credentials),
    AddReel(NewReel),
    DeleteReel { reel_id: i64 },
}

/// What the feed area currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeedPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The backend has no reels.
    Empty,
    /// Shown in place of the feed.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    ScrollSettle,
    WheelSettle,
    /// End of the animation lock taken by a settle snap.
    ReleaseSnapLock,
    /// End of the animation lock taken by [`FeedSession::scroll_to`].
    ScrollSettled { index: usize, rendered: usize },
    RetryScroll { index: usize },
    JumpToEnd,
    Unmute { index: usize },
}

pub struct FeedSession {
    feed: FeedState,
    cards: CardList,
    viewport: Viewport,
    tracker: VisibilityTracker,
    playback: PlaybackController,
    nav: NavigationState,
    scheduler: Scheduler<Timer>,
    quota: QuotaGate,
    rng: StdRng,
    phase: FeedPhase,
    load_after_auth: bool,
    scroll_settle: Option<TimerId>,
    wheel_settle: Option<TimerId>,
    scroll_lock: Option<TimerId>,
    effects: Vec<Effect>,
    notices: Vec<String>,
}

impl FeedSession {
    pub fn new(base_url: Url, playback: PlaybackController, rng: StdRng) -> Self {
        Self {
            feed: FeedState::new(),
            cards: CardList::new(base_url),
            viewport: Viewport::new(0, 0),
            tracker: VisibilityTracker::new(),
            playback,
            nav: NavigationState::default(),
            scheduler: Scheduler::new(),
            quota: QuotaGate::new(),
            rng,
            phase: FeedPhase::Idle,
            load_after_auth: false,
            scroll_settle: None,
            wheel_settle: None,
            scroll_lock: None,
            effects: Vec::new(),
            notices: Vec::new(),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Check the login status, then load the feed once it has answered.
    pub fn start(&mut self) {
        self.phase = FeedPhase::Loading;
        self.load_after_auth = true;
        let effect = self.quota.check_auth_status();
        self.effects.push(effect);
    }

    /// Drop the rendered feed and fetch the reel list again.
    pub fn load_feed(&mut self) {
        self.phase = FeedPhase::Loading;
        self.playback.reset();
        self.tracker.clear();
        self.cards.clear();
        self.viewport.reset(0);
        self.scheduler.clear();
        self.scroll_settle = None;
        self.wheel_settle = None;
        self.scroll_lock = None;
        self.nav.is_animating_scroll = false;
        self.effects.push(Effect::LoadFeed);
    }

    pub fn apply_auth_status(&mut self, result: Result<AuthStatus, ApiError>) {
        self.quota.apply_auth_status(&result);
        if std::mem::take(&mut self.load_after_auth) {
            self.load_feed();
        }
    }

    pub fn apply_feed(&mut self, result: Result<ReelsPage, ApiError>) {
        let page = match result {
            Ok(page) => page,
            Err(ApiError::Application(message)) => {
                tracing::warn!(error = %message, "Backend rejected reel list");
                self.phase = FeedPhase::Failed(format!("Error: {message}"));
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error loading reels");
                self.phase = FeedPhase::Failed(format!("Error loading reels: {e}"));
                return;
            }
        };

        if let Some(user) = &page.user {
            self.quota.apply_user_status(user);
        }
        self.feed.apply_load(page.reels, &mut self.rng);
        self.tracker.clear();
        self.nav = NavigationState::default();
        tracing::info!(count = self.feed.len(), "Loaded reels");

        if self.feed.is_empty() {
            self.cards.clear();
            self.viewport.reset(0);
            self.phase = FeedPhase::Empty;
            return;
        }

        if let Err(e) = self.cards.rerender(self.feed.rendered()) {
            tracing::error!(error = %e, "Error rendering reels");
            self.viewport.reset(0);
            self.phase = FeedPhase::Failed(format!("Error rendering reels: {e}"));
            return;
        }
        self.wire_pending_cards();
        self.viewport.reset(self.cards.len());
        self.phase = FeedPhase::Ready;
        self.refresh_visibility();
    }

    fn wire_pending_cards(&mut self) {
        for (index, reel_id) in self.cards.wire_pending() {
            self.tracker.register(index, reel_id);
        }
    }

    // ========================================================================
    // Quota and auth
    // ========================================================================

    pub fn apply_track_view(&mut self, reel_id: i64, result: Result<TrackViewResponse, ApiError>) {
        self.quota.apply_track_view(reel_id, result);
    }

    pub fn login(&mut self, credentials: Credentials) {
        let effect = self.quota.login(credentials);
        self.effects.push(effect);
    }

    pub fn register(&mut self, credentials: Credentials) {
        let effect = self.quota.register(credentials);
        self.effects.push(effect);
    }

    pub fn apply_auth_result(&mut self, kind: AuthKind, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                tracing::info!(?kind, "Authenticated");
                self.quota.apply_auth_success();
                self.load_feed();
            }
            Err(e) => {
                tracing::info!(?kind, error = %e, "Authentication failed");
                self.quota.apply_auth_failure(&e);
            }
        }
    }

    pub fn show_login(&mut self) {
        self.quota.show_overlay();
    }

    pub fn close_login(&mut self) {
        self.quota.close_overlay();
    }

    pub fn switch_auth_tab(&mut self, tab: AuthTab) {
        self.quota.switch_tab(tab);
    }

    /// Esc or a click beside the dialog. Returns whether it closed.
    pub fn dismiss_login_outside(&mut self) -> bool {
        self.quota.dismiss_outside()
    }

    // ========================================================================
    // Reel management
    // ========================================================================

    /// Queue an upload of `reel`. Only logged-in users may add reels.
    pub fn add_reel(&mut self, reel: NewReel) -> bool {
        if !self.quota.is_logged_in() {
            self.notices.push("Please login to add reels".to_string());
            return false;
        }
        self.effects.push(Effect::AddReel(reel));
        true
    }

    pub fn apply_reel_added(&mut self, result: Result<(), ApiError>) {
        match result {
            Ok(()) => self.load_feed(),
            Err(ApiError::Application(message)) => self.notices.push(format!("Error: {message}")),
            Err(e) => self.notices.push(format!("Error adding reel: {e}")),
        }
    }

    pub fn delete_reel(&mut self, reel_id: i64) {
        self.effects.push(Effect::DeleteReel { reel_id });
    }

    pub fn apply_reel_deleted(&mut self, result: Result<(), ApiError>) {
        match result {
            Ok(()) => self.load_feed(),
            Err(ApiError::Application(message)) => self.notices.push(format!("Error: {message}")),
            Err(e) => self.notices.push(format!("Error deleting reel: {e}")),
        }
    }

    // ========================================================================
    // Growth and navigation
    // ========================================================================

    /// Append another shuffle of the fetched reels below the current ones.
    ///
    /// The scroll offset is kept so the user does not see a jump. Returns
    /// whether anything was appended.
    pub fn grow_feed(&mut self) -> bool {
        if self.phase != FeedPhase::Ready {
            return false;
        }
        let saved = self.viewport.scroll_top();
        let range = match self.feed.grow(&mut self.rng) {
            Growth::Appended(range) => range,
            Growth::Empty | Growth::Busy => return false,
        };
        if let Err(e) = self.cards.append(self.feed.rendered(), range) {
            tracing::error!(error = %e, "Error rendering appended reels");
        }
        self.wire_pending_cards();
        self.viewport.set_item_count(self.cards.len());
        self.viewport.restore_scroll_top(saved);
        self.feed.finish_growth();
        tracing::debug!(total = self.cards.len(), "Appended more reels");
        self.refresh_visibility();
        true
    }

    fn near_end(index: usize, len: usize) -> bool {
        index + GROWTH_MARGIN >= len
    }

    /// Settle step after scrolling stops: track the nearest reel, grow near
    /// the end and snap back into alignment when far off.
    pub fn check_position(&mut self) {
        if self.phase != FeedPhase::Ready || self.cards.is_empty() {
            return;
        }
        let nearest = self.viewport.nearest_index();
        self.nav.current_index = nearest;

        if Self::near_end(nearest, self.cards.len()) {
            self.grow_feed();
        }

        if self.viewport.misalignment(nearest) > SNAP_THRESHOLD_PX && !self.nav.is_animating_scroll {
            tracing::trace!(index = nearest, "Snapping to nearest reel");
            self.viewport.animate_to(nearest, self.scheduler.now());
            self.take_scroll_lock(Timer::ReleaseSnapLock);
        }
    }

    fn take_scroll_lock(&mut self, release: Timer) {
        self.nav.is_animating_scroll = true;
        if let Some(id) = self.scroll_lock.take() {
            self.scheduler.cancel(id);
        }
        self.scroll_lock = Some(self.scheduler.after(SNAP_LOCK, release));
    }

    /// Smooth-scroll to rendered position `target`.
    ///
    /// Negative targets are ignored. A target past the end grows the feed
    /// and is retried shortly after.
    pub fn scroll_to(&mut self, target: isize) {
        if self.phase != FeedPhase::Ready {
            return;
        }
        let Ok(index) = usize::try_from(target) else {
            return;
        };
        if index >= self.cards.len() {
            self.grow_feed();
            self.scheduler.after(RETRY_DELAY, Timer::RetryScroll { index });
            return;
        }
        self.viewport.animate_to(index, self.scheduler.now());
        let rendered = self.cards.len();
        self.take_scroll_lock(Timer::ScrollSettled { index, rendered });
    }

    pub fn navigate(&mut self, intent: NavIntent) {
        if self.phase != FeedPhase::Ready {
            return;
        }
        let Some(intent) = intent.resolve() else {
            return;
        };
        match intent {
            NavIntent::Next => {
                self.nav.current_index += 1;
                self.scroll_to(self.nav.current_index as isize);
            }
            NavIntent::Previous => {
                if self.nav.current_index > 0 {
                    self.nav.current_index -= 1;
                    self.scroll_to(self.nav.current_index as isize);
                }
            }
            NavIntent::First => {
                self.nav.current_index = 0;
                self.scroll_to(0);
            }
            NavIntent::Last => {
                self.grow_feed();
                self.scheduler.after(RETRY_DELAY, Timer::JumpToEnd);
            }
            NavIntent::Swipe { .. } => {}
        }
    }

    /// Continuous scroll by `delta` pixels (drag, trackpad).
    pub fn on_scroll(&mut self, delta: i64) {
        if self.phase != FeedPhase::Ready {
            return;
        }
        if self.viewport.scroll_by(delta) {
            self.scrolled();
        }
    }

    /// Mouse wheel scroll by `delta` pixels.
    pub fn on_wheel(&mut self, delta: i64) {
        if self.phase != FeedPhase::Ready {
            return;
        }
        let moved = self.viewport.scroll_by(delta);
        if let Some(id) = self.wheel_settle.take() {
            self.scheduler.cancel(id);
        }
        self.wheel_settle = Some(self.scheduler.after(WHEEL_SETTLE, Timer::WheelSettle));
        if moved {
            self.scrolled();
        }
    }

    fn scrolled(&mut self) {
        self.refresh_visibility();
        if self.nav.is_animating_scroll {
            return;
        }
        if let Some(id) = self.scroll_settle.take() {
            self.scheduler.cancel(id);
        }
        self.scroll_settle = Some(self.scheduler.after(SCROLL_SETTLE, Timer::ScrollSettle));
    }

    /// Resize the feed area; the current reel stays aligned.
    pub fn resize(&mut self, height: u64, item_height: u64) {
        if self.viewport.height() == height && self.viewport.item_height() == item_height {
            return;
        }
        self.viewport.resize(height, item_height);
        self.refresh_visibility();
    }

    // ========================================================================
    // Time
    // ========================================================================

    /// Advance virtual time to `now`, firing every timer that came due and
    /// stepping the scroll animation.
    pub fn tick(&mut self, now: Duration) {
        while let Some(timer) = self.scheduler.pop_due(now) {
            let at = self.scheduler.now();
            if self.viewport.advance(at) {
                self.refresh_visibility();
            }
            self.fire(timer);
        }
        self.scheduler.advance_to(now);
        if self.viewport.advance(now) {
            self.refresh_visibility();
        }
    }

    /// Advance time by `delta`.
    pub fn tick_by(&mut self, delta: Duration) {
        let now = self.scheduler.now() + delta;
        self.tick(now);
    }

    fn fire(&mut self, timer: Timer) {
        match timer {
            Timer::ScrollSettle => {
                self.scroll_settle = None;
                self.check_position();
            }
            Timer::WheelSettle => {
                self.wheel_settle = None;
                self.check_position();
            }
            Timer::ReleaseSnapLock => {
                self.scroll_lock = None;
                self.nav.is_animating_scroll = false;
            }
            Timer::ScrollSettled { index, rendered } => {
                self.scroll_lock = None;
                self.nav.is_animating_scroll = false;
                if Self::near_end(index, rendered) {
                    self.grow_feed();
                }
            }
            Timer::RetryScroll { index } => {
                if index < self.cards.len() {
                    self.scroll_to(index as isize);
                }
            }
            Timer::JumpToEnd => {
                if let Some(last) = self.cards.len().checked_sub(1) {
                    self.nav.current_index = last;
                    self.scroll_to(last as isize);
                }
            }
            Timer::Unmute { index } => {
                self.playback.unmute(index);
            }
        }
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    // ========================================================================
    // Visibility and playback
    // ========================================================================

    /// Recompute intersection ratios and react to every threshold crossing.
    pub fn refresh_visibility(&mut self) {
        if self.phase != FeedPhase::Ready {
            return;
        }
        let viewport = &self.viewport;
        let events = self
            .tracker
            .observe_window(viewport.visible_range(), |i| viewport.intersection_ratio(i));
        for event in events {
            self.handle_visibility(event);
        }
    }

    fn handle_visibility(&mut self, event: VisibilityEvent) {
        let VisibilityEvent {
            index,
            reel_id,
            visible,
        } = event;

        if !visible {
            self.playback.pause(index);
            return;
        }

        if let Some(url) = self.cards.get(index).map(|c| c.media_url.clone()) {
            if self.playback.start(index, &url) == StartOutcome::PlayingMuted {
                self.scheduler.after(UNMUTE_DELAY, Timer::Unmute { index });
            }
        }

        let outcome = self.feed.mark_viewed(reel_id);
        if !outcome.first_view {
            return;
        }
        tracing::debug!(
            reel_id,
            viewed = self.feed.viewed_count(),
            total = self.feed.original().len(),
            "Viewed reel"
        );
        if outcome.all_viewed_now {
            tracing::info!("All reels viewed, continuing with shuffled playback");
        }
        if let Some(effect) = self.quota.track_view(reel_id) {
            self.effects.push(effect);
        }
    }

    /// Stop playback and drop pending timers before exit.
    pub fn shutdown(&mut self) {
        self.playback.reset();
        self.scheduler.clear();
        self.scroll_settle = None;
        self.wheel_settle = None;
        self.scroll_lock = None;
    }

    /// Any key press or click: unlocks sound for autoplay.
    pub fn on_user_interaction(&mut self) {
        self.playback.on_user_interaction();
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.playback.toggle_mute()
    }

    // ========================================================================
    // Outputs and accessors
    // ========================================================================

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    pub fn phase(&self) -> &FeedPhase {
        &self.phase
    }

    pub fn feed(&self) -> &FeedState {
        &self.feed
    }

    pub fn cards(&self) -> &CardList {
        &self.cards
    }

    pub fn current_card(&self) -> Option<&ReelCard> {
        self.cards.get(self.nav.current_index)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn navigation(&self) -> NavigationState {
        self.nav
    }

    pub fn tracker(&self) -> &VisibilityTracker {
        &self.tracker
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn quota(&self) -> &QuotaGate {
        &self.quota
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }
}
