//! Everything that decides which reel is "in view" and what plays.
//!
//! - [`Viewport`] - pixel geometry of the scrolling container
//! - [`VisibilityTracker`] - Hidden/Playing transitions at a 0.5 ratio
//! - [`PlaybackController`] - play/pause with an autoplay sound policy
//! - [`MpvBackend`] / [`NullBackend`] - media output
//! - [`navigation`] - discrete intents and the scroll timing constants

mod mpv;
pub mod navigation;
mod playback;
mod viewport;
mod visibility;

pub use mpv::MpvBackend;
pub use navigation::{NavIntent, NavigationState};
pub use playback::{
    MediaBackend, NullBackend, PlayState, PlaybackController, PlaybackError, StartOutcome,
};
pub use viewport::{Viewport, SCROLL_ANIMATION};
pub use visibility::{Visibility, VisibilityEvent, VisibilityTracker, VISIBILITY_THRESHOLD};
