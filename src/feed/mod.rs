//! Feed data: what is shown and in which order.
//!
//! - [`shuffle`](fn@shuffle) - unbiased Fisher–Yates copy
//! - [`FeedState`] - fetched list, rendered (growing) list, viewed ids
//! - [`CardList`] - per-position display models built from the rendered list
//!
//! The rendered feed is endless: whenever the user nears its end another
//! shuffle of the fetched list is appended, so reels repeat in fresh order.

mod cards;
mod shuffle;
mod state;

pub use cards::{format_date, render_card, CardList, ReelCard, RenderError};
pub use shuffle::shuffle;
pub use state::{FeedState, Growth, ViewOutcome};
