//! Terminal client for a short-video ("reel") feed.
//!
//! The crate is split so everything except the terminal loop can be driven
//! from tests: [`session::FeedSession`] holds all client state and talks to
//! the outside world only through effects and `apply_*` calls.

pub mod api;
pub mod app;
pub mod config;
pub mod feed;
pub mod keybindings;
pub mod scheduler;
pub mod session;
pub mod ui;
pub mod util;
pub mod viewer;
