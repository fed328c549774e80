//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard and mouse input handling
//! - `events` - Background task result processing
//! - `render` - Frame layout and overlay ordering
//! - `helpers` - Task spawning and layout utilities
//! - `reels` - Feed widget
//! - `overlay` - Login/register, add-reel and confirm dialogs
//! - `status` - Status bar widget
//! - `help` - Keybinding help overlay

mod events;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod overlay;
mod reels;
mod render;
mod status;

pub use loop_runner::{run, Action};
