//! Small shared helpers.
//!
//! - **URL validation**: base URL checks and media URL resolution
//! - **Text**: terminal-safe sanitizing and width-aware truncation
//!
//! ```
//! use reelfeed::util::{fit_width, sanitize_display};
//!
//! assert_eq!(sanitize_display("\x1b[1mBold\x1b[0m"), "Bold");
//! assert_eq!(fit_width("A very long reel title", 10), "A very lo…");
//! ```

mod text;
mod url_validator;

pub use text::{fit_width, sanitize_display};
pub use url_validator::{resolve_media_url, validate_base_url, UrlValidationError};
