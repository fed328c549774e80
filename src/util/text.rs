use std::borrow::Cow;

use unicode_width::UnicodeWidthChar;

/// Single-column ellipsis appended by [`fit_width`].
const ELLIPSIS: char = '…';

/// Make backend-supplied text safe to draw in the terminal.
///
/// Reel titles and descriptions come straight from the API, so escape
/// sequences must not reach the terminal:
/// - CSI (`ESC [` ... final byte 0x40-0x7E) and OSC (`ESC ]` ... BEL or
///   `ESC \`) sequences are dropped whole
/// - other C0 controls and DEL are dropped
/// - newlines, carriage returns and tabs become single spaces
///
/// Clean input is returned borrowed.
pub fn sanitize_display(s: &str) -> Cow<'_, str> {
    if !s.bytes().any(|b| b < 0x20 || b == 0x7f) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\x1b' => match chars.peek() {
                Some('[') => {
                    chars.next();
                    for c in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&c) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    while let Some(c) = chars.next() {
                        if c == '\x07' {
                            break;
                        }
                        if c == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            },
            '\n' | '\r' | '\t' => {
                if !out.ends_with(' ') {
                    out.push(' ');
                }
            }
            c if (c as u32) < 0x20 || c == '\x7f' => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Fit `s` into `max_width` terminal columns, ending with `…` when cut.
///
/// Width is measured with `unicode-width`, so CJK and emoji count as two
/// columns. A string that already fits is returned borrowed.
pub fn fit_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    let mut used = 0;
    // Byte offset of the last char that still leaves room for the ellipsis
    let mut cut = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > max_width {
            let mut truncated = s[..cut].to_string();
            truncated.push(ELLIPSIS);
            return Cow::Owned(truncated);
        }
        used += w;
        if used < max_width {
            cut = idx + c.len_utf8();
        }
    }
    Cow::Borrowed(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_is_borrowed() {
        let result = sanitize_display("Sunset over the bay");
        assert!(matches!(result, Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_sequences_removed() {
        assert_eq!(sanitize_display("\x1b[31mRed\x1b[0m reel"), "Red reel");
        assert_eq!(sanitize_display("\x1b]0;pwned\x07Title"), "Title");
        assert_eq!(sanitize_display("\x1b]0;pwned\x1b\\Title"), "Title");
        assert_eq!(sanitize_display("bare\x1besc"), "bareesc");
    }

    #[test]
    fn test_newlines_collapse_to_single_space() {
        assert_eq!(sanitize_display("line one\r\nline two"), "line one line two");
        assert_eq!(sanitize_display("a\tb"), "a b");
    }

    #[test]
    fn test_other_controls_dropped() {
        assert_eq!(sanitize_display("he\x00ll\x07o\x7f"), "hello");
    }

    #[test]
    fn test_unicode_survives_sanitizing() {
        assert_eq!(sanitize_display("日本\x1b[1m語\x1b[0m"), "日本語");
    }

    #[test]
    fn test_fit_width_short_text_untouched() {
        assert!(matches!(fit_width("Cats", 10), Cow::Borrowed("Cats")));
        assert_eq!(fit_width("12345", 5), "12345");
    }

    #[test]
    fn test_fit_width_truncates_with_ellipsis() {
        assert_eq!(fit_width("Hello World", 8), "Hello W…");
        assert_eq!(fit_width("Hello", 1), "…");
        assert_eq!(fit_width("Hello", 0), "");
    }

    #[test]
    fn test_fit_width_wide_chars() {
        // Each CJK char is two columns
        assert_eq!(fit_width("你好世界", 5), "你好…");
        assert_eq!(fit_width("你好世界", 8), "你好世界");
    }
}
