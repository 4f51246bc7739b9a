//! Text to keystroke mapping for a US keyboard layout.

use anyhow::{anyhow, Result};

/// One key press, optionally with Shift held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyStroke {
    /// Unshifted key character
    pub key: char,
    pub shifted: bool,
}

/// Shifted symbols and the key that produces them.
const SHIFTED_SYMBOLS: [(char, char); 21] = [
    ('!', '1'),
    ('@', '2'),
    ('#', '3'),
    ('$', '4'),
    ('%', '5'),
    ('^', '6'),
    ('&', '7'),
    ('*', '8'),
    ('(', '9'),
    (')', '0'),
    ('_', '-'),
    ('+', '='),
    ('{', '['),
    ('}', ']'),
    ('|', '\\'),
    (':', ';'),
    ('"', '\''),
    ('<', ','),
    ('>', '.'),
    ('?', '/'),
    ('~', '`'),
];

/// Maps a single character to its keystroke.
pub fn stroke_for(c: char) -> Result<KeyStroke> {
    if c.is_ascii_uppercase() {
        return Ok(KeyStroke {
            key: c.to_ascii_lowercase(),
            shifted: true,
        });
    }
    if let Some(&(_, key)) = SHIFTED_SYMBOLS.iter().find(|(symbol, _)| *symbol == c) {
        return Ok(KeyStroke { key, shifted: true });
    }
    if c.is_ascii_graphic() || c == ' ' {
        return Ok(KeyStroke {
            key: c,
            shifted: false,
        });
    }
    Err(anyhow!("Cannot type {:?} on a US keyboard layout", c))
}

/// Maps text to keystrokes, failing on the first character that has no key.
pub fn strokes_for(text: &str) -> Result<Vec<KeyStroke>> {
    text.chars().map(stroke_for).collect()
}
