//! Colouring for status lines

use std::fmt::Display;

use owo_colors::{OwoColorize, colors::css};

/// How a status line should stand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// A completed mutation, printed to stdout.
    Success,
    /// Something the user should notice, printed to stderr.
    Warning,
    /// Supplementary detail, printed to stderr.
    Quiet,
}

impl Tone {
    const fn stream(self) -> supports_color::Stream {
        match self {
            Self::Success => supports_color::Stream::Stdout,
            Self::Warning | Self::Quiet => supports_color::Stream::Stderr,
        }
    }

    /// Render `text` in this tone, or plainly if the target stream has no
    /// colour support.
    #[must_use]
    pub fn paint(self, text: impl Display) -> String {
        if supports_color::on(self.stream()).is_none() {
            return text.to_string();
        }

        match self {
            Self::Success => text.fg::<css::Green>().to_string(),
            Self::Warning => text.fg::<css::Orange>().to_string(),
            Self::Quiet => text.dimmed().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn painted_text_keeps_its_content() {
        for tone in [Tone::Success, Tone::Warning, Tone::Quiet] {
            assert!(tone.paint("Deleted record 3").contains("Deleted record 3"));
        }
    }
}
