use colored::{Color, ColoredString, Colorize};

use crate::testing::Verdict;

pub fn is_truecolor_supported() -> bool {
    let Ok(v) = std::env::var("COLORTERM") else {
        return false
    };
    matches!(v.as_str(), "truecolor" | "24bit")
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for log::Level {
    fn color(&self) -> Color {
        use log::Level::*;
        match self {
            Error => Color::BrightRed,
            Warn => Color::BrightYellow,
            Info => Color::Cyan,
            Debug => Color::Magenta,
            Trace => Color::Blue,
        }
    }
}

/// Basic 16-colour fallback and truecolour RGB for one verdict.
fn verdict_palette(verdict: Verdict) -> (Color, (u8, u8, u8)) {
    use Verdict::*;
    match verdict {
        Pass => (Color::Green, (46, 160, 67)),
        Mismatch => (Color::Yellow, (191, 135, 0)),
        Timeout => (Color::Blue, (56, 132, 244)),
        Error => (Color::Red, (207, 34, 46)),
    }
}

impl ColorTheme for Verdict {
    fn color(&self) -> Color {
        let (basic, (r, g, b)) = verdict_palette(*self);
        if self::is_truecolor_supported() {
            Color::TrueColor { r, g, b }
        } else {
            basic
        }
    }
}

/// `[✓]`, `[-]`, ... coloured by verdict.
pub fn verdict_symbol(verdict: Verdict) -> ColoredString {
    format!("[{}]", verdict.symbol())
        .color(verdict.color())
        .bold()
}

/// Verdict name on a coloured badge, e.g. ` TIMEOUT `.
pub fn verdict_icon(verdict: Verdict) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {} ", verdict)
        .on_color(verdict.color())
        .bold()
        .color(fg)
}

/// Scorecard with each symbol in its verdict colour.
pub fn colored_scorecard(verdicts: &[Verdict]) -> String {
    verdicts
        .iter()
        .map(|v| v.symbol().to_string().color(v.color()).bold().to_string())
        .collect()
}

#[cfg(test)]
mod test {
    use strum::IntoEnumIterator as _;

    use super::*;

    #[test]
    fn verdicts_have_distinct_colors() {
        let palettes: Vec<_> = Verdict::iter().map(verdict_palette).collect();
        for (i, a) in palettes.iter().enumerate() {
            for b in &palettes[i + 1..] {
                assert_ne!(a.0, b.0);
                assert_ne!(a.1, b.1);
            }
        }
    }
}
