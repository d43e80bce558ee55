//! Output normalization applied before comparing actual and expected output.

use lazy_regex::{lazy_regex, Lazy, Regex};

/// A line made of nothing but one backtick-quoted input token.
static RE_ECHO_LINE: Lazy<Regex> = lazy_regex!(r"^`.+`$");

/// Strips trailing whitespace from every line, then trailing whitespace and
/// blank lines from the whole text.
pub fn trim_line_ends(text: &str) -> String {
    text.split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_owned()
}

/// Removes input-marker lines so that only the expected stdout remains.
///
/// A marker counts only when a newline follows it: the last line of `text`
/// is always kept. Applied to the expected block only; captured output is
/// never stripped.
pub fn strip_input_echoes(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;
    lines
        .into_iter()
        .enumerate()
        .filter(|&(i, line)| i == last || !RE_ECHO_LINE.is_match(line))
        .map(|(_, line)| line)
        .collect::<Vec<_>>()
        .join("\n")
}
