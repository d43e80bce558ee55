use casegrade_core::{
    style::{self, ColorTheme as _},
    testing::{
        normalize::trim_line_ends, CaseVerdict, ExecFailure, GradeListener, GradeReport,
        SubjectCommand, Verdict,
    },
};
use colored::Colorize as _;
use crossterm::terminal;
use strum::IntoEnumIterator as _;

const BOLD_LINE: &str = "━";
const EMPTY_MARK: &str = "<EMPTY>";

/// Prints grading progress to stdout. Only the first failing case gets a
/// full diff; the rest get their one-line verdict.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    detail_shown: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GradeListener for ConsoleReporter {
    fn on_start(&mut self, num_cases: usize, cmd: &SubjectCommand) {
        self.detail_shown = false;
        println!();
        println!("{} cases loaded", num_cases);
        println!("spawn command is: {} {:?}", cmd.program(), cmd.args());
    }

    fn on_case_done(&mut self, v: &CaseVerdict) {
        println!(
            "{} inputs => {:?} {}",
            style::verdict_symbol(v.verdict),
            v.testcase.inputs(),
            format!("[{}ms]", v.result.execution_time.as_millis()).dimmed(),
        );
        if !v.verdict.is_pass() && !self.detail_shown {
            self.detail_shown = true;
            print_case_detail(v);
        }
    }

    fn on_finish(&mut self, report: &GradeReport) {
        print_summary(report);
    }
}

fn terminal_cols() -> usize {
    terminal::size().map(|(cols, _)| cols as usize).unwrap_or(80)
}

pub fn print_case_detail(v: &CaseVerdict) {
    let cols = terminal_cols().max(20);
    let bold_bar = BOLD_LINE.repeat(cols).blue().bold();

    println!(
        "{}: {}\n{}",
        format!("Testcase {}", v.testcase.name()).bright_yellow().bold(),
        style::verdict_icon(v.verdict),
        bold_bar,
    );

    let expected = v.testcase.expected_stdout();
    let actual = trim_line_ends(&v.result.captured_output);
    for row in render_two_panes(&expected, &actual, cols) {
        println!("{}", row);
    }

    match &v.result.failure {
        Some(failure @ ExecFailure::Timeout(_)) => println!("{}", failure.to_string().red()),
        Some(failure) => println!("{}", format!("{:#}", failure).bright_red()),
        None => (),
    }
    println!("{}", bold_bar);
}

/// Lays `expected` and `actual` side by side, one row per line. Rows whose
/// sides differ get the actual side highlighted.
pub fn render_two_panes(expected: &str, actual: &str, cols: usize) -> Vec<String> {
    let pane = cols.saturating_sub(3) / 2;
    let sep = " │ ".bright_black();

    let left: Vec<&str> = non_empty_lines(expected);
    let right: Vec<&str> = non_empty_lines(actual);

    let mut rows = vec![format!(
        "{}{}{}",
        fit("[expected]", pane).cyan().bold(),
        sep,
        fit("[actual]", pane).cyan().bold(),
    )];

    for i in 0..left.len().max(right.len()) {
        let l = left.get(i).copied().unwrap_or("");
        let r = right.get(i).copied().unwrap_or("");
        let r_cell = if l == r {
            fit(r, pane).normal()
        } else {
            fit(r, pane).color(Verdict::Mismatch.color())
        };
        rows.push(format!("{}{}{}", fit(l, pane), sep, r_cell));
    }
    rows
}

fn non_empty_lines(s: &str) -> Vec<&str> {
    if s.is_empty() {
        vec![EMPTY_MARK]
    } else {
        s.split('\n').collect()
    }
}

/// Pads or truncates to exactly `width` chars.
fn fit(s: &str, width: usize) -> String {
    let n = s.chars().count();
    if n <= width {
        format!("{}{}", s, " ".repeat(width - n))
    } else if width == 0 {
        String::new()
    } else {
        let mut t: String = s.chars().take(width - 1).collect();
        t.push('…');
        t
    }
}

pub fn print_summary(report: &GradeReport) {
    let bar = "-".repeat(5);
    let card = &report.scorecard;
    let num_total = card.len();
    let num_failed = num_total - card.num_passed();

    println!(
        "\n{} {} {}",
        bar,
        style::colored_scorecard(card.verdicts()),
        bar
    );

    if num_failed == 0 {
        println!("{}", format!("All {} tests passed ✨", num_total).green());
        return;
    }

    let summary_msg = if num_failed < num_total {
        format!("{}/{} tests failed 💣", num_failed, num_total)
    } else {
        format!("All {} tests failed 💀", num_total)
    };

    let count = card.count();
    let detail_msg = Verdict::iter()
        .filter(|v| !v.is_pass())
        .filter_map(|v| count.get(&v).map(|&cnt| (v, cnt)))
        .map(|(v, cnt)| {
            format!(
                "{}{}{}",
                style::verdict_icon(v),
                "x".dimmed(),
                cnt.to_string().bold().bright_white(),
            )
        })
        .collect::<Vec<String>>()
        .join(", ");

    println!("{} ({})", summary_msg.bright_red(), detail_msg);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("abcdef", 4), "abc…");
        assert_eq!(fit("abcd", 4), "abcd");
        assert_eq!(fit("abc", 0), "");
    }

    #[test]
    fn two_panes_align_lines() {
        colored::control::set_override(false);
        let rows = render_two_panes("3\n4", "3", 23);
        let row = |l: &str, r: &str| format!("{} │ {}", fit(l, 10), fit(r, 10));
        assert_eq!(rows, [row("[expected]", "[actual]"), row("3", "3"), row("4", "")]);
    }

    #[test]
    fn two_panes_mark_empty_output() {
        colored::control::set_override(false);
        let rows = render_two_panes("3", "", 43);
        assert_eq!(rows.len(), 2);
        assert!(rows[1].ends_with(&fit(EMPTY_MARK, 20)));
    }
}
