use lazy_regex::{lazy_regex, Lazy, Regex};

use super::normalize::{strip_input_echoes, trim_line_ends};

/// A line holding a single backtick closes a case block.
const CASE_DELIMITER: &str = "\n`\n";

/// Backtick-quoted input token; may span lines.
static RE_INPUT_TOKEN: Lazy<Regex> = lazy_regex!(r"(?s)`(.+?)`");

/// One input / expected-output unit of a testcase file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    ordinal: usize,
    inputs: Vec<String>,
    expected_output: String,
}

impl TestCase {
    pub fn new(
        ordinal: usize,
        inputs: impl IntoIterator<Item = impl Into<String>>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            ordinal,
            inputs: inputs.into_iter().map(Into::into).collect(),
            expected_output: expected_output.into(),
        }
    }

    /// 1-based position among the non-empty blocks of the file.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> String {
        format!("#{}", self.ordinal)
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// The right-trimmed block, input markers included.
    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    /// What gets written to the subject's stdin. No trailing newline is added;
    /// closing the pipe marks the end of input.
    pub fn stdin(&self) -> String {
        self.inputs.join("\n")
    }

    /// The expected block with input markers removed, ready for comparison.
    pub fn expected_stdout(&self) -> String {
        strip_input_echoes(&trim_line_ends(&self.expected_output))
    }
}

/// Splits a testcase file into cases, in file order.
///
/// Blocks that are empty after trimming are skipped, so a blank file yields
/// no cases rather than an error.
pub fn parse_testcases(raw: &str) -> Vec<TestCase> {
    let raw = raw.replace("\r\n", "\n");
    raw.split(CASE_DELIMITER)
        .map(trim_line_ends)
        .filter(|block| !block.is_empty())
        .enumerate()
        .map(|(i, block)| {
            let inputs = RE_INPUT_TOKEN
                .captures_iter(&block)
                .map(|c| c[1].to_owned())
                .collect::<Vec<_>>();
            TestCase {
                ordinal: i + 1,
                inputs,
                expected_output: block,
            }
        })
        .collect()
}
