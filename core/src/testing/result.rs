use std::{collections::HashMap, fmt, io, time::Duration};

use super::testcase::TestCase;

/// Four-way classification of one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum Verdict {
    #[strum(serialize = "PASS")]
    Pass,
    #[strum(serialize = "MISMATCH")]
    Mismatch,
    #[strum(serialize = "TIMEOUT")]
    Timeout,
    #[strum(serialize = "ERROR")]
    Error,
}

impl Verdict {
    /// The glyph used in the scorecard.
    pub fn symbol(self) -> char {
        use Verdict::*;
        match self {
            Pass => '✓',
            Mismatch => '-',
            Timeout => 'T',
            Error => 'E',
        }
    }

    pub fn is_pass(self) -> bool {
        self == Verdict::Pass
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecFailure {
    #[error("Failed to spawn subject: {0}")]
    Spawn(#[source] io::Error),

    #[error("Time limit exceeded ({}ms)", .0.as_millis())]
    Timeout(Duration),

    #[error("Failed to communicate with subject: {0}")]
    Io(#[source] io::Error),
}

/// What one run of the subject produced.
#[derive(Debug, Default)]
pub struct ExecutionResult {
    /// stdout and stderr merged in arrival order.
    pub captured_output: String,
    pub stdout: String,
    pub stderr: String,
    /// `None` if the process did not exit on its own (or never started).
    pub status: Option<i32>,
    pub execution_time: Duration,
    pub failure: Option<ExecFailure>,
}

impl ExecutionResult {
    pub fn failed(failure: ExecFailure, execution_time: Duration) -> Self {
        Self {
            failure: Some(failure),
            execution_time,
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub struct CaseVerdict {
    pub verdict: Verdict,
    pub testcase: TestCase,
    pub result: ExecutionResult,
}

/// Verdict symbols in case order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scorecard(Vec<Verdict>);

impl Scorecard {
    pub fn verdicts(&self) -> &[Verdict] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn num_passed(&self) -> usize {
        self.0.iter().filter(|v| v.is_pass()).count()
    }

    pub fn all_passed(&self) -> bool {
        self.0.iter().all(|v| v.is_pass())
    }

    pub fn count(&self) -> HashMap<Verdict, usize> {
        self.0.iter().fold(HashMap::new(), |mut count, &v| {
            *count.entry(v).or_default() += 1;
            count
        })
    }
}

impl FromIterator<Verdict> for Scorecard {
    fn from_iter<I: IntoIterator<Item = Verdict>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Scorecard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|v| write!(f, "{}", v.symbol()))
    }
}

#[derive(Debug)]
pub struct GradeReport {
    pub verdicts: Vec<CaseVerdict>,
    pub scorecard: Scorecard,
    pub elapsed: Duration,
}

impl GradeReport {
    pub fn first_failure(&self) -> Option<&CaseVerdict> {
        self.verdicts.iter().find(|v| !v.verdict.is_pass())
    }
}
