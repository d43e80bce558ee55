use std::time::Duration;

use futures::future::join_all;
use tokio::time::Instant;

use super::{
    command::{CommandError, SubjectCommand},
    normalize::trim_line_ends,
    result::*,
    runner::TestRunner,
    testcase::{parse_testcases, TestCase},
};

/// How cases are scheduled against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    /// One subject process at a time, in case order.
    #[default]
    Sequential,
    /// Every case launched at once; results joined in case order.
    Concurrent,
}

/// Hooks a reporter can hang off a grading run.
pub trait GradeListener {
    /// Called before any subject process is spawned.
    fn on_start(&mut self, _num_cases: usize, _cmd: &SubjectCommand) {}

    /// Called once per case, always in case order.
    fn on_case_done(&mut self, _verdict: &CaseVerdict) {}

    fn on_finish(&mut self, _report: &GradeReport) {}
}

#[derive(Debug, Default)]
pub struct Silent;

impl GradeListener for Silent {}

#[derive(Debug, Clone)]
pub struct Grader {
    runner: TestRunner,
    schedule: Schedule,
}

impl Grader {
    pub fn new(cmd: SubjectCommand) -> Self {
        Self {
            runner: TestRunner::new(cmd),
            schedule: Schedule::default(),
        }
    }

    pub fn timeout(mut self, limit: Duration) -> Self {
        self.runner = self.runner.execution_time_limit(limit);
        self
    }

    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Runs every case and classifies it. Per-case failures never abort the
    /// run: each case contributes exactly one verdict.
    pub async fn grade(
        &self,
        testcases: Vec<TestCase>,
        listener: &mut dyn GradeListener,
    ) -> GradeReport {
        let start_at = Instant::now();
        let cmd = self.runner.get_command();

        log::info!("{} cases loaded", testcases.len());
        log::info!("spawn command is: {} {:?}", cmd.program(), cmd.args());
        listener.on_start(testcases.len(), cmd);

        let verdicts = match self.schedule {
            Schedule::Sequential => {
                let mut verdicts = Vec::with_capacity(testcases.len());
                for t in testcases {
                    let v = self.grade_case(t).await;
                    listener.on_case_done(&v);
                    verdicts.push(v);
                }
                verdicts
            }
            Schedule::Concurrent => {
                let verdicts = join_all(testcases.into_iter().map(|t| self.grade_case(t))).await;
                verdicts.iter().for_each(|v| listener.on_case_done(v));
                verdicts
            }
        };

        let report = GradeReport {
            scorecard: verdicts.iter().map(|v| v.verdict).collect(),
            verdicts,
            elapsed: start_at.elapsed(),
        };
        log::info!("scorecard: {}", report.scorecard);
        listener.on_finish(&report);
        report
    }

    async fn grade_case(&self, testcase: TestCase) -> CaseVerdict {
        let result = self.runner.run(&testcase.stdin()).await;
        let verdict = self::classify(&testcase, &result);
        log::debug!(
            "case {} => {} [{}ms]",
            testcase.name(),
            verdict,
            result.execution_time.as_millis()
        );
        CaseVerdict {
            verdict,
            testcase,
            result,
        }
    }
}

/// Spawn/pipe failures beat timeouts; only a clean run is compared.
pub fn classify(testcase: &TestCase, result: &ExecutionResult) -> Verdict {
    match &result.failure {
        Some(ExecFailure::Spawn(_) | ExecFailure::Io(_)) => Verdict::Error,
        Some(ExecFailure::Timeout(_)) => Verdict::Timeout,
        None if trim_line_ends(&result.captured_output) == testcase.expected_stdout() => {
            Verdict::Pass
        }
        None => Verdict::Mismatch,
    }
}

/// Parses `raw` and grades it against `cmd`, splitting `cmd` on whitespace.
pub async fn grade_text(
    cmd: &str,
    raw: &str,
    timeout: Duration,
    schedule: Schedule,
    listener: &mut dyn GradeListener,
) -> Result<GradeReport, CommandError> {
    let grader = Grader::new(SubjectCommand::parse(cmd)?)
        .timeout(timeout)
        .schedule(schedule);
    Ok(grader.grade(parse_testcases(raw), listener).await)
}

#[cfg(test)]
mod test {
    use std::io;

    use super::*;

    fn ok(output: &str) -> ExecutionResult {
        ExecutionResult {
            captured_output: output.into(),
            stdout: output.into(),
            status: Some(0),
            ..Default::default()
        }
    }

    fn sum_case() -> TestCase {
        TestCase::new(1, ["1", "2"], "`1`\n`2`\n3")
    }

    #[test]
    fn classify_compares_normalized_output() {
        let t = sum_case();
        assert_eq!(classify(&t, &ok("3\n")), Verdict::Pass);
        assert_eq!(classify(&t, &ok("3   \n\n\n")), Verdict::Pass);
        assert_eq!(classify(&t, &ok("4\n")), Verdict::Mismatch);
        assert_eq!(classify(&t, &ok(" 3\n")), Verdict::Mismatch);
        assert_eq!(classify(&t, &ok("")), Verdict::Mismatch);
    }

    #[test]
    fn classify_failures_before_content() {
        let t = sum_case();
        let mut timed_out = ok("3\n");
        timed_out.failure = Some(ExecFailure::Timeout(Duration::from_millis(10)));
        assert_eq!(classify(&t, &timed_out), Verdict::Timeout);

        let spawn = ExecutionResult::failed(
            ExecFailure::Spawn(io::ErrorKind::NotFound.into()),
            Duration::ZERO,
        );
        assert_eq!(classify(&t, &spawn), Verdict::Error);

        let pipe = ExecutionResult::failed(
            ExecFailure::Io(io::ErrorKind::Other.into()),
            Duration::ZERO,
        );
        assert_eq!(classify(&t, &pipe), Verdict::Error);
    }

    #[test]
    fn classify_case_ending_in_marker_compares_against_marker() {
        let t = TestCase::new(1, ["1", "2"], "`1`\n`2`");
        assert_eq!(classify(&t, &ok("`2`\n")), Verdict::Pass);
        assert_eq!(classify(&t, &ok("\n")), Verdict::Mismatch);
    }

    #[derive(Default)]
    struct Recorder {
        started: Option<(usize, String)>,
        done: Vec<usize>,
        finished_with: Option<String>,
    }

    impl GradeListener for Recorder {
        fn on_start(&mut self, num_cases: usize, cmd: &SubjectCommand) {
            self.started = Some((num_cases, cmd.to_string()));
        }

        fn on_case_done(&mut self, verdict: &CaseVerdict) {
            self.done.push(verdict.testcase.ordinal());
        }

        fn on_finish(&mut self, report: &GradeReport) {
            self.finished_with = Some(report.scorecard.to_string());
        }
    }

    fn sleepy_echo() -> SubjectCommand {
        // Sleeps for the given seconds, then echoes them.
        SubjectCommand::new("awk", [r#"{ system("sleep " $1); print $1 }"#])
    }

    fn sleepy_cases() -> Vec<TestCase> {
        parse_testcases("`0.4`\n0.4\n`\n`0`\n1\n`\n`0.1`\n0.1\n`\n")
    }

    #[tokio::test]
    async fn concurrent_keeps_case_order() {
        let mut rec = Recorder::default();
        let report = Grader::new(sleepy_echo())
            .timeout(Duration::from_millis(3000))
            .schedule(Schedule::Concurrent)
            .grade(sleepy_cases(), &mut rec)
            .await;

        assert_eq!(report.scorecard.to_string(), "✓-✓");
        assert_eq!(rec.done, [1, 2, 3]);
        let ordinals: Vec<_> = report.verdicts.iter().map(|v| v.testcase.ordinal()).collect();
        assert_eq!(ordinals, [1, 2, 3]);
    }

    #[tokio::test]
    async fn sequential_and_concurrent_agree() {
        let grader = Grader::new(sleepy_echo()).timeout(Duration::from_millis(3000));
        let seq = grader.clone().grade(sleepy_cases(), &mut Silent).await;
        let con = grader
            .schedule(Schedule::Concurrent)
            .grade(sleepy_cases(), &mut Silent)
            .await;
        assert_eq!(seq.scorecard, con.scorecard);
    }

    #[tokio::test]
    async fn listener_sees_start_and_finish() {
        let mut rec = Recorder::default();
        let report = grade_text(
            "cat",
            "`hi`\nhi\n`\n`yo`\nnope\n`\n",
            Duration::from_millis(2000),
            Schedule::Sequential,
            &mut rec,
        )
        .await
        .unwrap();

        assert_eq!(rec.started, Some((2, "cat".to_owned())));
        assert_eq!(rec.done, [1, 2]);
        assert_eq!(rec.finished_with.as_deref(), Some("✓-"));
        assert_eq!(report.first_failure().map(|v| v.testcase.ordinal()), Some(2));
    }

    #[tokio::test]
    async fn grade_text_rejects_empty_command() {
        let timeout = Duration::from_millis(10);
        let res = grade_text("   ", "", timeout, Schedule::Sequential, &mut Silent).await;
        assert!(matches!(res, Err(CommandError::Empty)));
    }
}
