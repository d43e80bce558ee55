use std::path::PathBuf;

use anyhow::{anyhow, Context as _};
use casegrade_core::testing::{parse_testcases, GradeReport, Grader, SubjectCommand};

use crate::{config, reporter::ConsoleReporter};

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    /// Command to run the test on, e.g. "python3 main.py" (split on whitespace, no quoting)
    #[arg()] // positional argument
    pub command: String,

    /// File of backtick-delimited testcases
    #[arg()] // positional argument
    pub testcase_file: PathBuf,

    /// Run every testcase at once instead of one after another
    #[arg(long = "async", visible_alias = "concurrent", conflicts_with = "sequential")]
    pub concurrent: bool,

    /// Run testcases one after another (overrides the config file)
    #[arg(long)]
    pub sequential: bool,

    /// Time limit per testcase in milliseconds [default: 5000]
    #[arg(long, value_name = "MILLIS")]
    pub timeout: Option<u64>,

    /// Config file to use instead of the discovered casegrade.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl GlobalArgs {
    pub async fn exec(&self) -> anyhow::Result<GradeReport> {
        let grade_cfg = config::resolve_grade_config(self)?;

        fsutil::ensure_file(&self.testcase_file).map_err(|e| {
            log::debug!("{}", e);
            anyhow!(
                "can not find testcasefile at {}",
                fsutil::absolute_path(&self.testcase_file).to_string_lossy()
            )
        })?;
        let raw = fsutil::read_to_string(&self.testcase_file)?;

        let cmd = SubjectCommand::parse(&self.command)
            .with_context(|| format!("Invalid command {:?}", self.command))?;

        let grader = Grader::new(cmd)
            .timeout(grade_cfg.timeout())
            .schedule(grade_cfg.schedule());

        let mut reporter = ConsoleReporter::new();
        Ok(grader.grade(parse_testcases(&raw), &mut reporter).await)
    }
}
