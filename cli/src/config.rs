use anyhow::Context as _;
use casegrade_core::config::{Config, GradeConfig};

use crate::{cmd::GlobalArgs, util};

/// Config file (explicit `--config`, else discovered) overridden by flags.
pub fn resolve_grade_config(args: &GlobalArgs) -> anyhow::Result<GradeConfig> {
    let cfg = match &args.config {
        Some(path) => Config::from_toml_file(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => Config::discover(util::current_dir())?,
    };
    if let Some(path) = &cfg.source_config_file {
        log::info!(
            "Using config '{}'",
            util::replace_homedir_to_tilde(path).to_string_lossy()
        );
    }
    Ok(with_args(cfg.grade, args))
}

pub fn with_args(mut grade: GradeConfig, args: &GlobalArgs) -> GradeConfig {
    if let Some(ms) = args.timeout {
        grade.timeout_ms = ms;
    }
    if args.concurrent {
        grade.concurrent = true;
    }
    if args.sequential {
        grade.concurrent = false;
    }
    grade
}

#[cfg(test)]
mod test {
    use clap::Parser as _;

    use super::*;

    #[test]
    fn flags_override_file() {
        let file = GradeConfig {
            timeout_ms: 1000,
            concurrent: true,
        };

        let args = GlobalArgs::parse_from(["casegrade", "./a.out", "cases.txt"]);
        assert_eq!(with_args(file.clone(), &args), file);

        let args = GlobalArgs::parse_from([
            "casegrade",
            "./a.out",
            "cases.txt",
            "--timeout",
            "250",
            "--sequential",
        ]);
        let grade = with_args(file, &args);
        assert_eq!(grade.timeout_ms, 250);
        assert!(!grade.concurrent);
    }

    #[test]
    fn async_flag_enables_concurrency() {
        let args = GlobalArgs::parse_from(["casegrade", "python3 main.py", "cases.txt", "--async"]);
        assert_eq!(args.command, "python3 main.py");
        assert!(with_args(GradeConfig::default(), &args).concurrent);
    }
}
