use std::{fmt, str::FromStr};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Empty command: expected '<executable> [args...]'")]
    Empty,
}

/// The program under test and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectCommand {
    program: String,
    args: Vec<String>,
}

impl SubjectCommand {
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits on runs of whitespace. There is no quoting: `sh -c 'a b'`
    /// becomes four tokens.
    pub fn parse(s: &str) -> Result<Self, CommandError> {
        let mut tokens = s.split_whitespace();
        let program = tokens.next().ok_or(CommandError::Empty)?;
        Ok(Self::new(program, tokens))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl FromStr for SubjectCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SubjectCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
