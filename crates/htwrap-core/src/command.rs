//! httrack command synthesis.
//!
//! One token list backs both outputs: `render` gives the display/compat string
//! (values in double quotes, not escaped), `args` gives the argv used to
//! actually launch the tool without a shell.

use anyhow::{Context, Result};
use std::fmt;
use std::process::{Command, ExitStatus};

use crate::auth::AuthData;
use crate::config::MirrorConfig;

/// Name of the mirroring binary, resolved through `PATH`.
pub const MIRROR_PROGRAM: &str = "httrack";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Bare(String),
    Quoted(String),
}

impl Token {
    fn into_arg(self) -> String {
        match self {
            Token::Bare(s) | Token::Quoted(s) => s,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Bare(s) => f.write_str(s),
            Token::Quoted(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// A fully resolved httrack invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorCommand {
    tokens: Vec<Token>,
}

impl MirrorCommand {
    /// Build the invocation for `url` into `output` from `config` and optional
    /// captured auth data. Flag order is fixed: output, user-agent, depth,
    /// external depth, size, then the optional switches, cookies last.
    pub fn build(config: &MirrorConfig, auth: Option<&AuthData>, url: &str, output: &str) -> Self {
        let mut tokens = vec![
            Token::Bare(url.to_string()),
            Token::Bare("-O".to_string()),
            Token::Quoted(output.to_string()),
            Token::Bare("--user-agent".to_string()),
            Token::Quoted(config.user_agent.clone()),
            Token::Bare(format!("-r{}", config.max_depth)),
            Token::Bare(format!("-m{}", config.max_external_depth)),
            Token::Bare(format!("-M{}", config.max_size)),
        ];

        if !config.robots {
            tokens.push(Token::Bare("-s0".to_string()));
        }
        if config.cookies {
            tokens.push(Token::Bare("-b0".to_string()));
        }
        if config.update {
            tokens.push(Token::Bare("-u".to_string()));
        }
        if config.continue_interrupted {
            tokens.push(Token::Bare("-c".to_string()));
        }
        if let Some(cookies) = auth.and_then(AuthData::cookie_string) {
            tokens.push(Token::Bare("--cookies".to_string()));
            tokens.push(Token::Quoted(cookies));
        }

        Self { tokens }
    }

    /// The shell-style command line, e.g. `httrack URL -O "out" ...`.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Arguments after the program name, unquoted.
    pub fn args(&self) -> Vec<String> {
        self.tokens.iter().cloned().map(Token::into_arg).collect()
    }

    /// Launch httrack with `args()` and wait for it. Output goes straight to
    /// the terminal.
    pub fn execute(&self) -> Result<ExitStatus> {
        let status = Command::new(MIRROR_PROGRAM)
            .args(self.args())
            .status()
            .with_context(|| format!("failed to launch {}", MIRROR_PROGRAM))?;
        if status.success() {
            tracing::info!("{} finished", MIRROR_PROGRAM);
        } else {
            tracing::warn!("{} exited with {}", MIRROR_PROGRAM, status);
        }
        Ok(status)
    }
}

impl fmt::Display for MirrorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MIRROR_PROGRAM)?;
        for token in &self.tokens {
            write!(f, " {}", token)?;
        }
        Ok(())
    }
}
