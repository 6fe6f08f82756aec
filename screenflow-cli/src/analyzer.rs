//! Analysis service backed by an external command
//!
//! The command receives the analysis request as JSON on stdin and must print
//! the sitemap response as JSON on stdout. A non-zero exit status fails the
//! call with whatever the command wrote to stderr.

use screenflow_core::analysis::parse_response;
use screenflow_core::{AnalysisRequest, AnalysisService, Error, Result, SitemapGraph};
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

pub struct CommandAnalysisService {
    program: String,
    args: Vec<String>,
}

impl CommandAnalysisService {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Splits a command line on whitespace; `None` when it is blank
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl AnalysisService for CommandAnalysisService {
    fn analyze(&self, request: &AnalysisRequest) -> Result<SitemapGraph> {
        let payload = serde_json::to_vec(request)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::AnalysisService(format!("failed to start '{}': {e}", self.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::AnalysisService("analyzer stdin unavailable".into()))?;

        // The request can be far larger than a pipe buffer, so feed it from a
        // separate thread while stdout is drained here.
        let writer = thread::spawn(move || stdin.write_all(&payload));
        let output = child.wait_with_output()?;
        let written = writer
            .join()
            .map_err(|_| Error::AnalysisService("failed to send request to analyzer".into()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::AnalysisService(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        written?;

        parse_response(&output.stdout, request.len())
    }
}
