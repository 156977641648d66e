use std::process::{Command, Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::error::ImportError;
use crate::model::ToolVersions;

pub fn command_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

pub fn command_version_optional(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}

pub fn tool_versions() -> ToolVersions {
    ToolVersions {
        pdftotext: command_version_optional("pdftotext", &["-v"]),
        pdftoppm: command_version_optional("pdftoppm", &["-v"]),
        tesseract: command_version_optional("tesseract", &["--version"]),
    }
}

/// Scanned documents cannot be processed without the renderer and the
/// recognizer; this names whichever are absent.
pub fn ensure_ocr_tools() -> Result<(), ImportError> {
    let missing = ["pdftoppm", "tesseract"]
        .into_iter()
        .filter(|program| !command_available(program))
        .collect::<Vec<&str>>();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ImportError::tool_missing(&missing))
    }
}

/// Runs `command` to completion, killing it once `timeout` elapses.
pub fn run_with_timeout(command: Command, timeout: Duration) -> Result<Output> {
    let program = command.get_program().to_string_lossy().into_owned();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start process runtime")?;

    runtime.block_on(async {
        let mut command = tokio::process::Command::from(command);
        let child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to execute {program}"))?;

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output.with_context(|| format!("failed to wait for {program}")),
            Err(_) => bail!("{program} timed out after {}s", timeout.as_secs()),
        }
    })
}
