//! Shell-out command runner.

use std::path::Path;
use std::process::Command;

use crate::error::{InstallError, InstallResult};

use super::{CommandOutput, CommandRunner};

/// Runs programs through `std::process::Command`.
pub struct ShellRunner;

fn capture(command: &mut Command, program: &str) -> InstallResult<CommandOutput> {
	let output = command
		.output()
		.map_err(|e| InstallError::command(program, e.to_string()))?;
	Ok(CommandOutput {
		success: output.status.success(),
		stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
		stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
	})
}

impl CommandRunner for ShellRunner {
	fn run(&mut self, program: &str, args: &[&str]) -> InstallResult<CommandOutput> {
		capture(Command::new(program).args(args), program)
	}

	fn run_in(
		&mut self,
		dir: &Path,
		program: &str,
		args: &[&str],
	) -> InstallResult<CommandOutput> {
		capture(Command::new(program).args(args).current_dir(dir), program)
	}

	fn lookup(&mut self, program: &str) -> bool {
		which::which(program).is_ok()
	}
}

/// Abort unless running as root.
///
/// # Errors
///
/// Returns [`InstallError::NotRoot`] for any non-zero effective uid and
/// [`InstallError::Command`] if the uid cannot be determined at all.
pub fn require_root(runner: &mut dyn CommandRunner) -> InstallResult<()> {
	let output = runner.run("id", &["-u"])?.require_success("id -u")?;
	if output.stdout.trim() != "0" {
		return Err(InstallError::NotRoot);
	}
	Ok(())
}
