//! Node.js version gating.
//!
//! Node mode requires a minimum major version; an older or missing runtime
//! is provisioned through the NodeSource repository. Parsing is separated
//! from execution so the gate is testable without a runtime installed.

use regex::Regex;

use crate::error::{InstallError, InstallResult};

/// NodeSource setup script for the distribution channel we install.
pub const NODESOURCE_SETUP_URL: &str = "https://deb.nodesource.com/setup_20.x";

/// Parse a Node.js version from `node --version` output (`v18.19.0`).
///
/// # Errors
///
/// Returns [`InstallError::Command`] if the output does not contain a
/// recognizable version string.
pub fn parse_node_version(output: &str) -> InstallResult<(u32, u32, u32)> {
	let re = Regex::new(r"v(\d+)\.(\d+)\.(\d+)").map_err(|e| {
		InstallError::command("node --version", format!("failed to compile version regex: {e}"))
	})?;

	let caps = re.captures(output).ok_or_else(|| {
		InstallError::command(
			"node --version",
			format!("could not parse node version from output: {output}"),
		)
	})?;

	let parse = |i: usize| {
		caps[i]
			.parse::<u32>()
			.map_err(|e| InstallError::command("node --version", format!("invalid version component: {e}")))
	};

	Ok((parse(1)?, parse(2)?, parse(3)?))
}

/// Check whether a version tuple meets a minimum major version.
pub fn major_satisfies(version: (u32, u32, u32), minimum_major: u32) -> bool {
	version.0 >= minimum_major
}
