//! OIDC reconfiguration.
//!
//! The narrow entry point: detect existing config → prompt → confirm →
//! rewrite the env file → restart. Requires an existing installation; once
//! the file is written, a failed restart is a warning, not a failure.

use colored::Colorize;

use crate::RunOutcome;
use crate::collect::collect_oidc_config;
use crate::config::InstallLayout;
use crate::envfile::{EnvFile, render_oidc_block, upsert_keys, write_env};
use crate::error::{InstallError, InstallResult};
use crate::prompt::Prompter;
use crate::system::{Host, require_root};

/// Run the OIDC configurator against an existing installation.
pub fn run_oidc_setup(
	host: &mut Host,
	prompter: &mut dyn Prompter,
	layout: &InstallLayout,
) -> InstallResult<RunOutcome> {
	require_root(host.runner.as_mut())?;

	if !layout.install_dir().exists() {
		return Err(InstallError::Precondition {
			message: format!(
				"no installation found at {}; run kutt-install first",
				layout.install_dir().display()
			),
		});
	}
	let env = EnvFile::load(&layout.env_path())?.ok_or_else(|| InstallError::Precondition {
		message: format!("environment file missing: {}", layout.env_path().display()),
	})?;

	if env.oidc_enabled() {
		let proceed = prompter.confirm(
			"OIDC is already configured. Replace the existing configuration?",
			false,
		)?;
		if !proceed {
			println!("{} existing OIDC configuration left untouched", "✓".green());
			return Ok(RunOutcome::Declined);
		}
	}

	let oidc = collect_oidc_config(prompter)?;

	let domain = env.get("DEFAULT_DOMAIN").unwrap_or("<your-domain>").to_string();
	println!();
	println!("Issuer:       {}", oidc.issuer);
	println!("Client id:    {}", oidc.client_id);
	println!("Scope:        {}", oidc.scope);
	println!("Email claim:  {}", oidc.email_claim);
	println!(
		"Register this callback URL with your identity provider:\n  {}",
		oidc.callback_url(&domain).bold()
	);
	println!();

	if !prompter.confirm("Write this configuration?", true)? {
		println!("{} nothing written", "✓".green());
		return Ok(RunOutcome::Declined);
	}

	// Old OIDC lines are deleted before the new block is appended, so a
	// rerun never duplicates keys.
	let updated = upsert_keys(env.raw(), &render_oidc_block(&oidc));
	write_env(&layout.env_path(), &updated)?;
	println!("{} {} updated", "✓".green(), layout.env_path().display());

	restart_service(host);
	Ok(RunOutcome::Completed)
}

/// Restart the running service; print manual instructions when it is not
/// supervised (or the restart fails). The env file is already written, so
/// nothing here is fatal.
fn restart_service(host: &mut Host) {
	let active = host.services.is_active(crate::SERVICE_UNIT).unwrap_or(false);
	if active {
		match host.services.restart(crate::SERVICE_UNIT) {
			Ok(()) => {
				println!("{} {} restarted", "✓".green(), crate::SERVICE_UNIT);
				return;
			}
			Err(e) => {
				println!("{} restart failed: {e}", "warning:".yellow());
			}
		}
	}
	println!("Restart the application manually to apply the change:");
	println!("  docker:  docker compose restart   (in the install directory)");
	println!("  node:    systemctl restart {}", crate::SERVICE_UNIT);
}
