//! The install sequence.
//!
//! Strictly ordered: collect → secrets → provision → fetch → env file →
//! nginx phase 1 → certificate → nginx phase 2 → service. Fail fast with no
//! rollback of completed stages, except that a rejected proxy config is
//! never left active (validate-before-activate, with phase-2 restore).

use colored::Colorize;

use crate::RunOutcome;
use crate::collect::collect_install_config;
use crate::config::InstallLayout;
use crate::envfile::{EnvFile, render_env, write_env};
use crate::error::InstallResult;
use crate::nginx::{render_http_site, render_https_site};
use crate::prompt::Prompter;
use crate::report::{InstallReport, InstallStage};
use crate::secrets::Secrets;
use crate::system::{Host, ReverseProxyController, require_root};
use crate::{activate, provision};

/// Record a stage result; a failure prints the partial report before
/// propagating, so the operator sees how far the run got.
fn stage<T>(
	report: &mut InstallReport,
	stage: InstallStage,
	result: InstallResult<T>,
	ok_message: impl FnOnce(&T) -> String,
) -> InstallResult<T> {
	match result {
		Ok(value) => {
			let message = ok_message(&value);
			report.add_stage(stage, true, message);
			Ok(value)
		}
		Err(e) => {
			report.add_stage(stage, false, e.to_string());
			eprintln!("{}", report.format_human());
			Err(e)
		}
	}
}

/// Write, enable, and validate a site; activate only a passing config.
///
/// On a failed syntax check the site is restored to `previous` (or removed
/// entirely for the first version) before the error propagates. The running
/// proxy never loaded the rejected file, so the last good config stays
/// active.
fn activate_site(
	proxy: &mut dyn ReverseProxyController,
	content: &str,
	previous: Option<&str>,
) -> InstallResult<()> {
	proxy.write_site(crate::NGINX_SITE, content)?;
	proxy.enable_site(crate::NGINX_SITE)?;
	if let Err(e) = proxy.validate() {
		match previous {
			Some(prev) => proxy.write_site(crate::NGINX_SITE, prev)?,
			None => proxy.remove_site(crate::NGINX_SITE)?,
		}
		return Err(e);
	}
	proxy.reload()
}

/// Run the full installer.
///
/// Returns [`RunOutcome::Declined`] (exit 0, no changes) when the operator
/// declines to overwrite an existing installation.
pub fn run_install(
	host: &mut Host,
	prompter: &mut dyn Prompter,
	layout: &InstallLayout,
) -> InstallResult<RunOutcome> {
	require_root(host.runner.as_mut())?;

	// Explicit read-then-parse; an existing env file means a prior install.
	if EnvFile::load(&layout.env_path())?.is_some() {
		let proceed = prompter.confirm(
			"An existing installation was detected. Reinstall and overwrite its configuration?",
			false,
		)?;
		if !proceed {
			println!("{} leaving the existing installation untouched", "✓".green());
			return Ok(RunOutcome::Declined);
		}
	}

	let config = collect_install_config(prompter)?;
	let secrets = Secrets::generate()?;

	let mut report = InstallReport::new(&config.domain, config.mode.label());
	report.add_stage(InstallStage::Preflight, true, "running as root");
	report.add_stage(
		InstallStage::Collect,
		true,
		format!("domain {}, {} mode", config.domain, config.mode.label()),
	);

	stage(
		&mut report,
		InstallStage::Provision,
		provision::provision(host, config.mode),
		|_| "all dependencies present".into(),
	)?;

	stage(
		&mut report,
		InstallStage::FetchSource,
		fetch_source(host, layout),
		|fetched| {
			if *fetched {
				format!("cloned into {}", layout.install_dir().display())
			} else {
				"existing checkout left in place".into()
			}
		},
	)?;

	stage(
		&mut report,
		InstallStage::RenderEnv,
		write_env(&layout.env_path(), &render_env(&config, &secrets)),
		|_| format!("{} written (0600)", layout.env_path().display()),
	)?;

	let http_site = render_http_site(&config.domain)?;
	stage(
		&mut report,
		InstallStage::ProxyHttp,
		activate_site(host.proxy.as_mut(), &http_site, None),
		|_| "http-only site active for ACME validation".into(),
	)?;

	stage(
		&mut report,
		InstallStage::Certificate,
		obtain_certificate(host, &config.domain, &config.le_email),
		|_| format!("certificate issued for {}", config.domain),
	)?;

	let https_site = render_https_site(&config.domain)?;
	stage(
		&mut report,
		InstallStage::ProxyHttps,
		activate_site(host.proxy.as_mut(), &https_site, Some(&http_site)),
		|_| "https site active".into(),
	)?;

	stage(
		&mut report,
		InstallStage::Activate,
		activate::activate(host, &config, layout),
		|message| message.clone(),
	)?;

	println!("{}", report.format_human());
	Ok(RunOutcome::Completed)
}

/// Clone the application source unless a checkout is already present.
/// Returns `true` when a fresh clone was made.
fn fetch_source(host: &mut Host, layout: &InstallLayout) -> InstallResult<bool> {
	let dir = layout.install_dir();
	if dir.join(".git").exists() {
		return Ok(false);
	}
	host.runner
		.run(
			"git",
			&["clone", crate::KUTT_REPO_URL, &dir.display().to_string()],
		)?
		.require_success("git clone")?;
	Ok(true)
}

/// Issue the certificate, then wire up automatic renewal.
fn obtain_certificate(host: &mut Host, domain: &str, email: &str) -> InstallResult<()> {
	host.certificates.issue(domain, email)?;
	host.certificates.install_renewal_hook()?;
	host.services.enable("certbot.timer")?;
	Ok(())
}
