//! The uninstall sequencer.
//!
//! Nine stages walk the installer's artifacts in reverse. Every stage
//! detects its target first (absence is logged, not an error), asks its own
//! confirmation (data-loss stages default to no), and tolerates failure:
//! a broken stage is recorded as a warning and the sequencer moves on, so
//! as much as possible is cleaned up even under partial failure.

use colored::Colorize;
use comfy_table::Table;

use crate::RunOutcome;
use crate::config::InstallLayout;
use crate::envfile::EnvFile;
use crate::error::InstallResult;
use crate::prompt::Prompter;
use crate::system::{Host, require_root};

/// What happened to one teardown stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
	Removed,
	Declined,
	Absent,
	Failed(String),
}

impl StageOutcome {
	fn label(&self) -> String {
		match self {
			StageOutcome::Removed => "removed".into(),
			StageOutcome::Declined => "kept (declined)".into(),
			StageOutcome::Absent => "not present".into(),
			StageOutcome::Failed(message) => format!("FAILED: {message}"),
		}
	}
}

/// Per-stage record for the summary table.
#[derive(Debug, Clone)]
pub struct StageRecord {
	pub name: &'static str,
	pub outcome: StageOutcome,
}

fn record(records: &mut Vec<StageRecord>, name: &'static str, outcome: StageOutcome) {
	match &outcome {
		StageOutcome::Removed => println!("{} {name} removed", "✓".green()),
		StageOutcome::Declined => println!("{} {name} kept", "-".normal()),
		StageOutcome::Absent => println!("{} {name} not present, skipping", "-".normal()),
		StageOutcome::Failed(message) => {
			println!("{} {name} could not be removed: {message}", "warning:".yellow());
		}
	}
	records.push(StageRecord { name, outcome });
}

/// Fold a detect result, a confirmation, and a removal action into an
/// outcome. `detect` and `remove` failures never abort the sequencer.
fn outcome_of(detected: InstallResult<bool>, removal: Option<InstallResult<()>>) -> StageOutcome {
	match detected {
		Ok(false) => StageOutcome::Absent,
		Err(e) => StageOutcome::Failed(e.to_string()),
		Ok(true) => match removal {
			None => StageOutcome::Declined,
			Some(Ok(())) => StageOutcome::Removed,
			Some(Err(e)) => StageOutcome::Failed(e.to_string()),
		},
	}
}

/// Run the nine-stage teardown.
///
/// Declining a stage's confirmation only skips that stage; the sequencer
/// always runs to the end and exits zero.
pub fn run_teardown(
	host: &mut Host,
	prompter: &mut dyn Prompter,
	layout: &InstallLayout,
) -> InstallResult<RunOutcome> {
	require_root(host.runner.as_mut())?;

	// Read the env file up front; later stages remove it.
	let env = EnvFile::load(&layout.env_path())?;
	let domain = env.as_ref().and_then(|e| e.get("DEFAULT_DOMAIN").map(str::to_string));
	let compose_args = match env.as_ref().and_then(|e| e.get("DB_CLIENT")) {
		Some("pg") => crate::config::DatabaseBackend::Postgres.compose_args(),
		_ => crate::config::DatabaseBackend::Sqlite.compose_args(),
	};

	let mut records: Vec<StageRecord> = Vec::new();

	// Stage 1: the service is stopped first so nothing below is pulled out
	// from under a running process.
	{
		let detected = host.services.unit_exists(crate::SERVICE_UNIT);
		let removal = if detected.as_ref().is_ok_and(|d| *d)
			&& prompter.confirm("Stop and remove the kutt systemd service?", true)?
		{
			Some(
				host.services
					.stop_disable(crate::SERVICE_UNIT)
					.and_then(|()| host.services.remove_unit(crate::SERVICE_UNIT)),
			)
		} else {
			None
		};
		record(&mut records, "systemd service", outcome_of(detected, removal));
	}

	// Stage 2: containers.
	{
		let detected = host
			.containers
			.is_available()
			.map(|available| available && layout.install_dir().exists());
		let removal = if detected.as_ref().is_ok_and(|d| *d)
			&& prompter.confirm("Tear down the docker containers?", true)?
		{
			let remove_volumes = prompter.confirm(
				"Also remove data volumes? This permanently deletes the database.",
				false,
			)?;
			Some(host.containers.compose_down(
				layout.install_dir(),
				compose_args,
				remove_volumes,
			))
		} else {
			None
		};
		record(&mut records, "docker containers", outcome_of(detected, removal));
	}

	// Stage 3: service account.
	{
		let detected = host
			.runner
			.run("id", &["-u", crate::SERVICE_USER])
			.map(|output| output.success);
		let removal = if detected.as_ref().is_ok_and(|d| *d)
			&& prompter.confirm("Remove the kutt service user?", true)?
		{
			Some(
				host.runner
					.run("userdel", &[crate::SERVICE_USER])
					.and_then(|output| output.require_success("userdel"))
					.map(|_| ()),
			)
		} else {
			None
		};
		record(&mut records, "service user", outcome_of(detected, removal));
	}

	// Stage 4: nginx site.
	{
		let detected = host.proxy.site_exists(crate::NGINX_SITE);
		let removal = if detected.as_ref().is_ok_and(|d| *d)
			&& prompter.confirm("Remove the nginx site configuration?", true)?
		{
			Some(
				host.proxy
					.remove_site(crate::NGINX_SITE)
					.and_then(|()| host.proxy.reload()),
			)
		} else {
			None
		};
		record(&mut records, "nginx site", outcome_of(detected, removal));
	}

	// Stage 5: certificate. Requires the domain from the env file.
	{
		let detected = match &domain {
			Some(domain) => host.certificates.certificate_exists(domain),
			None => Ok(false),
		};
		let removal = if detected.as_ref().is_ok_and(|d| *d)
			&& prompter.confirm("Revoke and delete the TLS certificate?", true)?
		{
			// Detection only succeeds with a known domain.
			let domain = domain.as_deref().unwrap_or_default();
			Some(host.certificates.revoke(domain))
		} else {
			None
		};
		record(&mut records, "tls certificate", outcome_of(detected, removal));
	}

	// Stage 6: renewal hook.
	{
		let detected = host.certificates.hook_exists();
		let removal = if detected.as_ref().is_ok_and(|d| *d)
			&& prompter.confirm("Remove the certificate renewal hook?", true)?
		{
			Some(host.certificates.remove_renewal_hook())
		} else {
			None
		};
		record(&mut records, "renewal hook", outcome_of(detected, removal));
	}

	// Stage 7: firewall rule. The SSH rule is left alone so the operator
	// is never locked out.
	{
		let detected = Ok(host.runner.lookup("ufw"));
		let removal = if detected.as_ref().is_ok_and(|d| *d)
			&& prompter.confirm("Remove the 'Nginx Full' firewall rule?", true)?
		{
			Some(
				host.runner
					.run("ufw", &["delete", "allow", "Nginx Full"])
					.and_then(|output| output.require_success("ufw delete"))
					.map(|_| ()),
			)
		} else {
			None
		};
		record(&mut records, "firewall rule", outcome_of(detected, removal));
	}

	// Stage 8: install directory. Data loss; defaults to no.
	{
		let detected = Ok(layout.install_dir().exists());
		let removal = if detected.as_ref().is_ok_and(|d| *d)
			&& prompter.confirm(
				"Delete the install directory (including the database and .env)? This cannot be undone.",
				false,
			)? {
			Some(std::fs::remove_dir_all(layout.install_dir()).map_err(Into::into))
		} else {
			None
		};
		record(&mut records, "install directory", outcome_of(detected, removal));
	}

	// Stage 9: packages, last and most shared. Only packages actually on
	// the system are offered for removal.
	{
		let mut candidates: Vec<&str> = vec!["nginx", "certbot"];
		if host.containers.is_available().unwrap_or(false) {
			candidates.extend(["docker.io", "docker-compose-v2"]);
		}
		let mut installed: Vec<&str> = Vec::new();
		let mut probe_error = None;
		for package in candidates {
			match host.packages.is_installed(package) {
				Ok(true) => installed.push(package),
				Ok(false) => {}
				Err(e) => {
					probe_error = Some(e);
					break;
				}
			}
		}
		let detected = match probe_error {
			Some(e) => Err(e),
			None => Ok(!installed.is_empty()),
		};
		let removal = if detected.as_ref().is_ok_and(|d| *d)
			&& prompter.confirm(
				&format!(
					"Remove system packages ({})? Other services on this host may still use them.",
					installed.join(", ")
				),
				false,
			)? {
			Some(host.packages.remove(&installed))
		} else {
			None
		};
		record(&mut records, "system packages", outcome_of(detected, removal));
	}

	println!("\n{}", summary_table(&records));
	Ok(RunOutcome::Completed)
}

/// Render the per-stage outcome table.
pub fn summary_table(records: &[StageRecord]) -> Table {
	let mut table = Table::new();
	table.set_header(["stage", "outcome"]);
	for record in records {
		table.add_row([record.name.to_string(), record.outcome.label()]);
	}
	table
}
