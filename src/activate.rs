//! Service activation.
//!
//! Registers `kutt.service` so the application survives reboots. The unit's
//! start/stop commands mirror what an operator would run by hand: `docker
//! compose up`/`down` in Docker mode, `npm start` as the service user in
//! Node mode. Node mode installs dependencies and migrates the schema
//! before the unit is registered; a failure there leaves no unit behind.

use tera::{Context, Tera};

use crate::config::{DeployMode, InstallConfig, InstallLayout};
use crate::error::{InstallError, InstallResult};
use crate::system::Host;

/// Embedded systemd unit templates.
#[derive(rust_embed::RustEmbed)]
#[folder = "templates/systemd/"]
struct SystemdTemplates;

/// Restart backoff for the Node-mode unit, in seconds.
const NODE_RESTART_SEC: u32 = 5;

/// Load all systemd Tera templates from embedded resources.
fn load_systemd_templates() -> InstallResult<Tera> {
	let mut tera = Tera::default();

	for file_path in SystemdTemplates::iter() {
		let file = SystemdTemplates::get(&file_path).ok_or_else(|| InstallError::Template {
			message: format!("embedded systemd template not found: {file_path}"),
		})?;
		let content =
			std::str::from_utf8(file.data.as_ref()).map_err(|e| InstallError::Template {
				message: format!("invalid UTF-8 in systemd template {file_path}: {e}"),
			})?;
		tera.add_raw_template(&file_path, content)?;
	}

	Ok(tera)
}

/// Render the Docker-mode unit for the configured backend.
pub fn render_compose_unit(config: &InstallConfig, layout: &InstallLayout) -> InstallResult<String> {
	let tera = load_systemd_templates()?;
	let mut ctx = Context::new();
	ctx.insert("install_dir", &layout.install_dir().display().to_string());
	ctx.insert("compose_args", config.database.compose_args());
	Ok(tera.render("compose.service.tera", &ctx)?)
}

/// Render the Node-mode unit.
pub fn render_node_unit(layout: &InstallLayout) -> InstallResult<String> {
	let tera = load_systemd_templates()?;
	let mut ctx = Context::new();
	ctx.insert("install_dir", &layout.install_dir().display().to_string());
	ctx.insert("service_user", crate::SERVICE_USER);
	ctx.insert("restart_sec", &NODE_RESTART_SEC);
	Ok(tera.render("node.service.tera", &ctx)?)
}

/// Bring the service up and enable start-on-boot.
///
/// Returns a short message for the install report.
///
/// # Errors
///
/// Docker mode: a compose startup failure is fatal and the unit is not
/// registered. Node mode: dependency installation or migration failure is
/// fatal and the unit is not registered. Both modes: unit registration
/// failure is fatal.
pub fn activate(
	host: &mut Host,
	config: &InstallConfig,
	layout: &InstallLayout,
) -> InstallResult<String> {
	match config.mode {
		DeployMode::Docker => {
			// Bring the containers up directly so a compose failure surfaces
			// here. `enable --now` then re-runs the idempotent `up`, leaving
			// the unit active so is-active/stop reflect the containers
			// immediately, not only after the next boot.
			host.containers
				.compose_up(layout.install_dir(), config.database.compose_args())?;
			let unit = render_compose_unit(config, layout)?;
			host.services.write_unit(crate::SERVICE_UNIT, &unit)?;
			host.services.enable_now(crate::SERVICE_UNIT)?;
			Ok(format!(
				"{} running and enabled (docker compose, {} backend)",
				crate::SERVICE_UNIT,
				config.database.db_client()
			))
		}
		DeployMode::Node => {
			let dir = layout.install_dir();
			host.runner
				.run_in(dir, "npm", &["install", "--omit=dev"])?
				.require_success("npm install")?;
			host.runner
				.run_in(dir, "npm", &["run", "migrate"])?
				.require_success("npm run migrate")?;

			ensure_service_user(host)?;
			let owner = format!("{}:{}", crate::SERVICE_USER, crate::SERVICE_USER);
			host.runner
				.run(
					"chown",
					&["-R", &owner, &dir.display().to_string()],
				)?
				.require_success("chown")?;

			let unit = render_node_unit(layout)?;
			host.services.write_unit(crate::SERVICE_UNIT, &unit)?;
			host.services.enable_now(crate::SERVICE_UNIT)?;
			Ok(format!(
				"{} enabled (node, running as {})",
				crate::SERVICE_UNIT,
				crate::SERVICE_USER
			))
		}
	}
}

/// Create the unprivileged service account if absent.
fn ensure_service_user(host: &mut Host) -> InstallResult<()> {
	let probe = host.runner.run("id", &["-u", crate::SERVICE_USER])?;
	if probe.success {
		return Ok(());
	}
	host.runner
		.run(
			"useradd",
			&[
				"--system",
				"--shell",
				"/usr/sbin/nologin",
				"--no-create-home",
				crate::SERVICE_USER,
			],
		)?
		.require_success("useradd")?;
	Ok(())
}
