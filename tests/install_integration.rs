//! Integration tests for the install, teardown, and OIDC flows.
//!
//! Every external tool is replaced with an in-memory fake implementing the
//! capability traits, so the full orchestration runs against a temp
//! directory instead of a real host: parameter validation, two-phase proxy
//! activation, certificate ordering, service registration, teardown
//! isolation, and env-file rewrites.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;

use rstest::rstest;

use kutt_deploy::config::InstallLayout;
use kutt_deploy::envfile::EnvFile;
use kutt_deploy::error::{InstallError, InstallResult};
use kutt_deploy::install::run_install;
use kutt_deploy::oidc::run_oidc_setup;
use kutt_deploy::prompt::ScriptedPrompter;
use kutt_deploy::system::{
	CertificateClient, CommandOutput, CommandRunner, ContainerRuntime, Host, PackageManager,
	ReverseProxyController, ServiceSupervisor,
};
use kutt_deploy::teardown::run_teardown;
use kutt_deploy::{NGINX_SITE, RunOutcome, SERVICE_UNIT};

// ===========================================================================
// In-memory fakes
// ===========================================================================

#[derive(Default)]
struct RunnerState {
	calls: Vec<String>,
	/// Exact joined command -> (success, stdout, stderr). Unlisted commands
	/// succeed with empty output.
	responses: HashMap<String, (bool, String, String)>,
	tools: HashSet<String>,
}

struct FakeRunner(Rc<RefCell<RunnerState>>);

impl CommandRunner for FakeRunner {
	fn run(&mut self, program: &str, args: &[&str]) -> InstallResult<CommandOutput> {
		let joined = std::iter::once(program)
			.chain(args.iter().copied())
			.collect::<Vec<_>>()
			.join(" ");
		let mut state = self.0.borrow_mut();
		state.calls.push(joined.clone());
		let (success, stdout, stderr) = state
			.responses
			.get(&joined)
			.cloned()
			.unwrap_or((true, String::new(), String::new()));
		Ok(CommandOutput {
			success,
			stdout,
			stderr,
		})
	}

	fn run_in(
		&mut self,
		_dir: &Path,
		program: &str,
		args: &[&str],
	) -> InstallResult<CommandOutput> {
		self.run(program, args)
	}

	fn lookup(&mut self, program: &str) -> bool {
		self.0.borrow().tools.contains(program)
	}
}

#[derive(Default)]
struct PackagesState {
	installed: HashSet<String>,
	installs: Vec<String>,
	removes: Vec<String>,
	index_updates: usize,
}

struct FakePackages(Rc<RefCell<PackagesState>>);

impl PackageManager for FakePackages {
	fn is_installed(&mut self, package: &str) -> InstallResult<bool> {
		Ok(self.0.borrow().installed.contains(package))
	}

	fn update_index(&mut self) -> InstallResult<()> {
		self.0.borrow_mut().index_updates += 1;
		Ok(())
	}

	fn install(&mut self, packages: &[&str]) -> InstallResult<()> {
		let mut state = self.0.borrow_mut();
		for p in packages {
			state.installed.insert(p.to_string());
			state.installs.push(p.to_string());
		}
		Ok(())
	}

	fn remove(&mut self, packages: &[&str]) -> InstallResult<()> {
		let mut state = self.0.borrow_mut();
		for p in packages {
			state.removes.push(p.to_string());
		}
		Ok(())
	}
}

#[derive(Default)]
struct ServicesState {
	units: HashMap<String, String>,
	enabled: Vec<String>,
	enabled_now: Vec<String>,
	active: HashSet<String>,
	restarts: Vec<String>,
	stopped: Vec<String>,
	removed_units: Vec<String>,
}

struct FakeServices(Rc<RefCell<ServicesState>>);

impl ServiceSupervisor for FakeServices {
	fn write_unit(&mut self, name: &str, content: &str) -> InstallResult<()> {
		self.0
			.borrow_mut()
			.units
			.insert(name.to_string(), content.to_string());
		Ok(())
	}

	fn enable_now(&mut self, name: &str) -> InstallResult<()> {
		let mut state = self.0.borrow_mut();
		state.enabled_now.push(name.to_string());
		state.active.insert(name.to_string());
		Ok(())
	}

	fn enable(&mut self, name: &str) -> InstallResult<()> {
		self.0.borrow_mut().enabled.push(name.to_string());
		Ok(())
	}

	fn restart(&mut self, name: &str) -> InstallResult<()> {
		self.0.borrow_mut().restarts.push(name.to_string());
		Ok(())
	}

	fn stop_disable(&mut self, name: &str) -> InstallResult<()> {
		let mut state = self.0.borrow_mut();
		state.stopped.push(name.to_string());
		state.active.remove(name);
		Ok(())
	}

	fn remove_unit(&mut self, name: &str) -> InstallResult<()> {
		let mut state = self.0.borrow_mut();
		state.units.remove(name);
		state.removed_units.push(name.to_string());
		Ok(())
	}

	fn is_active(&mut self, name: &str) -> InstallResult<bool> {
		Ok(self.0.borrow().active.contains(name))
	}

	fn unit_exists(&mut self, name: &str) -> InstallResult<bool> {
		Ok(self.0.borrow().units.contains_key(name))
	}
}

#[derive(Default)]
struct ProxyState {
	sites: HashMap<String, String>,
	enabled: HashSet<String>,
	/// Content the proxy is serving, set at the last successful reload.
	active: Option<String>,
	reloads: usize,
	/// Validation fails while any written site contains this marker.
	reject_marker: Option<String>,
	removed: Vec<String>,
}

struct FakeProxy(Rc<RefCell<ProxyState>>);

impl ReverseProxyController for FakeProxy {
	fn write_site(&mut self, name: &str, content: &str) -> InstallResult<()> {
		self.0
			.borrow_mut()
			.sites
			.insert(name.to_string(), content.to_string());
		Ok(())
	}

	fn enable_site(&mut self, name: &str) -> InstallResult<()> {
		self.0.borrow_mut().enabled.insert(name.to_string());
		Ok(())
	}

	fn validate(&mut self) -> InstallResult<()> {
		let state = self.0.borrow();
		if let Some(marker) = &state.reject_marker {
			if state.sites.values().any(|c| c.contains(marker)) {
				return Err(InstallError::ProxyValidation {
					message: format!("directive rejected: {marker}"),
				});
			}
		}
		Ok(())
	}

	fn reload(&mut self) -> InstallResult<()> {
		let mut state = self.0.borrow_mut();
		state.active = state.sites.get(NGINX_SITE).cloned();
		state.reloads += 1;
		Ok(())
	}

	fn site_exists(&mut self, name: &str) -> InstallResult<bool> {
		Ok(self.0.borrow().sites.contains_key(name))
	}

	fn remove_site(&mut self, name: &str) -> InstallResult<()> {
		let mut state = self.0.borrow_mut();
		state.sites.remove(name);
		state.enabled.remove(name);
		state.removed.push(name.to_string());
		Ok(())
	}
}

#[derive(Default)]
struct CertsState {
	issued: Vec<(String, String)>,
	revoked: Vec<String>,
	existing: HashSet<String>,
	hook: bool,
	fail_issue: bool,
}

struct FakeCerts(Rc<RefCell<CertsState>>);

impl CertificateClient for FakeCerts {
	fn issue(&mut self, domain: &str, email: &str) -> InstallResult<()> {
		let mut state = self.0.borrow_mut();
		if state.fail_issue {
			return Err(InstallError::Certificate {
				domain: domain.to_string(),
				message: "rate limited".into(),
			});
		}
		state.issued.push((domain.to_string(), email.to_string()));
		state.existing.insert(domain.to_string());
		Ok(())
	}

	fn revoke(&mut self, domain: &str) -> InstallResult<()> {
		let mut state = self.0.borrow_mut();
		state.revoked.push(domain.to_string());
		state.existing.remove(domain);
		Ok(())
	}

	fn certificate_exists(&mut self, domain: &str) -> InstallResult<bool> {
		Ok(self.0.borrow().existing.contains(domain))
	}

	fn install_renewal_hook(&mut self) -> InstallResult<()> {
		self.0.borrow_mut().hook = true;
		Ok(())
	}

	fn remove_renewal_hook(&mut self) -> InstallResult<()> {
		self.0.borrow_mut().hook = false;
		Ok(())
	}

	fn hook_exists(&mut self) -> InstallResult<bool> {
		Ok(self.0.borrow().hook)
	}
}

#[derive(Default)]
struct ContainersState {
	available: bool,
	ups: Vec<String>,
	downs: Vec<(String, bool)>,
	fail_down: bool,
}

struct FakeContainers(Rc<RefCell<ContainersState>>);

impl ContainerRuntime for FakeContainers {
	fn is_available(&mut self) -> InstallResult<bool> {
		Ok(self.0.borrow().available)
	}

	fn compose_up(&mut self, _dir: &Path, compose_args: &str) -> InstallResult<()> {
		self.0.borrow_mut().ups.push(compose_args.to_string());
		Ok(())
	}

	fn compose_down(
		&mut self,
		_dir: &Path,
		compose_args: &str,
		remove_volumes: bool,
	) -> InstallResult<()> {
		let mut state = self.0.borrow_mut();
		if state.fail_down {
			return Err(InstallError::command("docker compose down", "daemon not running"));
		}
		state
			.downs
			.push((compose_args.to_string(), remove_volumes));
		Ok(())
	}
}

/// Handles to every fake's state, kept by the test after the `Host` takes
/// ownership of the fakes themselves.
struct Fakes {
	runner: Rc<RefCell<RunnerState>>,
	packages: Rc<RefCell<PackagesState>>,
	services: Rc<RefCell<ServicesState>>,
	proxy: Rc<RefCell<ProxyState>>,
	certs: Rc<RefCell<CertsState>>,
	containers: Rc<RefCell<ContainersState>>,
}

/// A host where every common tool is present and every command succeeds.
fn fake_host() -> (Host, Fakes) {
	let runner = Rc::new(RefCell::new(RunnerState::default()));
	{
		let mut state = runner.borrow_mut();
		state
			.responses
			.insert("id -u".into(), (true, "0\n".into(), String::new()));
		for tool in ["nginx", "certbot", "ufw", "git"] {
			state.tools.insert(tool.to_string());
		}
	}
	let packages = Rc::new(RefCell::new(PackagesState::default()));
	let services = Rc::new(RefCell::new(ServicesState::default()));
	let proxy = Rc::new(RefCell::new(ProxyState::default()));
	let certs = Rc::new(RefCell::new(CertsState::default()));
	let containers = Rc::new(RefCell::new(ContainersState {
		available: true,
		..Default::default()
	}));

	let host = Host {
		packages: Box::new(FakePackages(packages.clone())),
		services: Box::new(FakeServices(services.clone())),
		proxy: Box::new(FakeProxy(proxy.clone())),
		certificates: Box::new(FakeCerts(certs.clone())),
		containers: Box::new(FakeContainers(containers.clone())),
		runner: Box::new(FakeRunner(runner.clone())),
	};
	(
		host,
		Fakes {
			runner,
			packages,
			services,
			proxy,
			certs,
			containers,
		},
	)
}

// ===========================================================================
// Installer
// ===========================================================================

#[rstest]
fn docker_sqlite_install_end_to_end() {
	// Arrange
	let dir = tempfile::tempdir().unwrap();
	let layout = InstallLayout::at(dir.path().join("kutt"));
	let (mut host, fakes) = fake_host();
	// domain, email, mode, backend, mail?, registration?, anonymous links?
	let mut prompter = ScriptedPrompter::new([
		"s.example.com",
		"admin@example.com",
		"",
		"",
		"",
		"",
		"",
	]);

	// Act
	let outcome = run_install(&mut host, &mut prompter, &layout).unwrap();

	// Assert — outcome and env file content
	assert_eq!(outcome, RunOutcome::Completed);
	let env = EnvFile::load(&layout.env_path()).unwrap().unwrap();
	assert_eq!(env.get("DEFAULT_DOMAIN"), Some("s.example.com"));
	assert_eq!(env.get("DISALLOW_REGISTRATION"), Some("true"));
	assert_eq!(env.get("DB_CLIENT"), Some("better-sqlite3"));
	assert_eq!(env.get("MAIL_ENABLED"), Some("false"));
	assert_eq!(env.get("MAIL_HOST"), None);

	// Assert — certificate was issued with the collected identity and the
	// renewal machinery is in place
	let certs = fakes.certs.borrow();
	assert_eq!(
		certs.issued,
		vec![("s.example.com".to_string(), "admin@example.com".to_string())]
	);
	assert!(certs.hook);
	assert!(
		fakes
			.services
			.borrow()
			.enabled
			.contains(&"certbot.timer".to_string())
	);

	// Assert — phase 2 is active and references the derived cert paths
	let proxy = fakes.proxy.borrow();
	let active = proxy.active.as_ref().unwrap();
	assert!(active.contains("ssl_certificate /etc/letsencrypt/live/s.example.com/fullchain.pem;"));
	assert_eq!(proxy.reloads, 2);

	// Assert — containers were started and the unit is active right away
	assert_eq!(
		fakes.containers.borrow().ups,
		vec!["-f docker-compose.sqlite.yml".to_string()]
	);
	let services = fakes.services.borrow();
	let unit = services.units.get(SERVICE_UNIT).unwrap();
	assert!(unit.contains("docker-compose.sqlite.yml"));
	assert!(services.enabled_now.contains(&SERVICE_UNIT.to_string()));
	assert!(services.active.contains(SERVICE_UNIT));

	// Assert — source was cloned
	assert!(
		fakes
			.runner
			.borrow()
			.calls
			.iter()
			.any(|c| c.starts_with("git clone"))
	);
}

#[rstest]
fn node_install_migrates_before_activation() {
	// Arrange
	let dir = tempfile::tempdir().unwrap();
	let layout = InstallLayout::at(dir.path().join("kutt"));
	let (mut host, fakes) = fake_host();
	{
		let mut runner = fakes.runner.borrow_mut();
		runner.tools.insert("node".to_string());
		runner
			.responses
			.insert("node --version".into(), (true, "v20.11.1\n".into(), String::new()));
		// No kutt user yet
		runner
			.responses
			.insert("id -u kutt".into(), (false, String::new(), String::new()));
	}
	let mut prompter = ScriptedPrompter::new([
		"s.example.com",
		"admin@example.com",
		"node",
		"",
		"",
		"",
	]);

	// Act
	let outcome = run_install(&mut host, &mut prompter, &layout).unwrap();

	// Assert
	assert_eq!(outcome, RunOutcome::Completed);
	let calls = fakes.runner.borrow().calls.clone();
	let position = |needle: &str| calls.iter().position(|c| c.starts_with(needle));
	let install = position("npm install").unwrap();
	let migrate = position("npm run migrate").unwrap();
	let useradd = position("useradd").unwrap();
	assert!(install < migrate);
	assert!(migrate < useradd);

	let services = fakes.services.borrow();
	let unit = services.units.get(SERVICE_UNIT).unwrap();
	assert!(unit.contains("User=kutt"));
	assert!(unit.contains("Restart=on-failure"));

	// Node mode forces the embedded backend
	let env = EnvFile::load(&layout.env_path()).unwrap().unwrap();
	assert_eq!(env.get("DB_CLIENT"), Some("better-sqlite3"));
}

#[rstest]
fn blank_domain_aborts_before_any_side_effect() {
	// Arrange
	let dir = tempfile::tempdir().unwrap();
	let layout = InstallLayout::at(dir.path().join("kutt"));
	let (mut host, fakes) = fake_host();
	let mut prompter = ScriptedPrompter::new([""]);

	// Act
	let result = run_install(&mut host, &mut prompter, &layout);

	// Assert — fatal before any provisioning or file write
	assert!(matches!(result, Err(InstallError::MissingInput { .. })));
	assert!(!layout.env_path().exists());
	assert_eq!(fakes.packages.borrow().index_updates, 0);
	assert!(fakes.proxy.borrow().sites.is_empty());
	assert!(fakes.certs.borrow().issued.is_empty());
}

#[rstest]
fn declined_reinstall_leaves_everything_untouched() {
	// Arrange — an env file marks an existing installation
	let dir = tempfile::tempdir().unwrap();
	let layout = InstallLayout::at(dir.path().join("kutt"));
	kutt_deploy::envfile::write_env(&layout.env_path(), "DEFAULT_DOMAIN=s.example.com\n").unwrap();
	let (mut host, fakes) = fake_host();
	let mut prompter = ScriptedPrompter::new([""]); // default: do not reinstall

	// Act
	let outcome = run_install(&mut host, &mut prompter, &layout).unwrap();

	// Assert
	assert_eq!(outcome, RunOutcome::Declined);
	let content = std::fs::read_to_string(layout.env_path()).unwrap();
	assert_eq!(content, "DEFAULT_DOMAIN=s.example.com\n");
	assert_eq!(fakes.packages.borrow().index_updates, 0);
}

#[rstest]
fn failed_phase_two_validation_keeps_phase_one_active() {
	// Arrange — validation rejects anything containing an ssl directive,
	// so phase 1 passes and phase 2 fails
	let dir = tempfile::tempdir().unwrap();
	let layout = InstallLayout::at(dir.path().join("kutt"));
	let (mut host, fakes) = fake_host();
	fakes.proxy.borrow_mut().reject_marker = Some("ssl_certificate".to_string());
	let mut prompter = ScriptedPrompter::new([
		"s.example.com",
		"admin@example.com",
		"",
		"",
		"",
		"",
		"",
	]);

	// Act
	let result = run_install(&mut host, &mut prompter, &layout);

	// Assert — fatal, and the http-only config is both on disk and active
	assert!(matches!(result, Err(InstallError::ProxyValidation { .. })));
	let proxy = fakes.proxy.borrow();
	let on_disk = proxy.sites.get(NGINX_SITE).unwrap();
	assert!(!on_disk.contains("ssl_certificate"));
	let active = proxy.active.as_ref().unwrap();
	assert!(!active.contains("ssl_certificate"));
	assert_eq!(proxy.reloads, 1);

	// The service was never activated
	assert!(fakes.services.borrow().units.is_empty());
}

#[rstest]
fn failed_issuance_stops_before_https_and_activation() {
	// Arrange
	let dir = tempfile::tempdir().unwrap();
	let layout = InstallLayout::at(dir.path().join("kutt"));
	let (mut host, fakes) = fake_host();
	fakes.certs.borrow_mut().fail_issue = true;
	let mut prompter = ScriptedPrompter::new([
		"s.example.com",
		"admin@example.com",
		"",
		"",
		"",
		"",
		"",
	]);

	// Act
	let result = run_install(&mut host, &mut prompter, &layout);

	// Assert
	assert!(matches!(result, Err(InstallError::Certificate { .. })));
	let proxy = fakes.proxy.borrow();
	let active = proxy.active.as_ref().unwrap();
	assert!(!active.contains("ssl_certificate"));
	assert!(fakes.services.borrow().units.is_empty());
}

// ===========================================================================
// Teardown
// ===========================================================================

/// A host with every install artifact present.
fn installed_fixture(layout: &InstallLayout) -> (Host, Fakes) {
	let (host, fakes) = fake_host();
	kutt_deploy::envfile::write_env(
		&layout.env_path(),
		"DEFAULT_DOMAIN=s.example.com\nDB_CLIENT=pg\n",
	)
	.unwrap();
	{
		let mut packages = fakes.packages.borrow_mut();
		packages.installed.insert("nginx".to_string());
		packages.installed.insert("certbot".to_string());
	}
	fakes
		.services
		.borrow_mut()
		.units
		.insert(SERVICE_UNIT.to_string(), "[Unit]".to_string());
	fakes
		.proxy
		.borrow_mut()
		.sites
		.insert(NGINX_SITE.to_string(), "server {}".to_string());
	{
		let mut certs = fakes.certs.borrow_mut();
		certs.existing.insert("s.example.com".to_string());
		certs.hook = true;
	}
	(host, fakes)
}

/// Answers accepting every default: remove the reversible artifacts, keep
/// volumes, the install directory, and the packages.
fn default_teardown_answers() -> ScriptedPrompter {
	ScriptedPrompter::new(["", "", "", "", "", "", "", "", "", ""])
}

#[rstest]
fn teardown_removes_artifacts_in_order() {
	// Arrange
	let dir = tempfile::tempdir().unwrap();
	let layout = InstallLayout::at(dir.path().join("kutt"));
	let (mut host, fakes) = installed_fixture(&layout);
	let mut prompter = default_teardown_answers();

	// Act
	let outcome = run_teardown(&mut host, &mut prompter, &layout).unwrap();

	// Assert
	assert_eq!(outcome, RunOutcome::Completed);
	let services = fakes.services.borrow();
	assert_eq!(services.stopped, vec![SERVICE_UNIT.to_string()]);
	assert_eq!(services.removed_units, vec![SERVICE_UNIT.to_string()]);
	// Volumes kept (data-loss sub-confirmation defaults to no)
	assert_eq!(
		fakes.containers.borrow().downs,
		vec![("-f docker-compose.yml".to_string(), false)]
	);
	assert_eq!(fakes.proxy.borrow().removed, vec![NGINX_SITE.to_string()]);
	assert_eq!(fakes.certs.borrow().revoked, vec!["s.example.com".to_string()]);
	assert!(!fakes.certs.borrow().hook);
	// Data-loss stages defaulted to "no"
	assert!(layout.env_path().exists());
	assert!(fakes.packages.borrow().removes.is_empty());
}

#[rstest]
fn teardown_stage_failure_does_not_stop_later_stages() {
	// Arrange — docker cleanup fails
	let dir = tempfile::tempdir().unwrap();
	let layout = InstallLayout::at(dir.path().join("kutt"));
	let (mut host, fakes) = installed_fixture(&layout);
	fakes.containers.borrow_mut().fail_down = true;
	let mut prompter = default_teardown_answers();

	// Act
	let outcome = run_teardown(&mut host, &mut prompter, &layout).unwrap();

	// Assert — later stages still executed
	assert_eq!(outcome, RunOutcome::Completed);
	assert!(
		fakes
			.runner
			.borrow()
			.calls
			.contains(&"userdel kutt".to_string())
	);
	assert_eq!(fakes.proxy.borrow().removed, vec![NGINX_SITE.to_string()]);
	assert_eq!(fakes.certs.borrow().revoked, vec!["s.example.com".to_string()]);
	assert!(!fakes.certs.borrow().hook);
	assert!(
		fakes
			.runner
			.borrow()
			.calls
			.contains(&"ufw delete allow Nginx Full".to_string())
	);
}

#[rstest]
fn teardown_tolerates_absent_artifacts() {
	// Arrange — nothing installed: no env, no unit, no site, no docker,
	// no packages
	let dir = tempfile::tempdir().unwrap();
	let layout = InstallLayout::at(dir.path().join("kutt"));
	let (mut host, fakes) = fake_host();
	fakes.containers.borrow_mut().available = false;
	fakes.runner.borrow_mut().tools.remove("ufw");
	fakes
		.runner
		.borrow_mut()
		.responses
		.insert("id -u kutt".into(), (false, String::new(), String::new()));
	// Every stage detects absence, so nothing is ever asked
	let mut prompter = ScriptedPrompter::new(Vec::<String>::new());

	// Act
	let outcome = run_teardown(&mut host, &mut prompter, &layout).unwrap();

	// Assert
	assert_eq!(outcome, RunOutcome::Completed);
	assert!(fakes.packages.borrow().removes.is_empty());
	assert!(fakes.certs.borrow().revoked.is_empty());
}

#[rstest]
fn teardown_skips_package_stage_when_none_installed() {
	// Arrange — every artifact present except the system packages
	let dir = tempfile::tempdir().unwrap();
	let layout = InstallLayout::at(dir.path().join("kutt"));
	let (mut host, fakes) = installed_fixture(&layout);
	fakes.packages.borrow_mut().installed.clear();
	// Stages 1-8 prompt; the package stage must not (a ninth confirm would
	// exhaust the script and fail the run)
	let mut prompter = ScriptedPrompter::new(["", "", "", "", "", "", "", "", ""]);

	// Act
	let outcome = run_teardown(&mut host, &mut prompter, &layout).unwrap();

	// Assert
	assert_eq!(outcome, RunOutcome::Completed);
	assert!(fakes.packages.borrow().removes.is_empty());
}

#[rstest]
fn teardown_confirmed_data_loss_removes_directory_and_volumes() {
	// Arrange
	let dir = tempfile::tempdir().unwrap();
	let layout = InstallLayout::at(dir.path().join("kutt"));
	let (mut host, fakes) = installed_fixture(&layout);
	// service, containers, volumes YES, user, site, cert, hook, firewall,
	// install dir YES, packages no
	let mut prompter =
		ScriptedPrompter::new(["", "", "y", "", "", "", "", "", "y", ""]);

	// Act
	run_teardown(&mut host, &mut prompter, &layout).unwrap();

	// Assert
	assert_eq!(
		fakes.containers.borrow().downs,
		vec![("-f docker-compose.yml".to_string(), true)]
	);
	assert!(!layout.install_dir().exists());
}

// ===========================================================================
// OIDC reconfiguration
// ===========================================================================

fn seeded_layout(dir: &tempfile::TempDir) -> InstallLayout {
	let layout = InstallLayout::at(dir.path().join("kutt"));
	kutt_deploy::envfile::write_env(
		&layout.env_path(),
		"DEFAULT_DOMAIN=s.example.com\nJWT_SECRET=seed\n",
	)
	.unwrap();
	layout
}

#[rstest]
fn oidc_setup_strips_trailing_slash_and_appends_block() {
	// Arrange
	let dir = tempfile::tempdir().unwrap();
	let layout = seeded_layout(&dir);
	let (mut host, _fakes) = fake_host();
	// issuer, client id, secret, scope, claim, keep login, write?
	let mut prompter = ScriptedPrompter::new([
		"https://idp.example.com/",
		"kutt-client",
		"s3cret",
		"",
		"",
		"",
		"",
	]);

	// Act
	let outcome = run_oidc_setup(&mut host, &mut prompter, &layout).unwrap();

	// Assert
	assert_eq!(outcome, RunOutcome::Completed);
	let env = EnvFile::load(&layout.env_path()).unwrap().unwrap();
	assert!(env.oidc_enabled());
	assert_eq!(env.get("OIDC_ISSUER"), Some("https://idp.example.com"));
	assert_eq!(env.get("OIDC_SCOPE"), Some("openid profile email"));
	assert_eq!(env.get("OIDC_EMAIL_CLAIM"), Some("email"));
	assert_eq!(env.get("DISALLOW_LOGIN_FORM"), Some("false"));
	// Previous keys survive
	assert_eq!(env.get("JWT_SECRET"), Some("seed"));
}

#[rstest]
fn oidc_rerun_replaces_block_without_duplicates() {
	// Arrange — run once with issuer A
	let dir = tempfile::tempdir().unwrap();
	let layout = seeded_layout(&dir);
	let (mut host, _fakes) = fake_host();
	let mut first = ScriptedPrompter::new([
		"https://a.example.com",
		"kutt-client",
		"s3cret",
		"",
		"",
		"",
		"",
	]);
	run_oidc_setup(&mut host, &mut first, &layout).unwrap();

	// Act — rerun with issuer B; the enabled flag forces a reconfirmation
	let mut second = ScriptedPrompter::new([
		"y",
		"https://b.example.com",
		"kutt-client",
		"s3cret",
		"",
		"",
		"n",
		"",
	]);
	run_oidc_setup(&mut host, &mut second, &layout).unwrap();

	// Assert
	let env = EnvFile::load(&layout.env_path()).unwrap().unwrap();
	assert_eq!(env.get("OIDC_ISSUER"), Some("https://b.example.com"));
	assert_eq!(env.occurrences("OIDC_ISSUER"), 1);
	assert_eq!(env.occurrences("OIDC_ENABLED"), 1);
	assert_eq!(env.occurrences("DISALLOW_LOGIN_FORM"), 1);
	assert_eq!(env.get("DISALLOW_LOGIN_FORM"), Some("true"));
}

#[rstest]
fn oidc_declined_reconfiguration_changes_nothing() {
	// Arrange — an enabled block already present
	let dir = tempfile::tempdir().unwrap();
	let layout = InstallLayout::at(dir.path().join("kutt"));
	kutt_deploy::envfile::write_env(
		&layout.env_path(),
		"DEFAULT_DOMAIN=s.example.com\nOIDC_ENABLED=true\nOIDC_ISSUER=https://a.example.com\n",
	)
	.unwrap();
	let (mut host, _fakes) = fake_host();
	let mut prompter = ScriptedPrompter::new(["n"]);

	// Act
	let outcome = run_oidc_setup(&mut host, &mut prompter, &layout).unwrap();

	// Assert
	assert_eq!(outcome, RunOutcome::Declined);
	let env = EnvFile::load(&layout.env_path()).unwrap().unwrap();
	assert_eq!(env.get("OIDC_ISSUER"), Some("https://a.example.com"));
}

#[rstest]
fn oidc_requires_an_existing_installation() {
	// Arrange
	let dir = tempfile::tempdir().unwrap();
	let layout = InstallLayout::at(dir.path().join("missing"));
	let (mut host, _fakes) = fake_host();
	let mut prompter = ScriptedPrompter::new(Vec::<String>::new());

	// Act
	let result = run_oidc_setup(&mut host, &mut prompter, &layout);

	// Assert
	assert!(matches!(result, Err(InstallError::Precondition { .. })));
}

#[rstest]
fn oidc_restarts_an_active_service() {
	// Arrange
	let dir = tempfile::tempdir().unwrap();
	let layout = seeded_layout(&dir);
	let (mut host, fakes) = fake_host();
	fakes
		.services
		.borrow_mut()
		.active
		.insert(SERVICE_UNIT.to_string());
	let mut prompter = ScriptedPrompter::new([
		"https://idp.example.com",
		"kutt-client",
		"s3cret",
		"",
		"",
		"",
		"",
	]);

	// Act
	run_oidc_setup(&mut host, &mut prompter, &layout).unwrap();

	// Assert
	assert_eq!(
		fakes.services.borrow().restarts,
		vec![SERVICE_UNIT.to_string()]
	);
}

#[rstest]
fn oidc_restarts_service_on_a_freshly_installed_docker_host() {
	// Arrange — full docker install on the same host first
	let dir = tempfile::tempdir().unwrap();
	let layout = InstallLayout::at(dir.path().join("kutt"));
	let (mut host, fakes) = fake_host();
	let mut install_answers = ScriptedPrompter::new([
		"s.example.com",
		"admin@example.com",
		"",
		"",
		"",
		"",
		"",
	]);
	run_install(&mut host, &mut install_answers, &layout).unwrap();

	// Act
	let mut oidc_answers = ScriptedPrompter::new([
		"https://idp.example.com",
		"kutt-client",
		"s3cret",
		"",
		"",
		"",
		"",
	]);
	run_oidc_setup(&mut host, &mut oidc_answers, &layout).unwrap();

	// Assert — the unit is active straight after install, so the rewrite
	// is applied with a restart instead of manual instructions
	assert_eq!(
		fakes.services.borrow().restarts,
		vec![SERVICE_UNIT.to_string()]
	);
}
