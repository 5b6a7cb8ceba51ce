//! kutt-deploy: install, uninstall, and reconfigure a self-hosted Kutt
//! instance on an Ubuntu/Debian host.
//!
//! The crate is a coordination layer over external system tools (apt,
//! docker, nginx, certbot, systemd, ufw). Each tool sits behind a
//! capability trait in [`system`] so the orchestration in [`install`],
//! [`teardown`], and [`oidc`] can be tested against in-memory fakes.

pub mod activate;
pub mod collect;
pub mod config;
pub mod envfile;
pub mod error;
pub mod install;
pub mod nginx;
pub mod oidc;
pub mod prompt;
pub mod provision;
pub mod report;
pub mod secrets;
pub mod system;
pub mod teardown;

/// Port the application listens on behind the proxy.
pub const APP_PORT: u16 = 3000;

/// Webroot served for ACME http-01 challenges.
pub const ACME_WEBROOT: &str = "/var/lib/letsencrypt";

/// Root of certbot's per-domain certificate directories.
pub const LETSENCRYPT_LIVE_DIR: &str = "/etc/letsencrypt/live";

/// Name of the systemd unit supervising the application.
pub const SERVICE_UNIT: &str = "kutt.service";

/// Unprivileged account the application runs as in node mode.
pub const SERVICE_USER: &str = "kutt";

/// Nginx site file name (in sites-available / sites-enabled).
pub const NGINX_SITE: &str = "kutt.conf";

/// Minimum Node.js major version for node mode.
pub const NODE_MIN_MAJOR: u32 = 18;

/// Upstream application repository cloned into the install directory.
pub const KUTT_REPO_URL: &str = "https://github.com/thedevs-network/kutt.git";

/// How a run ended when it did not fail.
///
/// A declined top-level confirmation is not an error; the entry points map
/// both variants to exit code 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
	Completed,
	Declined,
}
