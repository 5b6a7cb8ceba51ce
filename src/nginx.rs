//! Nginx site rendering.
//!
//! The site config exists in two successive versions. Phase 1 serves plain
//! HTTP: the ACME webroot for domain validation plus a proxy to the app.
//! Phase 2 redirects HTTP to HTTPS and adds the TLS server block pointing at
//! the certificate paths certbot derives from the domain. Rendering is pure;
//! validation and activation live in [`crate::system`].

use tera::{Context, Tera};

use crate::error::{InstallError, InstallResult};

/// Embedded Nginx Tera templates.
#[derive(rust_embed::RustEmbed)]
#[folder = "templates/nginx/"]
struct NginxTemplates;

/// Certificate directory certbot creates for `domain`.
///
/// The path is a fixed convention, derived deterministically from the domain
/// name, so phase 2 can be rendered without asking certbot where the files
/// went.
pub fn live_cert_dir(domain: &str) -> String {
	format!("{}/{domain}", crate::LETSENCRYPT_LIVE_DIR)
}

/// Render the phase-1 (HTTP-only) site for `domain`.
///
/// # Errors
///
/// Returns [`InstallError::Template`] if template loading or rendering fails.
pub fn render_http_site(domain: &str) -> InstallResult<String> {
	let tera = load_nginx_templates()?;
	let mut ctx = Context::new();
	ctx.insert("domain", domain);
	ctx.insert("app_port", &crate::APP_PORT);
	ctx.insert("acme_webroot", crate::ACME_WEBROOT);
	Ok(tera.render("http.conf.tera", &ctx)?)
}

/// Render the phase-2 (HTTPS) site for `domain`.
///
/// # Errors
///
/// Returns [`InstallError::Template`] if template loading or rendering fails.
pub fn render_https_site(domain: &str) -> InstallResult<String> {
	let tera = load_nginx_templates()?;
	let mut ctx = Context::new();
	ctx.insert("domain", domain);
	ctx.insert("app_port", &crate::APP_PORT);
	ctx.insert("acme_webroot", crate::ACME_WEBROOT);
	ctx.insert("cert_dir", &live_cert_dir(domain));
	Ok(tera.render("https.conf.tera", &ctx)?)
}

/// Load all Nginx Tera templates from embedded resources.
fn load_nginx_templates() -> InstallResult<Tera> {
	let mut tera = Tera::default();

	for file_path in NginxTemplates::iter() {
		let file = NginxTemplates::get(&file_path).ok_or_else(|| InstallError::Template {
			message: format!("embedded nginx template not found: {file_path}"),
		})?;
		let content =
			std::str::from_utf8(file.data.as_ref()).map_err(|e| InstallError::Template {
				message: format!("invalid UTF-8 in nginx template {file_path}: {e}"),
			})?;
		tera.add_raw_template(&file_path, content)?;
	}

	Ok(tera)
}
