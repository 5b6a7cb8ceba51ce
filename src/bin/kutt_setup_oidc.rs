//! OIDC configurator entry point. Takes no arguments; must run as root
//! against an existing installation.

use colored::Colorize;

use kutt_deploy::config::InstallLayout;
use kutt_deploy::oidc::run_oidc_setup;
use kutt_deploy::prompt::ConsolePrompter;
use kutt_deploy::system::Host;

fn main() {
	let mut host = Host::live();
	let mut prompter = ConsolePrompter;
	let layout = InstallLayout::default();

	match run_oidc_setup(&mut host, &mut prompter, &layout) {
		Ok(_) => {}
		Err(e) => {
			eprintln!("{} {e}", "error:".red());
			std::process::exit(1);
		}
	}
}
