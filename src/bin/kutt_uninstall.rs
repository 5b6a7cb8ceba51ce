//! Interactive uninstaller entry point. Takes no arguments; must run as root.

use colored::Colorize;

use kutt_deploy::config::InstallLayout;
use kutt_deploy::prompt::ConsolePrompter;
use kutt_deploy::system::Host;
use kutt_deploy::teardown::run_teardown;

fn main() {
	let mut host = Host::live();
	let mut prompter = ConsolePrompter;
	let layout = InstallLayout::default();

	match run_teardown(&mut host, &mut prompter, &layout) {
		Ok(_) => {}
		Err(e) => {
			eprintln!("{} {e}", "error:".red());
			std::process::exit(1);
		}
	}
}
