//! Builders for host-side `vagrant` invocations.
//!
//! Guest commands travel as one argument to `vagrant ssh -c`, so only the
//! guest's shell ever parses them.

use crate::cmd::{quote, CommandLine};

const VAGRANT: &str = "vagrant";

pub fn destroy() -> CommandLine {
    CommandLine::new(VAGRANT, ["destroy", "--force"])
}

pub fn up() -> CommandLine {
    CommandLine::new(VAGRANT, ["up"])
}

pub fn halt() -> CommandLine {
    CommandLine::new(VAGRANT, ["halt"])
}

/// `vagrant package --base <vm> --output <box>`
pub fn package(vm_name: &str, box_file: &str) -> CommandLine {
    CommandLine::new(VAGRANT, ["package", "--base", vm_name, "--output", box_file])
}

/// Runs `command` in the guest's default non-interactive shell.
pub fn ssh(command: &str) -> CommandLine {
    CommandLine::new(VAGRANT, ["ssh", "-c", command])
}

/// Runs `command` inside an interactive login zsh so the user's profile
/// (rbenv, PATH tweaks) is loaded.
pub fn ssh_login_shell(command: &str) -> CommandLine {
    ssh(&format!("zsh -i -l -c {}", quote(command)))
}
