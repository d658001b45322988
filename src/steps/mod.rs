pub mod package;
pub mod provision;
pub mod verify;

use dialoguer::Confirm;

use crate::{
    cmd::Runner,
    config::{Options, Task},
    distro::Distro,
    error::LaptopError,
    ui,
    ui::LogSink,
};

/// What happened to one distro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// `build` found an existing box and the user kept it.
    Skipped,
}

/// Runs a single task against one distro.
///
/// Every task that talks to Vagrant links the descriptor first so
/// `./Vagrantfile` targets the right VM.
pub fn run_task<R: Runner, L: LogSink>(
    task: Task,
    distro: &mut Distro<R, L>,
    opts: &Options,
) -> Result<Outcome, LaptopError> {
    match task {
        Task::Status => {
            package::status(distro);
            return Ok(Outcome::Done);
        }
        Task::Build => return build(distro, opts),
        Task::Link => return provision::link(distro).map(|_| Outcome::Done),
        _ => provision::link(distro)?,
    }

    match task {
        Task::Reset => provision::reset(distro, opts.assume_yes)?,
        Task::Halt => package::halt(distro)?,
        Task::Prepare => provision::prepare(distro)?,
        Task::Dns => provision::dns(distro)?,
        Task::Laptop => provision::laptop(distro, opts.colored_output)?,
        Task::Rails => provision::rails(distro)?,
        Task::Chsh => provision::chsh(distro)?,
        Task::Verify => verify::run(distro)?,
        Task::Package => package::run(distro, opts.assume_yes)?,
        Task::Link | Task::Status | Task::Build => {}
    }

    Ok(Outcome::Done)
}

const BUILD_STEPS: usize = 9;

/// The full pipeline: a fresh VM provisioned, verified, packaged, halted.
fn build<R: Runner, L: LogSink>(
    distro: &mut Distro<R, L>,
    opts: &Options,
) -> Result<Outcome, LaptopError> {
    if distro.is_packaged() {
        ui::print_info(&format!("{} already exists.", distro.package_file_name()));
        if !opts.assume_yes
            && !Confirm::new()
                .with_prompt("Rebuild it?")
                .default(false)
                .interact()?
        {
            ui::print_warning(&format!("Skipping {}.", distro.base_name()));
            return Ok(Outcome::Skipped);
        }
    }

    ui::print_step(1, BUILD_STEPS, "Link Vagrantfile");
    provision::link(distro)?;

    ui::print_step(2, BUILD_STEPS, "Fresh VM");
    provision::reset(distro, opts.assume_yes)?;

    ui::print_step(3, BUILD_STEPS, "Guest DNS");
    provision::dns(distro)?;

    ui::print_step(4, BUILD_STEPS, "System Upgrade");
    provision::prepare(distro)?;

    ui::print_step(5, BUILD_STEPS, "Passwordless chsh");
    provision::chsh(distro)?;

    ui::print_step(6, BUILD_STEPS, "Laptop Script");
    provision::laptop(distro, opts.colored_output)?;

    ui::print_step(7, BUILD_STEPS, "Verification");
    verify::run(distro)?;

    // A rebuild of an existing box was confirmed above.
    ui::print_step(8, BUILD_STEPS, "Packaging");
    package::run(distro, true)?;

    ui::print_step(9, BUILD_STEPS, "Halt");
    package::halt(distro)?;

    Ok(Outcome::Done)
}
