use dialoguer::Confirm;

use crate::{cmd::Runner, distro::Distro, error::LaptopError, ui, ui::LogSink};

/// Points `./Vagrantfile` at the distro's descriptor.
pub fn link<R: Runner, L: LogSink>(distro: &Distro<R, L>) -> Result<(), LaptopError> {
    distro.link_config()?;
    ui::print_success(&format!(
        "Vagrantfile → {}",
        distro.config_path().display()
    ));
    Ok(())
}

/// Destroys and recreates the VM, asking first unless `assume_yes`.
pub fn reset<R: Runner, L: LogSink>(
    distro: &mut Distro<R, L>,
    assume_yes: bool,
) -> Result<(), LaptopError> {
    if !assume_yes
        && !Confirm::new()
            .with_prompt(format!(
                "Destroy and recreate {}?",
                distro.vm_image_name()
            ))
            .default(true)
            .interact()?
    {
        return Err(LaptopError::Cancelled);
    }

    distro.reset()?;
    ui::print_success(&format!("{} is up.", distro.vm_image_name()));
    Ok(())
}

pub fn dns<R: Runner, L: LogSink>(distro: &mut Distro<R, L>) -> Result<(), LaptopError> {
    distro.set_dns()?;
    ui::print_success("Guest nameserver set.");
    Ok(())
}

pub fn prepare<R: Runner, L: LogSink>(distro: &mut Distro<R, L>) -> Result<(), LaptopError> {
    distro.prepare()?;
    ui::print_success("Guest packages upgraded.");
    Ok(())
}

pub fn chsh<R: Runner, L: LogSink>(distro: &mut Distro<R, L>) -> Result<(), LaptopError> {
    distro.allow_shell_change_without_password()?;
    ui::print_success("chsh no longer asks for a password.");
    Ok(())
}

pub fn laptop<R: Runner, L: LogSink>(
    distro: &mut Distro<R, L>,
    colored_output: bool,
) -> Result<(), LaptopError> {
    distro.setup_laptop(colored_output)?;
    ui::print_success("Laptop script finished and rails installed.");
    Ok(())
}

pub fn rails<R: Runner, L: LogSink>(distro: &mut Distro<R, L>) -> Result<(), LaptopError> {
    distro.install_rails_gem()?;
    ui::print_success("rails gem installed.");
    Ok(())
}
