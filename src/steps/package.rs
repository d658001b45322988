use dialoguer::Confirm;

use crate::{cmd::Runner, distro::Distro, error::LaptopError, ui, ui::LogSink};

/// Exports the VM as a box, asking before an existing box is replaced
/// unless `assume_yes`.
pub fn run<R: Runner, L: LogSink>(
    distro: &mut Distro<R, L>,
    assume_yes: bool,
) -> Result<(), LaptopError> {
    if distro.is_packaged() {
        ui::print_warning(&format!("{} already exists.", distro.package_file_name()));
        if !assume_yes
            && !Confirm::new()
                .with_prompt("Replace it?")
                .default(false)
                .interact()?
        {
            return Err(LaptopError::Cancelled);
        }
    }

    distro.package()?;
    ui::print_success(&format!("Packaged {}.", distro.package_file_name()));
    Ok(())
}

pub fn halt<R: Runner, L: LogSink>(distro: &mut Distro<R, L>) -> Result<(), LaptopError> {
    distro.halt()?;
    ui::print_success(&format!("{} halted.", distro.vm_image_name()));
    Ok(())
}

/// Prints the distro's names and whether its box exists.
pub fn status<R: Runner, L: LogSink>(distro: &Distro<R, L>) {
    let descriptor = distro.config_path().display().to_string();
    let packaged = if distro.is_packaged() { "yes" } else { "no" };

    println!();
    ui::print_kv_box(
        distro.base_name(),
        &[
            ("Vagrantfile", descriptor.as_str()),
            ("VM name", distro.vm_image_name()),
            ("Box", distro.package_file_name()),
            ("Packaged", packaged),
        ],
    );
}
