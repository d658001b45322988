use crate::{cmd::Runner, distro::Distro, error::LaptopError, ui, ui::LogSink};

/// Checks the provisioned guest end to end: login shell, ruby, and a
/// scaffolded rails app with a migrated database.
///
/// Stops at the first failing check.
pub fn run<R: Runner, L: LogSink>(distro: &mut Distro<R, L>) -> Result<(), LaptopError> {
    ui::print_info("Active shell:");
    distro.active_shell()?;

    ui::print_info("Ruby version:");
    distro.installed_ruby_version()?;

    ui::print_info("Generating ~/test_app…");
    distro.generate_rails_app()?;

    ui::print_info("Scaffolding post title:string…");
    distro.scaffold_and_model_generation()?;

    ui::print_info("Creating and migrating the database…");
    distro.database_migration()?;

    ui::print_success("Rails app generated and migrated.");
    Ok(())
}
