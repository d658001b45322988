mod cmd;
mod config;
mod discover;
mod distro;
mod error;
mod steps;
mod ui;
mod vagrant;

use std::path::{Path, PathBuf};

use console::style;
use dialoguer::{MultiSelect, Select};

use cmd::{DryRunRunner, Runner, SystemRunner};
use config::{Options, Task};
use distro::Distro;
use error::LaptopError;
use steps::Outcome;
use ui::Console;

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    if let Err(e) = run() {
        println!();
        ui::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}

fn run() -> Result<(), LaptopError> {
    let opts = Options::parse(std::env::args().skip(1))?;

    ui::print_banner();

    if opts.dry_run {
        ui::print_warning("DRY-RUN MODE — commands and file changes are printed, nothing is touched.");
    }

    let task = match opts.task {
        Some(task) => task,
        None => ask_task()?,
    };
    let vagrantfiles = if opts.vagrantfiles.is_empty() {
        ask_vagrantfiles(Path::new("."))?
    } else {
        opts.vagrantfiles.clone()
    };

    if opts.dry_run {
        run_all(task, &vagrantfiles, &opts, DryRunRunner::new(Console))
    } else {
        run_all(task, &vagrantfiles, &opts, SystemRunner::new(Console))
    }
}

/// Runs `task` for every distro in turn, stopping at the first error.
fn run_all<R: Runner>(
    task: Task,
    vagrantfiles: &[PathBuf],
    opts: &Options,
    mut runner: R,
) -> Result<(), LaptopError> {
    let mut skipped = Vec::new();

    for path in vagrantfiles {
        let mut distro = Distro::new(path.clone(), &mut runner, Console)?.dry_run(opts.dry_run);

        println!();
        println!(
            "{}  {}",
            style(format!(" {} ", distro.base_name())).black().on_cyan().bold(),
            style(task.description()).white().bold()
        );

        if steps::run_task(task, &mut distro, opts)? == Outcome::Skipped {
            skipped.push(distro.base_name().to_string());
        }
    }

    println!();
    if !skipped.is_empty() {
        ui::print_info(&format!("Already packaged: {}", skipped.join(", ")));
    }
    ui::print_success(&format!("'{}' finished.", task.name()));
    Ok(())
}

// ── Prompts ───────────────────────────────────────────────────────────────────

fn ask_task() -> Result<Task, LaptopError> {
    let labels: Vec<String> = Task::ALL
        .iter()
        .map(|t| {
            format!(
                "{}  {}",
                style(format!("{:<8}", t.name())).cyan().bold(),
                style(t.description()).dim()
            )
        })
        .collect();

    let idx = Select::new()
        .with_prompt("What should be done?")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(Task::ALL[idx])
}

/// Lists `Vagrantfile.*` in `dir` and lets the user pick any number of them.
fn ask_vagrantfiles(dir: &Path) -> Result<Vec<PathBuf>, LaptopError> {
    let found = discover::list_vagrantfiles(dir)?;
    if found.is_empty() {
        return Err(LaptopError::NoVagrantfiles(dir.to_path_buf()));
    }

    let labels: Vec<String> = found
        .iter()
        .map(|p| p.file_name().unwrap_or_default().to_string_lossy().into_owned())
        .collect();
    let defaults = vec![true; labels.len()];

    ui::print_info("Space toggles a distro, Enter confirms.");
    let picked = MultiSelect::new()
        .with_prompt("Distros")
        .items(&labels)
        .defaults(&defaults)
        .interact()?;

    if picked.is_empty() {
        return Err(LaptopError::Cancelled);
    }

    Ok(picked.into_iter().map(|i| found[i].clone()).collect())
}
