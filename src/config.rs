use std::path::PathBuf;

use crate::error::LaptopError;

/// Settings collected from the command line.
#[derive(Debug, Clone)]
pub struct Options {
    /// Log commands instead of executing them.
    pub dry_run: bool,
    /// Skip confirmation prompts.
    pub assume_yes: bool,
    /// Forwarded to the guest provisioning script.
    pub colored_output: bool,
    pub task: Option<Task>,
    pub vagrantfiles: Vec<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dry_run: false,
            assume_yes: false,
            colored_output: true,
            task: None,
            vagrantfiles: Vec::new(),
        }
    }
}

impl Options {
    /// Parses `[--dry-run] [--yes] [--no-colored-output] [TASK] [VAGRANTFILE...]`.
    /// The first positional is the task; the rest are Vagrantfile paths.
    pub fn parse<I, S>(args: I) -> Result<Self, LaptopError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut opts = Options::default();

        for arg in args.into_iter().map(Into::into) {
            match arg.as_str() {
                "--dry-run" => opts.dry_run = true,
                "--yes" | "-y" => opts.assume_yes = true,
                "--no-colored-output" => opts.colored_output = false,
                _ if opts.task.is_none() && opts.vagrantfiles.is_empty() => {
                    opts.task = Some(Task::from_name(&arg)?);
                }
                _ => opts.vagrantfiles.push(PathBuf::from(arg)),
            }
        }

        Ok(opts)
    }
}

// ── Tasks ─────────────────────────────────────────────────────────────────────

/// What to do with each selected distro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Link,
    Reset,
    Halt,
    Prepare,
    Dns,
    Laptop,
    Rails,
    Chsh,
    Verify,
    Package,
    Status,
    Build,
}

impl Task {
    pub const ALL: [Task; 12] = [
        Task::Build,
        Task::Link,
        Task::Reset,
        Task::Dns,
        Task::Prepare,
        Task::Chsh,
        Task::Laptop,
        Task::Rails,
        Task::Verify,
        Task::Package,
        Task::Halt,
        Task::Status,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Task::Link => "link",
            Task::Reset => "reset",
            Task::Halt => "halt",
            Task::Prepare => "prepare",
            Task::Dns => "dns",
            Task::Laptop => "laptop",
            Task::Rails => "rails",
            Task::Chsh => "chsh",
            Task::Verify => "verify",
            Task::Package => "package",
            Task::Status => "status",
            Task::Build => "build",
        }
    }

    /// Human-readable label shown in the task selector.
    pub fn description(self) -> &'static str {
        match self {
            Task::Link => "point ./Vagrantfile at the descriptor",
            Task::Reset => "destroy and recreate the VM",
            Task::Halt => "shut the VM down",
            Task::Prepare => "update and dist-upgrade guest packages",
            Task::Dns => "force a public nameserver in the guest",
            Task::Laptop => "run the laptop script, then install rails",
            Task::Rails => "install the rails gem",
            Task::Chsh => "allow chsh without a password",
            Task::Verify => "check shell, ruby and a scaffolded rails app",
            Task::Package => "clean up and export the .box",
            Task::Status => "show whether the .box exists",
            Task::Build => "full pipeline, reset to halt",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, LaptopError> {
        Task::ALL
            .into_iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| LaptopError::UnknownTask(name.to_string()))
    }
}

// ── Packaging tool ────────────────────────────────────────────────────────────

/// The guest's package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageTool {
    Aptitude,
    AptGet,
}

impl PackageTool {
    pub fn as_str(self) -> &'static str {
        match self {
            PackageTool::Aptitude => "aptitude",
            PackageTool::AptGet => "apt-get",
        }
    }
}
