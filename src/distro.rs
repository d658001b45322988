//! One Vagrant-described distro and every operation run against its VM.
//!
//! A descriptor named `Vagrantfile.<name>` yields the VirtualBox VM
//! `laptop-<name>` and the exported box `<name>-with-laptop.box`.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{
    cmd::{quote, Runner},
    config::PackageTool,
    error::LaptopError,
    ui::LogSink,
    vagrant,
};

const VAGRANTFILE: &str = "Vagrantfile";
const DESCRIPTOR_PREFIX: &str = "Vagrantfile.";

const NAMESERVER: &str = "8.8.8.8";
const LAPTOP_SCRIPT: &str = "/vagrant/linux";
const TEST_APP: &str = "~/test_app";

pub struct Distro<R, L> {
    config_path: PathBuf,
    base_name: String,
    vm_image_name: String,
    package_file_name: String,
    packaging_tool: Option<PackageTool>,
    workdir: PathBuf,
    dry_run: bool,
    runner: R,
    log: L,
}

impl<R: Runner, L: LogSink> Distro<R, L> {
    /// Derives the distro names from `config_path`. Symlinks and box files
    /// are resolved against the current directory.
    pub fn new(config_path: impl Into<PathBuf>, runner: R, log: L) -> Result<Self, LaptopError> {
        let config_path = config_path.into();
        let base_name = config_path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| *n != VAGRANTFILE)
            .map(|n| n.strip_prefix(DESCRIPTOR_PREFIX).unwrap_or(n))
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .ok_or_else(|| LaptopError::InvalidPath(config_path.display().to_string()))?;

        Ok(Self {
            vm_image_name: format!("laptop-{}", base_name),
            package_file_name: format!("{}-with-laptop.box", base_name),
            base_name,
            config_path,
            packaging_tool: None,
            workdir: PathBuf::from("."),
            dry_run: false,
            runner,
            log,
        })
    }

    /// When set, filesystem changes are logged instead of made.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Resolves the `Vagrantfile` link and the box file against `dir`.
    #[cfg(test)]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = dir.into();
        self
    }

    // ── Identity ──────────────────────────────────────────────────────────────

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn vm_image_name(&self) -> &str {
        &self.vm_image_name
    }

    pub fn package_file_name(&self) -> &str {
        &self.package_file_name
    }

    // ── Host side ─────────────────────────────────────────────────────────────

    /// Replaces `./Vagrantfile` with a symlink to this distro's descriptor.
    pub fn link_config(&self) -> Result<(), LaptopError> {
        let link = self.workdir.join(VAGRANTFILE);

        if self.dry_run {
            self.log.command(&format!(
                "ln -sfn {} {}  (dry-run)",
                quote(&self.config_path.to_string_lossy()),
                quote(&link.to_string_lossy())
            ));
            return Ok(());
        }

        // symlink_metadata also sees dangling links, which `exists()` misses.
        match fs::symlink_metadata(&link) {
            Ok(_) => fs::remove_file(&link).map_err(|source| fs_error(&link, source))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(LaptopError::Filesystem { path: link, source }),
        }

        std::os::unix::fs::symlink(&self.config_path, &link)
            .map_err(|source| LaptopError::Filesystem { path: link, source })
    }

    /// Destroys the VM and brings it back up.
    ///
    /// `up` is attempted even when `destroy` fails (there may be nothing to
    /// destroy); the destroy failure is reported as a notice.
    pub fn reset(&mut self) -> Result<(), LaptopError> {
        if let Err(e) = self.runner.run(&vagrant::destroy()) {
            match e {
                LaptopError::CommandFailed(..) => {
                    self.log.notice(&format!("{}. Bringing the VM up anyway.", e))
                }
                other => return Err(other),
            }
        }
        self.runner.run(&vagrant::up())
    }

    pub fn halt(&mut self) -> Result<(), LaptopError> {
        self.runner.run(&vagrant::halt())
    }

    /// Where `package` writes the exported box.
    pub fn package_path(&self) -> PathBuf {
        self.workdir.join(&self.package_file_name)
    }

    /// True when the exported box is present in the working directory.
    pub fn is_packaged(&self) -> bool {
        self.package_path().exists()
    }

    // ── Guest side ────────────────────────────────────────────────────────────

    /// Probes the guest for `aptitude` once, falling back to `apt-get`.
    ///
    /// Only a failing probe selects the fallback; any other error (e.g. no
    /// `vagrant` on the host) propagates and leaves nothing cached.
    pub fn resolve_packaging_tool(&mut self) -> Result<PackageTool, LaptopError> {
        if let Some(tool) = self.packaging_tool {
            return Ok(tool);
        }

        let tool = match self.runner.run(&vagrant::ssh("which aptitude")) {
            Ok(()) => PackageTool::Aptitude,
            Err(LaptopError::CommandFailed(..)) => {
                self.log.notice(
                    "This VM is not using aptitude yet. Switching to apt-get for the moment.",
                );
                PackageTool::AptGet
            }
            Err(e) => return Err(e),
        };

        self.packaging_tool = Some(tool);
        Ok(tool)
    }

    /// Refreshes the package index, then dist-upgrades without prompting.
    pub fn prepare(&mut self) -> Result<(), LaptopError> {
        let tool = self.resolve_packaging_tool()?.as_str();

        self.guest(&format!("sudo {} update", tool))?;
        // confdef: take the default for new config files; confold: otherwise keep ours.
        self.guest(&format!(
            "sudo DEBIAN_FRONTEND=noninteractive {} dist-upgrade -y \
             -o Dpkg::Options::='--force-confdef' -o Dpkg::Options::='--force-confold'",
            tool
        ))
    }

    pub fn install_rails_gem(&mut self) -> Result<(), LaptopError> {
        self.guest("gem install rails")
    }

    pub fn set_dns(&mut self) -> Result<(), LaptopError> {
        self.guest(&format!(
            "echo \"nameserver {}\" | sudo tee /etc/resolv.conf > /dev/null",
            NAMESERVER
        ))
    }

    /// Runs the laptop script in the guest, then installs rails.
    /// The script reads the sudo password from stdin.
    pub fn setup_laptop(&mut self, colored_output: bool) -> Result<(), LaptopError> {
        let mut script = format!("echo vagrant | bash {}", LAPTOP_SCRIPT);
        if colored_output {
            script.push_str(" --colored-output");
        }
        self.guest(&script)?;

        self.log.notice("Installing rails gem");
        self.install_rails_gem()
    }

    pub fn active_shell(&mut self) -> Result<(), LaptopError> {
        self.login_shell("echo $SHELL")
    }

    pub fn installed_ruby_version(&mut self) -> Result<(), LaptopError> {
        self.login_shell("ruby --version")
    }

    pub fn generate_rails_app(&mut self) -> Result<(), LaptopError> {
        self.login_shell(&format!("rm -Rf {} && cd ~ && rails new test_app", TEST_APP))
    }

    pub fn scaffold_and_model_generation(&mut self) -> Result<(), LaptopError> {
        self.login_shell(&format!("cd {} && rails g scaffold post title:string", TEST_APP))
    }

    pub fn database_migration(&mut self) -> Result<(), LaptopError> {
        self.login_shell(&format!(
            "cd {} && rake db:create db:migrate db:test:prepare",
            TEST_APP
        ))
    }

    /// Removes the test app, cleans the package cache, and exports the VM
    /// as `<name>-with-laptop.box`.
    ///
    /// `vagrant package` refuses to overwrite its output, so an existing box
    /// is moved aside just before the export and restored if the export fails.
    pub fn package(&mut self) -> Result<(), LaptopError> {
        self.guest(&format!("rm -Rf {}", TEST_APP))?;
        let tool = self.resolve_packaging_tool()?.as_str();
        self.guest(&format!("sudo {} clean", tool))?;

        let backup = self.set_aside_existing_box()?;
        let cmd = vagrant::package(&self.vm_image_name, &self.package_file_name);

        match (self.runner.run(&cmd), backup) {
            (Ok(()), Some(old)) => fs::remove_file(&old).map_err(|source| fs_error(&old, source)),
            (Ok(()), None) => Ok(()),
            (Err(e), Some(old)) => {
                let path = self.package_path();
                fs::rename(&old, &path).map_err(|source| fs_error(&path, source))?;
                self.log
                    .notice(&format!("Kept the previous {}.", self.package_file_name));
                Err(e)
            }
            (Err(e), None) => Err(e),
        }
    }

    /// Lets the vagrant user run `chsh` without a password prompt.
    pub fn allow_shell_change_without_password(&mut self) -> Result<(), LaptopError> {
        self.guest(
            r#"sudo sed -i "/sufficient\spam_rootok.so/c\auth        sufficient  pam_permit.so" /etc/pam.d/chsh"#,
        )
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// Renames an existing box to `<box>.old`, returning the new path.
    fn set_aside_existing_box(&self) -> Result<Option<PathBuf>, LaptopError> {
        if !self.is_packaged() {
            return Ok(None);
        }

        let path = self.package_path();
        let old = self.workdir.join(format!("{}.old", self.package_file_name));

        if self.dry_run {
            self.log.command(&format!(
                "mv {} {}  (dry-run)",
                quote(&path.to_string_lossy()),
                quote(&old.to_string_lossy())
            ));
            return Ok(None);
        }

        fs::rename(&path, &old).map_err(|source| fs_error(&path, source))?;
        Ok(Some(old))
    }

    fn guest(&mut self, command: &str) -> Result<(), LaptopError> {
        self.runner.run(&vagrant::ssh(command))
    }

    fn login_shell(&mut self, command: &str) -> Result<(), LaptopError> {
        self.runner.run(&vagrant::ssh_login_shell(command))
    }
}

fn fs_error(path: &Path, source: io::Error) -> LaptopError {
    LaptopError::Filesystem {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::{cmd::testing::RecordingRunner, ui::testing::MemoryLog};

    fn distro<'a>(
        path: &str,
        runner: &'a mut RecordingRunner,
        log: &'a MemoryLog,
    ) -> Distro<&'a mut RecordingRunner, &'a MemoryLog> {
        Distro::new(path, runner, log).unwrap()
    }

    // ── Names ─────────────────────────────────────────────────────────────────

    #[test]
    fn names_derive_from_descriptor() {
        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        let d = distro("/config/Vagrantfile.ubuntu2204", &mut runner, &log);

        assert_eq!(d.base_name(), "ubuntu2204");
        assert_eq!(d.vm_image_name(), "laptop-ubuntu2204");
        assert_eq!(d.package_file_name(), "ubuntu2204-with-laptop.box");
        assert_eq!(d.config_path(), Path::new("/config/Vagrantfile.ubuntu2204"));
    }

    #[test]
    fn names_keep_dots_after_prefix() {
        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        let d = distro("Vagrantfile.debian.12", &mut runner, &log);
        assert_eq!(d.base_name(), "debian.12");
        assert_eq!(d.package_file_name(), "debian.12-with-laptop.box");
    }

    #[test]
    fn empty_or_rootless_paths_are_rejected() {
        for bad in ["", "/", "..", "/config/Vagrantfile.", "/config/Vagrantfile", "Vagrantfile"] {
            let err = Distro::new(bad, RecordingRunner::default(), MemoryLog::default())
                .err()
                .unwrap();
            assert!(matches!(err, LaptopError::InvalidPath(_)), "{bad:?}");
        }
    }

    // ── Filesystem ────────────────────────────────────────────────────────────

    #[test]
    fn link_config_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let descriptor = dir.path().join("Vagrantfile.fedora40");
        fs::write(&descriptor, "# vagrant").unwrap();

        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        let d = Distro::new(&descriptor, &mut runner, &log)
            .unwrap()
            .in_dir(dir.path());

        d.link_config().unwrap();
        d.link_config().unwrap();

        let link = dir.path().join("Vagrantfile");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap(), descriptor);
    }

    #[test]
    fn link_config_replaces_regular_file_and_dangling_link() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("Vagrantfile");

        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        let d = Distro::new("/boxes/Vagrantfile.arch", &mut runner, &log)
            .unwrap()
            .in_dir(dir.path());

        fs::write(&link, "stale").unwrap();
        d.link_config().unwrap();
        assert_eq!(fs::read_link(&link).unwrap(), Path::new("/boxes/Vagrantfile.arch"));

        // The target does not exist, so the link left behind is dangling.
        d.link_config().unwrap();
        assert_eq!(fs::read_link(&link).unwrap(), Path::new("/boxes/Vagrantfile.arch"));
    }

    #[test]
    fn link_config_reports_filesystem_errors() {
        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        let d = Distro::new("Vagrantfile.arch", &mut runner, &log)
            .unwrap()
            .in_dir("/nonexistent/laptop-box-test");

        let err = d.link_config().unwrap_err();
        assert!(matches!(err, LaptopError::Filesystem { .. }));
    }

    #[test]
    fn is_packaged_checks_every_call() {
        let dir = TempDir::new().unwrap();
        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        let d = Distro::new("Vagrantfile.alpine", &mut runner, &log)
            .unwrap()
            .in_dir(dir.path());

        assert!(!d.is_packaged());
        fs::write(dir.path().join("alpine-with-laptop.box"), b"box").unwrap();
        assert!(d.is_packaged());
        fs::remove_file(dir.path().join("alpine-with-laptop.box")).unwrap();
        assert!(!d.is_packaged());
    }

    // ── Host commands ─────────────────────────────────────────────────────────

    #[test]
    fn reset_destroys_then_ups() {
        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        distro("Vagrantfile.x", &mut runner, &log).reset().unwrap();
        assert_eq!(runner.rendered(), vec!["vagrant destroy --force", "vagrant up"]);
    }

    #[test]
    fn reset_still_ups_after_failed_destroy() {
        let mut runner = RecordingRunner::default().failing_on("destroy", 1);
        let log = MemoryLog::default();
        distro("Vagrantfile.x", &mut runner, &log).reset().unwrap();

        assert_eq!(runner.rendered(), vec!["vagrant destroy --force", "vagrant up"]);
        assert_eq!(log.notices().len(), 1);
    }

    #[test]
    fn reset_propagates_failed_up() {
        let mut runner = RecordingRunner::default().failing_on("vagrant up", 2);
        let log = MemoryLog::default();
        let err = distro("Vagrantfile.x", &mut runner, &log).reset().unwrap_err();
        assert!(matches!(err, LaptopError::CommandFailed(ref c, 2) if c == "vagrant up"));
    }

    #[test]
    fn halt_issues_one_command() {
        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        distro("Vagrantfile.x", &mut runner, &log).halt().unwrap();
        assert_eq!(runner.rendered(), vec!["vagrant halt"]);
    }

    // ── Package tool ──────────────────────────────────────────────────────────

    #[test]
    fn aptitude_is_probed_once() {
        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        let mut d = distro("Vagrantfile.x", &mut runner, &log);

        assert_eq!(d.resolve_packaging_tool().unwrap(), PackageTool::Aptitude);
        assert_eq!(d.resolve_packaging_tool().unwrap(), PackageTool::Aptitude);
        drop(d);

        assert_eq!(runner.guest_commands(), vec!["which aptitude"]);
        assert!(log.notices().is_empty());
    }

    #[test]
    fn failed_probe_falls_back_to_apt_get() {
        let mut runner = RecordingRunner::default().failing_on("which aptitude", 1);
        let log = MemoryLog::default();
        let mut d = distro("Vagrantfile.x", &mut runner, &log);

        assert_eq!(d.resolve_packaging_tool().unwrap(), PackageTool::AptGet);
        assert_eq!(d.resolve_packaging_tool().unwrap(), PackageTool::AptGet);
        drop(d);

        assert_eq!(runner.guest_commands(), vec!["which aptitude"]);
        assert_eq!(
            log.notices(),
            vec!["This VM is not using aptitude yet. Switching to apt-get for the moment."]
        );
    }

    #[test]
    fn missing_vagrant_is_not_a_fallback() {
        let mut runner = RecordingRunner::default().without_program("vagrant");
        let log = MemoryLog::default();
        let mut d = distro("Vagrantfile.x", &mut runner, &log);

        assert!(matches!(
            d.resolve_packaging_tool(),
            Err(LaptopError::CommandNotFound(_))
        ));
        assert!(d.resolve_packaging_tool().is_err());
        drop(d);
        assert_eq!(runner.issued.len(), 2);
    }

    // ── Guest commands ────────────────────────────────────────────────────────

    #[test]
    fn prepare_updates_then_upgrades() {
        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        distro("Vagrantfile.x", &mut runner, &log).prepare().unwrap();

        let guest = runner.guest_commands();
        assert_eq!(guest.len(), 3);
        assert_eq!(guest[0], "which aptitude");
        assert_eq!(guest[1], "sudo aptitude update");
        assert!(guest[2].contains("aptitude dist-upgrade -y"));
        assert!(guest[2].contains("DEBIAN_FRONTEND=noninteractive"));
        assert!(guest[2].contains("--force-confdef"));
        assert!(guest[2].contains("--force-confold"));
    }

    #[test]
    fn prepare_uses_apt_get_fallback() {
        let mut runner = RecordingRunner::default().failing_on("which aptitude", 1);
        let log = MemoryLog::default();
        distro("Vagrantfile.x", &mut runner, &log).prepare().unwrap();

        let guest = runner.guest_commands();
        assert_eq!(guest[1], "sudo apt-get update");
        assert!(guest[2].starts_with("sudo DEBIAN_FRONTEND=noninteractive apt-get dist-upgrade"));
    }

    #[test]
    fn prepare_stops_when_update_fails() {
        let mut runner = RecordingRunner::default().failing_on("update", 100);
        let log = MemoryLog::default();
        let err = distro("Vagrantfile.x", &mut runner, &log).prepare().unwrap_err();

        assert!(matches!(err, LaptopError::CommandFailed(_, 100)));
        assert_eq!(runner.guest_commands().len(), 2);
    }

    #[test]
    fn set_dns_writes_resolv_conf() {
        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        distro("Vagrantfile.x", &mut runner, &log).set_dns().unwrap();
        assert_eq!(
            runner.guest_commands(),
            vec![r#"echo "nameserver 8.8.8.8" | sudo tee /etc/resolv.conf > /dev/null"#]
        );
    }

    #[test]
    fn setup_laptop_then_rails() {
        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        distro("Vagrantfile.x", &mut runner, &log).setup_laptop(true).unwrap();

        assert_eq!(
            runner.guest_commands(),
            vec![
                "echo vagrant | bash /vagrant/linux --colored-output",
                "gem install rails"
            ]
        );
        assert_eq!(log.notices(), vec!["Installing rails gem"]);
    }

    #[test]
    fn setup_laptop_without_color() {
        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        distro("Vagrantfile.x", &mut runner, &log).setup_laptop(false).unwrap();
        assert_eq!(runner.guest_commands()[0], "echo vagrant | bash /vagrant/linux");
    }

    #[test]
    fn setup_laptop_skips_rails_when_script_fails() {
        let mut runner = RecordingRunner::default().failing_on("/vagrant/linux", 1);
        let log = MemoryLog::default();
        assert!(distro("Vagrantfile.x", &mut runner, &log).setup_laptop(true).is_err());
        assert_eq!(runner.issued.len(), 1);
    }

    #[test]
    fn ruby_checks_run_in_login_shell() {
        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        let mut d = distro("Vagrantfile.x", &mut runner, &log);
        d.active_shell().unwrap();
        d.installed_ruby_version().unwrap();
        d.generate_rails_app().unwrap();
        d.scaffold_and_model_generation().unwrap();
        d.database_migration().unwrap();
        drop(d);

        assert_eq!(
            runner.guest_commands(),
            vec![
                "zsh -i -l -c 'echo $SHELL'",
                "zsh -i -l -c 'ruby --version'",
                "zsh -i -l -c 'rm -Rf ~/test_app && cd ~ && rails new test_app'",
                "zsh -i -l -c 'cd ~/test_app && rails g scaffold post title:string'",
                "zsh -i -l -c 'cd ~/test_app && rake db:create db:migrate db:test:prepare'",
            ]
        );
    }

    #[test]
    fn package_cleans_then_exports() {
        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        distro("/config/Vagrantfile.ubuntu2204", &mut runner, &log)
            .package()
            .unwrap();

        assert_eq!(
            runner.rendered(),
            vec![
                "vagrant ssh -c 'rm -Rf ~/test_app'",
                "vagrant ssh -c 'which aptitude'",
                "vagrant ssh -c 'sudo aptitude clean'",
                "vagrant package --base laptop-ubuntu2204 --output ubuntu2204-with-laptop.box",
            ]
        );
    }

    #[test]
    fn package_reuses_tool_resolved_by_prepare() {
        let mut runner = RecordingRunner::default().failing_on("which aptitude", 1);
        let log = MemoryLog::default();
        let mut d = distro("Vagrantfile.debian12", &mut runner, &log);
        d.prepare().unwrap();
        d.package().unwrap();
        drop(d);

        let guest = runner.guest_commands();
        assert_eq!(guest.iter().filter(|c| *c == "which aptitude").count(), 1);
        assert!(guest.contains(&"sudo apt-get clean".to_string()));
    }

    #[test]
    fn chsh_rule_is_rewritten() {
        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        distro("Vagrantfile.x", &mut runner, &log)
            .allow_shell_change_without_password()
            .unwrap();

        let guest = runner.guest_commands();
        assert_eq!(guest.len(), 1);
        assert!(guest[0].starts_with("sudo sed -i "));
        assert!(guest[0].contains(r"/sufficient\spam_rootok.so/c\auth"));
        assert!(guest[0].contains("pam_permit.so"));
        assert!(guest[0].ends_with("/etc/pam.d/chsh"));
    }

    #[test]
    fn install_rails_gem_is_bare_ssh() {
        let mut runner = RecordingRunner::default();
        let log = MemoryLog::default();
        distro("Vagrantfile.x", &mut runner, &log)
            .install_rails_gem()
            .unwrap();
        assert_eq!(runner.rendered(), vec!["vagrant ssh -c 'gem install rails'"]);
    }
}
