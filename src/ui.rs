use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// ── Terminal helpers ──────────────────────────────────────────────────────────

fn term_width() -> usize {
    Term::stdout().size().1.max(60) as usize
}

fn rule() -> String {
    "─".repeat(term_width().min(52))
}

// ── Banner ────────────────────────────────────────────────────────────────────

pub fn print_banner() {
    println!();
    println!("{}", style("   laptop-box").cyan().bold());
    println!(
        "{}",
        style("   Vagrant boxes with laptop pre-installed  ·  v0.1.0")
            .dim()
            .italic()
    );
    println!();
    println!("{}", style(rule()).dim());
}

// ── Step header ───────────────────────────────────────────────────────────────

/// Prints a visually distinct numbered step header.
pub fn print_step(step: usize, total: usize, title: &str) {
    println!();
    let tag = style(format!(" {}/{} ", step, total)).black().on_cyan().bold();
    let heading = style(format!("  {}", title)).white().bold();
    println!("{}{}", tag, heading);
    println!("{}", style(rule()).dim());
}

// ── Feedback messages ─────────────────────────────────────────────────────────

/// Green ✓ — operation completed successfully.
pub fn print_success(msg: &str) {
    println!("  {}  {}", style("✓").green().bold(), style(msg).green());
}

/// Blue → — neutral info / progress note.
pub fn print_info(msg: &str) {
    println!("  {}  {}", style("→").blue().bold(), msg);
}

/// Yellow ⚠  — non-fatal notice.
pub fn print_warning(msg: &str) {
    println!("  {}  {}", style("⚠").yellow().bold(), style(msg).yellow());
}

/// Red ✗ — error (written to stderr).
pub fn print_error(msg: &str) {
    eprintln!("  {}  {}", style("✗").red().bold(), style(msg).red());
}

// ── Info box ──────────────────────────────────────────────────────────────────

/// Renders a key→value box in the terminal. Rows are left open on the
/// right so long values never break the border.
///
/// ```text
/// ┌─ ubuntu2204 ──────────────────────────┐
/// │  Vagrantfile  ./Vagrantfile.ubuntu2204
/// │  VM name      laptop-ubuntu2204
/// │  Packaged     no
/// └───────────────────────────────────────┘
/// ```
pub fn print_kv_box(title: &str, rows: &[(&str, &str)]) {
    let (dashes, bottom) = kv_box_rules(title);
    println!(
        "  ┌─ {} {}┐",
        style(title).white().bold(),
        style(&dashes).dim()
    );

    for (key, val) in rows {
        println!(
            "  │  {:<13}{}",
            style(*key).dim(),
            style(*val).white().bold()
        );
    }

    println!("  └{}┘", style(&bottom).dim());
}

/// Dashes after the title and the full bottom rule, sized so both
/// borders end in the same column.
fn kv_box_rules(title: &str) -> (String, String) {
    const BOX_INNER: usize = 38;

    let title_width = title.chars().count();
    let dashes = "─".repeat(BOX_INNER.saturating_sub(title_width + 2));
    // "─ " + title + " " + dashes
    let top_inner = 2 + title_width + 1 + dashes.chars().count();
    (dashes, "─".repeat(top_inner))
}

// ── Spinner ───────────────────────────────────────────────────────────────────

/// Returns a running braille spinner.
/// Call `pb.finish_and_clear()` when done.
pub fn spinner(msg: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("  {spinner:.cyan.bold}  {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ── Log sink ──────────────────────────────────────────────────────────────────

/// Destination for issued commands, their output, and operator notices.
///
/// Injected into `Distro` and the command runners instead of a global logger.
pub trait LogSink {
    /// A command line about to run.
    fn command(&self, line: &str);
    /// Captured stdout/stderr of a finished command.
    fn output(&self, text: &str);
    /// A human-facing notice (fallbacks, progress notes).
    fn notice(&self, msg: &str);
}

impl<T: LogSink + ?Sized> LogSink for &T {
    fn command(&self, line: &str) {
        (**self).command(line)
    }

    fn output(&self, text: &str) {
        (**self).output(text)
    }

    fn notice(&self, msg: &str) {
        (**self).notice(msg)
    }
}

/// Writes everything to the terminal with the styles above.
#[derive(Debug, Default, Clone, Copy)]
pub struct Console;

impl LogSink for Console {
    fn command(&self, line: &str) {
        println!("  {}  {}", style("$").cyan().bold(), style(line).white());
    }

    fn output(&self, text: &str) {
        for line in text.lines() {
            println!("     {}", style(line).dim());
        }
    }

    fn notice(&self, msg: &str) {
        print_info(msg);
    }
}
