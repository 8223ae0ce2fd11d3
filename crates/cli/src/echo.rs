use gleaner_core::FillStats;
use owo_colors::OwoColorize;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Gleaner".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Harvest article listings and bodies\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print body fill counters
pub fn print_fill_summary(stats: &FillStats) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Body Fill".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("  {} {}", "Attempted:".dimmed(), stats.attempted.to_string().bright_white());
    eprintln!("  {} {}", "Filled:".dimmed(), stats.filled.to_string().bright_green());
    if stats.empty > 0 {
        eprintln!("  {} {}", "No body:".dimmed(), stats.empty.to_string().bright_yellow());
    }
    if stats.failed > 0 {
        eprintln!("  {} {}", "Failed:".dimmed(), stats.failed.to_string().bright_red());
    }
    eprintln!("  {} {}\n", "Checkpoints:".dimmed(), stats.checkpoints.to_string().bright_white());
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
