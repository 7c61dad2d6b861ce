//! Terminal output formatting with rich UI support.

use std::time::Duration;

use console::style;
use fuzzplug_core::{Parameter, Role, Signature};
use indicatif::{ProgressBar, ProgressStyle};

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    println!("{} {}", style("⚠").yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", style("ℹ").blue().bold(), message);
}

/// Prints a plugin build header.
pub fn build_header(role: Role, plugin: &str) {
    println!(
        "\n{} {} {}",
        style("▶").cyan().bold(),
        style(role.id()).cyan().bold(),
        style(plugin).dim()
    );
}

/// Relays compiler output, indented under the current step.
pub fn compiler_output(text: &str) {
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        println!("  {} {}", style("│").dim(), line);
    }
}

/// Prints every parameter of the entry function, marking the custom ones.
pub fn parameters(signature: &Signature, custom: &[Parameter]) {
    if signature.parameters.is_empty() {
        list_item(&style("(no parameters)").dim().to_string());
        return;
    }

    let fixed = signature.parameters.len() - custom.len();
    for (index, param) in signature.parameters.iter().enumerate() {
        let text = param.formal();
        if index < fixed {
            list_item(&style(text).dim().to_string());
        } else {
            list_item(&format!("{} {}", text, style("(custom)").cyan()));
        }
    }
}

// ============================================================================
// Rich UI Components
// ============================================================================

fn spinner_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Creates a spinner for long-running operations.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style("{spinner:.cyan} {msg}"));
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Finishes a spinner with success.
pub fn spinner_success(spinner: &ProgressBar, message: &str) {
    spinner.set_style(spinner_style("{msg}"));
    spinner.finish_with_message(format!("{} {}", style("✓").green(), message));
}

/// Finishes a spinner with failure.
pub fn spinner_failure(spinner: &ProgressBar, message: &str) {
    spinner.set_style(spinner_style("{msg}"));
    spinner.finish_with_message(format!("{} {}", style("✗").red(), message));
}

/// Finishes a spinner with skip status.
pub fn spinner_skipped(spinner: &ProgressBar, message: &str) {
    spinner.set_style(spinner_style("{msg}"));
    spinner.finish_with_message(format!(
        "{} {} {}",
        style("○").dim(),
        style(message).dim(),
        style("(cached)").dim()
    ));
}

/// Prints a header for a section.
pub fn section_header(title: &str) {
    println!("\n{}", style(format!("── {} ──", title)).bold());
}

/// Prints a list item.
pub fn list_item(text: &str) {
    println!("  {} {}", style("•").dim(), text);
}

/// Prints a key-value pair.
pub fn key_value(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}
