//! Roles command implementation.

use console::style;
use fuzzplug_core::Role;
use miette::Result;

/// Lists every plugin role with its entry function and required signature.
pub fn execute() -> Result<()> {
    println!("{}", style("Plugin roles:").bold());
    println!();

    for role in Role::ALL {
        println!(
            "  {} - {}",
            style(role.id()).cyan().bold(),
            style(role.description()).dim()
        );
        println!("    func {}", role.contract().example());
        println!(
            "    {}",
            style(format!("default artifact: {}", role.default_artifact_name())).dim()
        );
        println!();
    }

    Ok(())
}
