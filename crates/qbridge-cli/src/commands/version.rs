//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - remote quantum backends with local simulation fallback",
        style("qbridge").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qbridge-ir        Circuit representation");
    println!("  qbridge-hal       Credentials, backend directory, execution");
    println!("  qbridge-compile   Lowering to native gate sets");
    println!("  qbridge-eval      Result validation");
    println!("  qbridge-pipeline  Orchestration with fallback");
    println!("  qbridge-cli       Command-line interface");
    println!();
    println!("License: {}", style("Apache-2.0").dim());
}
