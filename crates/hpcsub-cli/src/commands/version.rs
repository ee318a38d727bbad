//! Version command implementation.

use console::style;

use hpcsub_sched::Platform;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - batch submission scripts for HPC schedulers",
        style("hpcsub").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Platforms:");
    for platform in Platform::ALL {
        let profile = platform.profile();
        println!(
            "  {:<8} {:<6} {}",
            platform.id(),
            profile.directive_prefix,
            profile.submit_program
        );
    }
    println!();
    println!("License:    {}", style("Apache-2.0").dim());
}
