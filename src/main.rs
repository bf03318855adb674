//! kodegen_bundler_deb - build `.deb` packages from pre-built application folders.

use kodegen_bundler_deb::cli;
use kodegen_bundler_deb::cli::OutputManager;
use std::process;

fn main() {
    env_logger::init();

    match cli::run() {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            // Create output manager for error display (never quiet for fatal errors)
            let output = OutputManager::new(false, false);
            output.error(&format!("Fatal error: {e}"));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                let _ = output.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    let _ = output.indent(&suggestion);
                }
            }

            process::exit(1);
        }
    }
}
