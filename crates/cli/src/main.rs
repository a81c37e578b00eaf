use std::process::ExitCode;

fn main() -> ExitCode {
    roomy_cli::run()
}
