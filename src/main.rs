use std::process::ExitCode;

use upstep::ui::output;

fn main() -> ExitCode {
    match upstep::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
