use std::process::ExitCode;

use a2dl::A2dlError;

fn main() -> ExitCode {
    match a2dl::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(A2dlError::Usage(message)) => {
            eprint!("{message}");
            if !message.ends_with('\n') {
                eprintln!();
            }
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
