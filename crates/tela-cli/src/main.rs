mod cli;
mod modes;

use std::process::ExitCode;

use tela_core::core::interrupt;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        // Double Ctrl+C lands here with the conventional SIGINT code.
        Err(err) if err.downcast_ref::<interrupt::InterruptedError>().is_some() => {
            ExitCode::from(130)
        }
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
