//! `stropt`: inspect and optimize the memory layout of C aggregates.

use std::process::ExitCode;

use stropt::{init_tracing, parse_args, report, run, Command, HELP, USAGE};

fn main() -> ExitCode {
    init_tracing();

    let command = match parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match command {
        Command::Help => {
            println!("{USAGE}");
            println!("{HELP}");
        }
        Command::Version => println!("stropt {}", env!("CARGO_PKG_VERSION")),
        Command::Run(options) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(err) = run(&options, &mut stdout) {
                report(&err);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
