pub mod handlers;

use crate::presentation::cli::Cli;
use clap::Parser;

pub fn run() -> i32 {
    match Cli::try_parse() {
        Ok(cli) => handlers::handle(cli),
        Err(e) => {
            let _ = e.print();
            // --help and --version land here too; only real usage errors
            // carry the failure exit code.
            if e.use_stderr() { -1 } else { 0 }
        }
    }
}
