use clap::Parser;
use procstream::cli::{execute_command, init_tracing, Cli};
use procstream::config::ConfigLoader;
use tracing::{debug, error, trace};

fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::new().load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(cli.verbose, config.log_level.as_deref());

    debug!("procstream started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    match execute_command(cli.command, &config) {
        Ok(status) => std::process::exit(exit_code_for(status)),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

/// Pass the child's status through when it is a valid process exit code.
fn exit_code_for(status: i32) -> i32 {
    if (0..=255).contains(&status) {
        status
    } else {
        1
    }
}
