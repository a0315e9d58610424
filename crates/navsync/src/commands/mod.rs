use clap::ArgMatches;

mod config;
mod helpers;
mod replay;

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        Some(("replay", sub_matches)) => replay::handle_replay_command(matches, sub_matches),
        Some(("config", sub_matches)) => config::handle_config_command(matches, sub_matches),
        _ => {
            tracing::error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}
