use clap::{Arg, ArgAction, Command};

pub fn root_command() -> Command {
    Command::new("navsync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Replay navigation traces through the navigation-synchronized refresh coordinator")
        .long_about("navsync drives a coordinator with simulated browser, toast and session-store collaborators. Feed it a JSON trace of navigations, tab selections, refreshes and ticks to see how tab sync, refresh throttling, toast spacing and loop recovery react.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Use this config file instead of ~/.navsync/config.toml and ./.navsync/config.toml")
                .value_name("PATH")
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
}
