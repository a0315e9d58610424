use clap::{Arg, ArgAction, Command};

pub fn config_command() -> Command {
    Command::new("config")
        .about("Show the effective configuration")
        .arg(
            Arg::new("json")
                .long("json")
                .help("Output in JSON format")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("defaults")
                .long("defaults")
                .help("Fill in every default, not just the values set in config files")
                .action(ArgAction::SetTrue),
        )
}
