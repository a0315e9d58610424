use clap::{Arg, ArgAction, Command};

pub fn replay_command() -> Command {
    Command::new("replay")
        .about("Replay a navigation trace and print the coordinator's event log")
        .arg(
            Arg::new("trace")
                .help("Trace file, or the name of a trace in ~/.navsync/traces/")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Output in JSON format")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("status")
                .long("status")
                .help("Print the coordinator status after every step")
                .action(ArgAction::SetTrue),
        )
}
