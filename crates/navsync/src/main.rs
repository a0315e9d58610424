use navsync_core::init_logging;

mod app;
mod commands;
mod trace;

fn main() {
    let app = app::build_cli();
    let matches = app.get_matches();

    let verbose = matches.get_flag("verbose");
    let quiet = !verbose;
    init_logging(quiet);

    if let Err(e) = commands::run_command(&matches) {
        // Already reported to the user by the command handler.
        drop(e);
        std::process::exit(1);
    }
}
