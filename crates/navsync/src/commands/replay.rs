use clap::ArgMatches;
use tracing::{error, info};

use crate::trace::{self, Replay, ReplayReport};

use super::helpers::{load_config, resolve_trace_path};

pub(crate) fn handle_replay_command(
    root: &ArgMatches,
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let trace_arg = matches
        .get_one::<String>("trace")
        .ok_or("Trace argument is required")?;
    let json_output = matches.get_flag("json");
    let with_status = matches.get_flag("status");

    info!(
        event = "cli.replay_started",
        trace = trace_arg,
        json_output = json_output
    );

    let config = load_config(root)?;
    let path = resolve_trace_path(trace_arg)?;
    let trace = match trace::load_trace(&path) {
        Ok(trace) => trace,
        Err(e) => {
            eprintln!("❌ {}", e);
            error!(event = "cli.replay_failed", trace = trace_arg, error = %e);
            return Err(e);
        }
    };

    let report = Replay::attach(config, &trace, with_status).run(&trace);

    if json_output {
        let output = serde_json::json!({
            "trace": path.display().to_string(),
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report(&path.display().to_string(), &report, with_status);
    }

    info!(
        event = "cli.replay_completed",
        trace = trace_arg,
        steps = report.steps.len(),
        events = report.event_count()
    );
    Ok(())
}

fn print_report(trace: &str, report: &ReplayReport, with_status: bool) {
    println!("Replaying {}", trace);

    for event in &report.attach_events {
        println!("  {:>8}ms    {}", event.at(), event);
    }

    for step in &report.steps {
        println!("{:>8}ms  ▶ {}", step.at, step.op);
        for event in &step.events {
            println!("  {:>8}ms    {}", event.at(), event);
        }
        if let Some(error) = &step.error {
            println!("              ❌ {}", error);
        }
        if with_status && let Some(status) = &step.status {
            println!(
                "              phase={} view={} timers={}",
                status.phase, status.active_view, status.pending_timers
            );
        }
    }

    let status = &report.status;
    println!();
    println!("Final state");
    println!("  Phase:       {}", status.phase);
    println!("  View:        {} (from {})", status.active_view, status.tab_source);
    println!(
        "  Location:    {}",
        status.location.as_deref().unwrap_or("(detached)")
    );
    println!("  History:     {} entries", status.history_len);
    println!("  In flight:   {}", status.in_flight.len());
    println!("  Toasts:      {} active", status.active_toasts.len());
    println!("  Timers:      {} pending", status.pending_timers);
    println!("  Events:      {}", report.event_count());
}
