//! Annual sunrise/sunset CLI - entry point and output handling.

use sunspan::{cli, compute, output, planner};

fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .try_init();
}

fn main() {
    init_logger();
    let args: Vec<String> = std::env::args().collect();

    let invocation = match cli::parse_cli(args) {
        Ok(invocation) => invocation,
        Err(sunspan::CliError::Exit(message)) => {
            println!("{}", message);
            std::process::exit(0);
        }
        Err(sunspan::CliError::Message(message)) => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
    };

    // Performance monitoring setup
    let start = if invocation.params.perf {
        Some(std::time::Instant::now())
    } else {
        None
    };

    let (compute_plan, params) = match planner::build_job(invocation) {
        Ok(plan) => plan,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };

    let report = match compute::run(&compute_plan) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };

    let record_count = match output::dispatch_output(&report, &params) {
        Ok(count) => count,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };

    // Report performance if requested
    if let Some(start_time) = start {
        let elapsed = start_time.elapsed();
        eprintln!(
            "Processed {} {} records with {} worker(s) in {:.3}s ({:.0} records/sec)",
            record_count,
            compute_plan.command.name(),
            compute_plan.options.workers,
            elapsed.as_secs_f64(),
            record_count as f64 / elapsed.as_secs_f64()
        );
    }
}
