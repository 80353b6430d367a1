use sigterm_handler::{instance, log, parse_args, parse_config, set_log_file, Config, Level};
use std::process;
use std::thread;
use std::time::Duration;

fn main() {
    let args = parse_args();

    let config = match &args.config_file {
        Some(path) => parse_config(path),
        None => Ok(Config::default()),
    }
    .and_then(Config::with_env_overrides);
    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };
    if args.log_file.is_some() {
        config.log_file = args.log_file.clone();
    }
    if args.timeout_seconds.is_some() {
        config.timeout_seconds = args.timeout_seconds;
    }

    // Before instance() so the installation message reaches the log file.
    if let Some(log_file) = &config.log_file {
        if let Err(e) = set_log_file(log_file) {
            eprintln!("Error setting log file: {}", e);
            process::exit(1);
        }
    }

    let handler = match instance() {
        Ok(handler) => handler,
        Err(e) => {
            eprintln!("Error installing signal handler: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = config.apply(handler) {
        eprintln!("Error applying configuration: {}", e);
        process::exit(1);
    }

    let work = Duration::from_secs(args.work_seconds);
    for n in 1..=args.callbacks {
        handler.register_defer_func(move || {
            let _ = log(Level::Info, &format!("Cleanup {} started", n));
            thread::sleep(work);
            let _ = log(Level::Info, &format!("Cleanup {} finished", n));
        });
    }

    let _ = log(
        Level::Info,
        &format!(
            "PID {} waiting for SIGINT/SIGTERM ({} callbacks, timeout {:?})",
            process::id(),
            args.callbacks,
            handler.timeout()
        ),
    );

    handler.wait_for_completion();
    let _ = log(Level::Info, "Graceful shutdown complete");
}
