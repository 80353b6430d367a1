use std::env;
use std::process;

/// Options for the demo binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// Log destination (None for stdout)
    pub log_file: Option<String>,
    /// Force-exit deadline in seconds, overrides the config file
    pub timeout_seconds: Option<u64>,
    /// How long each simulated cleanup callback sleeps
    pub work_seconds: u64,
    /// Number of simulated cleanup callbacks
    pub callbacks: usize,
    /// Optional JSON config file
    pub config_file: Option<String>,
}

impl Default for Args {
    fn default() -> Self {
        Args {
            log_file: None,
            timeout_seconds: None,
            work_seconds: 1,
            callbacks: 1,
            config_file: None,
        }
    }
}

/// Prints usage instructions for the program.
pub fn print_usage() {
    println!(
        "Usage: {} [-h] [-v] [-l logfile] [-t timeout_seconds] [-w work_seconds] [-n callbacks] [config_file]",
        crate::PROGRAM_NAME
    );
}

/// Parses command line arguments, exiting on `-h`, `-v` or invalid input
pub fn parse_args() -> Args {
    match try_parse_args(env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => process::exit(0),
        Err(message) => {
            eprintln!("Error: {}", message);
            print_usage();
            process::exit(1);
        }
    }
}

/// Parses arguments without the program name
///
/// Returns `Ok(None)` when `-h` or `-v` was handled and the program should
/// exit successfully.
pub fn try_parse_args<I>(args: I) -> Result<Option<Args>, String>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" => {
                print_usage();
                return Ok(None);
            }
            "-v" => {
                println!("{} version {}", crate::PROGRAM_NAME, crate::PROGRAM_VERSION);
                return Ok(None);
            }
            "-l" => {
                parsed.log_file = Some(args.next().ok_or("Missing log file argument")?);
            }
            "-t" => {
                let value = args.next().ok_or("Missing timeout seconds argument")?;
                parsed.timeout_seconds = Some(
                    value
                        .parse()
                        .map_err(|_| "Timeout seconds must be a non-negative number")?,
                );
            }
            "-w" => {
                let value = args.next().ok_or("Missing work seconds argument")?;
                parsed.work_seconds = value
                    .parse()
                    .map_err(|_| "Work seconds must be a non-negative number")?;
            }
            "-n" => {
                let value = args.next().ok_or("Missing callback count argument")?;
                parsed.callbacks = value
                    .parse()
                    .map_err(|_| "Callback count must be a non-negative number")?;
            }
            _ => {
                if parsed.config_file.is_none() && !arg.starts_with('-') {
                    parsed.config_file = Some(arg);
                } else {
                    return Err(format!("Unexpected argument: {}", arg));
                }
            }
        }
    }

    Ok(Some(parsed))
}
