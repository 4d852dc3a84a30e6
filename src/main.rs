// memsim: worst-fit allocator simulator with a time-travel heap viewer

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use memsim::allocator::Allocator;
use memsim::constants::DEFAULT_SNAPSHOT_LIMIT;
use memsim::engine::Simulation;
use memsim::errors::SimError;
use memsim::request::{parse_page_size, parse_requests};
use memsim::ui::App;

/// Parsed command line
struct Options {
    page_size: u64,
    input: Option<String>, // None = stdin
    tui: bool,
    verbose: bool,
    snapshot_limit: usize,
}

fn print_usage(program_name: &str) {
    eprintln!(
        "Usage: {} [--tui] [--verbose] [--snapshot-limit BYTES] <page_size> [requests-file]",
        program_name
    );
    eprintln!();
    eprintln!("Requests are read one per line as '<tag> [size]'; a negative tag frees.");
    eprintln!("Without a file, requests are read from stdin.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --tui                   Step through the run in a terminal UI");
    eprintln!("  --verbose               Dump the allocator state after every request");
    eprintln!("  --snapshot-limit BYTES  Memory budget for the --tui history");
}

fn parse_args(args: &[String]) -> Result<Options, SimError> {
    let mut tui = false;
    let mut verbose = false;
    let mut snapshot_limit = DEFAULT_SNAPSHOT_LIMIT;
    let mut positional = Vec::new();

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--tui" => tui = true,
            "--verbose" | "-v" => verbose = true,
            "--snapshot-limit" => {
                let value = iter.next().ok_or_else(|| SimError::InvalidArgument {
                    message: "--snapshot-limit needs a value".to_string(),
                })?;
                snapshot_limit = value.parse().map_err(|_| SimError::InvalidArgument {
                    message: format!("snapshot limit '{}' is not a byte count", value),
                })?;
            }
            flag if flag.starts_with("--") => {
                return Err(SimError::InvalidArgument {
                    message: format!("unknown option '{}'", flag),
                })
            }
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    let page_size = match positional.next() {
        Some(text) => parse_page_size(&text)?,
        None => {
            return Err(SimError::InvalidArgument {
                message: "missing page size".to_string(),
            })
        }
    };
    let input = positional.next();
    if let Some(extra) = positional.next() {
        return Err(SimError::InvalidArgument {
            message: format!("unexpected argument '{}'", extra),
        });
    }

    Ok(Options {
        page_size,
        input,
        tui,
        verbose,
        snapshot_limit,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("memsim");

    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage(program_name);
        return Ok(());
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage(program_name);
            std::process::exit(1);
        }
    };

    // Read the request script
    let source = match &options.input {
        Some(path) => {
            if !Path::new(path).exists() {
                eprintln!("Error: File '{}' not found", path);
                std::process::exit(1);
            }
            eprintln!("Parsing {}...", path);
            fs::read_to_string(path)?
        }
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            source
        }
    };

    let requests = match parse_requests(&source) {
        Ok(requests) => requests,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!(
        "Replaying {} requests with page size {}...",
        requests.len(),
        options.page_size
    );

    if options.tui {
        run_tui(options, requests)
    } else {
        run_headless(options, &requests)
    }
}

/// Replay requests and print the final stats to stdout
fn run_headless(
    options: Options,
    requests: &[memsim::request::Request],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut allocator = Allocator::new(options.page_size)?;

    for (index, request) in requests.iter().enumerate() {
        if let Err(e) = request.apply(&mut allocator) {
            eprintln!("Error: request {}: {}", index + 1, e);
            std::process::exit(1);
        }
        if options.verbose {
            eprintln!("*{}* ({})", request, index + 1);
            eprintln!("{}", allocator);
        }
    }

    println!("{}", allocator.stats());
    Ok(())
}

/// Replay requests into a snapshot history and open the viewer on it
fn run_tui(
    options: Options,
    requests: Vec<memsim::request::Request>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut simulation = Simulation::new(options.page_size, requests, options.snapshot_limit)?;

    let verbose = options.verbose;
    let result = simulation.run_with(|index, request, allocator| {
        if verbose {
            eprintln!("*{}* ({})", request, index + 1);
            eprintln!("{}", allocator);
        }
    });

    match result {
        Ok(()) => {
            eprintln!("Simulation completed successfully.");
            eprintln!(
                "Total snapshots: {} ({} bytes)",
                simulation.total_snapshots(),
                simulation.snapshot_memory_usage()
            );
        }
        Err(e) => {
            eprintln!("Simulation error: {}", e);
            eprintln!("Entering TUI with partial history...");
        }
    }

    // Rewind to the beginning for TUI
    if let Err(e) = simulation.rewind_to_start() {
        eprintln!("Warning: Failed to rewind to start: {}", e);
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create and run app
    let mut app = App::new(simulation);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
