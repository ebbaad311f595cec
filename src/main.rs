// snipviz: data-structure and loop tracer for Python-style snippets

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use snipviz::ui::App;
use snipviz::{analyze_with_config, AnalysisResult, AnalyzerConfig};

/// Parsed command-line options
struct Options {
    input: String,
    json: bool,
    pretty: bool,
    config: AnalyzerConfig,
}

fn usage(program_name: &str) -> ! {
    eprintln!("Usage: {program_name} <file.py | -> [--json] [--pretty] [--max-iterations N]");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {program_name} snippet.py               # Step through the snippet in the TUI");
    eprintln!("  {program_name} snippet.py --json        # Print the analysis as JSON");
    eprintln!("  cat snippet.py | {program_name} - --json --pretty");
    eprintln!();
    eprintln!("Set SNIPVIZ_LOG=debug to see recovered evaluation errors on stderr.");
    std::process::exit(1);
}

fn parse_args(args: &[String]) -> Options {
    let program_name = args.first().map(String::as_str).unwrap_or("snipviz");
    let mut input = None;
    let mut json = false;
    let mut pretty = false;
    let mut config = AnalyzerConfig::default();

    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--pretty" => pretty = true,
            "--max-iterations" => match rest.next().and_then(|n| n.parse().ok()) {
                Some(n) => config.max_iterations = n,
                None => {
                    eprintln!("Error: --max-iterations expects a non-negative number");
                    usage(program_name);
                }
            },
            "-h" | "--help" => usage(program_name),
            other if other.starts_with("--") => {
                eprintln!("Error: Unknown option '{other}'");
                usage(program_name);
            }
            other if input.is_none() => input = Some(other.to_string()),
            other => {
                eprintln!("Error: Unexpected argument '{other}'");
                usage(program_name);
            }
        }
    }

    let Some(input) = input else {
        eprintln!("Error: No input file provided");
        eprintln!();
        usage(program_name);
    };

    if input != "-" && !Path::new(&input).exists() {
        eprintln!("Error: File '{input}' not found");
        usage(program_name);
    }

    Options {
        input,
        json,
        pretty,
        config,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("SNIPVIZ_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let options = parse_args(&args);

    let source = if options.input == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(&options.input)?
    };

    info!(input = %options.input, "analyzing snippet");
    let result = analyze_with_config(&source, options.config);

    if options.json {
        let rendered = if options.pretty {
            serde_json::to_string_pretty(&result)?
        } else {
            serde_json::to_string(&result)?
        };
        println!("{rendered}");
        return Ok(());
    }

    let analysis = match result {
        AnalysisResult::Complete(analysis) => *analysis,
        AnalysisResult::SyntaxError { message } => {
            eprintln!("{message}");
            std::process::exit(1);
        }
        AnalysisResult::Blank => {
            eprintln!("Nothing to analyze: the input is empty");
            return Ok(());
        }
    };

    info!(
        structures = analysis.structures.len(),
        iterations = analysis.iteration_state.len(),
        "analysis complete"
    );

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(analysis, source);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}
