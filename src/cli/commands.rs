use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::boards::{RefishRequest, DEFAULT_COGNATE_COLUMN};
use crate::cli::output::{format_boards_table, format_dangling_references, get_terminal_width, is_tty, to_json};
use crate::compare::CompareRequest;
use crate::config::Config;
use crate::lexicon::{emphasize_syllable, syllabize};
use crate::models::CognateApp;
use crate::{server, workflow};

#[derive(Parser)]
#[command(name = "cognate")]
#[command(about = "Cognate boards - compile, refish and compare reconstruction boards")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Increase logging (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Indent JSON output
    #[arg(long, global = true)]
    pub pretty: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a cross-id lexicon into a board document
    Compile {
        /// Lexicon file (defaults to lexicon.tsv in the data directory)
        lexicon: Option<PathBuf>,
    },
    /// Compile a partial-cognate lexicon into a board document
    Cognates {
        /// Lexicon file, relative to the data directory unless absolute
        lexicon: PathBuf,
        /// Column holding the cognate ids
        #[arg(long, default_value = DEFAULT_COGNATE_COLUMN)]
        column: String,
        /// foma script to use instead of the pipeline's own
        #[arg(long)]
        transducer: Option<PathBuf>,
    },
    /// Rebuild the boards of an edited board document
    Refish {
        /// Board document, or - for stdin
        board: PathBuf,
        /// Lexicon file (defaults to lexicon.tsv in the data directory)
        #[arg(long)]
        lexicon: Option<PathBuf>,
        /// foma script overriding the document's and the default one
        #[arg(long)]
        transducer: Option<PathBuf>,
    },
    /// Chart correspondences under an old and a new transducer
    Compare {
        /// Comparison request, or - for stdin
        input: PathBuf,
        /// Lexicon file (defaults to lexicon.tsv in the data directory)
        #[arg(long)]
        lexicon: Option<PathBuf>,
    },
    /// Report references that point at nothing
    Check {
        /// Board document, or - for stdin
        app: PathBuf,
    },
    /// List the boards of a board document
    Boards {
        /// Board document, or - for stdin
        app: PathBuf,
    },
    /// Split a transcription into syllables
    Syllabize {
        text: String,
        /// Print the whole form with this syllable (0-based) in angle brackets
        #[arg(long)]
        emphasize: Option<usize>,
    },
    /// Serve compile, refish and compare over HTTP
    Serve {
        /// Port to listen on (defaults to server.port, then 5000)
        #[arg(long)]
        port: Option<u16>,
        /// Lexicon served at / and used for refishing and comparison
        #[arg(long)]
        lexicon: Option<PathBuf>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    handle_command(cli)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn handle_command(cli: Cli) -> Result<()> {
    let pretty = cli.pretty;
    match cli.command {
        Commands::Compile { lexicon } => handle_compile(lexicon, pretty),
        Commands::Cognates { lexicon, column, transducer } => {
            handle_cognates(lexicon, column, transducer, pretty)
        }
        Commands::Refish { board, lexicon, transducer } => {
            handle_refish(board, lexicon, transducer, pretty)
        }
        Commands::Compare { input, lexicon } => handle_compare(input, lexicon, pretty),
        Commands::Check { app } => handle_check(app),
        Commands::Boards { app } => handle_boards(app),
        Commands::Syllabize { text, emphasize } => handle_syllabize(&text, emphasize),
        Commands::Serve { port, lexicon } => handle_serve(port, lexicon),
    }
}

/// Read a file, or stdin for `-`
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read standard input")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = read_input(path)?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn lexicon_path(config: &Config, lexicon: Option<PathBuf>) -> PathBuf {
    match lexicon {
        Some(path) => path,
        None => config.default_lexicon(),
    }
}

fn handle_compile(lexicon: Option<PathBuf>, pretty: bool) -> Result<()> {
    let config = Config::load()?;
    let path = lexicon_path(&config, lexicon);
    let app = workflow::compile_lexicon(&config, &path)?;
    println!("{}", to_json(&app, pretty)?);
    Ok(())
}

fn handle_cognates(lexicon: PathBuf, column: String, transducer: Option<PathBuf>, pretty: bool) -> Result<()> {
    let config = Config::load()?;
    let path = if lexicon.is_absolute() || lexicon.exists() {
        lexicon
    } else {
        config.data_dir.join(lexicon)
    };
    let script = transducer.as_deref().map(read_input).transpose()?;
    let app = workflow::compile_partial_cognates(&config, &path, &column, script)?;
    println!("{}", to_json(&app, pretty)?);
    Ok(())
}

fn handle_refish(board: PathBuf, lexicon: Option<PathBuf>, transducer: Option<PathBuf>, pretty: bool) -> Result<()> {
    let config = Config::load()?;
    let mut request: RefishRequest = read_json(&board)?;
    if let Some(path) = transducer {
        request.transducer = Some(read_input(&path)?);
    }
    let outcome = workflow::refish_document(&config, request, &lexicon_path(&config, lexicon))?;
    println!("{}", to_json(&outcome, pretty)?);
    Ok(())
}

fn handle_compare(input: PathBuf, lexicon: Option<PathBuf>, pretty: bool) -> Result<()> {
    let config = Config::load()?;
    let request: CompareRequest = read_json(&input)?;
    if request.langs_under_study.is_empty() {
        bail!("langsUnderStudy is empty");
    }
    let comparison = workflow::compare_transducers(&config, &request, &lexicon_path(&config, lexicon))?;
    println!("{}", to_json(&comparison, pretty)?);
    Ok(())
}

fn handle_check(path: PathBuf) -> Result<()> {
    let app: CognateApp = read_json(&path)?;
    let dangling = app.dangling_references();
    print!("{}", format_dangling_references(&dangling));
    if dangling.is_empty() {
        println!();
        Ok(())
    } else {
        bail!("{} has {} dangling reference(s)", path.display(), dangling.len())
    }
}

fn handle_boards(path: PathBuf) -> Result<()> {
    let app: CognateApp = read_json(&path)?;
    let table = format_boards_table(&app, get_terminal_width(), is_tty());
    print!("{}", table);
    if !table.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn handle_syllabize(text: &str, emphasize: Option<usize>) -> Result<()> {
    match emphasize {
        Some(index) => println!("{}", emphasize_syllable(text, index)),
        None => {
            for syllable in syllabize(text) {
                println!("{}", syllable);
            }
        }
    }
    Ok(())
}

fn handle_serve(port: Option<u16>, lexicon: Option<PathBuf>) -> Result<()> {
    let config = Config::load()?;
    let port = port.unwrap_or(config.port);
    let lexicon = lexicon_path(&config, lexicon);
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(server::serve(config, lexicon, port))
}
