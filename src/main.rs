use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast::Stmt;
use rox::ast_printer::AstPrinter;
use rox::config::LexerConfig;
use rox::error::{Diagnostics, LoxError};
use rox::parser::Parser;
use rox::rpn::RpnConverter;
use rox::scanner::Scanner;
use rox::Lox;

#[derive(ClapParser, Debug)]
#[command(version, about = "Rox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,

    /// JSON file overriding the keyword and single-character token tables
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses a program and prints the tree of each statement
    Parse { filename: PathBuf },

    /// Prints each expression statement in Reverse Polish Notation
    Rpn { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Reads and runs one line at a time
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn load_config(path: Option<&Path>) -> Result<LexerConfig> {
    match path {
        Some(path) => {
            let blob = read_file(path)?;
            LexerConfig::from_json(&blob).context(format!("Invalid config {:?}", path))
        }
        None => Ok(LexerConfig::default()),
    }
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn report_errors<'e>(errors: impl IntoIterator<Item = &'e LoxError>) {
    for e in errors {
        eprintln!("{}", e);
    }
}

/// Scan and parse `source`, exiting with 65 on any error.
fn parse_or_exit(source: &str, config: &LexerConfig) -> Vec<Stmt> {
    let mut diagnostics = Diagnostics::new();

    let tokens = Scanner::new(source, config).scan_tokens(&mut diagnostics);
    let statements = Parser::new(&tokens, &mut diagnostics).parse();

    if diagnostics.has_errors() {
        report_errors(diagnostics.errors());

        debug!("Parse failed, exiting with code 65");
        std::process::exit(65);
    }

    statements
}

fn repl(config: LexerConfig) -> Result<()> {
    let mut lox = Lox::with_output(config, Box::new(io::stdout()));
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        // Each line starts with a clean error slate.
        let report = lox.run(&line);

        report_errors(&report.errors);

        if let Some(value) = report.value {
            println!("=> {}", value);
        }
    }

    info!("REPL finished");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let config = load_config(args.config.as_deref())?;

    match args.commands {
        Commands::Tokenize { filename } => {
            info!("Running Tokenize subcommand");

            let buf = read_file(&filename)?;
            let mut tokenized = true;

            for token in Scanner::new(&buf, &config) {
                match token {
                    Ok(token) => {
                        debug!("Scanned token: {}", token);

                        println!("{}", token);
                    }

                    Err(e) => {
                        tokenized = false;

                        eprintln!("{}", e);
                    }
                }
            }

            if !tokenized {
                debug!("Tokenization failed, exiting with code 65");

                std::process::exit(65);
            }
        }

        Commands::Parse { filename } => {
            info!("Running Parse subcommand");

            let buf = read_file(&filename)?;

            for stmt in parse_or_exit(&buf, &config) {
                println!("{}", AstPrinter::print_stmt(&stmt));
            }
        }

        Commands::Rpn { filename } => {
            info!("Running Rpn subcommand");

            let buf = read_file(&filename)?;

            for stmt in parse_or_exit(&buf, &config) {
                if let Stmt::Expression(expr) = stmt {
                    println!("{}", RpnConverter::convert(&expr));
                }
            }
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");

            let buf = read_file(&filename)?;
            let mut lox = Lox::with_output(config, Box::new(io::stdout()));

            let report = lox.run(&buf);

            report_errors(&report.errors);

            let code = report.exit_code();
            if code != 0 {
                debug!("Run failed, exiting with code {}", code);

                std::process::exit(code);
            }

            info!("Program executed successfully");
        }

        Commands::Repl => repl(config)?,
    }

    Ok(())
}
