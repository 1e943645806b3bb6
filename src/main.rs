use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::ast_printer::AstPrinter;
use rox::error::{ErrorSink, LoxError, Status, StderrSink};
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::resolver::Resolver;
use rox::scanner::Scanner;
use rox::stmt::Stmt;

#[derive(ClapParser, Debug)]
#[command(version, about = "Rox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log (level can be overridden with RUST_LOG)
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses input from a file as a single expression and prints its AST
    Parse {
        filename: PathBuf,

        /// Parse a whole program, resolve it and dump the AST as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a Rox program
    Run { filename: PathBuf },

    /// Reads programs line by line from standard input
    Repl,
}

/// Maps the file into memory and validates it as UTF‑8.
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;

    let len: u64 = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the mapping is only read, and copied out before the file
    // handle goes away.
    let map: Mmap =
        unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    let text: String = String::from_utf8(map.to_vec())
        .map_err(LoxError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?;

    info!("Read {} bytes from {:?}", text.len(), filename);

    Ok(text)
}

fn init_logger() -> Result<()> {
    // Create or open the log file
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
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn exit_with(status: Status) -> ! {
    debug!("Exiting with {:?}", status);
    std::process::exit(status.exit_code());
}

fn tokenize(source: &str) -> Status {
    let mut status: Status = Status::Ok;

    for token in Scanner::new(source) {
        match token {
            Ok(token) => println!("{}", token),

            Err(e) => {
                status = Status::CompileError;
                eprintln!("{}", e);
            }
        }
    }

    status
}

fn parse(source: &str, json: bool) -> Result<Status> {
    let mut sink = StderrSink;

    if json {
        let Some(statements) = rox::parse_source(source, &mut sink) else {
            return Ok(Status::CompileError);
        };

        let errors: Vec<LoxError> = Resolver::new().resolve(&statements);
        let status: Status = if errors.is_empty() {
            Status::Ok
        } else {
            Status::CompileError
        };

        for error in errors {
            sink.report(error);
        }

        let dump: String =
            serde_json::to_string_pretty(&statements).context("Failed to serialize AST")?;
        println!("{}", dump);

        return Ok(status);
    }

    let Some(tokens) = rox::scan(source, &mut sink) else {
        return Ok(Status::CompileError);
    };

    match Parser::new(&tokens).parse_expression() {
        Ok(expr) => {
            let ast_str: String = AstPrinter.print(&expr);
            debug!("AST: {}", ast_str);
            println!("{}", ast_str);
            Ok(Status::Ok)
        }

        Err(e) => {
            sink.report(e);
            Ok(Status::CompileError)
        }
    }
}

fn evaluate(source: &str) -> Status {
    let mut sink = StderrSink;

    let Some(tokens) = rox::scan(source, &mut sink) else {
        return Status::CompileError;
    };

    let expr = match Parser::new(&tokens).parse_expression() {
        Ok(expr) => expr,
        Err(e) => {
            sink.report(e);
            return Status::CompileError;
        }
    };

    let errors: Vec<LoxError> = Resolver::new().resolve_expression(&expr);
    if !errors.is_empty() {
        for error in errors {
            sink.report(error);
        }
        return Status::CompileError;
    }

    let mut interpreter = Interpreter::new();

    match interpreter.evaluate(&expr) {
        Ok(value) => {
            debug!("Evaluated to: {}", value);
            println!("{}", value);
            Status::Ok
        }

        Err(e) => {
            sink.report(LoxError::Runtime(e));
            Status::RuntimeError
        }
    }
}

fn repl() -> Result<()> {
    info!("Starting REPL");

    let mut interpreter = Interpreter::new();
    let mut sink = StderrSink;
    let stdin = io::stdin();

    print!("> ");
    io::stdout().flush()?;

    for line in stdin.lock().lines() {
        let line: String = line.context("Failed to read from stdin")?;

        if let Some(statements) = rox::parse_source(&line, &mut sink) {
            let echo: bool = matches!(statements.last(), Some(Stmt::Expression(_)));
            let status: Status = interpreter.interpret(&statements, &mut sink);

            if status == Status::Ok && echo {
                println!("{}", interpreter.last_value());
            }
        }

        print!("> ");
        io::stdout().flush()?;
    }

    println!();
    info!("REPL finished");

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let status: Status = match args.commands {
        Commands::Tokenize { filename } => {
            info!("Running Tokenize subcommand");
            tokenize(&read_file(filename)?)
        }

        Commands::Parse { filename, json } => {
            info!("Running Parse subcommand");
            parse(&read_file(filename)?, json)?
        }

        Commands::Evaluate { filename } => {
            info!("Running Evaluate subcommand");
            evaluate(&read_file(filename)?)
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");
            let source: String = read_file(filename)?;
            let mut interpreter = Interpreter::new();
            rox::run_source(&mut interpreter, &source, &mut StderrSink)
        }

        Commands::Repl => {
            repl()?;
            Status::Ok
        }
    };

    if status != Status::Ok {
        exit_with(status);
    }

    Ok(())
}
