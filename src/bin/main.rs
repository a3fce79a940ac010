use std::{error::Error, fs, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use log::LevelFilter;
use nalthon::{
    codegen::{decode_hex, disasm},
    lexer, parser,
    util::tree,
    Limits, Options,
};

#[derive(Debug, Parser)]
#[command(name = "nalthon", version, about = "Compiles Nalthon contracts to EVM bytecode")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,

    /// Log what each stage produced.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Largest accepted source file, in bytes.
    #[arg(long, global = true, default_value_t = Limits::default().max_source_len)]
    max_source_len: usize,

    /// Deepest accepted nesting of blocks and expressions.
    #[arg(long, global = true, default_value_t = Limits::default().max_depth)]
    max_depth: usize,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile every contract and print the ABI and bytecode as JSON.
    Compile {
        file: PathBuf,

        /// Also print a disassembly of each runtime bytecode.
        #[arg(long)]
        asm: bool,
    },
    /// Print the token stream.
    Tokens { file: PathBuf },
    /// Print the syntax tree as JSON.
    Ast {
        file: PathBuf,

        /// Print an indented outline instead of JSON.
        #[arg(long)]
        tree: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if let Err(error) = simple_logger::SimpleLogger::new()
        .with_level(level)
        .env()
        .init()
    {
        eprintln!("failed to set up logging: {error}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let options = Options {
        limits: Limits {
            max_source_len: cli.max_source_len,
            max_depth: cli.max_depth,
        },
    };

    match &cli.cmd {
        Command::Compile { file, asm } => {
            let src = read_source(file)?;
            let contracts = nalthon::compile_with(&src, &options)?;
            println!("{}", serde_json::to_string_pretty(&contracts)?);

            if *asm {
                for contract in &contracts {
                    let code = decode_hex(&contract.runtime_bytecode)
                        .ok_or("generated bytecode is not valid hex")?;
                    println!("\n{} (runtime):", contract.contract_name);
                    print!("{}", disasm::listing(&code));
                }
            }
        }
        Command::Tokens { file } => {
            let src = read_source(file)?;
            let tokens = lexer::lex_in_new(&src).map_err(nalthon::Error::from)?;
            for token in &tokens {
                let kind = format!("{:?}", token.kind);
                println!("{:>9} {kind:<14} {}", token.pos.to_string(), token.text(&src));
            }
        }
        Command::Ast { file, tree: as_tree } => {
            let src = read_source(file)?;
            let program = parser::parse_program(&src, &mut Vec::new(), &options.limits)?;
            if *as_tree {
                print!("{}", tree::print_program_string(&program));
            } else {
                println!("{}", serde_json::to_string_pretty(&program)?);
            }
        }
    }
    Ok(())
}

fn read_source(file: &PathBuf) -> Result<String, Box<dyn Error>> {
    fs::read_to_string(file).map_err(|error| format!("{}: {error}", file.display()).into())
}
