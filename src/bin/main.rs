//! rustbnf CLI tool
//!
//! Compile BNF grammars, generate Rust source from them, or parse input with
//! the compiled grammar. A literal grammar or input must be preceded by an
//! exclamation point (!), anything else is read as a file name.

use clap::{Args, Parser, Subcommand};
use rustbnf::{BnfCompiler, CodegenOptions, CompilerOptions, GapWhitespace, Scanner};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "rustbnf")]
#[command(about = "Compile BNF grammars into parsers or Rust source")]
struct Cli {
    /// Log more (-v for debug, -vv for trace); RUST_LOG is used otherwise
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GrammarArgs {
    /// The grammar (literal or file name), in BNF notation
    grammar: String,

    /// Rule the grammar starts from
    #[arg(short, long)]
    start: String,

    /// Plain BNF: no grouping, repetition, optional terms or built-in rules
    #[arg(long)]
    basic: bool,

    /// Token between a rule name and its body
    #[arg(long, default_value = "::=")]
    separator: String,

    /// Terms written apart may also match with no whitespace between them
    #[arg(long)]
    loose_gap: bool,
}

impl GrammarArgs {
    fn compiler(&self) -> BnfCompiler {
        let gap = if self.loose_gap {
            GapWhitespace::Optional
        } else {
            GapWhitespace::Required
        };
        let options = CompilerOptions::new()
            .with_enhanced(!self.basic)
            .with_rule_separator(&self.separator)
            .with_gap(gap);
        BnfCompiler::with_options(options)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Compile a grammar and print its rules
    Check {
        #[command(flatten)]
        grammar: GrammarArgs,
    },
    /// Generate Rust source that rebuilds the grammar
    Generate {
        #[command(flatten)]
        grammar: GrammarArgs,

        /// Name of the generated struct
        #[arg(long, default_value = "GeneratedGrammar")]
        class_name: String,

        /// Crate the generated code imports from
        #[arg(long, default_value = "rustbnf")]
        crate_path: String,

        /// Write to this file instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse input with a grammar and print the match tree
    Parse {
        #[command(flatten)]
        grammar: GrammarArgs,

        /// The input (literal or file name)
        input: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| log::LevelFilter::from_str(&level).ok())
            .unwrap_or(log::LevelFilter::Warn),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    // a logger may already be set; diagnostics are best effort
    let _ = simplelog::TermLogger::init(
        level,
        simplelog::ConfigBuilder::new()
            .set_time_format_custom(&[])
            .build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    );
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Check { grammar } => {
            let text = read_arg(&grammar.grammar)?;
            let mut compiler = grammar.compiler();
            let compiled = compiler.compile(&text, &grammar.start)?;

            print!("{}", compiled.to_bnf());
            let undefined: Vec<_> = compiler
                .rules()
                .undefined()
                .map(|rule| format!("<{}>", rule.name))
                .collect();
            if !undefined.is_empty() {
                eprintln!("Undefined rules: {}", undefined.join(", "));
            }
        }
        Command::Generate {
            grammar,
            class_name,
            crate_path,
            output,
        } => {
            let text = read_arg(&grammar.grammar)?;
            let options = CodegenOptions::default()
                .with_class_name(&class_name)
                .with_crate_path(&crate_path);
            let source = grammar
                .compiler()
                .generate_with(&text, &grammar.start, options)?;

            match output {
                Some(path) => {
                    fs::write(&path, source)
                        .map_err(|e| format!("Error writing {}: {}", path.display(), e))?;
                    log::info!("wrote {}", path.display());
                }
                None => print!("{}", source),
            }
        }
        Command::Parse { grammar, input } => {
            let text = read_arg(&grammar.grammar)?;
            let input = read_arg(&input)?;
            let compiled = grammar.compiler().compile(&text, &grammar.start)?;

            let tree = compiled
                .parse(&input)
                .map_err(|e| e.format_with_context(&input))?;
            print!("{}", tree.to_tree_string(&Scanner::new(&input)));
        }
    }
    Ok(())
}

fn read_arg(arg: &str) -> Result<String, String> {
    match arg.strip_prefix('!') {
        // Literal (preceded by !)
        Some(literal) => Ok(literal.to_string()),
        None => fs::read_to_string(arg).map_err(|e| format!("Error reading {}: {}", arg, e)),
    }
}
