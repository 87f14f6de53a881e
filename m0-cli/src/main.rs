use anyhow::{bail, Context, Result};
use clap::Parser;
use m0_compiler::{compile_program, parse_ir, AllocatorKind, CodegenOptions};
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix every input file must carry.
const INPUT_SUFFIX: &str = ".m0.ir";
const OUTPUT_SUFFIX: &str = ".s";

#[derive(Parser)]
#[command(name = "m0c")]
#[command(about = "Compile m0 intermediate code to i386 assembly")]
struct Args {
    /// Path to the IR file to compile (must end in .m0.ir)
    input: PathBuf,

    /// Write assembly here instead of next to the input
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Register allocation strategy
    /// Options: memory, next-use (default: next-use)
    #[arg(long, default_value = "next-use", value_parser = parse_allocator)]
    alloc: AllocatorKind,

    /// Print the parsed IR back to stdout before compiling
    #[arg(long)]
    emit_ir: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_allocator(name: &str) -> Result<AllocatorKind, String> {
    AllocatorKind::from_name(name)
        .ok_or_else(|| format!("unknown allocator '{name}' (expected memory or next-use)"))
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let derived = output_path(&args.input)?;
    let output = args.output.clone().unwrap_or(derived);

    let src = fs::read_to_string(&args.input)
        .with_context(|| format!("reading '{}'", args.input.display()))?;
    let program = parse_ir(&src).with_context(|| format!("in '{}'", args.input.display()))?;

    if args.emit_ir {
        for line in program.to_lines() {
            println!("{}", line);
        }
    }

    let asm = compile_program(&program, &CodegenOptions::with_allocator(args.alloc));

    fs::write(&output, asm).with_context(|| format!("writing '{}'", output.display()))?;
    log::info!("wrote {}", output.display());
    Ok(())
}

/// `dir/name.m0.ir` → `dir/name.s`.
fn output_path(input: &Path) -> Result<PathBuf> {
    let text = input.to_string_lossy();
    let Some(stem) = text.strip_suffix(INPUT_SUFFIX) else {
        bail!("input file '{}' must end in '{INPUT_SUFFIX}'", input.display());
    };
    if stem.is_empty() || stem.ends_with('/') {
        bail!("input file '{}' has no name before '{INPUT_SUFFIX}'", input.display());
    }
    Ok(PathBuf::from(format!("{stem}{OUTPUT_SUFFIX}")))
}
