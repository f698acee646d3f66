use asm80::{
    config::{Config, SOFT_LIMIT},
    error::Error,
    source::{check_extension, preprocess, SourceLine},
    util::print_dump,
};
use color_print::cprintln;
use std::{
    fs::File,
    io::{self, Write},
    process::ExitCode,
};
use tracing::Level;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input file (.s, .as or .asm)
    input: Option<String>,

    /// Output file
    #[clap(short, long, default_value = "a.out")]
    output: String,

    /// Dump listing and symbol table
    #[clap(short, long)]
    dump: bool,

    /// Entry point written to the image header, unless `end` names one
    #[clap(short, long, default_value = "0", value_parser = parse_address)]
    entry: u16,

    /// Code and data budget in bytes before a warning is issued
    #[clap(long, default_value_t = SOFT_LIMIT)]
    soft_limit: usize,

    /// One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`
    #[clap(short, long, default_value_t = Level::WARN)]
    log_level: Level,
}

/// `256`, `100h` or `0x100`.
fn parse_address(s: &str) -> Result<u16, String> {
    let lower = s.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        u16::from_str_radix(hex, 16)
    } else if let Some(hex) = lower.strip_suffix('h') {
        u16::from_str_radix(hex, 16)
    } else {
        lower.parse::<u16>()
    };
    parsed.map_err(|e| format!("invalid address `{s}`: {e}"))
}

fn main() -> ExitCode {
    use clap::Parser;

    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .init();

    println!("8080 Assembler");

    let path = args.input.clone().unwrap_or_default();
    let lines = match read_source(&args) {
        Ok(lines) => lines,
        Err(err) => {
            err.print_diag(&path, &[]);
            return ExitCode::FAILURE;
        }
    };

    match run(&args, &path, &lines) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            err.print_diag(&path, &lines);
            ExitCode::FAILURE
        }
    }
}

fn read_source(args: &Args) -> Result<Vec<SourceLine>, Error> {
    let path = args.input.as_deref().ok_or(Error::NoSourceFile)?;
    check_extension(path)?;

    println!("1. Read Source");
    println!("  < {}", path);
    let src = std::fs::read_to_string(path).map_err(|e| Error::FileOpen(path.to_string(), e))?;
    Ok(preprocess(&src))
}

fn run(args: &Args, path: &str, lines: &[SourceLine]) -> Result<(), Error> {
    let config = Config::default()
        .with_soft_limit(args.soft_limit)
        .with_entry(args.entry);

    println!("2. Resolve Symbols & Generate Binary");
    let assembly = asm80::assemble(lines, &config)?;
    println!(
        "  - {} records, {} symbols, {} bytes",
        assembly.records.len(),
        assembly.symbols.user_symbols().count(),
        assembly.bytes_written
    );
    for (label, err) in &assembly.resolution.unresolved {
        cprintln!("<yellow,bold>warn</>: `{}` is never resolved: {}", label, err);
    }
    for warning in &assembly.warnings {
        warning.print();
    }

    if args.dump {
        print_dump(path, lines, &assembly.listing, &assembly.symbols);
    }

    println!("3. Output Binary");
    println!("  > {}", &args.output);
    let mut file =
        File::create(&args.output).map_err(|e| Error::FileCreate(args.output.clone(), e))?;
    file.write_all(&assembly.image.to_bytes())
        .map_err(|e| Error::FileWrite(args.output.clone(), e))?;
    println!(
        "  - entry {:04X}h, size {} bytes",
        assembly.image.entry(),
        assembly.image.size()
    );
    Ok(())
}
