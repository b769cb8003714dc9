use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::{env, process};

use anyhow::Context;
use jack::{driver, Options};
use log::{error, LevelFilter};

static USAGE: &str = r#"
usage: jackc [--indent N] [--stdout] PATH...

Compiles each .jack file, or every .jack file directly inside a directory,
into a .vm file next to it.

options:
    --indent N    spaces in front of instructions inside a function (default 4)
    --stdout      write instructions to stdout instead of .vm files
"#;

struct Args {
    options: Options,
    stdout: bool,
    paths: Vec<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Args> {
    let mut parsed = Args {
        options: Options::default(),
        stdout: false,
        paths: Vec::new(),
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--indent" => parsed.options.indent = args.next()?.parse().ok()?,
            "--stdout" => parsed.stdout = true,
            flag if flag.starts_with("--") => return None,
            _ => parsed.paths.push(PathBuf::from(arg)),
        }
    }
    if parsed.paths.is_empty() {
        return None;
    }
    Some(parsed)
}

/// Compiles one unit. With `--stdout` the unit reaches `out` only once it
/// compiled cleanly.
fn run_file(path: &Path, args: &Args, out: &mut impl Write) -> anyhow::Result<()> {
    if args.stdout {
        let code = driver::compile_to_vec(path, &args.options)
            .with_context(|| path.display().to_string())?;
        out.write_all(&code)?;
        out.flush()?;
    } else {
        driver::compile_file(path, &args.options).with_context(|| path.display().to_string())?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .env()
        .init()?;

    let args = match parse_args(env::args().skip(1)) {
        Some(args) => args,
        None => {
            println!("{USAGE}");
            // FreeBSD EX_USAGE (64)
            process::exit(64)
        }
    };

    let mut stdout = io::stdout().lock();
    let mut failed = 0;
    for path in &args.paths {
        let sources = match driver::find_sources(path) {
            Ok(sources) => sources,
            Err(err) => {
                error!("{}: {}", path.display(), err);
                failed += 1;
                continue;
            }
        };
        for source in sources {
            if let Err(err) = run_file(&source, &args, &mut stdout) {
                error!("{:#}", err);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        error!("{} unit(s) failed", failed);
        process::exit(1);
    }
    Ok(())
}
