//! Locating source files and compiling them one unit per file.
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::{compile, Options, Result};

pub const SOURCE_EXT: &str = "jack";
pub const OUTPUT_EXT: &str = "vm";

pub fn is_source(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == SOURCE_EXT)
}

/// Expands `path` into the source files it names: the file itself, or every
/// source file directly inside a directory, sorted by name.
pub fn find_sources(path: &Path) -> io::Result<Vec<PathBuf>> {
    if path.is_dir() {
        let mut files = Vec::new();
        for entry in fs::read_dir(path)? {
            let file = entry?.path();
            if file.is_file() && is_source(&file) {
                files.push(file);
            }
        }
        files.sort();
        debug!("{}: {} source file(s)", path.display(), files.len());
        Ok(files)
    } else if is_source(path) {
        Ok(vec![path.to_path_buf()])
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a .{} file or a directory", path.display(), SOURCE_EXT),
        ))
    }
}

pub fn output_path(path: &Path) -> PathBuf {
    path.with_extension(OUTPUT_EXT)
}

/// Compiles `path` into its `.vm` sibling and returns the output path.
///
/// When compilation fails the partially written output is removed.
pub fn compile_file(path: &Path, options: &Options) -> Result<PathBuf> {
    let out_path = output_path(path);
    let input = BufReader::new(File::open(path)?);
    let output = BufWriter::new(File::create(&out_path)?);

    match compile(input, output, options) {
        Ok(_) => {
            info!("{} -> {}", path.display(), out_path.display());
            Ok(out_path)
        }
        Err(err) => {
            // the writer is already dropped, so the file can go
            let _ = fs::remove_file(&out_path);
            Err(err)
        }
    }
}

/// Compiles `path` in memory. Nothing of a failed unit is returned, so the
/// caller can share one output stream between units.
pub fn compile_to_vec(path: &Path, options: &Options) -> Result<Vec<u8>> {
    let input = BufReader::new(File::open(path)?);
    let out = compile(input, Vec::new(), options)?;
    debug!("{}: {} byte(s) compiled", path.display(), out.len());
    Ok(out)
}
