use std::io::{Read, Write};

#[macro_use]
mod utils {
    macro_rules! fatal {
        ($err:expr) => {
            return Err($err)
        };
    }

    macro_rules! fatal_expected {
        ($scanner:expr, $($arg:tt)*) => {{
            let scanner = &$scanner;
            fatal!($crate::error::Error::UnexpectedToken {
                pos: scanner.pos(),
                expected: format!($($arg)*),
                found: $crate::token::describe(scanner.current()),
            })
        }};
    }
}

pub mod compiler;
pub mod driver;
pub mod error;
pub mod scanner;
pub mod symbols;
pub mod token;
pub mod vm;

pub use error::{Error, ErrorClass, Pos, Result};

#[derive(Clone, Debug)]
pub struct Options {
    /// Spaces in front of each instruction inside a function body.
    pub indent: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self { indent: 4 }
    }
}

/// Compiles the single class read from `input` and returns `output` once
/// every instruction has been written to it.
pub fn compile<R: Read, W: Write>(input: R, output: W, options: &Options) -> Result<W> {
    compiler::Compiler::new(input, output, options)?.compile_class()
}

pub fn compile_str(source: &str, options: &Options) -> Result<String> {
    let out = compile(source.as_bytes(), Vec::new(), options)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}
