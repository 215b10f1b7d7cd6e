pub mod detect;
pub mod engines;
pub mod installed;
pub mod version;

use miette::{IntoDiagnostic, Result};
use nodepm_core::version::SCHEMA_VERSION;
use nodepm_core::{Config, LockfileSet, Manifest};
use serde::Serialize;
use std::io::Write;

/// Exit code for any command failure.
pub const EXIT_FAILURE: i32 = 2;

/// Project inputs read once per command.
pub struct Project {
    pub manifest: Manifest,
    pub lockfiles: LockfileSet,
}

impl Project {
    pub fn load(config: &Config) -> Result<Self, nodepm_core::Error> {
        Ok(Self {
            manifest: Manifest::read_dir(&config.cwd)?,
            lockfiles: LockfileSet::read_dir(&config.cwd)?,
        })
    }
}

#[derive(Serialize)]
struct ErrorOutput<'a> {
    schema_version: u32,
    ok: bool,
    error: ErrorInfo<'a>,
}

#[derive(Serialize)]
struct ErrorInfo<'a> {
    code: &'a str,
    message: String,
}

/// Report a core error and exit.
///
/// In JSON mode the error goes to stdout as an object with a stable `code`.
pub fn fail(err: &nodepm_core::Error, json: bool) -> ! {
    if json {
        let out = ErrorOutput {
            schema_version: SCHEMA_VERSION,
            ok: false,
            error: ErrorInfo {
                code: err.code(),
                message: err.to_string(),
            },
        };
        if let Ok(text) = serde_json::to_string_pretty(&out) {
            println!("{text}");
        }
    } else {
        eprintln!("error: {err}");
    }
    std::process::exit(EXIT_FAILURE);
}

pub fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

fn w(out: &mut impl Write, s: &str) -> Result<()> {
    out.write_all(s.as_bytes()).into_diagnostic()
}
