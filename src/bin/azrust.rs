use std::env;
use std::path::Path;
use std::process::ExitCode;

use azrust::helper::{code_to_image_and_save, print_code};
use azrust::{AztecCode, Charset, EncodeError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "usage: azrust STRING_TO_ENCODE [IMAGE_FILE]
  Generate a 2D Aztec barcode and print it, or save it to a PNG file.";

/// Enable with `RUST_LOG=azrust=debug`.
fn init_tracing() {
    if env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

// Text outside ISO 8859-1 falls back to UTF-8 with an ECI escape.
fn encode(text: &str) -> Result<AztecCode, EncodeError> {
    match AztecCode::encode_text(text, None, None, None) {
        Err(EncodeError::UnencodableCharacter { .. }) => {
            AztecCode::encode_text(text, None, None, Some(Charset::Utf8))
        }
        result => result,
    }
}

fn main() -> ExitCode {
    init_tracing();
    let args: Vec<String> = env::args().collect();
    if !(2..=3).contains(&args.len()) {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    }

    let code = match encode(&args[1]) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::FAILURE;
        }
    };
    println!(
        "Aztec Code info: {0}x{0}{1}",
        code.size(),
        if code.is_compact() { " (compact)" } else { "" }
    );

    match args.get(2) {
        Some(file) => {
            let path = Path::new(file);
            let directory = path
                .parent()
                .and_then(|p| p.to_str())
                .filter(|p| !p.is_empty())
                .unwrap_or(".");
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                eprintln!("error: invalid image file name {:?}", file);
                return ExitCode::FAILURE;
            };
            match code_to_image_and_save(&code, Some(5), None, Some(directory), Some(stem)) {
                Ok(saved) => println!("Saved {}", saved.display()),
                Err(err) => {
                    eprintln!("error: {}", err);
                    return ExitCode::FAILURE;
                }
            }
        }
        None => print_code(&code, 2),
    }
    ExitCode::SUCCESS
}
