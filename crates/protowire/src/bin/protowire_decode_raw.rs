//! `protowire-decode-raw` - dump a serialized message (stdin) without a schema.
//!
//! Usage:
//!   protowire-decode-raw [--base64] [--indent N]

use std::io::{self, Read, Write};

use protowire::debug::{decode_raw, RawDumpOptions};
use protowire::ByteSource;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut base64 = false;
    let mut options = RawDumpOptions::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--base64" => base64 = true,
            "--indent" => {
                i += 1;
                match args.get(i).map(|n| n.parse::<usize>()) {
                    Some(Ok(n)) => options.indent = n,
                    _ => {
                        eprintln!("--indent expects a number");
                        std::process::exit(2);
                    }
                }
            }
            other => {
                eprintln!("Unknown argument: {other}");
                std::process::exit(2);
            }
        }
        i += 1;
    }

    let mut buf = Vec::new();
    if let Err(e) = io::stdin().read_to_end(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    let text;
    let source = if base64 {
        text = String::from_utf8_lossy(&buf).into_owned();
        ByteSource::Base64(text.trim())
    } else {
        ByteSource::Vec(buf)
    };
    let bytes = match source.into_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    match decode_raw(&bytes, &options) {
        Ok(dump) => {
            if let Err(e) = io::stdout().write_all(dump.as_bytes()) {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Failed to parse input: {e}");
            std::process::exit(1);
        }
    }
}
