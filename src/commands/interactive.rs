use anyhow::Result;
use colored::*;
use std::io::{self, BufRead, Write};
use vlesslinker::codec;
use vlesslinker::{InputKind, Target};

use crate::commands::convert;
use crate::input;

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "q"];

enum Flow {
    Continue,
    Quit,
}

/// Prints `question` to stderr and reads one line. `None` means EOF.
fn prompt<R: BufRead>(reader: &mut R, question: &str) -> Result<Option<String>> {
    eprint!("{}", question);
    io::stderr().flush()?;
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn choose_target<R: BufRead>(reader: &mut R) -> Result<Option<Target>> {
    eprintln!("\nChoose conversion type:");
    eprintln!("1. vpn:// to vless://");
    eprintln!("2. vpn:// to json");
    loop {
        match prompt(reader, "Enter choice (1 or 2): ")?.as_deref() {
            None => return Ok(None),
            Some("1") => return Ok(Some(Target::Vless)),
            Some("2") => return Ok(Some(Target::Json)),
            Some(_) => eprintln!("Invalid choice. Please enter 1 or 2."),
        }
    }
}

fn handle<R: BufRead, W: Write>(
    reader: &mut R,
    out: &mut W,
    src: &str,
    verbose: bool,
) -> Result<Flow> {
    let loaded = input::load(src)?;

    let target = if loaded.kind == InputKind::VpnUrl {
        match choose_target(reader)? {
            Some(target) => target,
            None => return Ok(Flow::Quit),
        }
    } else {
        convert::default_target(loaded.kind)
    };

    let mut model = convert::parse_model(&loaded, verbose)?;

    if target == Target::Vless {
        let default_name = model.remark.clone().unwrap_or_else(|| model.address.clone());
        let question = format!(
            "Enter VLESS name (leave empty to use '{}'): ",
            default_name
        );
        let name = prompt(reader, &question)?;
        model = model.with_remark(name);
    }

    let output = codec::render(&model, target, false)?;
    writeln!(out, "\n{}\n", "=".repeat(60))?;
    writeln!(out, "{}", output)?;
    out.flush()?;

    Ok(Flow::Continue)
}

pub fn run_with<R: BufRead, W: Write>(reader: &mut R, out: &mut W, verbose: bool) -> Result<()> {
    eprintln!(
        "{} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("VLess <-> Json Converter (with vpn:// support)");
    eprintln!("{}", "=".repeat(60));

    loop {
        eprintln!("\nEnter 'exit' or 'quit' (or press Ctrl+D) to close the program.");
        let Some(src) = prompt(reader, "Enter VLESS URL, VPN URL, JSON, or JSON file path: ")?
        else {
            eprintln!("\nGoodbye!");
            break;
        };

        if EXIT_WORDS.contains(&src.to_lowercase().as_str()) {
            eprintln!("Goodbye!");
            break;
        }
        if src.is_empty() {
            eprintln!("Empty input. Please try again.");
            continue;
        }

        match handle(reader, out, &src, verbose) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => {
                eprintln!("\nGoodbye!");
                break;
            }
            Err(e) => eprintln!("{} {:#}", "[ERROR]".red(), e),
        }
    }

    Ok(())
}

pub fn run(verbose: bool) -> Result<()> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut out = io::stdout();
    run_with(&mut reader, &mut out, verbose)
}
