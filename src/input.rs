use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use vlesslinker::InputKind;
use vlesslinker::codec::{vless, vpn};

/// Raw input text together with its classification.
#[derive(Debug)]
pub struct Loaded {
    pub kind: InputKind,
    pub text: String,
}

/// Sniffs the kind from the text itself. Anything that is not a known link
/// is handed to the JSON parser, which reports why it is not a config.
pub fn classify(text: &str) -> InputKind {
    let trimmed = text.trim_start();
    if trimmed.starts_with(vless::SCHEME) {
        InputKind::VlessUrl
    } else if trimmed.starts_with(vpn::SCHEME) {
        InputKind::VpnUrl
    } else {
        InputKind::Json
    }
}

fn is_json_path(src: &str) -> bool {
    src.to_lowercase().ends_with(".json") && Path::new(src).is_file()
}

/// Resolves the user's input: `-` reads stdin, an existing `*.json` path
/// is read from disk, anything else is taken as pasted text.
pub fn load(src: &str) -> Result<Loaded> {
    let src = src.trim();

    if src == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(Loaded {
            kind: classify(&text),
            text,
        });
    }

    if is_json_path(src) {
        let text =
            fs::read_to_string(src).with_context(|| format!("Failed to read file: {:?}", src))?;
        return Ok(Loaded {
            kind: InputKind::Json,
            text,
        });
    }

    Ok(Loaded {
        kind: classify(src),
        text: src.to_string(),
    })
}
