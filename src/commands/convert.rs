use anyhow::{Context, Result};
use colored::*;
use vlesslinker::codec::{self, vpn};
use vlesslinker::{ConnectionModel, InputKind, Target};

use crate::input::{self, Loaded};

/// Output format used when the caller did not pick one.
pub fn default_target(kind: InputKind) -> Target {
    match kind {
        InputKind::VlessUrl => Target::Json,
        InputKind::VpnUrl | InputKind::Json => Target::Vless,
    }
}

pub fn parse_model(loaded: &Loaded, verbose: bool) -> Result<ConnectionModel> {
    if verbose {
        eprintln!("{} Detected input: {}", "[INFO]".green(), loaded.kind);
    }

    if loaded.kind == InputKind::VpnUrl {
        let decoded = vpn::decode(&loaded.text).context("Failed to decode vpn:// link")?;
        if verbose {
            let framing = if decoded.compressed {
                "zlib-compressed"
            } else {
                "plain"
            };
            let carried = match decoded.embedded {
                vpn::Embedded::VlessUrl(_) => "a vless:// link",
                vpn::Embedded::XrayConfig(_) => "an Xray config",
            };
            eprintln!(
                "{} vpn:// payload is {} and carries {}",
                "[INFO]".green(),
                framing,
                carried
            );
        }
        return vpn::parse_decoded(&decoded).context("Failed to parse embedded payload");
    }

    codec::parse(loaded.kind, &loaded.text)
        .with_context(|| format!("Failed to parse {}", loaded.kind))
}

pub fn run(
    src: String,
    to: Option<Target>,
    remark: Option<String>,
    compact: bool,
    verbose: bool,
) -> Result<()> {
    let loaded = input::load(&src)?;
    let model = parse_model(&loaded, verbose)?;
    let target = to.unwrap_or_else(|| default_target(loaded.kind));

    let model = match target {
        Target::Vless => model.with_remark(remark),
        Target::Json => {
            if remark.is_some() {
                eprintln!(
                    "{} --remark is only used for vless:// output; ignoring.",
                    "[WARN]".yellow()
                );
            }
            model
        }
    };

    let output = codec::render(&model, target, compact).context("Failed to render output")?;
    println!("{}", output);

    Ok(())
}
