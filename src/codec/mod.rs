pub mod vless;
pub mod vpn;
pub mod xray;

use std::fmt;

use crate::error::Result;
use crate::model::ConnectionModel;

/// Input classification, decided once by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    VlessUrl,
    VpnUrl,
    Json,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputKind::VlessUrl => "vless:// URL",
            InputKind::VpnUrl => "vpn:// URL",
            InputKind::Json => "JSON config",
        })
    }
}

/// Output representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Vless,
    Json,
}

pub fn parse(kind: InputKind, text: &str) -> Result<ConnectionModel> {
    match kind {
        InputKind::VlessUrl => vless::parse(text),
        InputKind::VpnUrl => vpn::parse(text),
        InputKind::Json => xray::parse(text),
    }
}

/// Renders the model; JSON is pretty-printed unless `compact` is set.
pub fn render(model: &ConnectionModel, target: Target, compact: bool) -> Result<String> {
    match target {
        Target::Vless => vless::to_link(model),
        Target::Json => xray::to_json(model, !compact),
    }
}
