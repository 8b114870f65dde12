//! vlesslinker - translate VLESS connection parameters between
//! `vless://` links, Xray JSON configs and obfuscated `vpn://` links.
//!
//! ```text
//! vless://  ──┐                      ┌──> vless://
//! vpn://    ──┼──> ConnectionModel ──┤
//! JSON      ──┘                      └──> JSON
//! ```
//!
//! All conversions are pure in-memory functions; reading files and talking
//! to the terminal is left to the binary.

pub mod codec;
pub mod config;
pub mod error;
pub mod model;

pub use codec::{InputKind, Target, parse, render};
pub use error::{ConvertError, Result};
pub use model::{ConnectionModel, Network, Security};
