//! Obfuscated `vpn://` links.
//!
//! The body is base64 (either alphabet, padding optional). The decoded bytes
//! are either the Amnezia framing (4-byte big-endian length + zlib stream), a
//! bare zlib stream, or plain text. The text carries a `vless://` link or,
//! for Amnezia exports, a JSON envelope holding an Xray config.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use flate2::read::ZlibDecoder;
use serde_json::Value;
use std::io::Read;

use crate::codec::{vless, xray};
use crate::error::{ConvertError, Result};
use crate::model::ConnectionModel;

pub const SCHEME: &str = "vpn://";

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Outcome of the decompression pass. Failing to inflate is not an error;
/// the bytes are then taken as they are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Compressed(Vec<u8>),
    Plain(Vec<u8>),
}

impl Payload {
    pub fn is_compressed(&self) -> bool {
        matches!(self, Payload::Compressed(_))
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Payload::Compressed(bytes) | Payload::Plain(bytes) => bytes,
        }
    }
}

/// What the payload turned out to carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Embedded {
    VlessUrl(String),
    XrayConfig(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub compressed: bool,
    pub embedded: Embedded,
}

pub fn decode_base64(body: &str) -> Result<Vec<u8>> {
    let body: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    match URL_SAFE_LENIENT.decode(&body) {
        Ok(bytes) => Ok(bytes),
        Err(url_safe_err) => STANDARD_LENIENT
            .decode(&body)
            .map_err(|_| ConvertError::Base64Decode(url_safe_err)),
    }
}

/// Upper bound on inflated output. Anything larger is not treated as a
/// compressed payload.
pub const MAX_PAYLOAD: usize = 4 * 1024 * 1024;

fn zlib_inflate(data: &[u8], limit: usize) -> Option<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data).take(limit as u64 + 1);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).ok()?;
    if out.len() > limit {
        return None;
    }
    Some(out)
}

pub fn decompress(data: Vec<u8>) -> Payload {
    if data.len() >= 4 {
        let expected = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if expected <= MAX_PAYLOAD
            && let Some(out) = zlib_inflate(&data[4..], expected)
            && out.len() == expected
        {
            return Payload::Compressed(out);
        }
    }
    match zlib_inflate(&data, MAX_PAYLOAD) {
        Some(out) => Payload::Compressed(out),
        None => Payload::Plain(data),
    }
}

fn find_vless_url(text: &str) -> Option<String> {
    let start = text.find(vless::SCHEME)?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '`'))
        .unwrap_or(rest.len());
    Some(rest[..end].to_string())
}

/// Pulls the Xray config out of an Amnezia envelope, or accepts the JSON
/// as a config when it already has outbounds.
fn find_xray_config(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    if let Some(last) = value
        .pointer("/containers/0/xray/last_config")
        .and_then(Value::as_str)
    {
        return Some(last.to_string());
    }
    value.get("outbounds").map(|_| text.to_string())
}

pub fn decode(link: &str) -> Result<Decoded> {
    let body = link
        .trim()
        .strip_prefix(SCHEME)
        .ok_or_else(|| ConvertError::MalformedUrl(format!("link must start with '{}'", SCHEME)))?;

    let payload = decompress(decode_base64(body)?);
    let compressed = payload.is_compressed();
    let text = String::from_utf8(payload.into_bytes()).map_err(|_| {
        ConvertError::MalformedUrl("vpn:// payload is not UTF-8 text".to_string())
    })?;

    let embedded = if let Some(url) = find_vless_url(&text) {
        Embedded::VlessUrl(url)
    } else if let Some(config) = find_xray_config(&text) {
        Embedded::XrayConfig(config)
    } else {
        return Err(ConvertError::MalformedUrl(
            "no vless:// link found in vpn:// payload".to_string(),
        ));
    };

    Ok(Decoded {
        compressed,
        embedded,
    })
}

pub fn parse(link: &str) -> Result<ConnectionModel> {
    parse_decoded(&decode(link)?)
}

pub fn parse_decoded(decoded: &Decoded) -> Result<ConnectionModel> {
    match &decoded.embedded {
        Embedded::VlessUrl(url) => vless::parse(url),
        Embedded::XrayConfig(config) => xray::parse(config),
    }
}
