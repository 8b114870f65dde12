//! `vless://` share links.
//!
//! Format: `vless://<id>@<address>:<port>?<query>#<remark>`. Known query keys
//! are `flow`, `security`, `type`, `sni`, `fp`, `pbk`, `sid` and `spx`; all
//! other keys are ignored on input.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::collections::HashMap;
use url::{Host, Url, form_urlencoded};

use crate::error::{ConvertError, Result};
use crate::model::{ConnectionModel, Network, Security, non_empty};

pub const SCHEME: &str = "vless://";

const USERINFO: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`');

fn malformed(msg: impl Into<String>) -> ConvertError {
    ConvertError::MalformedUrl(msg.into())
}

fn decode_component(raw: &str, what: &str) -> Result<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| malformed(format!("{} is not valid UTF-8: {}", what, e)))
}

pub fn parse(link: &str) -> Result<ConnectionModel> {
    let link = link.trim();
    if !link.starts_with(SCHEME) {
        return Err(malformed(format!("link must start with '{}'", SCHEME)));
    }

    let url = Url::parse(link).map_err(|e| malformed(e.to_string()))?;

    if url.password().is_some() {
        return Err(malformed("user info must be a single id, found 'id:secret'"));
    }
    let id = decode_component(url.username(), "user id")?;
    if id.is_empty() {
        return Err(malformed("missing user id before '@'"));
    }

    let address = match url.host() {
        Some(Host::Ipv6(addr)) => addr.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Domain(domain)) => decode_component(domain, "server address")?,
        None => String::new(),
    };
    if address.is_empty() {
        return Err(malformed("missing server address"));
    }
    let port = url.port().ok_or_else(|| malformed("missing server port"))?;

    // First occurrence wins for repeated keys
    let mut params: HashMap<String, String> = HashMap::new();
    for (key, value) in url.query_pairs() {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    let mut take = |key: &str| non_empty(params.remove(key));

    let security = match take("security") {
        Some(value) => Security::parse(&value.to_ascii_lowercase())?,
        None => Security::None,
    };
    let network = take("type")
        .map(|value| Network::parse(&value))
        .unwrap_or_default();

    let remark = url
        .fragment()
        .map(|f| decode_component(f, "remark"))
        .transpose()?;

    let model = ConnectionModel {
        id,
        address,
        port,
        flow: take("flow"),
        security,
        network,
        server_name: take("sni"),
        fingerprint: take("fp"),
        public_key: take("pbk"),
        short_id: take("sid"),
        spider_x: take("spx"),
        remark,
        transport: None,
    };

    model.normalized()
}

/// Builds a share link. Query keys are always emitted in the same order and
/// only for fields that are present. A missing remark falls back to the
/// server address.
pub fn to_link(model: &ConnectionModel) -> Result<String> {
    let model = &model.clone().normalized()?;

    let host = if model.address.contains(':') && !model.address.starts_with('[') {
        format!("[{}]", model.address)
    } else {
        model.address.clone()
    };

    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("encryption", "none");
    if let Some(flow) = &model.flow {
        query.append_pair("flow", flow);
    }
    query.append_pair("security", model.security.as_str());
    for (key, value) in [
        ("sni", &model.server_name),
        ("fp", &model.fingerprint),
        ("pbk", &model.public_key),
        ("sid", &model.short_id),
        ("spx", &model.spider_x),
    ] {
        if let Some(value) = value {
            query.append_pair(key, value);
        }
    }
    query.append_pair("type", model.network.as_str());

    let remark = model.remark.as_deref().unwrap_or(&model.address);

    Ok(format!(
        "{}{}@{}:{}?{}#{}",
        SCHEME,
        utf8_percent_encode(&model.id, USERINFO),
        host,
        model.port,
        query.finish(),
        utf8_percent_encode(remark, FRAGMENT)
    ))
}
