//! Xray-core JSON configs.
//!
//! Parsing reads the first `vless` outbound. Serializing produces a complete
//! client config: one local SOCKS5 inbound, the VLESS outbound, and minimal
//! log and routing sections.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::{
    Inbound, LogConfig, Outbound, RoutingConfig, SecuritySettings, Server, SocksSettings,
    StreamSettings, User, VlessSettings, XrayConfig,
};
use crate::error::{ConvertError, Result};
use crate::model::{ConnectionModel, Network, Security, non_empty};

pub const SOCKS_LISTEN: &str = "127.0.0.1";
pub const SOCKS_PORT: u16 = 10808;

const PROTOCOL: &str = "vless";

fn missing(path: &str) -> ConvertError {
    ConvertError::MalformedConfig(format!("missing required key '{}'", path))
}

fn protocol_of(outbound: &Value) -> Option<&str> {
    outbound.get("protocol").and_then(Value::as_str)
}

fn strip_brackets(address: String) -> String {
    match address
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        Some(inner) => inner.to_string(),
        None => address,
    }
}

pub fn parse(text: &str) -> Result<ConnectionModel> {
    let root: Value = serde_json::from_str(text)?;
    from_value(&root)
}

pub fn from_value(root: &Value) -> Result<ConnectionModel> {
    let outbounds = root
        .get("outbounds")
        .and_then(Value::as_array)
        .ok_or_else(|| missing("outbounds"))?;

    let index = outbounds
        .iter()
        .position(|o| protocol_of(o) == Some(PROTOCOL))
        .ok_or_else(|| {
            let found: Vec<&str> = outbounds.iter().filter_map(protocol_of).collect();
            ConvertError::MalformedConfig(format!(
                "no outbound with protocol '{}' (found: {})",
                PROTOCOL,
                if found.is_empty() {
                    "none".to_string()
                } else {
                    found.join(", ")
                }
            ))
        })?;

    let base = format!("outbounds[{}]", index);
    let outbound = Outbound::deserialize(&outbounds[index])
        .map_err(|e| ConvertError::MalformedConfig(format!("{}: {}", base, e)))?;

    let settings = outbound
        .settings
        .ok_or_else(|| missing(&format!("{}.settings", base)))?;
    let server = settings
        .vnext
        .ok_or_else(|| missing(&format!("{}.settings.vnext", base)))?
        .into_iter()
        .next()
        .ok_or_else(|| missing(&format!("{}.settings.vnext[0]", base)))?;

    let server_path = format!("{}.settings.vnext[0]", base);
    let address = non_empty(server.address.map(strip_brackets))
        .ok_or_else(|| missing(&format!("{}.address", server_path)))?;
    let port = server
        .port
        .ok_or_else(|| missing(&format!("{}.port", server_path)))?;
    let port = u16::try_from(port).map_err(|_| {
        ConvertError::Validation(format!("port {} is outside 1-65535", port))
    })?;

    let user = server
        .users
        .ok_or_else(|| missing(&format!("{}.users", server_path)))?
        .into_iter()
        .next()
        .ok_or_else(|| missing(&format!("{}.users[0]", server_path)))?;
    let id = non_empty(user.id).ok_or_else(|| missing(&format!("{}.users[0].id", server_path)))?;

    let mut stream = outbound.stream_settings.unwrap_or_default();
    let security = match non_empty(stream.security) {
        Some(value) => Security::parse(&value.to_ascii_lowercase())?,
        None => Security::None,
    };
    let network = non_empty(stream.network)
        .map(|value| Network::parse(&value))
        .unwrap_or_default();

    let details = match security {
        Security::Reality => stream.reality_settings,
        // Configs that only carry realitySettings still name the TLS server there
        Security::Tls => stream.tls_settings.or_else(|| {
            stream.reality_settings.map(|r| SecuritySettings {
                server_name: r.server_name,
                fingerprint: r.fingerprint,
                ..Default::default()
            })
        }),
        Security::None => None,
    }
    .unwrap_or_default();

    let transport_key = network.settings_key();
    let transport = match stream.other.remove(&transport_key) {
        Some(Value::Object(map)) => Some(map),
        Some(Value::Null) | None => None,
        Some(_) => {
            return Err(ConvertError::MalformedConfig(format!(
                "{}.streamSettings.{} must be an object",
                base, transport_key
            )));
        }
    };

    let model = ConnectionModel {
        id,
        address,
        port,
        flow: non_empty(user.flow),
        security,
        network,
        server_name: non_empty(details.server_name),
        fingerprint: non_empty(details.fingerprint),
        public_key: non_empty(details.public_key),
        short_id: non_empty(details.short_id),
        spider_x: non_empty(details.spider_x),
        remark: None,
        transport,
    };

    model.normalized()
}

pub fn to_config(model: &ConnectionModel) -> Result<XrayConfig> {
    let model = &model.clone().normalized()?;

    let details = SecuritySettings {
        server_name: model.server_name.clone(),
        fingerprint: model.fingerprint.clone(),
        public_key: model.public_key.clone(),
        short_id: model.short_id.clone(),
        spider_x: model.spider_x.clone(),
    };
    let (reality_settings, tls_settings) = match model.security {
        Security::Reality => (Some(details), None),
        Security::Tls => (
            None,
            Some(SecuritySettings {
                server_name: details.server_name,
                fingerprint: details.fingerprint,
                ..Default::default()
            }),
        ),
        Security::None => (None, None),
    };

    let mut other = Map::new();
    if let Some(transport) = &model.transport {
        other.insert(
            model.network.settings_key(),
            Value::Object(transport.clone()),
        );
    }

    let outbound = Outbound {
        tag: Some("proxy".to_string()),
        protocol: PROTOCOL.to_string(),
        settings: Some(VlessSettings {
            vnext: Some(vec![Server {
                address: Some(model.address.clone()),
                port: Some(u64::from(model.port)),
                users: Some(vec![User {
                    id: Some(model.id.clone()),
                    encryption: Some("none".to_string()),
                    flow: model.flow.clone(),
                }]),
            }]),
        }),
        stream_settings: Some(StreamSettings {
            network: Some(model.network.to_string()),
            security: Some(model.security.to_string()),
            reality_settings,
            tls_settings,
            other,
        }),
    };

    Ok(XrayConfig {
        log: LogConfig {
            loglevel: "error".to_string(),
        },
        inbounds: vec![Inbound {
            tag: "socks-in".to_string(),
            listen: SOCKS_LISTEN.to_string(),
            port: SOCKS_PORT,
            protocol: "socks".to_string(),
            settings: SocksSettings {
                auth: "noauth".to_string(),
                udp: true,
            },
        }],
        outbounds: vec![outbound],
        routing: RoutingConfig {
            domain_strategy: "AsIs".to_string(),
        },
    })
}

pub fn to_value(model: &ConnectionModel) -> Result<Value> {
    Ok(serde_json::to_value(to_config(model)?)?)
}

pub fn to_json(model: &ConnectionModel, pretty: bool) -> Result<String> {
    let config = to_config(model)?;
    let content = if pretty {
        serde_json::to_string_pretty(&config)?
    } else {
        serde_json::to_string(&config)?
    };
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::vless;
    use serde_json::json;

    fn reality_model() -> ConnectionModel {
        vless::parse("vless://uuid@host:443?security=reality&sni=www.google.com&fp=chrome&pbk=KEY&sid=ID&type=tcp")
            .unwrap()
    }

    #[test]
    fn test_url_to_config_matches_fields() {
        let value = to_value(&reality_model()).unwrap();
        let outbound = &value["outbounds"][0];
        assert_eq!(outbound["protocol"], "vless");
        assert_eq!(outbound["settings"]["vnext"][0]["address"], "host");
        assert_eq!(outbound["settings"]["vnext"][0]["port"], 443);
        assert_eq!(outbound["settings"]["vnext"][0]["users"][0]["id"], "uuid");
        let stream = &outbound["streamSettings"];
        assert_eq!(stream["security"], "reality");
        assert_eq!(stream["network"], "tcp");
        assert_eq!(stream["realitySettings"]["serverName"], "www.google.com");
        assert_eq!(stream["realitySettings"]["fingerprint"], "chrome");
        assert_eq!(stream["realitySettings"]["publicKey"], "KEY");
        assert_eq!(stream["realitySettings"]["shortId"], "ID");
        assert!(stream.get("tlsSettings").is_none());
    }

    #[test]
    fn test_fixed_socks_inbound() {
        let value = to_value(&reality_model()).unwrap();
        let inbounds = value["inbounds"].as_array().unwrap();
        assert_eq!(inbounds.len(), 1);
        assert_eq!(inbounds[0]["port"], 10808);
        assert_eq!(inbounds[0]["listen"], "127.0.0.1");
        assert_eq!(inbounds[0]["protocol"], "socks");
        assert_eq!(value["outbounds"].as_array().unwrap().len(), 1);
        assert_eq!(value["log"]["loglevel"], "error");
        assert!(value["routing"].is_object());
    }

    #[test]
    fn test_absent_fields_are_not_emitted() {
        let mut model = reality_model();
        model.short_id = None;
        let value = to_value(&model).unwrap();
        let reality = value["outbounds"][0]["streamSettings"]["realitySettings"]
            .as_object()
            .unwrap();
        assert!(!reality.contains_key("shortId"));
        assert!(!reality.contains_key("spiderX"));
        let user = value["outbounds"][0]["settings"]["vnext"][0]["users"][0]
            .as_object()
            .unwrap();
        assert!(!user.contains_key("flow"));
        assert!(!to_json(&model, false).unwrap().contains("null"));
    }

    #[test]
    fn test_config_round_trip() {
        let model = reality_model();
        let back = parse(&to_json(&model, true).unwrap()).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_tls_settings_only_carry_tls_fields() {
        let model =
            vless::parse("vless://1111@example.com:443?security=tls&sni=cdn.example.com&fp=safari")
                .unwrap();
        let value = to_value(&model).unwrap();
        let stream = &value["outbounds"][0]["streamSettings"];
        assert!(stream.get("realitySettings").is_none());
        assert_eq!(stream["tlsSettings"]["serverName"], "cdn.example.com");
        assert_eq!(stream["tlsSettings"]["fingerprint"], "safari");
        assert_eq!(parse(&value.to_string()).unwrap(), model);
    }

    #[test]
    fn test_transport_settings_pass_through() {
        let config = json!({
            "outbounds": [
                { "protocol": "freedom", "tag": "direct" },
                {
                    "protocol": "vless",
                    "settings": { "vnext": [ {
                        "address": "example.com",
                        "port": 443,
                        "users": [ { "id": "1111", "encryption": "none" } ]
                    } ] },
                    "streamSettings": {
                        "network": "ws",
                        "security": "none",
                        "wsSettings": { "path": "/ray", "headers": { "Host": "example.com" } },
                        "sockopt": { "mark": 255 }
                    }
                }
            ]
        });
        let model = from_value(&config).unwrap();
        assert_eq!(model.network, Network::Ws);
        let transport = model.transport.as_ref().unwrap();
        assert_eq!(transport["path"], "/ray");

        let value = to_value(&model).unwrap();
        assert_eq!(
            value["outbounds"][0]["streamSettings"]["wsSettings"]["headers"]["Host"],
            "example.com"
        );
        assert!(value["outbounds"][0]["streamSettings"].get("sockopt").is_none());
        assert_eq!(from_value(&value).unwrap(), model);
    }

    #[test]
    fn test_empty_strings_and_unused_reality_block_are_ignored() {
        let config = json!({
            "outbounds": [ {
                "protocol": "vless",
                "settings": { "vnext": [ {
                    "address": "example.com",
                    "port": 8443,
                    "users": [ { "id": "1111", "encryption": "none", "flow": "" } ]
                } ] },
                "streamSettings": {
                    "network": "tcp",
                    "security": "none",
                    "realitySettings": {
                        "serverName": "", "fingerprint": "", "publicKey": "",
                        "shortId": "", "spiderX": ""
                    }
                }
            } ]
        });
        let model = from_value(&config).unwrap();
        assert_eq!(model.flow, None);
        assert_eq!(model.security, Security::None);
        assert_eq!(model.public_key, None);
        assert_eq!(model.fingerprint, None);
    }

    #[test]
    fn test_missing_stream_settings_defaults() {
        let config = json!({
            "outbounds": [ {
                "protocol": "vless",
                "settings": { "vnext": [ {
                    "address": "example.com", "port": 443, "users": [ { "id": "1111" } ]
                } ] }
            } ]
        });
        let model = from_value(&config).unwrap();
        assert_eq!(model.security, Security::None);
        assert_eq!(model.network, Network::Tcp);
    }

    #[test]
    fn test_missing_vnext_names_path() {
        let config = json!({ "outbounds": [ { "protocol": "vless", "settings": {} } ] });
        let err = from_value(&config).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedConfig(_)));
        assert!(err.to_string().contains("vnext"));
    }

    #[test]
    fn test_missing_users_names_path() {
        let config = json!({ "outbounds": [ { "protocol": "vless", "settings": {
            "vnext": [ { "address": "example.com", "port": 443 } ]
        } } ] });
        let err = from_value(&config).unwrap_err();
        assert!(err.to_string().contains("users"));
    }

    #[test]
    fn test_missing_id_names_path() {
        let config = json!({ "outbounds": [ { "protocol": "vless", "settings": {
            "vnext": [ { "address": "example.com", "port": 443, "users": [ { "flow": "" } ] } ]
        } } ] });
        let err = from_value(&config).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedConfig(_)));
        assert!(err.to_string().contains("users[0].id"));
    }

    #[test]
    fn test_missing_outbounds() {
        let err = parse(r#"{"inbounds": []}"#).unwrap_err();
        assert!(err.to_string().contains("outbounds"));
    }

    #[test]
    fn test_wrong_protocol_is_malformed() {
        let err = parse(r#"{"outbounds": [ { "protocol": "vmess" } ]}"#).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedConfig(_)));
        assert!(err.to_string().contains("vmess"));
    }

    #[test]
    fn test_invalid_json_is_decode_error() {
        assert!(matches!(
            parse("{ not json"),
            Err(ConvertError::JsonDecode(_))
        ));
    }

    #[test]
    fn test_out_of_range_port_fails_validation() {
        let config = json!({ "outbounds": [ { "protocol": "vless", "settings": {
            "vnext": [ { "address": "example.com", "port": 70000, "users": [ { "id": "1" } ] } ]
        } } ] });
        assert!(matches!(
            from_value(&config),
            Err(ConvertError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_and_out_of_mode_fields_are_not_emitted() {
        let mut model = reality_model();
        model.flow = Some(String::new());
        model.fingerprint = Some(String::new());
        let value = to_value(&model).unwrap();
        let user = value["outbounds"][0]["settings"]["vnext"][0]["users"][0]
            .as_object()
            .unwrap();
        assert!(!user.contains_key("flow"));
        let reality = value["outbounds"][0]["streamSettings"]["realitySettings"]
            .as_object()
            .unwrap();
        assert!(!reality.contains_key("fingerprint"));

        let mut plain = vless::parse("vless://1111@example.com:443").unwrap();
        plain.public_key = Some("K".to_string());
        plain.short_id = Some("ab".to_string());
        let json = to_json(&plain, false).unwrap();
        assert!(!json.contains("realitySettings"));
        assert!(!json.contains("publicKey"));
        assert!(!json.contains("shortId"));
        assert_eq!(parse(&json).unwrap(), plain.normalized().unwrap());
    }

    #[test]
    fn test_tls_falls_back_to_reality_settings_block() {
        // Layout written by the reference converter for a security=tls link
        let config = json!({
            "inbounds": [ {
                "listen": "127.0.0.1", "port": 10808, "protocol": "socks",
                "settings": { "udp": true }
            } ],
            "log": { "loglevel": "error" },
            "outbounds": [ {
                "protocol": "vless",
                "settings": { "vnext": [ {
                    "address": "example.com",
                    "port": 443,
                    "users": [ { "id": "1111", "encryption": "none", "flow": "" } ]
                } ] },
                "streamSettings": {
                    "network": "ws",
                    "security": "tls",
                    "realitySettings": {
                        "serverName": "cdn.example.com", "fingerprint": "chrome",
                        "publicKey": "", "shortId": "", "spiderX": ""
                    }
                }
            } ]
        });
        let model = from_value(&config).unwrap();
        assert_eq!(model.security, Security::Tls);
        assert_eq!(model.server_name.as_deref(), Some("cdn.example.com"));
        assert_eq!(model.fingerprint.as_deref(), Some("chrome"));
        assert_eq!(model.public_key, None);

        let value = to_value(&model).unwrap();
        let stream = &value["outbounds"][0]["streamSettings"];
        assert_eq!(stream["tlsSettings"]["serverName"], "cdn.example.com");
        assert!(stream.get("realitySettings").is_none());
    }

    #[test]
    fn test_tls_settings_win_over_reality_settings() {
        let config = json!({ "outbounds": [ {
            "protocol": "vless",
            "settings": { "vnext": [ {
                "address": "example.com", "port": 443, "users": [ { "id": "1111" } ]
            } ] },
            "streamSettings": {
                "security": "tls",
                "tlsSettings": { "serverName": "tls.example.com" },
                "realitySettings": { "serverName": "reality.example.com" }
            }
        } ] });
        let model = from_value(&config).unwrap();
        assert_eq!(model.server_name.as_deref(), Some("tls.example.com"));
    }

    #[test]
    fn test_bracketed_ipv6_address_matches_url_form() {
        let config = json!({ "outbounds": [ {
            "protocol": "vless",
            "settings": { "vnext": [ {
                "address": "[2001:db8::1]", "port": 443, "users": [ { "id": "1111" } ]
            } ] }
        } ] });
        let from_json = from_value(&config).unwrap();
        assert_eq!(from_json.address, "2001:db8::1");
        let from_url = vless::parse("vless://1111@[2001:db8::1]:443").unwrap();
        assert_eq!(from_json.address, from_url.address);
    }

    #[test]
    fn test_reality_without_public_key_cannot_serialize() {
        let mut model = reality_model();
        model.public_key = None;
        assert!(matches!(
            to_config(&model),
            Err(ConvertError::Validation(_))
        ));
    }
}
