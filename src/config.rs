use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct XrayConfig {
    pub log: LogConfig,
    pub inbounds: Vec<Inbound>,
    pub outbounds: Vec<Outbound>,
    pub routing: RoutingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogConfig {
    pub loglevel: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Inbound {
    pub tag: String,
    pub listen: String,
    pub port: u16,
    pub protocol: String,
    pub settings: SocksSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SocksSettings {
    pub auth: String,
    pub udp: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoutingConfig {
    #[serde(rename = "domainStrategy")]
    pub domain_strategy: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Outbound {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default)]
    pub protocol: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<VlessSettings>,

    #[serde(
        rename = "streamSettings",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub stream_settings: Option<StreamSettings>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VlessSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnext: Option<Vec<Server>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Server {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    // Wide enough to report out-of-range ports instead of failing to decode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StreamSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,

    #[serde(
        rename = "realitySettings",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reality_settings: Option<SecuritySettings>,

    #[serde(
        rename = "tlsSettings",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tls_settings: Option<SecuritySettings>,

    // Transport objects (wsSettings, grpcSettings, ...) and anything else
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SecuritySettings {
    #[serde(rename = "serverName", default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    #[serde(rename = "publicKey", default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    #[serde(rename = "shortId", default, skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,

    #[serde(rename = "spiderX", default, skip_serializing_if = "Option::is_none")]
    pub spider_x: Option<String>,
}
