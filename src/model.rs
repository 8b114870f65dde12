use serde_json::{Map, Value};
use std::fmt;

use crate::error::{ConvertError, Result};

/// Transport security layered over the VLESS stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    Reality,
    Tls,
    #[default]
    None,
}

impl Security {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "reality" => Ok(Security::Reality),
            "tls" => Ok(Security::Tls),
            "none" => Ok(Security::None),
            other => Err(ConvertError::Validation(format!(
                "unsupported security '{}' (expected reality, tls or none)",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Security::Reality => "reality",
            Security::Tls => "tls",
            Security::None => "none",
        }
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stream network. Names we do not model are carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Network {
    #[default]
    Tcp,
    Ws,
    Grpc,
    Other(String),
}

impl Network {
    pub fn parse(value: &str) -> Self {
        match value {
            "tcp" => Network::Tcp,
            "ws" => Network::Ws,
            "grpc" => Network::Grpc,
            other => Network::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Network::Tcp => "tcp",
            Network::Ws => "ws",
            Network::Grpc => "grpc",
            Network::Other(name) => name,
        }
    }

    /// Key of the transport object inside Xray `streamSettings`.
    pub fn settings_key(&self) -> String {
        match self.as_str() {
            "h2" => "httpSettings".to_string(),
            name => format!("{}Settings", name),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical parameters of one VLESS connection.
///
/// Optional fields are `None` when absent and never hold an empty string,
/// so re-serializing a parsed model yields the same output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionModel {
    pub id: String,
    pub address: String,
    pub port: u16,
    pub flow: Option<String>,
    pub security: Security,
    pub network: Network,
    pub server_name: Option<String>,
    pub fingerprint: Option<String>,
    pub public_key: Option<String>,
    pub short_id: Option<String>,
    pub spider_x: Option<String>,
    /// Connection name. Only carried by the URL fragment.
    pub remark: Option<String>,
    /// Opaque `<network>Settings` object. Only carried by JSON configs.
    pub transport: Option<Map<String, Value>>,
}

impl ConnectionModel {
    /// Drops fields that do not apply to the chosen security mode, then
    /// validates. Every codec finishes construction through here.
    pub fn normalized(mut self) -> Result<Self> {
        for field in [
            &mut self.flow,
            &mut self.server_name,
            &mut self.fingerprint,
            &mut self.public_key,
            &mut self.short_id,
            &mut self.spider_x,
            &mut self.remark,
        ] {
            if field.as_deref().is_some_and(str::is_empty) {
                *field = None;
            }
        }
        if self.transport.as_ref().is_some_and(Map::is_empty) {
            self.transport = None;
        }

        if self.security != Security::Reality {
            self.public_key = None;
            self.short_id = None;
            self.spider_x = None;
        }
        if self.security == Security::None {
            self.server_name = None;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(ConvertError::Validation("user id is empty".to_string()));
        }
        if self.address.is_empty() {
            return Err(ConvertError::Validation(
                "server address is empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ConvertError::Validation(
                "port must be between 1 and 65535".to_string(),
            ));
        }
        if matches!(self.security, Security::Reality | Security::Tls)
            && self.server_name.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConvertError::Validation(format!(
                "security '{}' requires serverName (sni)",
                self.security
            )));
        }
        if self.security == Security::Reality
            && self.public_key.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConvertError::Validation(
                "security 'reality' requires publicKey (pbk)".to_string(),
            ));
        }
        Ok(())
    }

    /// Merges an interactively supplied name. An empty or missing name
    /// leaves the current remark in place.
    pub fn with_remark(mut self, remark: Option<String>) -> Self {
        if let Some(name) = remark.map(|r| r.trim().to_string())
            && !name.is_empty()
        {
            self.remark = Some(name);
        }
        self
    }
}

/// Treats empty strings as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
