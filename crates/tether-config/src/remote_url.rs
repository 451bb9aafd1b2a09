//! Remote instance URLs
//!
//! A remote URL has the shape `scheme://[user[:password]@]host[:port][?routing]`.
//! Credentials embedded in the URL are kept for the driver but never printed:
//! both `Display` and `Debug` render the scrubbed form `scheme://user@host:port`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{ConfigError, ConfigResult};

/// URL scheme understood by the wire-protocol driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Direct connection, no encryption
    Bolt,
    /// Direct connection, TLS with CA-signed certificates
    BoltSecure,
    /// Direct connection, TLS accepting self-signed certificates
    BoltSelfSigned,
    /// Routed connection, no encryption
    Neo4j,
    /// Routed connection, TLS with CA-signed certificates
    Neo4jSecure,
    /// Routed connection, TLS accepting self-signed certificates
    Neo4jSelfSigned,
}

impl Scheme {
    /// Scheme as written in a URL
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bolt => "bolt",
            Self::BoltSecure => "bolt+s",
            Self::BoltSelfSigned => "bolt+ssc",
            Self::Neo4j => "neo4j",
            Self::Neo4jSecure => "neo4j+s",
            Self::Neo4jSelfSigned => "neo4j+ssc",
        }
    }

    /// Whether the scheme itself mandates an encrypted connection
    pub fn is_encrypted(&self) -> bool {
        !matches!(self, Self::Bolt | Self::Neo4j)
    }

    /// Whether the scheme asks the driver for cluster routing
    pub fn is_routing(&self) -> bool {
        matches!(self, Self::Neo4j | Self::Neo4jSecure | Self::Neo4jSelfSigned)
    }
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bolt" => Ok(Self::Bolt),
            "bolt+s" => Ok(Self::BoltSecure),
            "bolt+ssc" => Ok(Self::BoltSelfSigned),
            "neo4j" => Ok(Self::Neo4j),
            "neo4j+s" => Ok(Self::Neo4jSecure),
            "neo4j+ssc" => Ok(Self::Neo4jSelfSigned),
            other => Err(format!("unsupported scheme '{}'", other)),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed remote instance URL
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    scheme: Scheme,
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<String>,
    routing_context: BTreeMap<String, String>,
}

impl RemoteUrl {
    /// Port used when the URL does not name one
    pub const DEFAULT_PORT: u16 = 7687;

    /// Parse a remote URL
    pub fn parse(input: &str) -> ConfigResult<Self> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            input: scrub(input),
            reason,
        };

        let url = Url::parse(input.trim()).map_err(|e| invalid(e.to_string()))?;
        let scheme = url.scheme().parse::<Scheme>().map_err(invalid)?;

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host".to_string()))?
            .to_string();

        let username = match url.username() {
            "" => None,
            raw => Some(decode(raw).map_err(invalid)?),
        };
        let password = match url.password() {
            Some(raw) => Some(decode(raw).map_err(invalid)?),
            None => None,
        };

        let routing_context: BTreeMap<String, String> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if !routing_context.is_empty() && !scheme.is_routing() {
            return Err(invalid(format!(
                "routing context is not allowed with the '{}' scheme",
                scheme
            )));
        }

        Ok(Self {
            scheme,
            host,
            port: url.port().unwrap_or(Self::DEFAULT_PORT),
            username,
            password,
            routing_context,
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Password embedded in the URL, if any. Hand it to the driver, never to a log.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Routing context taken from the query string (routed schemes only)
    pub fn routing_context(&self) -> &BTreeMap<String, String> {
        &self.routing_context
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL with the password removed, safe for logs and error messages
    pub fn scrubbed(&self) -> String {
        match &self.username {
            Some(user) => format!("{}://{}@{}", self.scheme, user, self.address()),
            None => format!("{}://{}", self.scheme, self.address()),
        }
    }
}

impl FromStr for RemoteUrl {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.scrubbed())
    }
}

impl fmt::Debug for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteUrl")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("routing_context", &self.routing_context)
            .finish()
    }
}

fn decode(raw: &str) -> Result<String, String> {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .map_err(|e| format!("credentials are not valid UTF-8: {}", e))
}

/// Remove the password from a URL-like string without parsing it.
///
/// Used for inputs that failed to parse, so error messages can still quote them.
pub fn scrub(input: &str) -> String {
    let Some(scheme_end) = input.find("://") else {
        return input.to_string();
    };
    let rest = &input[scheme_end + 3..];
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_end];

    match authority.rfind('@') {
        Some(at) => {
            let user = authority[..at].split(':').next().unwrap_or("");
            format!(
                "{}://{}@{}{}",
                &input[..scheme_end],
                user,
                &authority[at + 1..],
                &rest[authority_end..]
            )
        }
        None => input.to_string(),
    }
}
