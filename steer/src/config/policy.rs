use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Reserved target name meaning "no proxy".
pub const DIRECT: &str = "direct";

macro_rules! lenient_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $lit:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $lit),+
                }
            }

            /// Unrecognized values fall back to the first variant.
            pub fn parse(s: &str) -> Self {
                s.parse().unwrap_or(Self::ALL[0])
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ALL[0]
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($lit => Ok($name::$variant),)+
                    _ => Err(()),
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

lenient_enum!(
    /// How the external stack routes traffic.
    ProxyMode {
        Direct => "direct",
        AutoDetect => "auto_detect",
        PacScript => "pac_script",
        FixedServers => "fixed_servers",
        System => "system",
        Unmanaged => "unmanaged",
    }
);

lenient_enum!(ProxyScheme {
    Http => "http",
    Https => "https",
    Socks4 => "socks4",
    Socks5 => "socks5",
});

lenient_enum!(RuleType {
    Shexp => "shexp",
    Regex => "regex",
    Exact => "exact",
});

lenient_enum!(RuleSubject {
    Url => "url",
    Host => "host",
});

impl ProxyScheme {
    pub fn default_port(&self) -> u16 {
        match self {
            ProxyScheme::Http => 80,
            ProxyScheme::Https => 443,
            ProxyScheme::Socks4 | ProxyScheme::Socks5 => 1080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProxyServer {
    pub scheme: ProxyScheme,
    pub host: String,
    /// 0 selects the scheme's well-known port.
    pub port: i64,
}

impl ProxyServer {
    pub fn new<S: Into<String>>(scheme: ProxyScheme, host: S, port: i64) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
        }
    }

    pub fn effective_port(&self) -> i64 {
        if self.port != 0 {
            self.port
        } else {
            self.scheme.default_port() as i64
        }
    }

    /// Servers are compared by scheme, host and effective port, so an omitted
    /// port equals the scheme's explicit well-known port.
    pub fn is_equivalent(&self, other: &ProxyServer) -> bool {
        self.scheme == other.scheme
            && self.host == other.host
            && self.effective_port() == other.effective_port()
    }
}

impl Display for ProxyServer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.effective_port())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProxyConfig {
    pub name: String,
    pub badge_text: String,
    pub server: ProxyServer,
}

impl ProxyConfig {
    pub fn new<S: Into<String>>(name: S, server: ProxyServer) -> Self {
        Self {
            name: name.into(),
            badge_text: String::new(),
            server,
        }
    }

    pub fn with_badge<S: Into<String>>(mut self, badge_text: S) -> Self {
        self.badge_text = badge_text.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub rule_type: RuleType,
    pub subject: RuleSubject,
    pub pattern: String,
    pub proxy_name: String,
}

impl Rule {
    pub fn new<P: Into<String>, N: Into<String>>(
        rule_type: RuleType,
        subject: RuleSubject,
        pattern: P,
        proxy_name: N,
    ) -> Self {
        Self {
            rule_type,
            subject,
            pattern: pattern.into(),
            proxy_name: proxy_name.into(),
        }
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::new(RuleType::Shexp, RuleSubject::Url, "", DIRECT)
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.rule_type, self.subject, self.pattern, self.proxy_name
        )
    }
}

/// The declared proxy policy. Values handed to the controller are never
/// mutated; edits go through [`crate::config::Staging`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub mode: ProxyMode,
    /// Only meaningful when `mode` is [`ProxyMode::FixedServers`].
    pub fixed_proxy_name: Option<String>,
    pub proxies: Vec<ProxyConfig>,
    pub auto_default: String,
    pub auto_rules: Vec<Rule>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            mode: ProxyMode::Direct,
            fixed_proxy_name: None,
            proxies: vec![],
            auto_default: DIRECT.to_string(),
            auto_rules: vec![],
        }
    }
}

impl Policy {
    /// First proxy with this name, by position.
    pub fn proxy_by_name(&self, name: &str) -> Option<&ProxyConfig> {
        self.proxies.iter().find(|p| p.name == name)
    }

    /// Whether `name` is `"direct"` or a configured proxy.
    pub fn resolves(&self, name: &str) -> bool {
        name == DIRECT || self.proxy_by_name(name).is_some()
    }

    pub fn fixed_proxy(&self) -> Option<&ProxyConfig> {
        self.fixed_proxy_name
            .as_deref()
            .and_then(|name| self.proxy_by_name(name))
    }

    /// Switch mode; the fixed selection is kept only for fixed-server mode.
    pub fn set_mode(&mut self, mode: ProxyMode, fixed_proxy_name: Option<&str>) {
        self.mode = mode;
        self.fixed_proxy_name = match mode {
            ProxyMode::FixedServers => fixed_proxy_name
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            _ => None,
        };
    }
}
