//! Host targets

/// Default SSH port
pub const DEFAULT_PORT: u16 = 22;

/// Connection target for one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Host address (name or IP), without any user prefix
    pub address: String,
    /// Port (default 22)
    pub port: u16,
    /// Remote username
    pub user: String,
}

impl Target {
    /// Create new target on the default port
    pub fn new(address: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: DEFAULT_PORT,
            user: user.into(),
        }
    }

    /// Parse a host entry, falling back to `default_user`
    ///
    /// `alice@web1` selects user `alice` on `web1`. Only the first two
    /// `@`-separated fields are used, so `a@b@c` targets `b` as `a`.
    #[must_use]
    pub fn parse(host: &str, default_user: &str) -> Self {
        if host.contains('@') {
            let mut fields = host.split('@');
            let user = fields.next().unwrap_or_default();
            let address = fields.next().unwrap_or_default();
            Self::new(address, user)
        } else {
            Self::new(host, default_user)
        }
    }

    /// Set custom port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.address, self.port)
    }
}
