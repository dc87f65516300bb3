use crate::login::DEFAULT_EMAIL_DOMAIN;
use std::path::PathBuf;

/// Default address the web server listens on
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Runtime settings of the portal
#[derive(Debug, Clone, PartialEq)]
pub struct PortalConfig {
    /// Directory scanned for `.xlsx` files
    pub data_dir: PathBuf,

    /// Address the web server binds to
    pub bind_addr: String,

    /// Email suffix admitted by the login gate
    pub email_domain: String,
}

impl Default for PortalConfig {
    /// Serve the current directory on localhost:3000 for `@ey.com` addresses
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
        }
    }
}

impl PortalConfig {
    /// Build a configuration from positional command-line arguments
    ///
    /// `research-portal [data_dir] [bind_addr]`; anything missing keeps its default.
    /// The first element is the program name, as in `std::env::args()`.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut config = Self::default();

        if let Some(dir) = args.get(1) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(addr) = args.get(2) {
            config.bind_addr = addr.clone();
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_arguments() {
        assert_eq!(PortalConfig::from_args(["research-portal"]), PortalConfig::default());
    }

    #[test]
    fn positional_arguments() {
        let config = PortalConfig::from_args(["research-portal", "/srv/research", "0.0.0.0:8080"]);
        assert_eq!(config.data_dir, PathBuf::from("/srv/research"));
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.email_domain, "@ey.com");
    }
}
