use std::str::FromStr;

use rpcprims_protocol::{Result, Version};

/// Server behavior settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    /// Version advertised to clients. When unset, negotiation is skipped.
    pub version: Option<Version>,
}

impl ServerConfig {
    /// Config advertising `version`, validated as `<major>.<minor>.<patch>`.
    pub fn with_version(mut self, version: &str) -> Result<Self> {
        self.version = Some(Version::from_str(version)?);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use rpcprims_protocol::ProtocolError;

    use super::*;

    #[test]
    fn defaults_to_no_version() {
        assert_eq!(ServerConfig::default().version, None);
    }

    #[test]
    fn version_is_validated_when_configured() {
        let config = ServerConfig::default().with_version("1.2.3").unwrap();
        assert_eq!(config.version, Some(Version::new(1, 2, 3)));

        assert!(matches!(
            ServerConfig::default().with_version("one"),
            Err(ProtocolError::InvalidVersion { .. })
        ));
    }
}
