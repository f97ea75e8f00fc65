use std::str::FromStr;

use rpcprims_protocol::{Result, Version};

/// Settings stamped onto every outgoing envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Caret range the server's version must satisfy.
    pub expected_version: Option<Version>,
    /// Routing hint passed through to the server and back.
    pub channel: Option<String>,
}

impl ClientConfig {
    /// Require servers compatible with `version`, given as `x.y.z` or `^x.y.z`.
    pub fn with_expected_version(mut self, version: &str) -> Result<Self> {
        self.expected_version = Some(Version::from_str(version)?);
        Ok(self)
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Expected version in wire form.
    pub(crate) fn expected_version_tag(&self) -> Option<String> {
        self.expected_version.as_ref().map(ToString::to_string)
    }
}
