use std::fmt;
use std::str::FromStr;

use crate::error::{ProtocolError, Result, VersionMismatch};

const MAX_VERSION_LEN: usize = 64;

/// A `<major>.<minor>.<patch>` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// True if `candidate` satisfies the caret range `^self`.
    ///
    /// The leftmost non-zero component is pinned: `^1.2.3` accepts
    /// `>=1.2.3 <2.0.0`, `^0.2.3` accepts `>=0.2.3 <0.3.0` and `^0.0.3`
    /// accepts only `0.0.3`.
    pub fn caret_matches(&self, candidate: &Version) -> bool {
        if candidate < self {
            return false;
        }
        if self.major > 0 {
            candidate.major == self.major
        } else if self.minor > 0 {
            candidate.major == 0 && candidate.minor == self.minor
        } else {
            candidate.major == 0 && candidate.minor == 0 && candidate.patch == self.patch
        }
    }
}

impl FromStr for Version {
    type Err = ProtocolError;

    /// Parse `x.y.z`, tolerating a leading `^`.
    fn from_str(version: &str) -> Result<Self> {
        let invalid = |reason: &str| ProtocolError::InvalidVersion {
            version: version.to_string(),
            reason: reason.to_string(),
        };

        if version.is_empty() || version.len() > MAX_VERSION_LEN {
            return Err(invalid("bad length"));
        }

        let bare = version.strip_prefix('^').unwrap_or(version);
        let mut parts = bare.split('.');
        let mut component = |label: &str| -> Result<u64> {
            let part = parts
                .next()
                .ok_or_else(|| invalid(&format!("missing {label}")))?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid(&format!("non-numeric {label}")));
            }
            part.parse::<u64>()
                .map_err(|_| invalid(&format!("{label} out of range")))
        };

        let major = component("major")?;
        let minor = component("minor")?;
        let patch = component("patch")?;

        if parts.next().is_some() {
            return Err(invalid("expected '<major>.<minor>.<patch>'"));
        }

        Ok(Self::new(major, minor, patch))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Check the client's expected version against the server's.
///
/// Skipped when either side declares no version. An expected version that
/// does not parse can never be satisfied.
pub fn negotiate(
    expected: Option<&str>,
    server: Option<&Version>,
) -> std::result::Result<(), VersionMismatch> {
    let (Some(expected), Some(server)) = (expected, server) else {
        return Ok(());
    };

    let compatible = expected
        .parse::<Version>()
        .map(|range| range.caret_matches(server))
        .unwrap_or(false);

    if compatible {
        Ok(())
    } else {
        Err(VersionMismatch::new(format!(
            "The expected version is ^{expected}, but the server version is {server}."
        )))
    }
}
