use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// Location of a callable inside a nested namespace tree.
///
/// Always holds at least one segment. Serialized as a JSON array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct MethodPath(Vec<String>);

impl MethodPath {
    /// Build a path from its segments.
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(ProtocolError::EmptyMethodPath);
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Path extended by one more segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Path made of a single segment.
    pub fn root(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl TryFrom<Vec<String>> for MethodPath {
    type Error = ProtocolError;

    fn try_from(segments: Vec<String>) -> Result<Self> {
        Self::new(segments)
    }
}

impl From<MethodPath> for Vec<String> {
    fn from(path: MethodPath) -> Self {
        path.0
    }
}

impl FromStr for MethodPath {
    type Err = ProtocolError;

    /// Parse the dotted form, e.g. `"namespace.echo"`.
    fn from_str(dotted: &str) -> Result<Self> {
        if dotted.is_empty() {
            return Err(ProtocolError::EmptyMethodPath);
        }
        Self::new(dotted.split('.'))
    }
}

impl<const N: usize> TryFrom<[&str; N]> for MethodPath {
    type Error = ProtocolError;

    fn try_from(segments: [&str; N]) -> Result<Self> {
        Self::new(segments)
    }
}

impl TryFrom<&str> for MethodPath {
    type Error = ProtocolError;

    fn try_from(dotted: &str) -> Result<Self> {
        dotted.parse()
    }
}

/// Anything a caller can name a method with.
pub trait IntoMethodPath {
    fn into_method_path(self) -> Result<MethodPath>;
}

impl IntoMethodPath for MethodPath {
    fn into_method_path(self) -> Result<MethodPath> {
        Ok(self)
    }
}

impl IntoMethodPath for &MethodPath {
    fn into_method_path(self) -> Result<MethodPath> {
        Ok(self.clone())
    }
}

impl IntoMethodPath for &str {
    fn into_method_path(self) -> Result<MethodPath> {
        self.parse()
    }
}

impl IntoMethodPath for String {
    fn into_method_path(self) -> Result<MethodPath> {
        self.parse()
    }
}

impl IntoMethodPath for Vec<String> {
    fn into_method_path(self) -> Result<MethodPath> {
        MethodPath::new(self)
    }
}

impl<const N: usize> IntoMethodPath for [&str; N] {
    fn into_method_path(self) -> Result<MethodPath> {
        MethodPath::new(self)
    }
}

impl fmt::Display for MethodPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_form() {
        let path: MethodPath = "namespace.echo".parse().unwrap();
        assert_eq!(path.segments(), ["namespace", "echo"]);
        assert_eq!(path.to_string(), "namespace.echo");
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn rejects_empty_paths() {
        assert!(matches!(
            MethodPath::new(Vec::<String>::new()),
            Err(ProtocolError::EmptyMethodPath)
        ));
        assert!(matches!(
            "".parse::<MethodPath>(),
            Err(ProtocolError::EmptyMethodPath)
        ));
    }

    #[test]
    fn serializes_as_array() {
        let path = MethodPath::try_from(["a", "b"]).unwrap();
        assert_eq!(serde_json::to_string(&path).unwrap(), r#"["a","b"]"#);

        let back: MethodPath = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn deserializing_empty_array_fails() {
        assert!(serde_json::from_str::<MethodPath>("[]").is_err());
    }

    #[test]
    fn into_method_path_accepts_common_forms() {
        let expected = MethodPath::try_from(["ns", "echo"]).unwrap();
        assert_eq!("ns.echo".into_method_path().unwrap(), expected);
        assert_eq!(["ns", "echo"].into_method_path().unwrap(), expected);
        assert_eq!((&expected).into_method_path().unwrap(), expected);
        assert!(String::new().into_method_path().is_err());
    }

    #[test]
    fn child_extends_path() {
        let path = MethodPath::root("ns").child("echo");
        assert_eq!(path.segments(), ["ns", "echo"]);
    }
}
