//! Ecosystem tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::FixforwardError;

/// A language/toolchain family with its own test command and output dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ecosystem {
    /// pytest in verbose, long-traceback mode.
    Python,
    /// `npm test` driving Jest or Mocha.
    Node,
    /// `cargo test`.
    Rust,
}

impl Ecosystem {
    pub const ALL: [Ecosystem; 3] = [Ecosystem::Python, Ecosystem::Node, Ecosystem::Rust];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Node => "node",
            Self::Rust => "rust",
        }
    }

    /// Command template the external runner uses for this ecosystem.
    pub fn test_command(self) -> &'static [&'static str] {
        match self {
            Self::Python => &["python3", "-m", "pytest", "--tb=long", "-v"],
            Self::Node => &["npm", "test", "--"],
            Self::Rust => &["cargo", "test"],
        }
    }

    /// Human-readable runner label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Python => "Python / pytest",
            Self::Node => "Node.js / npm test",
            Self::Rust => "Rust / cargo test",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ecosystem {
    type Err = FixforwardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "pytest" | "py" => Ok(Self::Python),
            "node" | "npm" | "js" | "jest" | "mocha" => Ok(Self::Node),
            "rust" | "cargo" | "rs" => Ok(Self::Rust),
            other => Err(FixforwardError::UnknownEcosystem(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("python".parse::<Ecosystem>().unwrap(), Ecosystem::Python);
        assert_eq!("NPM".parse::<Ecosystem>().unwrap(), Ecosystem::Node);
        assert_eq!(" cargo ".parse::<Ecosystem>().unwrap(), Ecosystem::Rust);
        assert!("cobol".parse::<Ecosystem>().is_err());
    }

    #[test]
    fn test_display_matches_as_str() {
        for eco in Ecosystem::ALL {
            assert_eq!(eco.to_string(), eco.as_str());
            assert_eq!(eco.as_str().parse::<Ecosystem>().unwrap(), eco);
        }
    }

    #[test]
    fn test_commands() {
        assert_eq!(Ecosystem::Rust.test_command(), &["cargo", "test"]);
        assert!(Ecosystem::Python.test_command().contains(&"--tb=long"));
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&Ecosystem::Node).expect("serialize");
        assert_eq!(json, "\"node\"");
    }
}
