use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::GeneratorError;

/// Output style of a generated script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    /// Standalone script with a `run` entry point.
    #[serde(alias = "generic")]
    Script,
    /// Test function receiving the framework's `playwright` object.
    Playwright,
    /// Test function driven by a `page` fixture, with a viewport fixture block.
    Pytest,
}

impl Flavor {
    pub const ALL: [Flavor; 3] = [Flavor::Script, Flavor::Playwright, Flavor::Pytest];

    pub fn as_str(&self) -> &'static str {
        match self {
            Flavor::Script => "script",
            Flavor::Playwright => "playwright",
            Flavor::Pytest => "pytest",
        }
    }

    /// Name of the file a generated script is saved under.
    pub fn file_name(&self) -> &'static str {
        match self {
            Flavor::Script => "test_script.py",
            Flavor::Playwright => "playwright_test.py",
            Flavor::Pytest => "pytest_test.py",
        }
    }

    /// Test flavors check the page URL every third step.
    pub fn asserts(&self) -> bool {
        !matches!(self, Flavor::Script)
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flavor {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "script" | "generic" => Ok(Flavor::Script),
            "playwright" => Ok(Flavor::Playwright),
            "pytest" => Ok(Flavor::Pytest),
            _ => Err(GeneratorError::UnsupportedFlavor(s.to_string())),
        }
    }
}
