use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MathJaxError, MathJaxResult};

pub const BUNDLE_FILE_SUFFIX: &str = ".bundle.rhai";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Chtml,
    Mml,
    Svg,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [Self::Chtml, Self::Mml, Self::Svg];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Chtml => "chtml",
            Self::Mml => "mml",
            Self::Svg => "svg",
        }
    }

    pub fn bundle_file_name(&self) -> String {
        format!("{}{}", self.name(), BUNDLE_FILE_SUFFIX)
    }

    pub fn from_bundle_file_name(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(BUNDLE_FILE_SUFFIX)?;
        stem.parse().ok()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(value))
            .ok_or_else(|| format!("Unknown output format \"{}\".", value))
    }
}

/// Validates one raw conversion result into its domain value.
pub type OutputParser = fn(&str) -> MathJaxResult<String>;

/// Static location of one conversion function inside the engine namespace.
#[derive(Debug, Clone, Copy)]
pub struct FunctionDescriptor {
    pub name: &'static str,
    pub module_name: &'static str,
    pub class_name: &'static str,
    pub owning_format: OutputFormat,
    pub output_parser: OutputParser,
}

impl FunctionDescriptor {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}.{}", self.module_name, self.class_name, self.name)
    }

    pub fn parse_output(&self, raw: &str) -> MathJaxResult<String> {
        (self.output_parser)(raw)
    }
}

impl PartialEq for FunctionDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.module_name == other.module_name
            && self.class_name == other.class_name
            && self.owning_format == other.owning_format
    }
}

impl Eq for FunctionDescriptor {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResponse {
    pub value: String,
    pub error: Option<MathJaxError>,
}

impl CallResponse {
    pub fn ok(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            error: None,
        }
    }

    pub fn failed(raw: impl Into<String>, error: MathJaxError) -> Self {
        Self {
            value: raw.into(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> MathJaxResult<String> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.value),
        }
    }
}
