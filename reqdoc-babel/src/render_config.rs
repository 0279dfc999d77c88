//! Render configuration: decides per attribute which renderer applies.
//!
//!     A rule document is an ordered list of rules, each with optional `package`, `type` and
//!     `attribute` regex patterns and a `format`:
//!
//!     ```json
//!     { "renderCfg": [
//!         { "package": "Reqs", "format": "rst" },
//!         { "package": "Reqs", "type": "SwReq", "attribute": "description", "format": "md" }
//!     ] }
//!     ```
//!
//!     Every rule is evaluated, in file order. A rule contributes when all of its present
//!     patterns match; absent patterns match anything. The format of the last contributing rule
//!     wins, so later, more specific rules override earlier, broader ones. Patterns are anchored
//!     at the start of the input but may match a prefix only.
//!
//!     A missing or malformed rule document is not an error: the configuration stays empty and
//!     every attribute resolves to nothing, which converters treat as plain text. Invalid regex
//!     patterns on the other hand are reported, since they are always a configuration mistake.

use crate::error::ConvertError;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Format an attribute is written in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormatSpecifier {
    Plain,
    Markdown,
    Rst,
    /// Any other specifier, kept for converters that define their own
    Extension(String),
}

impl FormatSpecifier {
    pub fn parse(value: &str) -> Self {
        match value {
            "plain" => FormatSpecifier::Plain,
            "md" | "markdown" => FormatSpecifier::Markdown,
            "rst" => FormatSpecifier::Rst,
            other => FormatSpecifier::Extension(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FormatSpecifier::Plain => "plain",
            FormatSpecifier::Markdown => "md",
            FormatSpecifier::Rst => "rst",
            FormatSpecifier::Extension(other) => other,
        }
    }
}

impl fmt::Display for FormatSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Deserialize)]
struct RuleDocument {
    #[serde(rename = "renderCfg", default)]
    render_cfg: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    package: Option<String>,
    #[serde(rename = "type")]
    type_name: Option<String>,
    attribute: Option<String>,
    format: Option<String>,
}

/// A single compiled rule.
#[derive(Debug, Clone)]
pub struct FormatRule {
    package: Option<Regex>,
    type_name: Option<Regex>,
    attribute: Option<Regex>,
    format: Option<FormatSpecifier>,
}

impl FormatRule {
    /// Compile a rule. `None` patterns are wildcards.
    pub fn new(
        package: Option<&str>,
        type_name: Option<&str>,
        attribute: Option<&str>,
        format: Option<FormatSpecifier>,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            package: package.map(compile_pattern).transpose()?,
            type_name: type_name.map(compile_pattern).transpose()?,
            attribute: attribute.map(compile_pattern).transpose()?,
            format,
        })
    }

    /// Whether every present pattern matches its input.
    pub fn matches(&self, package: &str, type_name: &str, attribute: &str) -> bool {
        pattern_matches(&self.package, package)
            && pattern_matches(&self.type_name, type_name)
            && pattern_matches(&self.attribute, attribute)
    }

    pub fn format(&self) -> Option<&FormatSpecifier> {
        self.format.as_ref()
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, ConvertError> {
    // Anchor at the start only: a pattern may match a prefix of the input.
    Regex::new(&format!("^(?:{pattern})")).map_err(|source| ConvertError::InvalidRulePattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn pattern_matches(pattern: &Option<Regex>, input: &str) -> bool {
    pattern.as_ref().map_or(true, |regex| regex.is_match(input))
}

/// Ordered set of format rules.
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    rules: Vec<FormatRule>,
    loaded: bool,
}

impl RenderConfig {
    /// An empty configuration: every attribute resolves to nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from already compiled rules.
    pub fn from_rules(rules: Vec<FormatRule>) -> Self {
        Self {
            rules,
            loaded: true,
        }
    }

    /// Load the rule document at `path`.
    ///
    /// A missing file or a document that is not valid JSON yields an empty, not-loaded
    /// configuration. Only invalid patterns produce an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading render configuration");

        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "render configuration not available");
                return Ok(Self::new());
            }
        };

        Self::from_json(&source)
    }

    /// Parse a rule document from JSON text.
    pub fn from_json(source: &str) -> Result<Self, ConvertError> {
        let document: RuleDocument = match serde_json::from_str(source) {
            Ok(document) => document,
            Err(err) => {
                warn!(error = %err, "ignoring malformed render configuration");
                return Ok(Self::new());
            }
        };

        let rules = document
            .render_cfg
            .into_iter()
            .map(|raw| {
                FormatRule::new(
                    raw.package.as_deref(),
                    raw.type_name.as_deref(),
                    raw.attribute.as_deref(),
                    raw.format.as_deref().map(FormatSpecifier::parse),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(rules = rules.len(), "render configuration loaded");
        Ok(Self::from_rules(rules))
    }

    /// Whether a rule document was actually read.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn rules(&self) -> &[FormatRule] {
        &self.rules
    }

    /// Append a rule after the existing ones, giving it the highest precedence.
    pub fn push_rule(&mut self, rule: FormatRule) {
        self.rules.push(rule);
        self.loaded = true;
    }

    /// Resolve the format of an attribute. The last contributing rule wins.
    pub fn resolve(
        &self,
        package: &str,
        type_name: &str,
        attribute: &str,
    ) -> Option<&FormatSpecifier> {
        let mut resolved = None;
        for rule in &self.rules {
            if rule.matches(package, type_name, attribute) {
                if let Some(format) = rule.format() {
                    resolved = Some(format);
                }
            }
        }
        resolved
    }

    pub fn is_format_plain(&self, package: &str, type_name: &str, attribute: &str) -> bool {
        self.resolve(package, type_name, attribute) == Some(&FormatSpecifier::Plain)
    }

    pub fn is_format_markdown(&self, package: &str, type_name: &str, attribute: &str) -> bool {
        self.resolve(package, type_name, attribute) == Some(&FormatSpecifier::Markdown)
    }

    pub fn is_format_rst(&self, package: &str, type_name: &str, attribute: &str) -> bool {
        self.resolve(package, type_name, attribute) == Some(&FormatSpecifier::Rst)
    }
}
