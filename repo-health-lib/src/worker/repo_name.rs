use crate::Result;
use core::fmt::{Display, Formatter};
use core::str::FromStr;
use ohno::{AppError, bail};
use serde::{Deserialize, Serialize};

/// A validated `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoName {
    owner: String,
    name: String,
}

impl RepoName {
    /// Parse an `owner/name` string, trimming surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let Some((owner, name)) = s.split_once('/') else {
            bail!("invalid repository '{s}', expected 'owner/name'");
        };

        check_segment(s, "owner", owner)?;
        check_segment(s, "name", name)?;

        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the repository resource relative to the API root.
    #[must_use]
    pub fn api_path(&self) -> String {
        format!("repos/{}/{}", self.owner, self.name)
    }
}

fn check_segment(full: &str, what: &str, segment: &str) -> Result<()> {
    if segment.is_empty() {
        bail!("invalid repository '{full}', missing {what}");
    }

    if segment == "." || segment == ".." {
        bail!("invalid repository '{full}', {what} must not be '{segment}'");
    }

    if let Some(c) = segment.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))) {
        bail!("invalid repository '{full}', unexpected character '{c}' in {what}");
    }

    Ok(())
}

impl Display for RepoName {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RepoName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RepoName> for String {
    fn from(value: RepoName) -> Self {
        value.to_string()
    }
}
