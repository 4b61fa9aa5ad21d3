use serde::Deserialize;

/// The subset of GitHub's repository object that the pipeline uses.
///
/// Search results and `GET /repos/{owner}/{repo}` share this shape.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub full_name: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, alias = "stars_count")]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub license: Option<License>,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl Repository {
    /// SPDX identifier of the repository's license, falling back to its display name.
    ///
    /// GitHub reports `NOASSERTION` for licenses it could not classify; those fall
    /// back to the name as well.
    #[must_use]
    pub fn license_id(&self) -> Option<&str> {
        let license = self.license.as_ref()?;
        license
            .spdx_id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != "NOASSERTION")
            .or(license.name.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct License {
    #[serde(default)]
    pub spdx_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One page of `GET /search/repositories`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(default)]
    pub items: Vec<Repository>,
}
