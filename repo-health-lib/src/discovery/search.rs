use crate::hosting::{ApiResult, Client, Repository, SearchPage, SoftFailure};
use crate::worker::{RepoName, WorkItem};
use chrono::NaiveDate;
use core::fmt::{Display, Formatter};

const LOG_TARGET: &str = " discovery";
const SEARCH_ENDPOINT: &str = "search/repositories";

/// Largest page size the search API accepts.
const MAX_PAGE_SIZE: u32 = 100;

/// What to search for and how much of it to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryFilter {
    pub language: String,
    pub min_stars: u64,
    pub max_repos: usize,
    pub page_size: u32,
}

impl DiscoveryFilter {
    /// The search query string, e.g. `language:Python stars:>=100`.
    #[must_use]
    pub fn query(&self) -> String {
        format!("language:{} stars:>={}", self.language, self.min_stars)
    }
}

/// A repository as listed by the search API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredRepo {
    pub full_name: RepoName,
    pub language: Option<String>,
    pub stars: u64,
    pub license: Option<String>,
}

impl TryFrom<Repository> for DiscoveredRepo {
    type Error = ohno::AppError;

    fn try_from(repo: Repository) -> crate::Result<Self> {
        let license = repo.license_id().map(str::to_owned);
        Ok(Self {
            full_name: RepoName::parse(&repo.full_name)?,
            language: repo.language,
            stars: repo.stargazers_count,
            license,
        })
    }
}

/// Why discovery stopped paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEnd {
    /// Collected `max_repos` repositories
    LimitReached,

    /// The search ran out of results
    Exhausted,

    /// A page could not be fetched; the results gathered so far are kept
    SoftFailure(SoftFailure),
}

impl Display for DiscoveryEnd {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::LimitReached => write!(f, "limit reached"),
            Self::Exhausted => write!(f, "no more results"),
            Self::SoftFailure(failure) => write!(f, "stopped early, {failure}"),
        }
    }
}

/// Repositories found by one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub repos: Vec<DiscoveredRepo>,
    pub end: DiscoveryEnd,
}

impl Discovery {
    /// One work item per repository, all stamped with `snapshot_date`.
    #[must_use]
    pub fn work_items(&self, snapshot_date: NaiveDate) -> Vec<WorkItem> {
        self.repos
            .iter()
            .map(|repo| WorkItem::new(repo.full_name.clone(), snapshot_date))
            .collect()
    }
}

/// Page through search results, most-starred first.
///
/// Stops at `max_repos`, at the first empty page, at a short page the API marks as
/// complete, or at the first soft failure. A short page with `incomplete_results`
/// set only means the search timed out upstream, so paging continues. A soft
/// failure is not an error: whatever was collected before it is returned, with
/// the failure recorded in [`Discovery::end`].
///
/// `page_size` is clamped to `1..=100`.
pub async fn discover(client: &Client, filter: &DiscoveryFilter) -> Discovery {
    let query = filter.query();
    let page_size = filter.page_size.clamp(1, MAX_PAGE_SIZE);
    let mut repos = Vec::new();
    let mut page = 1u32;

    log::info!(target: LOG_TARGET, "Searching for '{query}' (up to {} repositories)", filter.max_repos);

    let end = loop {
        if repos.len() >= filter.max_repos {
            break DiscoveryEnd::LimitReached;
        }

        let params = [
            ("q", query.clone()),
            ("sort", "stars".to_owned()),
            ("order", "desc".to_owned()),
            ("per_page", page_size.to_string()),
            ("page", page.to_string()),
        ];

        let result = match client.fetch_as::<SearchPage>(SEARCH_ENDPOINT, &params).await {
            ApiResult::Success(result) => result,
            ApiResult::SoftFailure(failure) => {
                log::warn!(target: LOG_TARGET, "Search page {page} for '{query}' failed: {failure}");
                break DiscoveryEnd::SoftFailure(failure);
            }
        };

        let received = result.items.len();
        log::debug!(
            target: LOG_TARGET,
            "Search page {page} for '{query}' returned {received} of {} item(s){}",
            result.total_count,
            if result.incomplete_results { " (incomplete)" } else { "" }
        );

        if received == 0 {
            break DiscoveryEnd::Exhausted;
        }

        for item in result.items {
            if item.stargazers_count < filter.min_stars {
                continue;
            }

            match DiscoveredRepo::try_from(item) {
                Ok(repo) => repos.push(repo),
                Err(e) => log::warn!(target: LOG_TARGET, "Ignoring search result: {e}"),
            }
        }

        if received < page_size as usize && !result.incomplete_results {
            break if repos.len() >= filter.max_repos {
                DiscoveryEnd::LimitReached
            } else {
                DiscoveryEnd::Exhausted
            };
        }

        page += 1;
    };

    repos.truncate(filter.max_repos);
    log::info!(target: LOG_TARGET, "Found {} repositories for '{query}' ({end})", repos.len());

    Discovery { repos, end }
}
