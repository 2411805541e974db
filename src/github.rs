//! # GitHub Organization Source
//!
//! Lists every repository of a GitHub organization through the REST API
//! (`GET /orgs/{org}/repos?type=all`) and yields each one's SSH clone URL.
//!
//! Results are paginated; the `Link` response header carries the URL of the
//! next page as `<...>; rel="next"`. Pages are fetched lazily as the iterator
//! returned by [`RepositorySource::remotes`] is drained, so a large
//! organization starts producing mirror tasks after the first page.
//!
//! Authentication uses a bearer token read from the first line of
//! `auth_key_file`, or the `GITHUB_TOKEN` environment variable. Without a
//! token only public repositories are visible.

use std::collections::VecDeque;
use std::fs;
use std::sync::LazyLock;

use log::{debug, info};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use serde::Deserialize;
use url::Url;

use crate::config::GithubConfig;
use crate::defaults::DEFAULT_GITHUB_API;
use crate::error::{Error, Result};
use crate::source::{Remotes, RepositorySource};

static NEXT_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<([^>]+)>;\s*rel="next""#).expect("link pattern is valid"));

/// The fields of a repository listing entry we use
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RepoSummary {
    pub name: String,
    pub full_name: String,
    pub ssh_url: String,
}

/// All repositories of one GitHub organization
pub struct GithubOrg {
    organization: String,
    api_url: Url,
    ignore: Vec<String>,
    dry_run: bool,
    client: Client,
}

impl GithubOrg {
    /// Build a source for `organization` from its `[gather.github.<org>]`
    /// table.
    pub fn new(organization: &str, config: &GithubConfig) -> Result<Self> {
        let token = resolve_token(config)?;
        let mut api_url = Url::parse(config.api_url.as_deref().unwrap_or(DEFAULT_GITHUB_API))?;
        // Url::join drops the last segment of a base without a trailing slash
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static("2022-11-28"));
        if let Some(token) = &token {
            let mut value =
                HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| Error::Config {
                    message: format!("GitHub token for {} is not a valid header value", organization),
                    hint: Some("the key file should contain only the token".to_string()),
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        debug!(
            "GitHub source for {} created with {} authorization",
            organization,
            if token.is_some() { "token" } else { "no" }
        );

        Ok(Self {
            organization: organization.to_string(),
            api_url,
            ignore: config.ignore.iter().map(|name| name.to_lowercase()).collect(),
            dry_run: config.dry_run,
            client,
        })
    }

    fn first_page(&self) -> Result<Url> {
        let mut url = self
            .api_url
            .join(&format!("orgs/{}/repos", self.organization))?;
        url.query_pairs_mut().append_pair("type", "all");
        Ok(url)
    }

    fn fetch_page(&self, url: Url) -> Result<(Vec<RepoSummary>, Option<Url>)> {
        let response = self.client.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Source {
                source_name: self.name(),
                message: format!("GET {} returned {}: {}", url, status, body.trim()),
            });
        }

        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_link)
            .map(|link| Url::parse(&link))
            .transpose()?;

        let repos: Vec<RepoSummary> = serde_json::from_str(&response.text()?)?;
        debug!("Found {} repositories at {}", repos.len(), url);
        if let Some(next) = &next {
            debug!("Following next repo link to {}", next);
        }

        Ok((repos, next))
    }

    /// Decide whether a listed repository is mirrored, logging the decision
    fn accept(&self, repo: &RepoSummary) -> bool {
        if is_ignored(&self.ignore, &repo.name) {
            debug!("Ignoring {}", repo.full_name);
            return false;
        }
        if self.dry_run {
            info!("Would mirror GitHub repository {}", repo.full_name);
            return false;
        }
        info!("Mirroring GitHub repository {}", repo.full_name);
        true
    }
}

impl RepositorySource for GithubOrg {
    fn name(&self) -> String {
        format!("github:{}", self.organization)
    }

    fn remotes(&self) -> Result<Remotes<'_>> {
        info!("Getting {} repositories", self.organization);
        let pages = Pages {
            org: self,
            next: Some(self.first_page()?),
            buffer: VecDeque::new(),
        };

        Ok(Box::new(pages.filter_map(move |repo| match repo {
            Ok(repo) => self.accept(&repo).then_some(Ok(repo.ssh_url)),
            Err(e) => Some(Err(e)),
        })))
    }
}

/// Lazy walk over the pages of an organization's repository listing
struct Pages<'a> {
    org: &'a GithubOrg,
    next: Option<Url>,
    buffer: VecDeque<RepoSummary>,
}

impl Iterator for Pages<'_> {
    type Item = Result<RepoSummary>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(repo) = self.buffer.pop_front() {
                return Some(Ok(repo));
            }
            let url = self.next.take()?;
            match self.org.fetch_page(url) {
                Ok((repos, next)) => {
                    self.buffer.extend(repos);
                    self.next = next;
                }
                // `next` is already cleared, so an error ends the walk
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Extract the `rel="next"` target from a `Link` header
pub fn next_link(header: &str) -> Option<String> {
    header
        .split(',')
        .find_map(|part| NEXT_LINK.captures(part.trim()))
        .map(|caps| caps[1].to_string())
}

fn is_ignored(ignore: &[String], name: &str) -> bool {
    let name = name.to_lowercase();
    ignore.iter().any(|ignored| *ignored == name)
}

/// Token from the key file's first line, else `GITHUB_TOKEN`, else none
fn resolve_token(config: &GithubConfig) -> Result<Option<String>> {
    if let Some(path) = &config.auth_key_file {
        let content = fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read auth_key_file {}: {}", path.display(), e),
            hint: None,
        })?;
        let token = content.lines().next().unwrap_or("").trim().to_string();
        if token.is_empty() {
            return Err(Error::Config {
                message: format!("auth_key_file {} is empty", path.display()),
                hint: Some("put the access token on the first line".to_string()),
            });
        }
        return Ok(Some(token));
    }

    Ok(std::env::var("GITHUB_TOKEN")
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty()))
}
