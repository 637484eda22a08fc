//! reqwest implementation of [`IssueService`].
//!
//! Show endpoints answer either with a wrapped body (`{"issue": {...}}`) or
//! the bare entity; both are accepted. Bodies that do not match the expected
//! shape surface as [`NavigatorError::MalformedResponse`] and leave caller
//! state untouched.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{NavigatorError, Result};
use crate::types::{
    ActionPlan, AppState, FavoriteFilter, Issue, LineRange, Rule, ScmLine, SearchResponse,
    SourceLine, SourceSnippet, UserPage,
};

use super::{ApiError, Config, IssueMutation, IssueService, Params};

const SEARCH_PATH: &str = "/api/issues/search";
const SHOW_ISSUE_PATH: &str = "/api/issues/show";
const FILTER_PAGE_PATH: &str = "/api/issue_filters/page";
const FAVORITES_PATH: &str = "/api/issue_filters/favorites";
const RULE_PATH: &str = "/api/rules/show";
const SOURCE_PATH: &str = "/api/sources/show";
const ACTION_PLANS_PATH: &str = "/api/action_plans/search";
const USERS_PATH: &str = "/api/users/search";

pub struct HttpIssueService {
    client: Client,
    base_url: Url,
    login: Option<String>,
    password: Option<SecretString>,
}

impl fmt::Debug for HttpIssueService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpIssueService")
            .field("base_url", &self.base_url.as_str())
            .field("login", &self.login)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoritesBody {
    #[serde(default)]
    favorite_filters: Vec<FavoriteFilter>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionPlansBody {
    #[serde(default)]
    action_plans: Vec<ActionPlan>,
}

/// `/api/sources/show` keys lines by their number; blame entries are
/// `[author, date]`.
#[derive(Deserialize)]
struct SourceBody {
    #[serde(default)]
    source: Option<BTreeMap<u32, String>>,
    #[serde(default)]
    scm: Option<BTreeMap<u32, Vec<String>>>,
}

impl From<SourceBody> for SourceSnippet {
    fn from(body: SourceBody) -> Self {
        let lines = body
            .source
            .unwrap_or_default()
            .into_iter()
            .map(|(line, code)| SourceLine { line, code })
            .collect();
        let scm = body
            .scm
            .unwrap_or_default()
            .into_iter()
            .map(|(line, mut entry)| {
                let mut parts = entry.drain(..);
                ScmLine {
                    line,
                    author: parts.next(),
                    date: parts.next(),
                }
            })
            .collect();
        SourceSnippet { lines, scm }
    }
}

/// Take `body[field]` when present, else the body itself.
fn unwrap_envelope(body: serde_json::Value, field: &str) -> serde_json::Value {
    match body {
        serde_json::Value::Object(mut map) if map.contains_key(field) => {
            map.remove(field).unwrap_or(serde_json::Value::Null)
        }
        other => other,
    }
}

impl HttpIssueService {
    /// Create a client for the configured server.
    ///
    /// Configures HTTP client with 30s connect timeout and 60s total timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.server.url).map_err(|e| {
            NavigatorError::Config(format!("invalid server url '{}': {}", config.server.url, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url,
            login: config.server.login.clone(),
            password: config.password(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        // Keep any context path of the base URL (e.g. https://host/sonar).
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}"))
            .map_err(|e| NavigatorError::Config(format!("invalid endpoint '{path}': {e}")))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.login {
            Some(login) => request.basic_auth(
                login,
                self.password.as_ref().map(|p| p.expose_secret().to_string()),
            ),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder, path: &str) -> Result<String> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = ApiError::from_response(status, &body, path);
            tracing::debug!(path, status = status.as_u16(), "request failed: {error}");
            if error.is_not_found() {
                return Err(NavigatorError::NotFound(path.to_string()));
            }
            return Err(error.into());
        }
        Ok(body)
    }

    async fn get_value(&self, path: &str, query: &[(&str, String)]) -> Result<serde_json::Value> {
        tracing::debug!(path, "GET");
        let request = self.client.get(self.url(path)?).query(query);
        let body = self.send(request, path).await?;
        serde_json::from_str(&body).map_err(|e| NavigatorError::malformed(path, e))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let value = self.get_value(path, query).await?;
        serde_json::from_value(value).map_err(|e| NavigatorError::malformed(path, e))
    }

    async fn get_wrapped<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        field: &str,
    ) -> Result<T> {
        let value = unwrap_envelope(self.get_value(path, query).await?, field);
        serde_json::from_value(value).map_err(|e| NavigatorError::malformed(path, e))
    }

    async fn post_form(&self, path: &str, form: &[(&str, String)]) -> Result<()> {
        tracing::debug!(path, "POST");
        let request = self.client.post(self.url(path)?).form(form);
        self.send(request, path).await.map(|_| ())
    }
}

#[async_trait]
impl IssueService for HttpIssueService {
    async fn search_issues(&self, params: &Params) -> Result<SearchResponse> {
        tracing::debug!(path = SEARCH_PATH, "GET");
        let request = self.client.get(self.url(SEARCH_PATH)?).query(params);
        let body = self.send(request, SEARCH_PATH).await?;
        serde_json::from_str(&body).map_err(|e| NavigatorError::malformed(SEARCH_PATH, e))
    }

    async fn show_issue(&self, key: &str) -> Result<Issue> {
        self.get_wrapped(SHOW_ISSUE_PATH, &[("key", key.to_string())], "issue")
            .await
            .map_err(|e| match e {
                NavigatorError::NotFound(_) => NavigatorError::IssueNotFound(key.to_string()),
                other => other,
            })
    }

    async fn filter_page(&self) -> Result<AppState> {
        self.get_json(FILTER_PAGE_PATH, &[]).await
    }

    async fn favorite_filters(&self) -> Result<Vec<FavoriteFilter>> {
        let body: FavoritesBody = self.get_json(FAVORITES_PATH, &[]).await?;
        Ok(body.favorite_filters)
    }

    async fn show_favorite_filter(&self, id: u64) -> Result<FavoriteFilter> {
        let path = format!("/api/issue_filters/show/{id}");
        self.get_wrapped(&path, &[], "filter")
            .await
            .map_err(|e| match e {
                NavigatorError::NotFound(_) => NavigatorError::FilterNotFound(id.to_string()),
                other => other,
            })
    }

    async fn show_rule(&self, key: &str) -> Result<Rule> {
        self.get_wrapped(RULE_PATH, &[("key", key.to_string())], "rule")
            .await
    }

    async fn show_source(&self, component: &str, range: LineRange) -> Result<SourceSnippet> {
        let body: SourceBody = self
            .get_json(
                SOURCE_PATH,
                &[
                    ("key", component.to_string()),
                    ("from", range.from.to_string()),
                    ("to", range.to.to_string()),
                    ("format", "json".to_string()),
                ],
            )
            .await?;
        Ok(body.into())
    }

    async fn action_plans(&self, project: &str) -> Result<Vec<ActionPlan>> {
        let body: ActionPlansBody = self
            .get_json(ACTION_PLANS_PATH, &[("project", project.to_string())])
            .await?;
        Ok(body.action_plans)
    }

    async fn search_users(&self, term: &str, page: u32) -> Result<UserPage> {
        self.get_json(
            USERS_PATH,
            &[
                ("f", "s2".to_string()),
                ("s", term.to_string()),
                ("p", page.to_string()),
            ],
        )
        .await
    }

    async fn mutate(&self, mutation: &IssueMutation) -> Result<()> {
        self.post_form(mutation.path(), &mutation.form()).await
    }

    async fn save_filter(&self, id: u64, query: &str) -> Result<()> {
        let path = format!("/issues/save/{id}");
        let mut url = self.url(&path)?;
        url.set_query(Some(query).filter(|q| !q.is_empty()));
        tracing::debug!(path = %path, "POST");
        let request = self.client.post(url);
        self.send(request, &path).await.map(|_| ())
    }
}
