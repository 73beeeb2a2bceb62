//! GitHub REST client
//!
//! Narrow client for the handful of endpoints the daemon touches. Auth is a
//! configured bearer token; how that token is minted (app keys,
//! installation flows) lives outside this codebase.

use async_trait::async_trait;
use reqwest::header;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::api::{
    ActionsApi, Artifact, CheckConclusion, CheckRun, CheckRunOutput, CheckStatus, ChecksApi,
    WorkflowJob, WorkflowRun,
};
use crate::error::{GithubError, GithubResult};

/// Provider configuration
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// REST base URL, overridable for GitHub Enterprise instances.
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    /// Bearer token. `None` works only against unauthenticated mirrors.
    pub token: Option<String>,
}

impl GithubConfig {
    pub fn new(owner: &str, repo: &str) -> Self {
        GithubConfig {
            api_base: "https://api.github.com".to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }
}

/// Client for the check-run and workflow endpoints
pub struct GithubClient {
    config: GithubConfig,
    http: reqwest::Client,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("benchci/0.1")
            .build()
            .expect("Failed to create HTTP client");

        GithubClient { config, http }
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.config.api_base, self.config.owner, self.config.repo, path
        )
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let mut req = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.config.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send_json<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> GithubResult<T> {
        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GithubError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    async fn send_ok(&self, req: reqwest::RequestBuilder) -> GithubResult<()> {
        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GithubError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct CheckRunList {
    check_runs: Vec<CheckRun>,
}

#[derive(Deserialize)]
struct WorkflowRunList {
    workflow_runs: Vec<WorkflowRun>,
}

#[derive(Deserialize)]
struct JobList {
    jobs: Vec<WorkflowJob>,
}

#[derive(Deserialize)]
struct ArtifactList {
    artifacts: Vec<Artifact>,
}

#[async_trait]
impl ChecksApi for GithubClient {
    async fn create_check_run(&self, name: &str, head_sha: &str) -> GithubResult<CheckRun> {
        debug!(name, head_sha, "creating check run");
        let req = self
            .request(reqwest::Method::POST, self.repo_url("check-runs"))
            .json(&json!({
                "name": name,
                "head_sha": head_sha,
                "status": CheckStatus::Queued,
            }));
        self.send_json(req).await
    }

    async fn update_check_run_status(&self, id: u64, status: CheckStatus) -> GithubResult<()> {
        let req = self
            .request(
                reqwest::Method::PATCH,
                self.repo_url(&format!("check-runs/{id}")),
            )
            .json(&json!({ "status": status }));
        self.send_ok(req).await
    }

    async fn complete_check_run(
        &self,
        id: u64,
        conclusion: CheckConclusion,
        output: CheckRunOutput,
    ) -> GithubResult<()> {
        let req = self
            .request(
                reqwest::Method::PATCH,
                self.repo_url(&format!("check-runs/{id}")),
            )
            .json(&json!({
                "status": CheckStatus::Completed,
                "conclusion": conclusion,
                "completed_at": chrono::Utc::now().to_rfc3339(),
                "output": output,
            }));
        self.send_ok(req).await
    }

    async fn list_check_runs_for_ref(
        &self,
        head_sha: &str,
        status: Option<CheckStatus>,
    ) -> GithubResult<Vec<CheckRun>> {
        let mut req = self
            .request(
                reqwest::Method::GET,
                self.repo_url(&format!("commits/{head_sha}/check-runs")),
            )
            .query(&[("per_page", "100")]);
        if let Some(status) = status {
            req = req.query(&[("status", status.as_str())]);
        }
        let list: CheckRunList = self.send_json(req).await?;
        Ok(list.check_runs)
    }
}

#[async_trait]
impl ActionsApi for GithubClient {
    async fn list_successful_runs(&self) -> GithubResult<Vec<WorkflowRun>> {
        let req = self
            .request(reqwest::Method::GET, self.repo_url("actions/runs"))
            .query(&[("status", "success"), ("per_page", "50")]);
        let list: WorkflowRunList = self.send_json(req).await?;
        Ok(list.workflow_runs)
    }

    async fn list_jobs(&self, run_id: u64) -> GithubResult<Vec<WorkflowJob>> {
        let req = self.request(
            reqwest::Method::GET,
            self.repo_url(&format!("actions/runs/{run_id}/jobs")),
        );
        let list: JobList = self.send_json(req).await?;
        Ok(list.jobs)
    }

    async fn artifact_url(&self, run_id: u64) -> GithubResult<String> {
        let req = self.request(
            reqwest::Method::GET,
            self.repo_url(&format!("actions/runs/{run_id}/artifacts")),
        );
        let list: ArtifactList = self.send_json(req).await?;
        list.artifacts
            .first()
            .map(|artifact| artifact.archive_download_url.clone())
            .ok_or_else(|| GithubError::NotFound(format!("no artifacts for run {run_id}")))
    }
}
