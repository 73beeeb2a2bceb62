//! benchci GitHub surfaces
//!
//! Everything the daemon needs from its hosting provider: the check-run
//! lifecycle ([`CheckRunGateway`]), firmware artifact lookups
//! ([`ArtifactResolver`]), the webhook event model ([`WebhookEvent`]), and
//! a narrow REST client implementing the [`ChecksApi`] and [`ActionsApi`]
//! traits. In-memory fakes for both traits live in [`fakes`].

pub mod api;
pub mod client;
pub mod error;
pub mod fakes;
pub mod gateway;
pub mod resolver;
pub mod webhook;

pub use api::{
    ActionsApi, Artifact, CheckConclusion, CheckRun, CheckRunOutput, CheckStatus, ChecksApi,
    WorkflowJob, WorkflowRun,
};
pub use client::{GithubClient, GithubConfig};
pub use error::{GithubError, GithubResult};
pub use gateway::{parse_target, run_name, CheckRunGateway, RUN_NAME_PREFIX};
pub use resolver::ArtifactResolver;
pub use webhook::WebhookEvent;
