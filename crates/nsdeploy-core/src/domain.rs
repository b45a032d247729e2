//! Data center discovery
//!
//! NetSuite accounts live in different data centers. The REST roles service
//! lists, per role, the base URLs of the account's system, web services and
//! REST domains. Resolved domains are cached per environment.

use crate::cache::DeployCache;
use crate::credentials::Credentials;
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use nsdeploy_config::Environment;
use serde::Deserialize;
use serde_json::Value;

const INVALID_JSON_MESSAGE: &str = "Response was not valid JSON data";

/// Which base URL to look up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainKind {
    System,
    Webservices,
    Rest,
}

impl DomainKind {
    /// Field name in the roles response, also used as the cache key
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainKind::System => "systemDomain",
            DomainKind::Webservices => "webservicesDomain",
            DomainKind::Rest => "restDomain",
        }
    }
}

impl std::fmt::Display for DomainKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw answer from the roles service
#[derive(Debug, Clone)]
pub struct RolesResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

/// Transport for the roles lookup
#[async_trait]
pub trait RolesService: Send + Sync {
    async fn fetch_roles(
        &self,
        environment: Environment,
        credentials: &Credentials,
    ) -> Result<RolesResponse>;
}

/// Roles lookup over HTTPS
pub struct HttpRolesService {
    client: reqwest::Client,
}

impl HttpRolesService {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpRolesService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RolesService for HttpRolesService {
    async fn fetch_roles(
        &self,
        environment: Environment,
        credentials: &Credentials,
    ) -> Result<RolesResponse> {
        let url = environment.roles_url();
        tracing::debug!("Retrieving data center domains from {}", url);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, credentials.nlauth_header())
            .send()
            .await?;

        let status = response.status();
        // The service has been seen to answer with non-JSON bodies, so read
        // text and decode separately.
        let body = response.text().await?;

        Ok(RolesResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RoleEntry {
    role: RoleRef,
    #[serde(rename = "dataCenterURLs")]
    data_center_urls: DataCenterUrls,
}

#[derive(Debug, Deserialize)]
struct RoleRef {
    #[serde(rename = "internalId")]
    internal_id: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataCenterUrls {
    system_domain: Option<String>,
    webservices_domain: Option<String>,
    rest_domain: Option<String>,
}

impl DataCenterUrls {
    fn get(&self, kind: DomainKind) -> Option<&str> {
        match kind {
            DomainKind::System => self.system_domain.as_deref(),
            DomainKind::Webservices => self.webservices_domain.as_deref(),
            DomainKind::Rest => self.rest_domain.as_deref(),
        }
    }
}

/// Role ids come back as numbers or strings; compare them as strings
fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pick the `kind` domain for `role` out of a roles response
pub fn select_domain(response: &RolesResponse, role: &str, kind: DomainKind) -> Result<String> {
    let data: Value = serde_json::from_str(&response.body).unwrap_or_else(|_| {
        serde_json::json!({ "error": { "message": INVALID_JSON_MESSAGE } })
    });

    if response.status != 200 {
        let message = data
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();
        return Err(CoreError::RemoteService {
            status: response.status,
            reason: response.reason.clone(),
            message,
        });
    }

    if data.get("error").is_some() && !data.is_array() {
        return Err(CoreError::RemoteService {
            status: response.status,
            reason: response.reason.clone(),
            message: data
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or(INVALID_JSON_MESSAGE)
                .to_string(),
        });
    }

    let entries: Vec<RoleEntry> = serde_json::from_value(data)?;
    let matched = entries
        .into_iter()
        .find(|entry| id_string(&entry.role.internal_id) == role)
        .ok_or_else(|| CoreError::NoMatchingDataCenter {
            role: role.to_string(),
        })?;

    matched
        .data_center_urls
        .get(kind)
        .map(str::to_string)
        .ok_or_else(|| CoreError::MissingDomain(kind.as_str().to_string()))
}

/// Resolves data center domains, consulting the deploy cache first
pub struct DomainResolver<S = HttpRolesService> {
    service: S,
    credentials: Credentials,
}

impl DomainResolver<HttpRolesService> {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_service(HttpRolesService::new(), credentials)
    }
}

impl<S: RolesService> DomainResolver<S> {
    pub fn with_service(service: S, credentials: Credentials) -> Self {
        Self {
            service,
            credentials,
        }
    }

    /// Return the `kind` base URL for `environment`
    ///
    /// Performs at most one roles lookup; the result is stored in `cache`.
    pub async fn resolve(
        &self,
        cache: &mut DeployCache,
        environment: Environment,
        kind: DomainKind,
    ) -> Result<String> {
        if let Some(url) = cache.get_str(environment.as_str(), kind.as_str()) {
            tracing::debug!("Using cached {} for {}: {}", kind, environment, url);
            return Ok(url.to_string());
        }

        let response = self
            .service
            .fetch_roles(environment, &self.credentials)
            .await?;
        let url = select_domain(&response, &self.credentials.role, kind)?;

        tracing::info!("Resolved {} for {}: {}", kind, environment, url);
        cache.set(environment.as_str(), kind.as_str(), url.clone());
        Ok(url)
    }
}
