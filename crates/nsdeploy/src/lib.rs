//! nsdeploy
//!
//! Deploys to NetSuite with one of two methods:
//!
//! - `suitetalk`: uploads files into the File Cabinet over the SOAP web
//!   services, mirroring the local folder layout below `base` at `path`
//! - `sdf`: runs `sdfcli deploy` for a SuiteCloud project and answers its
//!   prompts
//!
//! Data center domains and folder ids are remembered in the deploy cache,
//! which is written back only when the whole deployment succeeded.

use anyhow::{Context, Result};
use nsdeploy_config::{ConfigError, DeployConfig, Environment, Transport};
use nsdeploy_core::{
    Credentials, DeployCache, DomainKind, DomainResolver, FileId, HttpRolesService, RemotePath,
    RolesService,
};
use nsdeploy_sdf::{
    DeploymentOutcome, ExitPolicy, Operator, SdfDriver, SdfInvocation, TerminalOperator,
    host_from_domain,
};
use nsdeploy_suitetalk::{FileCabinet, SuiteTalkClient, UploadRequest, UploadedFile, Uploader};
use std::path::PathBuf;

/// Result of a successful deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// Files uploaded over SuiteTalk, in upload order
    Uploaded(Vec<UploadedFile>),
    /// sdfcli run finished
    Deployed(DeploymentOutcome),
}

impl DeployOutcome {
    /// Id of the last file created by a SuiteTalk upload
    pub fn file_id(&self) -> Option<FileId> {
        match self {
            DeployOutcome::Uploaded(files) => files.last().map(|file| file.file_id),
            DeployOutcome::Deployed(_) => None,
        }
    }
}

/// Remote services a deployment talks to
pub trait Connector {
    type Roles: RolesService;
    type Cabinet: FileCabinet;

    /// Data center discovery
    fn roles_service(&self) -> Self::Roles;

    /// File Cabinet bound to the resolved web services domain
    fn file_cabinet(
        &self,
        webservices_domain: &str,
        credentials: Credentials,
        application_id: &str,
    ) -> Self::Cabinet;
}

/// The live NetSuite services
#[derive(Debug, Clone, Copy, Default)]
pub struct NetSuite;

impl Connector for NetSuite {
    type Roles = HttpRolesService;
    type Cabinet = SuiteTalkClient;

    fn roles_service(&self) -> HttpRolesService {
        HttpRolesService::new()
    }

    fn file_cabinet(
        &self,
        webservices_domain: &str,
        credentials: Credentials,
        application_id: &str,
    ) -> SuiteTalkClient {
        SuiteTalkClient::new(webservices_domain, credentials, application_id)
    }
}

/// Validated work for one method
#[derive(Debug, Clone, PartialEq)]
enum Plan {
    Upload(UploadRequest),
    Sdf { project: PathBuf },
}

/// Deploy according to `config`, asking the terminal for operator answers
pub async fn deploy(config: &DeployConfig) -> Result<DeployOutcome> {
    deploy_with_operator(config, &mut TerminalOperator::new()).await
}

pub async fn deploy_with_operator<O: Operator + ?Sized>(
    config: &DeployConfig,
    operator: &mut O,
) -> Result<DeployOutcome> {
    deploy_with(config, &NetSuite, operator).await
}

/// Deploy through `connector`
///
/// The deploy cache is written back only when every step succeeded.
pub async fn deploy_with<N: Connector + ?Sized, O: Operator + ?Sized>(
    config: &DeployConfig,
    connector: &N,
    operator: &mut O,
) -> Result<DeployOutcome> {
    // Everything is validated before the cache, the network or sdfcli is touched
    let transport = config.transport()?;
    let environment = config.environment()?;
    config.require_credentials(transport)?;
    let plan = plan(config, transport)?;

    let credentials = Credentials::from_config(config);
    let mut cache = DeployCache::open(&config.cache_file)
        .await
        .with_context(|| format!("Failed to open {}", config.cache_file.display()))?;
    let domains = DomainResolver::with_service(connector.roles_service(), credentials.clone());

    tracing::info!("Deploying to {} with {}", environment, transport);
    let outcome = match plan {
        Plan::Upload(request) => {
            let domain = domains
                .resolve(&mut cache, environment, DomainKind::Webservices)
                .await?;
            let cabinet = connector.file_cabinet(&domain, credentials, &config.application_id);
            let uploaded = Uploader::new(&cabinet, environment)
                .upload_all(&mut cache, &request)
                .await?;
            DeployOutcome::Uploaded(uploaded)
        }
        Plan::Sdf { project } => {
            let domain = domains
                .resolve(&mut cache, environment, DomainKind::System)
                .await?;
            let outcome = run_sdf(config, environment, &domain, project, operator).await?;
            DeployOutcome::Deployed(outcome)
        }
    };

    cache
        .flush()
        .await
        .with_context(|| format!("Failed to save {}", config.cache_file.display()))?;
    Ok(outcome)
}

fn plan(config: &DeployConfig, transport: Transport) -> Result<Plan, ConfigError> {
    let missing = |field| ConfigError::MissingField {
        field,
        transport: transport.as_str(),
    };

    match transport {
        Transport::SuiteTalk => {
            let raw = config.path.as_deref().ok_or_else(|| missing("path"))?;
            let destination = RemotePath::parse(raw).map_err(|_| missing("path"))?;
            if config.file.is_empty() {
                return Err(missing("file"));
            }
            Ok(Plan::Upload(UploadRequest {
                destination,
                base_dir: config.base.clone().unwrap_or_else(|| PathBuf::from(".")),
                files: config.files(),
            }))
        }
        Transport::Sdf => {
            let project = config.project().ok_or_else(|| missing("file"))?;
            Ok(Plan::Sdf {
                project: project.to_path_buf(),
            })
        }
    }
}

async fn run_sdf<O: Operator + ?Sized>(
    config: &DeployConfig,
    environment: Environment,
    system_domain: &str,
    project: PathBuf,
    operator: &mut O,
) -> Result<DeploymentOutcome> {
    let invocation = SdfInvocation {
        binary: config.sdfcli.clone(),
        url: host_from_domain(system_domain).to_string(),
        account: config.account.clone(),
        email: config.email.clone(),
        role: config.role.clone(),
        project,
    };
    tracing::debug!("sdfcli deploy to {} ({})", invocation.url, environment);

    let driver = SdfDriver::new(
        invocation,
        config.password.clone(),
        ExitPolicy::from_strict(config.strict_exit),
    );
    Ok(driver.run(operator).await?)
}
