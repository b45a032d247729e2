use async_trait::async_trait;
use nsdeploy::{Connector, DeployOutcome, deploy, deploy_with};
use nsdeploy_config::{ConfigError, DeployConfig, Environment, FileSpec};
use nsdeploy_core::{Credentials, DeployCache, RolesResponse, RolesService};
use nsdeploy_sdf::{Operator, SdfError};
use nsdeploy_suitetalk::{
    FileCabinet, FoundRecord, Record, SearchCriteria, SearchResult, Status, StatusDetail,
    WriteResponse,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const WEBSERVICES: &str = "https://1234567-sb1.suitetalk.api.netsuite.com";

const ROLES_BODY: &str = r#"[{
    "account": { "internalId": "1234567", "name": "Example" },
    "role": { "internalId": 3, "name": "Administrator" },
    "dataCenterURLs": {
        "restDomain": "https://1234567-sb1.restlets.api.netsuite.com",
        "webservicesDomain": "https://1234567-sb1.suitetalk.api.netsuite.com",
        "systemDomain": "https://1234567-sb1.app.netsuite.com"
    }
}]"#;

#[derive(Default)]
struct CabinetState {
    next_id: u64,
    folders: Vec<(String, Option<u64>, u64)>,
    files: Vec<(String, u64)>,
    failing_file: Option<String>,
}

/// Shared in-memory File Cabinet plus a canned roles service
#[derive(Clone, Default)]
struct FakeNetSuite {
    cabinet: Arc<Mutex<CabinetState>>,
    roles_calls: Arc<AtomicUsize>,
    searches: Arc<AtomicUsize>,
}

impl FakeNetSuite {
    fn failing_on(name: &str) -> Self {
        let fake = Self::default();
        fake.cabinet.lock().unwrap().failing_file = Some(name.to_string());
        fake
    }

    fn uploaded(&self) -> Vec<String> {
        let state = self.cabinet.lock().unwrap();
        state.files.iter().map(|(name, _)| name.clone()).collect()
    }
}

fn status(is_success: bool, message: Option<&str>) -> Status {
    Status {
        is_success,
        details: message
            .map(|message| StatusDetail {
                code: Some("INSUFFICIENT_PERMISSION".to_string()),
                message: message.to_string(),
            })
            .into_iter()
            .collect(),
    }
}

#[async_trait]
impl RolesService for FakeNetSuite {
    async fn fetch_roles(
        &self,
        _environment: Environment,
        _credentials: &Credentials,
    ) -> nsdeploy_core::Result<RolesResponse> {
        self.roles_calls.fetch_add(1, Ordering::SeqCst);
        Ok(RolesResponse {
            status: 200,
            reason: "OK".to_string(),
            body: ROLES_BODY.to_string(),
        })
    }
}

#[async_trait]
impl FileCabinet for FakeNetSuite {
    async fn search(&self, criteria: &SearchCriteria) -> nsdeploy_suitetalk::Result<SearchResult> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let SearchCriteria::Folder { name, parent } = criteria;
        let parent = parent.map(|id| id.get());
        let state = self.cabinet.lock().unwrap();

        let records: Vec<FoundRecord> = state
            .folders
            .iter()
            .filter(|(folder, folder_parent, _)| folder == name && *folder_parent == parent)
            .map(|(folder, _, id)| FoundRecord {
                internal_id: *id,
                name: Some(folder.clone()),
            })
            .collect();

        Ok(SearchResult {
            status: status(true, None),
            total_records: records.len() as u64,
            records,
        })
    }

    async fn add(&self, record: &Record) -> nsdeploy_suitetalk::Result<WriteResponse> {
        let mut state = self.cabinet.lock().unwrap();
        state.next_id += 1;
        let id = 500 + state.next_id;

        match record {
            Record::Folder { name, parent } => {
                state
                    .folders
                    .push((name.clone(), parent.map(|id| id.get()), id));
            }
            Record::File { name, folder, .. } => {
                if state.failing_file.as_deref() == Some(name.as_str()) {
                    return Ok(WriteResponse {
                        status: status(false, Some("Permission violation.")),
                        base_ref: None,
                    });
                }
                state.files.push((name.clone(), folder.get()));
            }
        }

        Ok(WriteResponse {
            status: status(true, None),
            base_ref: Some(id),
        })
    }
}

impl Connector for FakeNetSuite {
    type Roles = FakeNetSuite;
    type Cabinet = FakeNetSuite;

    fn roles_service(&self) -> FakeNetSuite {
        self.clone()
    }

    fn file_cabinet(
        &self,
        webservices_domain: &str,
        _credentials: Credentials,
        _application_id: &str,
    ) -> FakeNetSuite {
        assert_eq!(webservices_domain, WEBSERVICES);
        self.clone()
    }
}

/// Never expected to be asked anything
struct NoOperator;

#[async_trait]
impl Operator for NoOperator {
    async fn ask(&mut self, question: &str) -> nsdeploy_sdf::Result<String> {
        panic!("Unexpected question: {}", question);
    }
}

fn upload_config(dir: &TempDir, files: &[&str]) -> DeployConfig {
    let base = dir.path().join("src");
    let paths = files
        .iter()
        .map(|relative| {
            let path = base.join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, format!("// {}", relative)).unwrap();
            path
        })
        .collect();

    let mut config = config(dir, "suitetalk");
    config.base = Some(base);
    config.path = Some("SuiteScripts/App".to_string());
    config.file = FileSpec::Many(paths);
    config
}

fn config(dir: &TempDir, method: &str) -> DeployConfig {
    DeployConfig {
        method: method.to_string(),
        environment: "sandbox".to_string(),
        account: "1234567".to_string(),
        email: "dev@example.com".to_string(),
        password: "secret".to_string(),
        role: "3".to_string(),
        cache_file: dir.path().join(".deploycache"),
        ..Default::default()
    }
}

fn config_error(err: &anyhow::Error) -> &ConfigError {
    err.downcast_ref::<ConfigError>()
        .unwrap_or_else(|| panic!("Expected ConfigError, got {:?}", err))
}

#[tokio::test]
async fn test_unknown_method_fails_before_any_io() {
    let dir = TempDir::new().unwrap();
    let err = deploy(&config(&dir, "carrierpigeon")).await.unwrap_err();

    match config_error(&err) {
        ConfigError::InvalidTransport(name) => assert_eq!(name, "carrierpigeon"),
        other => panic!("Expected InvalidTransport, got {:?}", other),
    }
    assert!(!dir.path().join(".deploycache").exists());
}

#[tokio::test]
async fn test_unknown_environment() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, "suitetalk");
    config.environment = "staging".to_string();

    let err = deploy(&config).await.unwrap_err();
    assert!(matches!(
        config_error(&err),
        ConfigError::InvalidEnvironment(env) if env == "staging"
    ));
}

#[tokio::test]
async fn test_missing_credentials() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, "sdf");
    config.password = String::new();
    config.file = FileSpec::One(PathBuf::from("project"));

    let err = deploy(&config).await.unwrap_err();
    assert!(matches!(
        config_error(&err),
        ConfigError::MissingField {
            field: "password",
            transport: "sdf"
        }
    ));
}

#[tokio::test]
async fn test_sdf_requires_project() {
    let dir = TempDir::new().unwrap();
    let err = deploy(&config(&dir, "sdf")).await.unwrap_err();
    assert!(matches!(
        config_error(&err),
        ConfigError::MissingField { field: "file", .. }
    ));
}

#[test]
fn test_sdf_outcome_has_no_file_id() {
    let outcome = DeployOutcome::Deployed(nsdeploy_sdf::DeploymentOutcome {
        state: nsdeploy_sdf::SessionState::Done,
        exit_code: Some(0),
        prompts: vec![nsdeploy_sdf::Prompt::Password],
    });
    assert_eq!(outcome.file_id(), None);
}

#[tokio::test]
async fn test_upload_returns_last_file_and_saves_cache() {
    let dir = TempDir::new().unwrap();
    let config = upload_config(&dir, &["main.js", "lib/util.js"]);
    let netsuite = FakeNetSuite::default();

    let outcome = deploy_with(&config, &netsuite, &mut NoOperator)
        .await
        .unwrap();

    let DeployOutcome::Uploaded(files) = &outcome else {
        panic!("Expected uploads, got {:?}", outcome);
    };
    assert_eq!(files.len(), 2);
    assert_eq!(outcome.file_id(), Some(files[1].file_id));
    assert_eq!(netsuite.uploaded(), vec!["main.js", "util.js"]);

    let cache = DeployCache::open(&config.cache_file).await.unwrap();
    assert_eq!(cache.get_str("sandbox", "webservicesDomain"), Some(WEBSERVICES));
    assert_eq!(
        cache.get_u64("sandbox", "folderIDs:SuiteScripts/App/lib"),
        Some(files[1].folder.get())
    );
}

#[tokio::test]
async fn test_second_upload_reuses_saved_cache() {
    let dir = TempDir::new().unwrap();
    let config = upload_config(&dir, &["main.js"]);
    let netsuite = FakeNetSuite::default();

    deploy_with(&config, &netsuite, &mut NoOperator)
        .await
        .unwrap();
    let searches = netsuite.searches.load(Ordering::SeqCst);

    let outcome = deploy_with(&config, &netsuite, &mut NoOperator)
        .await
        .unwrap();

    assert!(outcome.file_id().is_some());
    assert_eq!(netsuite.roles_calls.load(Ordering::SeqCst), 1);
    assert_eq!(netsuite.searches.load(Ordering::SeqCst), searches);
}

#[tokio::test]
async fn test_failed_upload_leaves_cache_untouched() {
    let dir = TempDir::new().unwrap();
    let config = upload_config(&dir, &["a.js", "b.js", "c.js"]);
    let netsuite = FakeNetSuite::failing_on("b.js");

    let err = deploy_with(&config, &netsuite, &mut NoOperator)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Permission violation.");
    assert_eq!(netsuite.uploaded(), vec!["a.js"]);
    assert!(!config.cache_file.exists());
}

#[tokio::test]
async fn test_sdf_spawn_failure_leaves_cache_untouched() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, "sdf");
    config.file = FileSpec::One(dir.path().to_path_buf());
    config.sdfcli = dir.path().join("no-such-sdfcli").display().to_string();
    let netsuite = FakeNetSuite::default();

    let err = deploy_with(&config, &netsuite, &mut NoOperator)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SdfError>(),
        Some(SdfError::Spawn { .. })
    ));
    assert_eq!(netsuite.roles_calls.load(Ordering::SeqCst), 1);
    assert!(!config.cache_file.exists());
}
