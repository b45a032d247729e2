//! Deployment settings and the selectors they carry

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Application id sent in the SuiteTalk `applicationInfo` header.
pub const DEFAULT_APPLICATION_ID: &str = "79927DCC-D1D8-4884-A7C5-F2B155FA00F3";

pub const DEFAULT_CACHE_FILE: &str = ".deploycache";
pub const DEFAULT_SDFCLI: &str = "sdfcli";

/// How files reach the File Cabinet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// SOAP web services, one file at a time
    SuiteTalk,
    /// The interactive `sdfcli deploy` tool
    Sdf,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::SuiteTalk => "suitetalk",
            Transport::Sdf => "sdf",
        }
    }
}

impl FromStr for Transport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "suitetalk" => Ok(Transport::SuiteTalk),
            "sdf" => Ok(Transport::Sdf),
            other => Err(ConfigError::InvalidTransport(other.to_string())),
        }
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// NetSuite environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Production,
    Sandbox,
    Beta,
    Eu,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Sandbox => "sandbox",
            Environment::Beta => "beta",
            Environment::Eu => "eu",
        }
    }

    /// Roles service used to discover the account's data center
    pub fn roles_url(&self) -> &'static str {
        match self {
            Environment::Production => "https://rest.netsuite.com/rest/roles",
            Environment::Sandbox => "https://rest.sandbox.netsuite.com/rest/roles",
            Environment::Beta => "https://rest.beta.netsuite.com/rest/roles",
            Environment::Eu => "https://rest.eu1.netsuite.com/rest/roles",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "production" => Ok(Environment::Production),
            "sandbox" => Ok(Environment::Sandbox),
            "beta" => Ok(Environment::Beta),
            "eu" => Ok(Environment::Eu),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single path or a list of paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileSpec {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

impl FileSpec {
    pub fn to_vec(&self) -> Vec<PathBuf> {
        match self {
            FileSpec::One(path) => vec![path.clone()],
            FileSpec::Many(paths) => paths.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FileSpec::One(_) => false,
            FileSpec::Many(paths) => paths.is_empty(),
        }
    }
}

impl Default for FileSpec {
    fn default() -> Self {
        FileSpec::Many(Vec::new())
    }
}

/// Settings for one deployment
///
/// `file` is the project folder for the `sdf` method and the list of files
/// to upload for the `suitetalk` method. `base` and `path` only apply to
/// `suitetalk`.
#[derive(Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub method: String,

    #[serde(default)]
    pub environment: String,

    #[serde(default)]
    pub account: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,

    /// Internal id of the role used to log in (e.g. "3" for Administrator)
    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub file: FileSpec,

    #[serde(default)]
    pub base: Option<PathBuf>,

    /// Destination folder in the File Cabinet (e.g. /SuiteScripts/Folder/)
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,

    #[serde(default = "default_sdfcli")]
    pub sdfcli: String,

    #[serde(default)]
    pub strict_exit: bool,

    #[serde(default = "default_application_id")]
    pub application_id: String,
}

fn default_cache_file() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_FILE)
}

fn default_sdfcli() -> String {
    DEFAULT_SDFCLI.to_string()
}

fn default_application_id() -> String {
    DEFAULT_APPLICATION_ID.to_string()
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            method: String::new(),
            environment: String::new(),
            account: String::new(),
            email: String::new(),
            password: String::new(),
            role: String::new(),
            file: FileSpec::default(),
            base: None,
            path: None,
            cache_file: default_cache_file(),
            sdfcli: default_sdfcli(),
            strict_exit: false,
            application_id: default_application_id(),
        }
    }
}

impl std::fmt::Debug for DeployConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployConfig")
            .field("method", &self.method)
            .field("environment", &self.environment)
            .field("account", &self.account)
            .field("email", &self.email)
            .field("password", &"******")
            .field("role", &self.role)
            .field("file", &self.file)
            .field("base", &self.base)
            .field("path", &self.path)
            .field("cache_file", &self.cache_file)
            .field("sdfcli", &self.sdfcli)
            .field("strict_exit", &self.strict_exit)
            .finish()
    }
}

impl DeployConfig {
    pub fn transport(&self) -> Result<Transport> {
        self.method.parse()
    }

    pub fn environment(&self) -> Result<Environment> {
        self.environment.parse()
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.file.to_vec()
    }

    /// Project folder for the `sdf` method (the first entry of `file`)
    pub fn project(&self) -> Option<&Path> {
        match &self.file {
            FileSpec::One(path) => Some(path.as_path()),
            FileSpec::Many(paths) => paths.first().map(|p| p.as_path()),
        }
    }

    /// Check that the credentials every method needs are present
    pub fn require_credentials(&self, transport: Transport) -> Result<()> {
        let fields = [
            ("account", &self.account),
            ("email", &self.email),
            ("password", &self.password),
            ("role", &self.role),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field,
                    transport: transport.as_str(),
                });
            }
        }
        Ok(())
    }
}
