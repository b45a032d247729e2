//! SDF transport
//!
//! Deploys a SuiteCloud project by running `sdfcli deploy` and answering its
//! interactive prompts.

pub mod driver;
pub mod error;
pub mod operator;
pub mod prompt;

pub use driver::{
    DeploymentOutcome, DeploymentSession, ExitPolicy, MASKED_PASSWORD, SdfDriver, SdfInvocation,
    host_from_domain,
};
pub use error::{Result, SdfError};
pub use operator::{Operator, TerminalOperator};
pub use prompt::{Prompt, PromptDetector, SessionState};
