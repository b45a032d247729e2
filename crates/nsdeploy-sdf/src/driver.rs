//! sdfcli subprocess driver
//!
//! Runs `sdfcli deploy`, mirrors everything it prints and answers its
//! prompts: the password and the YES confirmation automatically, the
//! production safety question by asking the operator.

use crate::error::{Result, SdfError};
use crate::operator::Operator;
use crate::prompt::{Prompt, PromptDetector, SessionState};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;

/// Shown in place of the password
pub const MASKED_PASSWORD: &str = "******";

const READ_CHUNK: usize = 1024;

/// How a non-zero sdfcli exit is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitPolicy {
    /// Logged as a warning; the deployment still counts as finished
    #[default]
    Lenient,
    /// Reported as [`SdfError::NonZeroExit`]
    Strict,
}

impl ExitPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            ExitPolicy::Strict
        } else {
            ExitPolicy::Lenient
        }
    }
}

/// Command line of one `sdfcli deploy` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdfInvocation {
    pub binary: String,
    /// Host of the account's system domain, without scheme
    pub url: String,
    pub account: String,
    pub email: String,
    pub role: String,
    pub project: PathBuf,
}

impl SdfInvocation {
    pub fn args(&self) -> Vec<String> {
        vec![
            "deploy".to_string(),
            "-url".to_string(),
            self.url.clone(),
            "-account".to_string(),
            self.account.clone(),
            "-email".to_string(),
            self.email.clone(),
            "-role".to_string(),
            self.role.clone(),
            "-project".to_string(),
            self.project.display().to_string(),
        ]
    }
}

/// Strip the scheme and trailing slash from a domain URL
pub fn host_from_domain(domain: &str) -> &str {
    let host = domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(domain);
    host.trim_end_matches('/')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentOutcome {
    pub state: SessionState,
    pub exit_code: Option<i32>,
    /// Prompts answered, in order
    pub prompts: Vec<Prompt>,
}

impl DeploymentOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Prompt/answer exchange of one sdfcli run
pub struct DeploymentSession<'a> {
    password: &'a str,
    detector: PromptDetector,
    state: SessionState,
    answered: Vec<Prompt>,
}

impl<'a> DeploymentSession<'a> {
    pub fn new(password: &'a str) -> Self {
        Self {
            password,
            detector: PromptDetector::new(),
            state: SessionState::Running,
            answered: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn answered(&self) -> &[Prompt] {
        &self.answered
    }

    /// Pump `output` until it closes, mirroring it to `console` and
    /// answering prompts on `input`
    pub async fn drive<R, W, L, O>(
        &mut self,
        output: R,
        input: W,
        console: &mut L,
        operator: &mut O,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
        L: AsyncWrite + Unpin,
        O: Operator + ?Sized,
    {
        let result = self.pump(output, input, console, operator).await;
        if result.is_err() {
            self.state = SessionState::Failed;
        }
        result
    }

    async fn pump<R, W, L, O>(
        &mut self,
        mut output: R,
        mut input: W,
        console: &mut L,
        operator: &mut O,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
        L: AsyncWrite + Unpin,
        O: Operator + ?Sized,
    {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let read = output.read(&mut chunk).await?;
            if read == 0 {
                break;
            }

            console.write_all(&chunk[..read]).await?;
            console.flush().await?;

            for prompt in self.detector.feed(&chunk[..read]) {
                self.state = prompt.state();
                self.answer(prompt, &mut input, console, operator).await?;
                self.answered.push(prompt);
                self.state = SessionState::Running;
            }
        }
        Ok(())
    }

    async fn answer<W, L, O>(
        &mut self,
        prompt: Prompt,
        input: &mut W,
        console: &mut L,
        operator: &mut O,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
        L: AsyncWrite + Unpin,
        O: Operator + ?Sized,
    {
        tracing::debug!("sdfcli prompt: {:?}", prompt);
        let reply = match prompt {
            Prompt::Password => {
                console
                    .write_all(format!("{}\n", MASKED_PASSWORD).as_bytes())
                    .await?;
                console.flush().await?;
                self.password.to_string()
            }
            Prompt::Confirmation => "YES".to_string(),
            Prompt::ProductionAck => operator.ask(prompt.trigger()).await?,
        };

        input.write_all(format!("{}\n", reply).as_bytes()).await?;
        input.flush().await?;
        Ok(())
    }
}

/// Runs sdfcli as a child process
pub struct SdfDriver {
    invocation: SdfInvocation,
    password: String,
    policy: ExitPolicy,
}

impl SdfDriver {
    pub fn new(invocation: SdfInvocation, password: impl Into<String>, policy: ExitPolicy) -> Self {
        Self {
            invocation,
            password: password.into(),
            policy,
        }
    }

    pub fn invocation(&self) -> &SdfInvocation {
        &self.invocation
    }

    /// Run the deployment to completion
    ///
    /// Output is mirrored to this process's stdout; stderr is inherited.
    pub async fn run<O: Operator + ?Sized>(&self, operator: &mut O) -> Result<DeploymentOutcome> {
        let args = self.invocation.args();
        tracing::debug!("Running: {} {}", self.invocation.binary, args.join(" "));

        let mut child = Command::new(&self.invocation.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| SdfError::Spawn {
                binary: self.invocation.binary.clone(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or(SdfError::PipeUnavailable("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(SdfError::PipeUnavailable("stdout"))?;

        let mut session = DeploymentSession::new(&self.password);
        let mut console = tokio::io::stdout();
        let driven = session.drive(stdout, stdin, &mut console, operator).await;

        if let Err(err) = driven {
            // Don't leave sdfcli waiting on a prompt nobody will answer
            let _ = child.kill().await;
            return Err(err);
        }

        let status = child.wait().await?;
        self.finish(session, status)
    }

    fn finish(&self, session: DeploymentSession<'_>, status: ExitStatus) -> Result<DeploymentOutcome> {
        let exit_code = status.code();

        if !status.success() {
            match self.policy {
                ExitPolicy::Strict => return Err(SdfError::NonZeroExit { code: exit_code }),
                ExitPolicy::Lenient => {
                    tracing::warn!("sdfcli exited with {}; treating the deploy as finished", status)
                }
            }
        }

        Ok(DeploymentOutcome {
            state: SessionState::Done,
            exit_code,
            prompts: session.answered,
        })
    }
}
