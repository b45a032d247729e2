//! Prompt detection over sdfcli output
//!
//! sdfcli writes its prompts without a trailing newline and output may be
//! delivered in arbitrary pieces, so detection runs over a rolling buffer
//! of recent output rather than over lines.

/// Interactive prompts sdfcli is known to ask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Password,
    Confirmation,
    ProductionAck,
}

impl Prompt {
    pub const ALL: [Prompt; 3] = [Prompt::Password, Prompt::Confirmation, Prompt::ProductionAck];

    /// Text identifying the prompt in sdfcli output
    pub fn trigger(&self) -> &'static str {
        match self {
            Prompt::Password => "Enter password",
            Prompt::Confirmation => "Type YES to proceed with deploy.",
            Prompt::ProductionAck => "You are deploying to a Production account",
        }
    }

    /// State the session is in while this prompt is being answered
    pub fn state(&self) -> SessionState {
        match self {
            Prompt::Password => SessionState::AwaitingPassword,
            Prompt::Confirmation => SessionState::AwaitingConfirmation,
            Prompt::ProductionAck => SessionState::AwaitingProductionAck,
        }
    }
}

/// Lifecycle of one sdfcli invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    AwaitingPassword,
    AwaitingConfirmation,
    AwaitingProductionAck,
    Done,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Done | SessionState::Failed)
    }
}

pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

#[derive(Debug)]
pub struct PromptDetector {
    buffer: Vec<u8>,
    capacity: usize,
}

impl Default for PromptDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptDetector {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    /// `capacity` is raised to the longest trigger so a prompt can always fit
    pub fn with_capacity(capacity: usize) -> Self {
        let longest = Prompt::ALL
            .iter()
            .map(|prompt| prompt.trigger().len())
            .max()
            .unwrap_or(0);
        let capacity = capacity.max(longest);

        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a chunk of output and return the prompts it completes
    ///
    /// Each match consumes the buffer up to the end of the trigger, so a
    /// prompt is reported once no matter how the output was split.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Prompt> {
        self.buffer.extend_from_slice(chunk);

        let mut found = Vec::new();
        while let Some((prompt, end)) = self.earliest_match() {
            found.push(prompt);
            self.buffer.drain(..end);
        }

        if self.buffer.len() > self.capacity {
            let excess = self.buffer.len() - self.capacity;
            self.buffer.drain(..excess);
        }

        found
    }

    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Prompt whose trigger starts first, with the offset just past it
    fn earliest_match(&self) -> Option<(Prompt, usize)> {
        Prompt::ALL
            .iter()
            .filter_map(|prompt| {
                let trigger = prompt.trigger().as_bytes();
                self.buffer
                    .windows(trigger.len())
                    .position(|window| window == trigger)
                    .map(|start| (*prompt, start, start + trigger.len()))
            })
            .min_by_key(|(_, start, _)| *start)
            .map(|(prompt, _, end)| (prompt, end))
    }
}
