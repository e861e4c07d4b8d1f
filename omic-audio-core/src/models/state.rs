use std::fmt;

/// Stream session state machine.
///
/// State transitions:
/// ```text
/// unopened → opened ⇄ running
///     ↓         ↓        ↓
///     └──────→ closed ←──┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    Unopened,
    Opened,
    Running,
    Closed,
}

impl StreamState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether an engine stream handle exists in this state.
    pub fn has_stream(&self) -> bool {
        matches!(self, Self::Opened | Self::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unopened => "unopened",
            Self::Opened => "opened",
            Self::Running => "running",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Where an encoder session is in its allocate/initialize lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncoderStatus {
    Empty,
    Allocated,
    Ready,
    Released,
}

impl fmt::Display for EncoderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Allocated => "allocated",
            Self::Ready => "ready",
            Self::Released => "released",
        };
        f.write_str(name)
    }
}
