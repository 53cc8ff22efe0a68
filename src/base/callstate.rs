/// The lifecycle of an asynchronously dispatched call.
///
/// `Submitted -> Running -> {Succeeded | Failed | Errored}`; the last three
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CallState {
    /// Accepted by the dispatcher, not yet picked up by a worker.
    #[default]
    Submitted = 0,

    /// A worker is building, sending or consuming the call.
    Running = 1,

    /// The response was consumed into a value.
    Succeeded = 2,

    /// The server answered with a non-success status.
    Failed = 3,

    /// The call raised a classified error.
    Errored = 4,
}

impl CallState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CallState::Succeeded | CallState::Failed | CallState::Errored
        )
    }

    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => CallState::Running,
            2 => CallState::Succeeded,
            3 => CallState::Failed,
            4 => CallState::Errored,
            _ => CallState::Submitted,
        }
    }
}
