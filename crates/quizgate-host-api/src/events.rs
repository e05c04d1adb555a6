//! Input coming from the host

use quizgate_util::PanelId;

/// Something the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Login { username: String, password: String },
    Open(PanelId),
    Close(PanelId),
    Toggle(PanelId),
    /// Tracked interaction without any other effect
    Activity,
    Extend,
    Logout,
    Status,
    /// The page became visible again
    Show,
    Panels,
    Help,
    Quit,
}

impl UserCommand {
    /// Whether the command counts as user activity for the session guard
    pub fn is_activity(&self) -> bool {
        !matches!(self, Self::Quit | Self::Show)
    }
}

/// Events from the host adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A parsed user command
    Command(UserCommand),

    /// Input the host could not interpret
    Unrecognized { input: String, message: String },

    /// The input source closed
    InputClosed,
}
