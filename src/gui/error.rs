use std::{error::Error, fmt::Display, sync::mpsc};

/// Errors from the terminal player.
#[derive(Debug)]
pub enum GuiError {
    /// The terminal couldn't be set up, drawn to, or restored.
    IoError(std::io::Error),
    /// The tick thread went away mid-playback.
    MpscRecvError(mpsc::RecvError),
}

impl Display for GuiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuiError::IoError(error) => write!(f, "terminal error: {}", error),
            GuiError::MpscRecvError(error) => write!(f, "tick channel closed: {}", error),
        }
    }
}

impl Error for GuiError {}

impl From<std::io::Error> for GuiError {
    fn from(value: std::io::Error) -> Self {
        Self::IoError(value)
    }
}

impl From<mpsc::RecvError> for GuiError {
    fn from(value: mpsc::RecvError) -> Self {
        Self::MpscRecvError(value)
    }
}
