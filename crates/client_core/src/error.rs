use shared::error::TransportError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    #[error("{operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: TransportError,
    },
    #[error("season {season_id} is not listed in the loaded profile")]
    UnknownSeason { season_id: u32 },
    #[error("no player profile loaded")]
    NoProfile,
}

impl PlayerError {
    pub(crate) fn transport(operation: &'static str) -> impl FnOnce(TransportError) -> Self {
        move |source| PlayerError::Transport { operation, source }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, PlayerError::Transport { .. })
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;
