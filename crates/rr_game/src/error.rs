use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CharacterError {
    /// Requested state name is not one of run/boost/jump/ball. Callers treat
    /// this as a programming error.
    #[error("illegal transition: unknown state '{0}'")]
    IllegalTransition(String),
    /// Model and clips have not been delivered yet.
    #[error("character model is not loaded yet")]
    AssetNotReady,
}
