#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid SteamID64: {0}")]
    InvalidSteamId(String),
}
