#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("item not found: {0}")]
    ItemNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
