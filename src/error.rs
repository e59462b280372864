use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model encoding error: {0}")]
    ModelCodec(#[from] bincode::Error),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Face detector error: {0}")]
    Detector(String),

    #[cfg(feature = "live")]
    #[error("Camera error: {0}")]
    Camera(String),
}

pub type Result<T> = std::result::Result<T, Error>;
