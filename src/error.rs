use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Error, Debug)]
pub enum SimError {
    /// Grids need at least one cell per axis.
    #[error("invalid grid dimension {dimension}, expected at least 1")]
    InvalidDimension { dimension: usize },

    /// A grid coordinate outside `[0, dimension]` on either axis.
    #[error("node ({i}, {j}) is outside the grid [0, {dimension}] x [0, {dimension}]")]
    IndexOutOfBounds { i: i64, j: i64, dimension: usize },

    /// Advisory only: the field grew past a sanity bound or stopped being finite.
    #[error("numeric divergence at node {index}: |{value}| exceeds {bound}")]
    NumericDivergence { index: usize, value: f32, bound: f32 },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("png encoding error: {0}")]
    Encoding(#[from] png::EncodingError),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("a frame writer thread panicked")]
    WorkerPanic,
}

impl SimError {
    pub fn config(message: impl Into<String>) -> SimError {
        SimError::InvalidConfig { message: message.into() }
    }
}
