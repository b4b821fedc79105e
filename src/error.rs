use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("chunk pool exhausted ({capacity} chunks all resident)")]
    PoolExhausted { capacity: usize },

    #[error("chunk pool holds {pool} chunks but the visibility window needs {window}")]
    PoolUndersized { pool: usize, window: usize },

    #[error("no asset for tile id {tile_id}")]
    MissingAsset { tile_id: i32 },

    #[error("map load failed: {0}")]
    MapLoad(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
