use std::path::PathBuf;
use thetadata_openapi_tools::error::OpenApiToolsError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    OpenApi(#[from] OpenApiToolsError),

    #[error("failed to read descriptions file '{path}': {source}")]
    DescriptionsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse descriptions file '{path}': {source}")]
    DescriptionsParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub type Result<T> = std::result::Result<T, ServerError>;
