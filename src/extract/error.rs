use std::path::PathBuf;

#[derive(Debug)]
pub enum ExtractError {
    Io(std::io::Error),
    Zip(zip::result::ZipError),
    Glob(String),
    HyperFileNotFound(PathBuf),
    AmbiguousHyperFile(Vec<PathBuf>),
    Engine(String),
    Database(sqlx::Error),
    MissingColumn(String),
    InvalidDate { column: String, value: String },
}

impl From<std::io::Error> for ExtractError {
    fn from(err: std::io::Error) -> Self {
        ExtractError::Io(err)
    }
}

impl From<zip::result::ZipError> for ExtractError {
    fn from(err: zip::result::ZipError) -> Self {
        ExtractError::Zip(err)
    }
}

impl From<sqlx::Error> for ExtractError {
    fn from(err: sqlx::Error) -> Self {
        ExtractError::Database(err)
    }
}

impl From<glob::PatternError> for ExtractError {
    fn from(err: glob::PatternError) -> Self {
        ExtractError::Glob(err.to_string())
    }
}

impl From<glob::GlobError> for ExtractError {
    fn from(err: glob::GlobError) -> Self {
        ExtractError::Glob(err.to_string())
    }
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Io(e) => write!(f, "IO error: {}", e),
            ExtractError::Zip(e) => write!(f, "Archive error: {}", e),
            ExtractError::Glob(e) => write!(f, "Extract lookup error: {}", e),
            ExtractError::HyperFileNotFound(dir) => {
                write!(f, "No .hyper extract found under {}", dir.display())
            }
            ExtractError::AmbiguousHyperFile(paths) => {
                let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                write!(f, "Expected one .hyper extract, found {}: {}", paths.len(), names.join(", "))
            }
            ExtractError::Engine(msg) => write!(f, "Extract engine error: {}", msg),
            ExtractError::Database(e) => write!(f, "Extract query error: {}", e),
            ExtractError::MissingColumn(name) => write!(f, "Extract has no column '{}'", name),
            ExtractError::InvalidDate { column, value } => {
                write!(f, "Column '{}' holds an unreadable date: '{}'", column, value)
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::Io(e) => Some(e),
            ExtractError::Zip(e) => Some(e),
            ExtractError::Database(e) => Some(e),
            _ => None,
        }
    }
}
