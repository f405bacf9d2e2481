use reqwest::StatusCode;

#[derive(Debug)]
pub enum TableauError {
    Http(reqwest::Error),
    Status {
        context: &'static str,
        status: StatusCode,
        body: String,
    },
    GraphQl(Vec<String>),
    MissingField(String),
    DatasourceNotFound(String),
    AmbiguousDatasource { name: String, count: usize },
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl From<reqwest::Error> for TableauError {
    fn from(err: reqwest::Error) -> Self {
        TableauError::Http(err)
    }
}

impl From<std::io::Error> for TableauError {
    fn from(err: std::io::Error) -> Self {
        TableauError::Io(err)
    }
}

impl From<serde_json::Error> for TableauError {
    fn from(err: serde_json::Error) -> Self {
        TableauError::Json(err)
    }
}

impl std::fmt::Display for TableauError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableauError::Http(e) => write!(f, "HTTP error: {}", e),
            TableauError::Status { context, status, body } => {
                write!(f, "{} failed with {}: {}", context, status, body)
            }
            TableauError::GraphQl(messages) => {
                write!(f, "Metadata API error: {}", messages.join("; "))
            }
            TableauError::MissingField(field) => {
                write!(f, "Unexpected response: missing {}", field)
            }
            TableauError::DatasourceNotFound(name) => {
                write!(f, "No published data source named '{}'", name)
            }
            TableauError::AmbiguousDatasource { name, count } => write!(
                f,
                "{} published data sources are named '{}', expected exactly one",
                count, name
            ),
            TableauError::Io(e) => write!(f, "IO error: {}", e),
            TableauError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for TableauError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableauError::Http(e) => Some(e),
            TableauError::Io(e) => Some(e),
            TableauError::Json(e) => Some(e),
            _ => None,
        }
    }
}
