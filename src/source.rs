//! Script sources.
//!
//! A script is read from a local path, a `file://` URL or an `http(s)://` URL.
//! DDL and DML may come from two sources, joined with a line break.

use std::fmt;
use std::path::PathBuf;

use tracing::info;
use url::Url;

use crate::error::{Result, SubmitError};

/// Where a script is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    Path(PathBuf),
    Remote(Url),
}

impl ScriptSource {
    /// Classifies a command-line source argument.
    pub fn parse(source: &str) -> Result<Self> {
        if !source.contains("://") {
            return Ok(Self::Path(PathBuf::from(source)));
        }

        let url = Url::parse(source)
            .map_err(|e| SubmitError::source(format!("Invalid source URL '{source}': {e}")))?;
        match url.scheme() {
            "file" => url
                .to_file_path()
                .map(Self::Path)
                .map_err(|_| SubmitError::source(format!("Invalid file URL '{source}'"))),
            "http" | "https" => Ok(Self::Remote(url)),
            scheme => Err(SubmitError::source(format!(
                "Unsupported source scheme '{scheme}'. Expected file, http or https"
            ))),
        }
    }

    /// Reads the whole source as UTF-8 text.
    pub async fn read(&self) -> Result<String> {
        match self {
            Self::Path(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                SubmitError::source(format!("Failed to read {}: {e}", path.display()))
            }),
            Self::Remote(url) => {
                let response = reqwest::get(url.clone())
                    .await
                    .and_then(|response| response.error_for_status())
                    .map_err(|e| SubmitError::source(format!("Failed to fetch {url}: {e}")))?;
                response
                    .text()
                    .await
                    .map_err(|e| SubmitError::source(format!("Failed to read {url}: {e}")))
            }
        }
    }
}

impl fmt::Display for ScriptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// The sources making up one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSources {
    /// One complete script.
    Single(ScriptSource),
    /// DDL followed by DML.
    Split { ddl: ScriptSource, dml: ScriptSource },
}

impl ScriptSources {
    /// Reads the script text; split sources are joined DDL first.
    pub async fn read_script(&self) -> Result<String> {
        match self {
            Self::Single(source) => {
                info!("Reading script from {source}");
                source.read().await
            }
            Self::Split { ddl, dml } => {
                info!("Reading DDL from {ddl} and DML from {dml}");
                let ddl = ddl.read().await?;
                let dml = dml.read().await?;
                Ok(format!("{ddl}\n{dml}"))
            }
        }
    }
}
