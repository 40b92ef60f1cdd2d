// Session configuration read from an INI file:
//
//   [client]
//   webservice = https://example.com
//   upload_file = basketball.jpg   (optional)
//   exif_file = eng.jpg            (optional)

use crate::error::{ClientError, Result};
use ini::Ini;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "photoapp-client-config";
pub const DEFAULT_UPLOAD_FILE: &str = "basketball.jpg";
pub const DEFAULT_EXIF_FILE: &str = "eng.jpg";

const SECTION: &str = "client";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the web service, without a trailing slash.
    pub webservice: String,
    /// Image whose bytes are uploaded.
    pub upload_file: PathBuf,
    /// Image the GPS position and timestamp are read from.
    pub exif_file: PathBuf,
}

impl ClientConfig {
    /// Load the configuration from `path`. A missing file is reported as
    /// `ClientError::ConfigMissing` so the caller can exit quietly.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ClientError::ConfigMissing(path.display().to_string()));
        }
        let ini = Ini::load_from_file(path)
            .map_err(|e| ClientError::Configuration(format!("{}: {}", path.display(), e)))?;
        Self::from_ini(&ini)
    }

    pub fn from_ini(ini: &Ini) -> Result<Self> {
        let webservice = ini
            .get_from(Some(SECTION), "webservice")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ClientError::Configuration("missing setting [client] webservice".into())
            })?;

        let file_or = |key: &str, default: &str| -> PathBuf {
            ini.get_from(Some(SECTION), key)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .into()
        };

        Ok(ClientConfig {
            webservice: webservice.trim_end_matches('/').to_string(),
            upload_file: file_or("upload_file", DEFAULT_UPLOAD_FILE),
            exif_file: file_or("exif_file", DEFAULT_EXIF_FILE),
        })
    }
}
