use std::{env, fs, io, path::Path};

use serde::Deserialize;

use crate::error::AppError;

/// Connection settings for one Canvas course.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CanvasConfig {
    pub base_url: String,
    pub course_id: String,
    pub token: String,
}

/// Shape of the optional `defaults.json` file.
#[derive(Debug, Default, Deserialize)]
struct DefaultsFile {
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default, rename = "courseID")]
    course_id: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

impl CanvasConfig {
    /// Loads defaults from `path` (if it exists), then lets `CANVAS_HOST`,
    /// `CANVAS_COURSE_ID` and `CANVAS_TOKEN` override them.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let mut config = Self::from_defaults_file(path)?;
        config.apply_env();
        Ok(config)
    }

    pub fn from_defaults_file(path: &Path) -> Result<Self, AppError> {
        let defaults = match fs::read_to_string(path) {
            Ok(text) => serde_json::from_str::<DefaultsFile>(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => DefaultsFile::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            base_url: defaults.hostname.unwrap_or_default(),
            course_id: defaults.course_id.unwrap_or_default(),
            token: defaults.token.unwrap_or_default(),
        })
    }

    fn apply_env(&mut self) {
        if let Ok(host) = env::var("CANVAS_HOST") {
            self.base_url = host;
        }
        if let Ok(course_id) = env::var("CANVAS_COURSE_ID") {
            self.course_id = course_id;
        }
        if let Ok(token) = env::var("CANVAS_TOKEN") {
            self.token = token;
        }
    }

    /// Applies explicit overrides, typically from the command line.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        course_id: Option<String>,
        token: Option<String>,
    ) -> Self {
        if let Some(host) = host {
            self.base_url = host;
        }
        if let Some(course_id) = course_id {
            self.course_id = course_id;
        }
        if let Some(token) = token {
            self.token = token;
        }
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.base_url.trim().is_empty() {
            return Err(AppError::Config("host is not set".to_string()));
        }
        if self.course_id.trim().is_empty() {
            return Err(AppError::Config("course ID is not set".to_string()));
        }
        if self.token.trim().is_empty() {
            return Err(AppError::Config("token is not set".to_string()));
        }
        Ok(())
    }

    /// `<host>/api/v1/`, adding the slash after the host when missing.
    pub fn api_root(&self) -> String {
        let host = self.base_url.trim();
        if host.ends_with('/') {
            format!("{}api/v1/", host)
        } else {
            format!("{}/api/v1/", host)
        }
    }
}
