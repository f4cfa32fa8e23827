//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,

    // Date / Time
    pub timezone: String,
    pub date_format: String,

    // Post image
    pub image: ImageConfig,

    // Content store
    pub sanity: SanityConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            timezone: "UTC".to_string(),
            date_format: "M/D/YYYY".to_string(),
            image: ImageConfig::default(),
            sanity: SanityConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Reject values that would only fail later at render time
    pub fn validate(&self) -> Result<()> {
        self.tz()?;
        if self.image.width == 0 || self.image.height == 0 {
            anyhow::bail!("image width and height must be non-zero");
        }
        Ok(())
    }

    /// Timezone used when displaying publish dates
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow::anyhow!("invalid timezone {:?}: {}", self.timezone, e))
    }
}

/// Size requested for the post's header image
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: 550,
            height: 310,
        }
    }
}

/// Connection parameters for the Sanity content store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanityConfig {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    /// Allow possibly stale reads from the API CDN
    pub use_cdn: bool,
    /// Overrides the `https://{project_id}.api.sanity.io` host
    pub api_host: Option<String>,
}

impl Default for SanityConfig {
    fn default() -> Self {
        Self {
            project_id: "w9a2sij1".to_string(),
            dataset: "production".to_string(),
            api_version: "2024-01-01".to_string(),
            use_cdn: false,
            api_host: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SiteConfig::default();
        assert_eq!(config.sanity.project_id, "w9a2sij1");
        assert_eq!(config.sanity.dataset, "production");
        assert_eq!(config.sanity.api_version, "2024-01-01");
        assert!(!config.sanity.use_cdn);
        assert_eq!(config.image.width, 550);
        assert_eq!(config.image.height, 310);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "title: My Blog\ntimezone: America/New_York\nsanity:\n  dataset: staging\n  use_cdn: true"
        )
        .unwrap();

        let config = SiteConfig::load(file.path()).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.sanity.dataset, "staging");
        assert!(config.sanity.use_cdn);
        // untouched keys keep their defaults
        assert_eq!(config.sanity.project_id, "w9a2sij1");
        assert_eq!(config.date_format, "M/D/YYYY");
        assert_eq!(config.tz().unwrap(), chrono_tz::America::New_York);
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timezone: Mars/Olympus").unwrap();
        assert!(SiteConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig::load_or_default(dir.path().join("_config.yml")).unwrap();
        assert_eq!(config.title, "Blog");
    }
}
