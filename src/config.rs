use anyhow::{Context, Result};
use chrono::{NaiveDate, Weekday};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::schedule::{parse_date, weekday_from_index};

pub const DEFAULT_WORK_ITEM_TYPE: &str = "Hybrid Story";
pub const DEFAULT_ANCHOR_WEEKDAY: u8 = 5;
pub const DEFAULT_EARLIEST: &str = "2022-07-01";
const TOKEN_ENV: &str = "AZURE_DEVOPS_TOKEN";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub azure: Option<AzureConfig>,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize)]
pub struct AzureConfig {
    pub organization_url: String,
    pub project: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ReportConfig {
    pub work_item_type: Option<String>,
    pub anchor_weekday: Option<u8>,
    pub earliest: Option<String>,
}

/// Connection details with the token resolved.
#[derive(Debug)]
pub struct AzureSettings {
    pub organization_url: String,
    pub project: Option<String>,
    pub token: String,
}

impl AppConfig {
    pub fn azure_settings(&self) -> Result<AzureSettings, ReportError> {
        let azure = self.azure.as_ref().ok_or(ReportError::MissingOrganization)?;
        let token = azure
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty()))
            .ok_or(ReportError::MissingToken)?;
        Ok(AzureSettings {
            organization_url: azure.organization_url.clone(),
            project: azure.project.clone(),
            token,
        })
    }

    pub fn work_item_type(&self) -> String {
        self.report
            .work_item_type
            .clone()
            .unwrap_or_else(|| DEFAULT_WORK_ITEM_TYPE.to_string())
    }

    pub fn anchor_weekday(&self) -> Result<Weekday, ReportError> {
        weekday_from_index(self.report.anchor_weekday.unwrap_or(DEFAULT_ANCHOR_WEEKDAY))
    }

    pub fn earliest(&self) -> Result<NaiveDate, ReportError> {
        parse_date(self.report.earliest.as_deref().unwrap_or(DEFAULT_EARLIEST))
    }
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".workstate")
}

fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig =
        toml::from_str(&contents).with_context(|| "Failed to parse config.toml")?;
    Ok(config)
}
