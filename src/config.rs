//! Game configuration for the embed section: the record the page hands us
//! (JSON, camelCase keys), its validation rules and the FiddleBops defaults.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::embed::{LoaderMessages, LoaderSettings};
use crate::error::ConfigError;
use crate::i18n::{self, Language};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOrientation {
    Landscape,
    Portrait,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameControls {
    pub mobile: Vec<String>,
    pub desktop: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingConfig {
    pub message: String,
    /// Watchdog timeout in milliseconds
    pub timeout: u32,
    pub max_retries: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessages {
    pub timeout: String,
    pub not_found: String,
    pub generic: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorConfig {
    pub messages: ErrorMessages,
    /// Delay before an automatic retry, in milliseconds
    pub retry_interval: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeoConfig {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub preview_image: String,
    pub orientation: GameOrientation,
    /// `W:H`, e.g. `16:9`
    pub aspect_ratio: String,
    pub controls: GameControls,
    pub loading: LoadingConfig,
    pub error: ErrorConfig,
    pub seo: SeoConfig,
}

/// CSS selectors of the five page anchors the embed binds to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSelectors {
    pub wrapper: String,
    pub iframe: String,
    pub error: String,
    pub cover: String,
    pub start_button: String,
}

impl Default for GameSelectors {
    fn default() -> Self {
        Self {
            wrapper: ".game-wrapper".into(),
            iframe: ".game-frame".into(),
            error: ".error-message".into(),
            cover: ".game-cover".into(),
            start_button: ".start-button".into(),
        }
    }
}

/// Site-relative paths (`/images/...`) are accepted alongside absolute urls.
pub fn is_valid_url(value: &str) -> bool {
    value.starts_with('/') || Url::parse(value).is_ok()
}

fn is_aspect_ratio(value: &str) -> bool {
    let is_number = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    match value.split_once(':') {
        Some((w, h)) => is_number(w) && is_number(h),
        None => false,
    }
}

fn require_text(value: &str, field: &'static str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::EmptyField { field });
    }
    Ok(())
}

fn require_url(value: &str, field: &'static str) -> Result<(), ConfigError> {
    if !is_valid_url(value) {
        return Err(ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn require_entries(values: &[String], field: &'static str) -> Result<(), ConfigError> {
    if values.iter().any(|v| v.is_empty()) {
        return Err(ConfigError::EmptyEntry { field });
    }
    Ok(())
}

fn require_positive(value: u32, field: &'static str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::NonPositive { field });
    }
    Ok(())
}

impl GameConfig {
    /// Parse a page-supplied configuration and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks run in declaration order; the first violation is reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_text(&self.id, "Game ID")?;
        require_text(&self.name, "Game name")?;
        require_text(&self.description, "Game description")?;
        require_url(&self.url, "Game URL")?;
        require_url(&self.preview_image, "Preview image URL")?;
        if !is_aspect_ratio(&self.aspect_ratio) {
            return Err(ConfigError::InvalidAspectRatio(self.aspect_ratio.clone()));
        }
        require_entries(&self.controls.mobile, "Mobile controls")?;
        require_entries(&self.controls.desktop, "Desktop controls")?;

        require_text(&self.loading.message, "Loading message")?;
        require_positive(self.loading.timeout, "Loading timeout")?;
        require_positive(self.loading.max_retries, "Max retries")?;

        require_text(&self.error.messages.timeout, "Timeout message")?;
        require_text(&self.error.messages.not_found, "Not found message")?;
        require_text(&self.error.messages.generic, "Generic error message")?;
        require_positive(self.error.retry_interval, "Retry interval")?;

        require_text(&self.seo.title, "SEO title")?;
        require_text(&self.seo.description, "SEO description")?;
        require_entries(&self.seo.keywords, "SEO keywords")?;
        Ok(())
    }

    /// Loader parameters for this game. With a language, the user-facing
    /// texts come from the translation table instead of the config.
    pub fn loader_settings(&self, lang: Option<Language>) -> LoaderSettings {
        let messages = match lang {
            Some(lang) => LoaderMessages {
                loading: i18n::translate(lang, "game.loading", &[]),
                timeout: i18n::translate(lang, "game.error.timeout", &[]),
                not_found: i18n::translate(lang, "game.error.notFound", &[]),
                generic: i18n::translate(lang, "game.error.generic", &[]),
            },
            None => LoaderMessages {
                loading: self.loading.message.clone(),
                timeout: self.error.messages.timeout.clone(),
                not_found: self.error.messages.not_found.clone(),
                generic: self.error.messages.generic.clone(),
            },
        };
        LoaderSettings {
            target_url: self.url.clone(),
            load_timeout_ms: self.loading.timeout,
            max_retries: self.loading.max_retries,
            retry_interval_ms: self.error.retry_interval,
            messages,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Self {
            id: "fiddlebops".into(),
            name: "FiddleBops".into(),
            description: "创新音乐节奏游戏".into(),
            url: "https://silkycell.github.io/FiddleBops/".into(),
            preview_image: "/images/FiddleBops.webp".into(),
            orientation: GameOrientation::Landscape,
            aspect_ratio: "16:9".into(),
            controls: GameControls {
                mobile: strings(&["点击并拖动音乐元素", "双指缩放查看全局", "长按解锁新内容"]),
                desktop: strings(&["鼠标拖放音乐元素", "滚轮缩放查看全局", "右键解锁新内容"]),
            },
            loading: LoadingConfig {
                message: "游戏加载中...".into(),
                timeout: 30_000,
                max_retries: 3,
            },
            error: ErrorConfig {
                messages: ErrorMessages {
                    timeout: "游戏加载超时，请检查网络连接".into(),
                    not_found: "游戏资源未找到".into(),
                    generic: "加载游戏时出现错误".into(),
                },
                retry_interval: 1_000,
            },
            seo: SeoConfig {
                title: "FiddleBops - 创新音乐节奏游戏".into(),
                description: "通过简单直观的操作，体验音乐创作的乐趣。适合所有热爱音乐的玩家。".into(),
                keywords: strings(&["音乐游戏", "节奏游戏", "音乐创作"]),
            },
        }
    }
}
