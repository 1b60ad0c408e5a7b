//! English / Chinese strings used by the game section, with `{name}`
//! placeholder interpolation and fallback to the default language.

use log::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    En,
    Zh,
}

pub const DEFAULT_LANGUAGE: Language = Language::En;
pub const LANGUAGES: [Language; 2] = [Language::En, Language::Zh];

impl Language {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Language::En),
            "zh" => Some(Language::Zh),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Zh => "中文",
        }
    }

    fn table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Language::En => EN,
            Language::Zh => ZH,
        }
    }
}

const EN: &[(&str, &str)] = &[
    ("game.loading", "Loading FiddleBops..."),
    ("game.start", "Start Game"),
    ("game.retry", "Retry"),
    ("game.frameTitle", "FiddleBops - A Musical Creation Game"),
    ("game.error.timeout", "Game loading timed out, please check your network connection"),
    ("game.error.notFound", "Game resources not found"),
    ("game.error.generic", "An error occurred while loading the game"),
    ("game.error.attempts", "Failed after {count} attempts"),
    ("footer.copyright", "© {year} FiddleBops. All rights reserved."),
];

// Missing keys fall back to EN.
const ZH: &[(&str, &str)] = &[
    ("game.loading", "FiddleBops 加载中..."),
    ("game.start", "开始游戏"),
    ("game.retry", "重试"),
    ("game.frameTitle", "FiddleBops - 音乐创作游戏"),
    ("game.error.timeout", "游戏加载超时，请检查网络连接"),
    ("game.error.notFound", "游戏资源未找到"),
    ("game.error.generic", "加载游戏时出现错误"),
    ("footer.copyright", "© {year} FiddleBops. 保留所有权利。"),
];

/// Untranslated text for `key` in `lang` only, without fallback.
pub fn lookup(lang: Language, key: &str) -> Option<&'static str> {
    lang.table().iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Translate `key`, substituting every `{name}` placeholder found in `params`.
/// An unknown key is returned verbatim.
pub fn translate(lang: Language, key: &str, params: &[(&str, &str)]) -> String {
    let Some(text) = lookup(lang, key).or_else(|| lookup(DEFAULT_LANGUAGE, key)) else {
        warn!("missing translation key {key:?} for {}", lang.code());
        return key.to_string();
    };
    params.iter().fold(text.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{name}}}"), value)
    })
}

pub fn keys(lang: Language) -> impl Iterator<Item = &'static str> {
    lang.table().iter().map(|(k, _)| *k)
}

/// First segment of an absolute path (`/zh/...`) if it names a language,
/// else the default.
pub fn lang_from_path(path: &str) -> Language {
    path.split('/')
        .nth(1)
        .and_then(Language::from_code)
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Default language keeps `path`; others get a `/{code}` prefix.
pub fn translate_path(path: &str, target: Language) -> String {
    if target == DEFAULT_LANGUAGE {
        path.to_string()
    } else {
        format!("/{}{}", target.code(), path)
    }
}

/// Resolve a `navigator.language` value such as `zh-CN`.
pub fn browser_language(navigator_language: Option<&str>) -> Language {
    navigator_language
        .and_then(|tag| tag.split('-').next())
        .and_then(Language::from_code)
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Placeholder mismatches between a text and the params supplied for it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamReport {
    pub missing: Vec<String>,
    pub unused: Vec<String>,
}

impl ParamReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.unused.is_empty()
    }
}

/// Names of `{word}` placeholders in order of appearance.
pub fn placeholders(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    out.push(name);
                }
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    out
}

pub fn check_params(text: &str, params: &[(&str, &str)]) -> ParamReport {
    let found = placeholders(text);
    ParamReport {
        missing: found
            .iter()
            .filter(|p| !params.iter().any(|(k, _)| *k == **p))
            .map(|p| p.to_string())
            .collect(),
        unused: params
            .iter()
            .filter(|(k, _)| !found.contains(k))
            .map(|(k, _)| k.to_string())
            .collect(),
    }
}
