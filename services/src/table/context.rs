use serde::Serialize;
use std::collections::HashMap;

/// UI language of the request. Descriptor builders pick labels with [`Language::pick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    Cn,
}

impl Language {
    /// Parses a `lang` parameter or the first tag of an `Accept-Language` header.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag
            .split([',', ';', '-', '_'])
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Self::En),
            "zh" | "cn" => Some(Self::Cn),
            _ => None,
        }
    }

    pub fn pick<'a>(self, en: &'a str, cn: &'a str) -> &'a str {
        match self {
            Self::En => en,
            Self::Cn => cn,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::En => 0,
            Self::Cn => 1,
        }
    }
}

/// Request-scoped input to descriptor builders and action handlers.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    path: String,
    params: HashMap<String, String>,
    language: Language,
    user: Option<String>,
}

impl RequestContext {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Context used to validate every descriptor before the server starts.
    pub fn startup() -> Self {
        Self::new("/")
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Shorthand for `self.language().pick(en, cn).to_owned()`.
    pub fn text(&self, en: &str, cn: &str) -> String {
        self.language.pick(en, cn).to_owned()
    }
}
