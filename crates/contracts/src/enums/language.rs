use serde::{Deserialize, Serialize};

/// Языки озвучки и субтитров курса
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Language {
    Polish,
    English,
    German,
    Spanish,
    French,
    Russian,
}

impl Language {
    /// Код языка ISO 639-1
    pub fn code(&self) -> &'static str {
        match self {
            Language::Polish => "pl",
            Language::English => "en",
            Language::German => "de",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::Russian => "ru",
        }
    }

    /// Получить все языки
    pub fn all() -> Vec<Language> {
        vec![
            Language::Polish,
            Language::English,
            Language::German,
            Language::Spanish,
            Language::French,
            Language::Russian,
        ]
    }

    /// Парсинг из кода
    pub fn from_code(code: &str) -> Option<Self> {
        Language::all()
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
