//! Languages offered by legendas.tv and their numeric site codes

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing an unsupported language tag
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

/// A subtitle language available on legendas.tv
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    BrazilianPortuguese,
    English,
    Spanish,
    French,
    German,
    Japanese,
    Danish,
    Norwegian,
    Swedish,
    Portuguese,
    Arabic,
    Czech,
    Chinese,
    Korean,
    Bulgarian,
    Italian,
    Polish,
}

impl Language {
    /// Every supported language, in site code order
    pub const ALL: [Language; 17] = [
        Language::BrazilianPortuguese,
        Language::English,
        Language::Spanish,
        Language::French,
        Language::German,
        Language::Japanese,
        Language::Danish,
        Language::Norwegian,
        Language::Swedish,
        Language::Portuguese,
        Language::Arabic,
        Language::Czech,
        Language::Chinese,
        Language::Korean,
        Language::Bulgarian,
        Language::Italian,
        Language::Polish,
    ];

    /// The numeric code legendas.tv uses in listing URLs
    pub fn legendastv_code(self) -> u8 {
        match self {
            Language::BrazilianPortuguese => 1,
            Language::English => 2,
            Language::Spanish => 3,
            Language::French => 4,
            Language::German => 5,
            Language::Japanese => 6,
            Language::Danish => 7,
            Language::Norwegian => 8,
            Language::Swedish => 9,
            Language::Portuguese => 10,
            Language::Arabic => 11,
            Language::Czech => 12,
            Language::Chinese => 13,
            Language::Korean => 14,
            Language::Bulgarian => 15,
            Language::Italian => 16,
            Language::Polish => 17,
        }
    }

    pub fn from_legendastv_code(code: u8) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|language| language.legendastv_code() == code)
    }

    /// IETF-style tag, e.g. "pt-BR"
    pub fn tag(self) -> &'static str {
        match self {
            Language::BrazilianPortuguese => "pt-BR",
            Language::English => "en",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
            Language::Japanese => "ja",
            Language::Danish => "da",
            Language::Norwegian => "no",
            Language::Swedish => "sv",
            Language::Portuguese => "pt",
            Language::Arabic => "ar",
            Language::Czech => "cs",
            Language::Chinese => "zh",
            Language::Korean => "ko",
            Language::Bulgarian => "bg",
            Language::Italian => "it",
            Language::Polish => "pl",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    /// Accepts tags case-insensitively with `-` or `_` separators ("pt_br", "PT-BR")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "-");

        Self::ALL
            .into_iter()
            .find(|language| language.tag().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| UnsupportedLanguage(s.to_string()))
    }
}
