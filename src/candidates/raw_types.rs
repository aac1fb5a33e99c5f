/// legendas.tv suggestion records for deserialization.
///
/// These structures mirror the JSON returned by `/legenda/sugestao/{keyword}`.
/// The catalog is inconsistent about value types: ids and years show up both
/// as strings and as numbers, and most fields may be null.
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One suggestion record
#[derive(Debug, Deserialize)]
pub(super) struct RawSearchHit {
    #[serde(rename = "_source")]
    pub source: RawSource,
}

/// The catalog fields of a suggestion
#[derive(Debug, Deserialize)]
pub(super) struct RawSource {
    /// Catalog id, used to build listing URLs
    #[serde(deserialize_with = "lenient_text")]
    pub id_filme: Option<String>,
    /// IMDB id, sometimes prefixed with "tt"
    #[serde(default, deserialize_with = "lenient_text")]
    pub id_imdb: Option<String>,
    /// Type code: M (movie), S (series), C (collection)
    #[serde(default, deserialize_with = "lenient_text")]
    pub tipo: Option<String>,
    /// Original title
    #[serde(default, deserialize_with = "lenient_text")]
    pub dsc_nome: Option<String>,
    /// Localized title, e.g. "Breaking Bad - 4ª Temporada"
    #[serde(default, deserialize_with = "lenient_text")]
    pub dsc_nome_br: Option<String>,
    /// Season number, frequently null
    #[serde(default, deserialize_with = "lenient_text")]
    pub temporada: Option<String>,
    /// Release year
    #[serde(default, deserialize_with = "lenient_text")]
    pub dsc_data_lancamento: Option<String>,
}

/// Accepts strings and numbers as text; everything else becomes `None`
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}
