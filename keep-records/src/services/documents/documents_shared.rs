use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use keep_core::{Entity, IntoUpdateMap, KeepError, KeepResult, Patch, UpdateMap};
use serde::{Deserialize, Serialize};

/// Persisted field holding the owning user's id.
pub const OWNER_FIELD: &str = "user_id";

/// Declared category of an identity document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Passport,
    IdCard,
    #[serde(rename = "driver_licence")]
    DriverLicence,
    #[default]
    Other,
}

impl DocumentType {
    /// Parse a category name as callers send it (`PASSPORT`, `ID_CARD`,
    /// `DRIVER_LICENSE`, `OTHER`), ignoring case.
    pub fn parse(name: &str) -> KeepResult<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "PASSPORT" => Ok(Self::Passport),
            "ID_CARD" => Ok(Self::IdCard),
            "DRIVER_LICENSE" => Ok(Self::DriverLicence),
            "OTHER" => Ok(Self::Other),
            _ => Err(KeepError::invalid_argument(format!(
                "invalid document type: {name}"
            ))),
        }
    }

    /// The persisted value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passport => "passport",
            Self::IdCard => "id_card",
            Self::DriverLicence => "driver_licence",
            Self::Other => "other",
        }
    }
}

impl FromStr for DocumentType {
    type Err = KeepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one stored document blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: i64,
    #[serde(rename = "type", default)]
    pub doc_type: DocumentType,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Document {
    const CREATED_AT: Option<&'static str> = Some("created_at");
    const UPDATED_AT: Option<&'static str> = Some("updated_at");

    fn id(&self) -> &str {
        &self.id
    }
}

/// Fields rewritten when a document's content is replaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub size: Patch<i64>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub content_type: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub path: Patch<String>,
}

impl IntoUpdateMap for DocumentPatch {
    fn to_update_map(&self) -> KeepResult<UpdateMap> {
        let mut map = UpdateMap::new();
        map.apply("name", &self.name)?
            .apply("size", &self.size)?
            .apply("content_type", &self.content_type)?
            .apply("path", &self.path)?;
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keep_core::ErrorKind;

    #[test]
    fn parse_ignores_case() {
        assert_eq!(DocumentType::parse("passport").unwrap(), DocumentType::Passport);
        assert_eq!(DocumentType::parse("Id_Card").unwrap(), DocumentType::IdCard);
        assert_eq!(
            "DRIVER_LICENSE".parse::<DocumentType>().unwrap(),
            DocumentType::DriverLicence
        );
        assert_eq!(DocumentType::parse("other").unwrap(), DocumentType::Other);
    }

    #[test]
    fn unknown_category_is_invalid_argument() {
        let err = DocumentType::parse("SELFIE").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn persisted_values_match_display() {
        for doc_type in [
            DocumentType::Passport,
            DocumentType::IdCard,
            DocumentType::DriverLicence,
            DocumentType::Other,
        ] {
            let value = serde_json::to_value(doc_type).unwrap();
            assert_eq!(value, doc_type.to_string());
        }
    }

    #[test]
    fn document_type_is_stored_under_type() {
        let doc = Document {
            id: "d1".to_string(),
            doc_type: DocumentType::IdCard,
            ..Document::default()
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["type"], "id_card");
    }

    #[test]
    fn patch_skips_unchanged_fields() {
        let patch = DocumentPatch {
            path: Patch::Set("documents/u1/a.png".to_string()),
            size: Patch::Set(10),
            ..DocumentPatch::default()
        };
        let map = patch.to_update_map().unwrap();
        let keys: Vec<_> = map.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["path", "size"]);
    }
}
