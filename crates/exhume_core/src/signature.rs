//! Validated file-type signature definitions and the registry that owns them.

use crate::error::{CarveError, Result};
use tracing::warn;

/// The already-parsed key/value fields declared for one file type, before
/// validation. Produced by an external configuration loader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSignature {
    /// Hexadecimal header pattern, e.g. `FFD8FF` for JPEG.
    pub header: Option<String>,
    /// Hexadecimal footer pattern, if the format has a reliable end marker.
    pub footer: Option<String>,
}

/// A validated signature: a non-empty header pattern and an optional
/// non-empty footer pattern for one named file type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureDefinition {
    type_name: String,
    header: Vec<u8>,
    footer: Option<Vec<u8>>,
}

impl SignatureDefinition {
    pub fn new(
        type_name: impl Into<String>,
        header: Vec<u8>,
        footer: Option<Vec<u8>>,
    ) -> Result<Self> {
        let type_name = type_name.into();
        if type_name.is_empty() {
            return Err(CarveError::Configuration("empty type name".to_string()));
        }
        if header.is_empty() {
            return Err(CarveError::Configuration(format!(
                "empty header for type '{type_name}'"
            )));
        }
        if footer.as_ref().is_some_and(|f| f.is_empty()) {
            return Err(CarveError::Configuration(format!(
                "empty footer for type '{type_name}'"
            )));
        }
        Ok(Self {
            type_name,
            header,
            footer,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn header(&self) -> &[u8] {
        &self.header
    }

    pub fn footer(&self) -> Option<&[u8]> {
        self.footer.as_deref()
    }
}

/// Ordered collection of validated signatures for one carve run.
///
/// Iteration order is insertion order; the orchestrator relies on this for
/// reproducible output.
#[derive(Debug, Default)]
pub struct SignatureRegistry {
    signatures: Vec<SignatureDefinition>,
}

impl SignatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from an ordered sequence of `(type_name, fields)`
    /// entries as produced by a signature file loader.
    ///
    /// A type declared without a header is skipped with a warning; every
    /// other malformed entry is a configuration error that aborts the run
    /// before any scanning happens.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, RawSignature)>,
    {
        let mut registry = Self::new();
        for (type_name, raw) in entries {
            if type_name.is_empty() {
                return Err(CarveError::Configuration("empty type name".to_string()));
            }
            let Some(header_hex) = raw.header else {
                warn!(type_name = %type_name, "no header defined for file type, skipping");
                continue;
            };
            let header = decode_hex(&type_name, "header", &header_hex)?;
            let footer = match raw.footer {
                Some(hex) => Some(decode_hex(&type_name, "footer", &hex)?),
                None => None,
            };
            registry.register(SignatureDefinition::new(type_name, header, footer)?)?;
        }
        Ok(registry)
    }

    /// Appends a signature, rejecting duplicate type names.
    pub fn register(&mut self, signature: SignatureDefinition) -> Result<()> {
        if self
            .signatures
            .iter()
            .any(|s| s.type_name() == signature.type_name())
        {
            return Err(CarveError::Configuration(format!(
                "duplicate type name '{}'",
                signature.type_name()
            )));
        }
        self.signatures.push(signature);
        Ok(())
    }

    pub fn signatures(&self) -> &[SignatureDefinition] {
        &self.signatures
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

fn decode_hex(type_name: &str, field: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|e| {
        CarveError::Configuration(format!("invalid {field} for type '{type_name}': {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(header: Option<&str>, footer: Option<&str>) -> RawSignature {
        RawSignature {
            header: header.map(str::to_string),
            footer: footer.map(str::to_string),
        }
    }

    #[test]
    fn from_entries_decodes_hex_patterns() {
        let registry = SignatureRegistry::from_entries(vec![
            ("jpeg".to_string(), raw(Some("FFD8FF"), Some("FFD9"))),
            ("bmp".to_string(), raw(Some("424D"), None)),
        ])
        .unwrap();

        assert_eq!(registry.len(), 2);
        let jpeg = &registry.signatures()[0];
        assert_eq!(jpeg.type_name(), "jpeg");
        assert_eq!(jpeg.header(), &[0xFF, 0xD8, 0xFF]);
        assert_eq!(jpeg.footer(), Some(&[0xFF, 0xD9][..]));
        assert_eq!(registry.signatures()[1].footer(), None);
    }

    #[test]
    fn from_entries_preserves_declaration_order() {
        let registry = SignatureRegistry::from_entries(vec![
            ("zzz".to_string(), raw(Some("01"), None)),
            ("aaa".to_string(), raw(Some("02"), None)),
            ("mmm".to_string(), raw(Some("03"), None)),
        ])
        .unwrap();

        let names: Vec<_> = registry
            .signatures()
            .iter()
            .map(|s| s.type_name())
            .collect();
        assert_eq!(names, vec!["zzz", "aaa", "mmm"]);
    }

    #[test]
    fn type_without_header_is_skipped_not_fatal() {
        let registry = SignatureRegistry::from_entries(vec![
            ("broken".to_string(), raw(None, Some("FFD9"))),
            ("jpeg".to_string(), raw(Some("FFD8FF"), Some("FFD9"))),
        ])
        .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.signatures()[0].type_name(), "jpeg");
    }

    #[test]
    fn odd_length_hex_is_configuration_error() {
        let err = SignatureRegistry::from_entries(vec![(
            "jpeg".to_string(),
            raw(Some("FFD8F"), None),
        )])
        .unwrap_err();
        assert!(matches!(err, CarveError::Configuration(_)));
    }

    #[test]
    fn non_hex_characters_are_configuration_error() {
        let err = SignatureRegistry::from_entries(vec![(
            "jpeg".to_string(),
            raw(Some("GGHH"), None),
        )])
        .unwrap_err();
        assert!(matches!(err, CarveError::Configuration(_)));
    }

    #[test]
    fn empty_type_name_is_configuration_error() {
        let err =
            SignatureRegistry::from_entries(vec![(String::new(), raw(Some("FF"), None))])
                .unwrap_err();
        assert!(matches!(err, CarveError::Configuration(_)));
    }

    #[test]
    fn empty_footer_is_configuration_error() {
        let err = SignatureRegistry::from_entries(vec![(
            "jpeg".to_string(),
            raw(Some("FFD8FF"), Some("")),
        )])
        .unwrap_err();
        assert!(matches!(err, CarveError::Configuration(_)));
    }

    #[test]
    fn duplicate_type_name_is_configuration_error() {
        let err = SignatureRegistry::from_entries(vec![
            ("jpeg".to_string(), raw(Some("FFD8FF"), None)),
            ("jpeg".to_string(), raw(Some("FFD8FF"), None)),
        ])
        .unwrap_err();
        assert!(matches!(err, CarveError::Configuration(_)));
    }
}
