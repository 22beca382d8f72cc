use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Hazard severity shown to end users.
///
/// Serialized with the native labels used by the backend and the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskLevel {
    #[serde(rename = "Alto")]
    High,
    #[serde(rename = "Médio")]
    Medium,
    #[serde(rename = "Baixo")]
    Low,
}

impl RiskLevel {
    /// Classifies free-text feed severity. Anything that is not recognisably
    /// "perigo" or "atenção" is Low, including the empty string.
    pub fn classify(severity: &str) -> Self {
        let lowered = severity.to_lowercase();
        if lowered.contains("perigo") {
            RiskLevel::High
        } else if lowered.contains("atenção") || lowered.contains("atencao") {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Parses either vocabulary: the native enum labels ("Alto", "MEDIO", "High")
    /// or the feed labels ("Perigo Potencial", "Atenção", "Observação").
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            "alto" | "high" => Some(RiskLevel::High),
            "médio" | "medio" | "medium" => Some(RiskLevel::Medium),
            "baixo" | "low" => Some(RiskLevel::Low),
            "" => None,
            other if other.contains("perigo") => Some(RiskLevel::High),
            other if other.contains("atenção") || other.contains("atencao") => {
                Some(RiskLevel::Medium)
            }
            other if other.contains("observação") || other.contains("observacao") => {
                Some(RiskLevel::Low)
            }
            _ => None,
        }
    }

    /// Canonical level for a value that is expected to already be canonical
    /// (user reports). Unknown values degrade the same way feed text does.
    pub fn from_native(label: &str) -> Self {
        Self::parse(label).unwrap_or_else(|| Self::classify(label))
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::High => "Alto",
            RiskLevel::Medium => "Médio",
            RiskLevel::Low => "Baixo",
        }
    }

    /// Label expected by the backend when creating alerts.
    pub fn backend_code(&self) -> &'static str {
        match self {
            RiskLevel::High => "ALTO",
            RiskLevel::Medium => "MEDIO",
            RiskLevel::Low => "BAIXO",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        RiskLevel::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown risk level '{}'", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_vocabulary_is_classified() {
        assert_eq!(RiskLevel::classify("Perigo Potencial"), RiskLevel::High);
        assert_eq!(RiskLevel::classify("Grande Perigo"), RiskLevel::High);
        assert_eq!(RiskLevel::classify("Atenção"), RiskLevel::Medium);
        assert_eq!(RiskLevel::classify("ATENÇÃO"), RiskLevel::Medium);
    }

    #[test]
    fn unknown_severity_defaults_to_low() {
        assert_eq!(RiskLevel::classify(""), RiskLevel::Low);
        assert_eq!(RiskLevel::classify("observação"), RiskLevel::Low);
        assert_eq!(RiskLevel::classify("qualquer coisa"), RiskLevel::Low);
    }

    #[test]
    fn both_vocabularies_are_one_class() {
        assert_eq!(RiskLevel::parse("Alto"), RiskLevel::parse("Perigo Potencial"));
        assert_eq!(RiskLevel::parse("Médio"), RiskLevel::parse("Atenção"));
        assert_eq!(RiskLevel::parse("Baixo"), RiskLevel::parse("Observação"));
        assert_eq!(RiskLevel::parse("MEDIO"), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::parse("High"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::parse("nada"), None);
    }

    #[test]
    fn native_values_skip_reclassification() {
        assert_eq!(RiskLevel::from_native("BAIXO"), RiskLevel::Low);
        assert_eq!(RiskLevel::from_native("ALTO"), RiskLevel::High);
        assert_eq!(RiskLevel::from_native(""), RiskLevel::Low);
    }

    #[test]
    fn serializes_native_labels() {
        assert_eq!(serde_json::to_string(&RiskLevel::Medium).unwrap(), "\"Médio\"");
        let parsed: RiskLevel = serde_json::from_str("\"Perigo Potencial\"").unwrap();
        assert_eq!(parsed, RiskLevel::High);
    }
}
