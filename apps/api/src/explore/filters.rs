use serde::{Deserialize, Serialize};

use crate::models::search::AdvancedFilters;

/// Active facet selections. List fields have set semantics: `normalized()`
/// sorts and de-duplicates them so equality ignores order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub professions: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub min_profile_score: Option<f64>,
    #[serde(default)]
    pub is_looking_for_job: Option<bool>,
}

impl FilterState {
    pub fn normalized(mut self) -> Self {
        for values in [&mut self.locations, &mut self.professions, &mut self.skills] {
            normalize_set(values);
        }
        self
    }

    pub fn is_active(&self) -> bool {
        !self.locations.is_empty()
            || !self.professions.is_empty()
            || !self.skills.is_empty()
            || self.min_profile_score.is_some()
            || self.is_looking_for_job.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        match self.min_profile_score {
            Some(score) if !score.is_finite() => {
                Err("min_profile_score must be a finite number".to_string())
            }
            Some(score) if score < 0.0 => Err(format!(
                "min_profile_score must be non-negative, got {score}"
            )),
            _ => Ok(()),
        }
    }

    pub fn to_advanced_filters(&self) -> AdvancedFilters {
        AdvancedFilters {
            locations: self.locations.clone(),
            professions: self.professions.clone(),
            skills: self.skills.clone(),
            min_profile_score: self.min_profile_score,
            is_looking_for_job: self.is_looking_for_job,
        }
    }
}

fn normalize_set(values: &mut Vec<String>) {
    values.retain_mut(|v| {
        let trimmed = v.trim();
        if trimmed.len() != v.len() {
            *v = trimmed.to_string();
        }
        !v.is_empty()
    });
    values.sort();
    values.dedup();
}

/// Collapses line breaks to spaces and trims. Applied before a query is used
/// as a search key.
pub fn normalize_query(raw: &str) -> String {
    raw.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_query_collapses_line_breaks() {
        assert_eq!(normalize_query("  react\naws\r\nrust \r"), "react aws rust");
        assert_eq!(normalize_query("\n\n"), "");
    }

    #[test]
    fn test_default_filters_inactive() {
        assert!(!FilterState::default().is_active());
    }

    #[test]
    fn test_any_single_field_activates() {
        let cases = [
            FilterState {
                locations: vec!["Pune".to_string()],
                ..Default::default()
            },
            FilterState {
                professions: vec!["Designer".to_string()],
                ..Default::default()
            },
            FilterState {
                skills: vec!["rust".to_string()],
                ..Default::default()
            },
            FilterState {
                min_profile_score: Some(0.0),
                ..Default::default()
            },
            FilterState {
                is_looking_for_job: Some(false),
                ..Default::default()
            },
        ];
        for filters in cases {
            assert!(filters.is_active(), "{filters:?} should be active");
        }
    }

    #[test]
    fn test_equality_ignores_order_after_normalizing() {
        let a = FilterState {
            skills: vec!["rust".to_string(), "go".to_string(), "go".to_string()],
            ..Default::default()
        }
        .normalized();
        let b = FilterState {
            skills: vec![" go".to_string(), "rust".to_string()],
            ..Default::default()
        }
        .normalized();
        assert_eq!(a, b);
    }

    #[test]
    fn test_blank_values_dropped() {
        let filters = FilterState {
            locations: vec!["  ".to_string()],
            ..Default::default()
        }
        .normalized();
        assert!(!filters.is_active());
    }

    #[test]
    fn test_validate_rejects_negative_score() {
        let filters = FilterState {
            min_profile_score: Some(-1.0),
            ..Default::default()
        };
        assert!(filters.validate().is_err());
        let nan = FilterState {
            min_profile_score: Some(f64::NAN),
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }
}
