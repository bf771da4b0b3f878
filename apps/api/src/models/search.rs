use serde::{Deserialize, Serialize};

use crate::models::profile::ResultItem;

/// One page of hits for a single page index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    #[serde(default)]
    pub hits: Vec<ResultItem>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValue {
    pub value: String,
    pub count: u64,
}

/// Available filter values and their counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetSet {
    #[serde(default)]
    pub locations: Vec<FacetValue>,
    #[serde(default)]
    pub professions: Vec<FacetValue>,
    #[serde(default)]
    pub skills: Vec<FacetValue>,
}

/// Facet filters as the backend expects them. Sent only in search mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedFilters {
    pub locations: Vec<String>,
    pub professions: Vec<String>,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_profile_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_looking_for_job: Option<bool>,
}

/// Body of a `searchUsers` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub q: String,
    pub limit: usize,
    pub page: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_filters: Option<AdvancedFilters>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_request_wire_shape() {
        let request = SearchRequest {
            q: "rust".to_string(),
            limit: 24,
            page: 0,
            advanced_filters: Some(AdvancedFilters {
                locations: vec!["Berlin".to_string()],
                min_profile_score: Some(60.0),
                ..Default::default()
            }),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["advancedFilters"]["locations"], json!(["Berlin"]));
        assert_eq!(value["advancedFilters"]["minProfileScore"], json!(60.0));
        assert!(value["advancedFilters"].get("isLookingForJob").is_none());
    }

    #[test]
    fn test_browse_request_omits_filters() {
        let request = SearchRequest {
            q: String::new(),
            limit: 5,
            page: 4,
            advanced_filters: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("advancedFilters").is_none());
        assert_eq!(value["page"], json!(4));
    }

    #[test]
    fn test_facet_set_tolerates_missing_dimensions() {
        let facets: FacetSet = serde_json::from_value(json!({
            "skills": [{ "value": "rust", "count": 12 }]
        }))
        .unwrap();
        assert!(facets.locations.is_empty());
        assert_eq!(facets.skills[0].count, 12);
    }
}
