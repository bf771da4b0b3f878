use serde::{Deserialize, Serialize};

/// One skill on a profile. The backend returns either a bare name or a
/// `{ name, level }` object depending on how the profile was edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Skill {
    Name(String),
    Detailed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<String>,
    },
}

impl Skill {
    pub fn name(&self) -> &str {
        match self {
            Skill::Name(name) => name,
            Skill::Detailed { name, .. } => name,
        }
    }

    /// Lower-cased skill name used for term matching.
    pub fn normalized_name(&self) -> String {
        self.name().trim().to_lowercase()
    }
}

/// A profile hit as returned by the search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub profile_score: f64,
    #[serde(default)]
    pub is_looking_for_job: bool,
    /// Derived client-side in search mode; never stored by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_percentage: Option<u8>,
}
