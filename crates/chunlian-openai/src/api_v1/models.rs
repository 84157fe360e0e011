use serde::Deserialize;

/// Response of `GET {base_url}/models`.
#[derive(Debug, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub data: Vec<ModelObject>,
}

#[derive(Debug, Deserialize)]
pub struct ModelObject {
    pub id: String,
    #[serde(default)]
    pub owned_by: Option<String>,
}

impl ModelList {
    pub fn ids(self) -> Vec<String> {
        self.data.into_iter().map(|m| m.id).collect()
    }
}
