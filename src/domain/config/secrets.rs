use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SupabaseSecrets {
    #[serde(rename = "storageUrl")]
    pub storage_url: String,
    #[serde(rename = "apiKey")]
    pub api_key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Secrets {
    #[serde(rename = "supabaseSecrets")]
    pub supabase_secrets: Option<SupabaseSecrets>,
}
