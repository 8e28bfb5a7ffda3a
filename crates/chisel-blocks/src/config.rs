use serde::Deserialize;

// Top-level states config file
#[derive(Deserialize, Debug, Default)]
pub struct StatesConfig {
    #[serde(default)]
    pub states: Vec<StateDef>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StateDef {
    pub name: String,
    // Explicit id; assigned sequentially after the highest seen id when absent
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub light: Option<u8>,
    #[serde(default)]
    pub opacity: Option<f32>,
    #[serde(default)]
    pub fluid: Option<bool>,
}
