use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use super::config::{StateDef, StatesConfig};
use super::types::{AIR, StateId, StateProperties, StateTable};

#[derive(Clone, Debug)]
pub struct StateType {
    pub id: StateId,
    pub name: String,
    pub props: StateProperties,
}

/// State table loaded once at startup. Id 0 is always `air`.
#[derive(Clone, Debug)]
pub struct StateRegistry {
    pub states: HashMap<StateId, StateType>,
    pub by_name: HashMap<String, StateId>,
    next_id: StateId,
}

impl Default for StateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StateRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            states: HashMap::new(),
            by_name: HashMap::new(),
            next_id: 1,
        };
        reg.states.insert(
            AIR,
            StateType {
                id: AIR,
                name: "air".to_string(),
                props: StateProperties::AIR,
            },
        );
        reg.by_name.insert("air".to_string(), AIR);
        reg
    }

    #[inline]
    pub fn get(&self, id: StateId) -> Option<&StateType> {
        self.states.get(&id)
    }

    pub fn id_by_name(&self, name: &str) -> Option<StateId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.len() <= 1
    }

    /// Registers a state and returns its id. Re-registering a name returns the
    /// existing id unchanged.
    pub fn register(
        &mut self,
        name: &str,
        id: Option<StateId>,
        props: StateProperties,
    ) -> Result<StateId, Box<dyn Error>> {
        if let Some(existing) = self.id_by_name(name) {
            return Ok(existing);
        }
        let id = id.unwrap_or(self.next_id);
        if id == AIR {
            return Err(format!("state `{name}` cannot use id 0, which is reserved for air").into());
        }
        if let Some(other) = self.states.get(&id) {
            let taken = &other.name;
            return Err(format!("state `{name}` reuses id {id} already taken by `{taken}`").into());
        }
        self.states.insert(
            id,
            StateType {
                id,
                name: name.to_string(),
                props,
            },
        );
        self.by_name.insert(name.to_string(), id);
        self.next_id = self.next_id.max(id.saturating_add(1));
        Ok(id)
    }

    pub fn from_config(cfg: StatesConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = StateRegistry::new();
        // Explicit ids first so sequential assignment never collides with them.
        let (explicit, implicit): (Vec<StateDef>, Vec<StateDef>) =
            cfg.states.into_iter().partition(|d| d.id.is_some());
        for def in explicit.into_iter().chain(implicit) {
            let props = compile_props(&def);
            reg.register(&def.name, def.id, props)?;
        }
        log::debug!(target: "states", "loaded {} states", reg.len());
        Ok(reg)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: StatesConfig = toml::from_str(toml_str)?;
        Self::from_config(cfg)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}

fn compile_props(def: &StateDef) -> StateProperties {
    let is_fluid = def.fluid.unwrap_or(false);
    StateProperties {
        is_air: false,
        is_fluid,
        light_value: def.light.unwrap_or(0).min(15),
        opacity: def
            .opacity
            .unwrap_or(if is_fluid { 0.5 } else { 1.0 })
            .clamp(0.0, 1.0),
    }
}

impl StateTable for StateRegistry {
    #[inline]
    fn properties(&self, id: StateId) -> Option<StateProperties> {
        self.states.get(&id).map(|t| t.props)
    }
}
