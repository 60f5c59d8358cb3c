use std::collections::BTreeMap;

use serde_json::Value;

/// Read-only site context handed to every rule during one build.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Site {
    pub config: BTreeMap<String, Value>,
}

impl Site {
    pub fn new(config: BTreeMap<String, Value>) -> Self {
        Self { config }
    }

    pub fn config_value(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }
}
