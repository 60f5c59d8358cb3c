use std::collections::HashMap;

use rulemem_core::FilterName;

use crate::FilterRegistry;

/// Filter output types declared up front, e.g. from the rules file.
#[derive(Clone, Debug, Default)]
pub struct StaticFilterRegistry {
    filters: HashMap<FilterName, bool>,
}

impl StaticFilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: impl Into<FilterName>, to_binary: bool) -> &mut Self {
        self.filters.insert(name.into(), to_binary);
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl FilterRegistry for StaticFilterRegistry {
    fn to_binary(&self, name: &FilterName) -> Option<bool> {
        self.filters.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_filters_report_output_type() {
        let mut reg = StaticFilterRegistry::new();
        reg.declare("erb", false).declare("thumbnail", true);
        assert_eq!(reg.to_binary(&"erb".into()), Some(false));
        assert_eq!(reg.to_binary(&"thumbnail".into()), Some(true));
        assert_eq!(reg.to_binary(&"sass".into()), None);
    }
}
