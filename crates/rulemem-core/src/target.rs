use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ItemIdentifier, LayoutIdentifier, PlanError, RepName};

/// One named output rendering of a content item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRep {
    pub item: ItemIdentifier,
    pub name: RepName,
    /// Whether the item's source content is binary.
    #[serde(default)]
    pub binary: bool,
}

impl ItemRep {
    pub fn new(item: impl Into<ItemIdentifier>, name: impl Into<RepName>) -> Self {
        Self {
            item: item.into(),
            name: name.into(),
            binary: false,
        }
    }

    pub fn with_binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    pub fn reference(&self) -> String {
        format!("rep:{}:{}", self.name, self.item)
    }
}

impl fmt::Display for ItemRep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item rep {} ({})", self.item, self.name)
    }
}

/// A template applied around an item representation's content.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layout {
    pub identifier: LayoutIdentifier,
}

impl Layout {
    pub fn new(identifier: impl Into<LayoutIdentifier>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    pub fn reference(&self) -> String {
        format!("layout:{}", self.identifier)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layout {}", self.identifier)
    }
}

/// Anything an action plan can be calculated for.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompilationTarget {
    ItemRep(ItemRep),
    Layout(Layout),
}

impl CompilationTarget {
    /// Stable identity used for memoization and error reporting.
    ///
    /// `rep:<rep-name>:<item-identifier>` or `layout:<layout-identifier>`.
    pub fn reference(&self) -> String {
        match self {
            CompilationTarget::ItemRep(rep) => rep.reference(),
            CompilationTarget::Layout(layout) => layout.reference(),
        }
    }

    /// Parses a reference produced by [`CompilationTarget::reference`].
    /// Item reps come back as text; callers flip the flag when they know better.
    pub fn from_reference(reference: &str) -> Result<Self, PlanError> {
        let unsupported = || PlanError::UnsupportedTarget {
            reference: reference.to_string(),
        };
        let (kind, rest) = reference.split_once(':').ok_or_else(unsupported)?;
        match kind {
            "rep" => {
                let (name, item) = rest.split_once(':').ok_or_else(unsupported)?;
                if name.is_empty() || item.is_empty() {
                    return Err(unsupported());
                }
                Ok(CompilationTarget::ItemRep(ItemRep::new(item, name)))
            }
            "layout" if !rest.is_empty() => Ok(CompilationTarget::Layout(Layout::new(rest))),
            _ => Err(unsupported()),
        }
    }

    pub fn as_item_rep(&self) -> Option<&ItemRep> {
        match self {
            CompilationTarget::ItemRep(rep) => Some(rep),
            CompilationTarget::Layout(_) => None,
        }
    }
}

impl fmt::Display for CompilationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompilationTarget::ItemRep(rep) => fmt::Display::fmt(rep, f),
            CompilationTarget::Layout(layout) => fmt::Display::fmt(layout, f),
        }
    }
}

impl From<ItemRep> for CompilationTarget {
    fn from(rep: ItemRep) -> Self {
        CompilationTarget::ItemRep(rep)
    }
}

impl From<Layout> for CompilationTarget {
    fn from(layout: Layout) -> Self {
        CompilationTarget::Layout(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_roundtrips_through_parser() {
        let rep: CompilationTarget = ItemRep::new("/about.md", "default").into();
        assert_eq!(rep.reference(), "rep:default:/about.md");
        assert_eq!(CompilationTarget::from_reference(&rep.reference()).unwrap(), rep);

        let layout: CompilationTarget = Layout::new("/default.html").into();
        assert_eq!(layout.reference(), "layout:/default.html");
        assert_eq!(CompilationTarget::from_reference("layout:/default.html").unwrap(), layout);
    }

    #[test]
    fn identifiers_may_contain_colons() {
        let parsed = CompilationTarget::from_reference("rep:default:/notes/a:b.md").unwrap();
        assert_eq!(parsed.as_item_rep().unwrap().item.as_str(), "/notes/a:b.md");
    }

    #[test]
    fn unknown_kinds_are_unsupported() {
        for bad in ["item:/about.md", "snapshot:last", "rep:default", "layout:", "nonsense"] {
            assert_eq!(
                CompilationTarget::from_reference(bad),
                Err(PlanError::UnsupportedTarget {
                    reference: bad.to_string()
                })
            );
        }
    }
}
