use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn from_str(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

id_newtype!(ItemIdentifier);
id_newtype!(LayoutIdentifier);
id_newtype!(RepName);
id_newtype!(FilterName);
id_newtype!(SnapshotName);

impl RepName {
    pub fn default_rep() -> Self {
        Self::new("default")
    }
}

impl SnapshotName {
    /// Content before any filter ran.
    pub fn raw() -> Self {
        Self::new("raw")
    }

    /// Content right before the first layout was applied.
    pub fn pre() -> Self {
        Self::new("pre")
    }

    /// Content after all layouts were applied.
    pub fn post() -> Self {
        Self::new("post")
    }

    /// Final content of the representation.
    pub fn last() -> Self {
        Self::new("last")
    }

    /// Bookkeeping names generated for `write` calls look like `_1`, `_2`, ...
    pub fn is_temporary(&self) -> bool {
        match self.0.strip_prefix('_') {
            Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
            None => false,
        }
    }

    pub fn temporary(n: u32) -> Self {
        Self(format!("_{n}"))
    }
}

impl ItemIdentifier {
    /// Extension without the leading dot, if the last component has one.
    pub fn ext(&self) -> Option<&str> {
        let last = self.0.rsplit('/').next().unwrap_or(&self.0);
        match last.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&last[idx + 1..]),
        }
    }

    pub fn without_ext(&self) -> &str {
        match self.ext() {
            Some(ext) => &self.0[..self.0.len() - ext.len() - 1],
            None => &self.0,
        }
    }
}
