//! Naming scope carried alongside create and lookup calls.

/// Optional name and API key for a registry call.
///
/// Either field may be omitted.  Empty strings count as omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    name: Option<String>,
    api_key: Option<String>,
}

impl Scope {
    /// No name, personal (unkeyed) scope.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = non_empty(name.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = non_empty(api_key.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
