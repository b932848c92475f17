//! Tool catalog adapter.
//!
//! Turns the tool host's descriptors into the schema list the model endpoint
//! expects. A [`Catalog`] is a snapshot for a single turn.

use std::collections::HashSet;

use serde_json::{Value, json};
use tracing::warn;

use crate::model::ToolSpec;
use crate::tools::{ToolDescriptor, ToolError, ToolHost};

/// The tools available for one turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    tools: Vec<ToolDescriptor>,
}

impl Catalog {
    /// Query the host for its current tools.
    ///
    /// Host order is preserved. If a name repeats, the first descriptor wins.
    pub async fn fetch<H: ToolHost>(host: &H) -> Result<Self, ToolError> {
        let descriptors = host.list_tools().await?;
        Ok(Self::from_descriptors(descriptors))
    }

    /// A catalog with no tools.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_descriptors(descriptors: Vec<ToolDescriptor>) -> Self {
        let mut seen = HashSet::new();
        let tools = descriptors
            .into_iter()
            .filter(|tool| {
                let fresh = seen.insert(tool.name.clone());
                if !fresh {
                    warn!(tool = %tool.name, "duplicate tool name in catalog, ignoring");
                }
                fresh
            })
            .collect();
        Self { tools }
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Build the model-facing tool list.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(to_spec).collect()
    }
}

fn to_spec(tool: &ToolDescriptor) -> ToolSpec {
    // Function parameters must be an object schema.
    let parameters = match &tool.parameters {
        Value::Object(_) => tool.parameters.clone(),
        _ => json!({"type": "object", "properties": {}}),
    };

    ToolSpec {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{EmptyToolHost, ToolArguments};

    fn descriptor(name: &str, description: &str, parameters: Value) -> ToolDescriptor {
        ToolDescriptor {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    struct BrokenHost;

    impl ToolHost for BrokenHost {
        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
            Err(ToolError::CatalogUnavailable("connection closed".into()))
        }

        async fn call_tool(&self, name: &str, _: ToolArguments) -> Result<String, ToolError> {
            Err(ToolError::NotFound(name.into()))
        }
    }

    #[test]
    fn specs_keep_host_order() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "number"}}});
        let catalog = Catalog::from_descriptors(vec![
            descriptor("sub", "Subtract", schema.clone()),
            descriptor("add", "Add", schema.clone()),
        ]);

        let specs = catalog.specs();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "sub");
        assert_eq!(specs[1].name, "add");
        assert_eq!(specs[1].description, "Add");
        assert_eq!(specs[1].parameters, schema);
    }

    #[test]
    fn duplicate_names_keep_first() {
        let catalog = Catalog::from_descriptors(vec![
            descriptor("add", "first", json!({})),
            descriptor("add", "second", json!({})),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.tools()[0].description, "first");
    }

    #[test]
    fn non_object_schema_becomes_empty_object() {
        let catalog = Catalog::from_descriptors(vec![descriptor("now", "", Value::Null)]);
        assert_eq!(
            catalog.specs()[0].parameters,
            json!({"type": "object", "properties": {}})
        );
    }

    #[tokio::test]
    async fn fetch_propagates_host_failure() {
        let err = Catalog::fetch(&BrokenHost).await.unwrap_err();
        assert!(matches!(err, ToolError::CatalogUnavailable(_)));
    }

    #[tokio::test]
    async fn fetch_from_empty_host() {
        let catalog = Catalog::fetch(&EmptyToolHost).await.unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.specs().is_empty());
    }
}
