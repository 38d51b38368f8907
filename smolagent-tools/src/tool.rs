//! Tool trait and registry

use serde::de::DeserializeOwned;
use serde_json::Value;
use smolagent_error::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// Named arguments of one tool call, exactly as the model supplied them
pub type Arguments = serde_json::Map<String, Value>;

/// A named capability the agent can invoke on the model's behalf.
///
/// `name` and `description` are shown to the model in the system prompt,
/// so the description should say what arguments the tool takes.
/// Failures are returned, never raised: the agent turns them into a
/// `Tool error: ...` message and keeps going.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn execute(&self, arguments: &Arguments) -> Result<Value>;
}

impl fmt::Debug for dyn Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool").field("name", &self.name()).finish()
    }
}

/// Decode tool arguments into a typed struct.
///
/// Missing, unknown or ill-typed arguments become an `InvalidArgument`
/// error naming the tool.
pub fn decode_arguments<T: DeserializeOwned>(tool: &str, arguments: &Arguments) -> Result<T> {
    serde_json::from_value(Value::Object(arguments.clone())).map_err(|e| {
        Error::invalid_argument(format!("invalid arguments for {}: {}", tool, e))
            .with_context("tool", tool)
            .set_source(e)
    })
}

/// Tools available to an agent, keyed by name.
///
/// Iteration follows registration order, which is also the order tools
/// are listed in the system prompt. Registering a name twice replaces the
/// earlier tool in place.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, returning the one it replaced
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Option<Box<dyn Tool>> {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&slot) => {
                tracing::warn!(tool = %name, "duplicate tool name, replacing earlier registration");
                Some(std::mem::replace(&mut self.tools[slot], tool))
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
                None
            }
        }
    }

    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.register(Box::new(tool));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&slot| self.tools[slot].as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Tool> {
        self.tools.iter().map(|t| t.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl FromIterator<Box<dyn Tool>> for ToolRegistry {
    fn from_iter<I: IntoIterator<Item = Box<dyn Tool>>>(iter: I) -> Self {
        let mut registry = Self::new();
        for tool in iter {
            registry.register(tool);
        }
        registry
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use smolagent_error::ErrorKind;

    struct Echo {
        name: &'static str,
        reply: &'static str,
    }

    impl Tool for Echo {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Echoes a fixed reply"
        }

        fn execute(&self, _arguments: &Arguments) -> Result<Value> {
            Ok(Value::String(self.reply.to_string()))
        }
    }

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_registry_order_and_lookup() {
        let registry = ToolRegistry::new()
            .with_tool(Echo { name: "b", reply: "1" })
            .with_tool(Echo { name: "a", reply: "2" });

        assert_eq!(registry.names(), vec!["b", "a"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("a"));
        assert!(registry.get("missing").is_none());
        assert_eq!(
            registry.get("a").unwrap().execute(&Arguments::new()).unwrap(),
            json!("2")
        );
    }

    #[test]
    fn test_duplicate_name_replaces_in_place() {
        let mut registry = ToolRegistry::new()
            .with_tool(Echo { name: "x", reply: "old" })
            .with_tool(Echo { name: "y", reply: "y" });

        let replaced = registry.register(Box::new(Echo { name: "x", reply: "new" }));
        assert!(replaced.is_some());
        assert_eq!(registry.names(), vec!["x", "y"]);
        assert_eq!(
            registry.get("x").unwrap().execute(&Arguments::new()).unwrap(),
            json!("new")
        );
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(format!("{:?}", registry), "[]");
    }

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Params {
        expression: String,
    }

    #[test]
    fn test_decode_arguments() {
        let ok: Params = decode_arguments("calculator", &args(json!({"expression": "1+1"}))).unwrap();
        assert_eq!(ok.expression, "1+1");

        let err = decode_arguments::<Params>("calculator", &Arguments::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.message().contains("missing field `expression`"));

        let err = decode_arguments::<Params>("calculator", &args(json!({"expression": "1", "x": 2})))
            .unwrap_err();
        assert!(err.message().contains("unknown field `x`"));

        let err = decode_arguments::<Params>("calculator", &args(json!({"expression": 3}))).unwrap_err();
        assert!(err.message().starts_with("invalid arguments for calculator"));
    }
}
