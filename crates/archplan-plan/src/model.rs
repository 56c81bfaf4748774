use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

pub const FALLBACK_REPLY_TEXT: &str = "Generated outputs.";

/// The closed set of things a step can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    IngestDocs,
    BuildSpecs,
    GenAll,
    McpTool,
    Reply,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::IngestDocs,
        ActionKind::BuildSpecs,
        ActionKind::GenAll,
        ActionKind::McpTool,
        ActionKind::Reply,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ingest_docs" => Some(ActionKind::IngestDocs),
            "build_specs" => Some(ActionKind::BuildSpecs),
            "gen_all" => Some(ActionKind::GenAll),
            "mcp_tool" => Some(ActionKind::McpTool),
            "reply" => Some(ActionKind::Reply),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::IngestDocs => "ingest_docs",
            ActionKind::BuildSpecs => "build_specs",
            ActionKind::GenAll => "gen_all",
            ActionKind::McpTool => "mcp_tool",
            ActionKind::Reply => "reply",
        }
    }

    /// The action kind that must have completed before this one may run.
    pub fn required_predecessor(self) -> Option<Self> {
        match self {
            ActionKind::BuildSpecs => Some(ActionKind::IngestDocs),
            ActionKind::GenAll => Some(ActionKind::BuildSpecs),
            ActionKind::IngestDocs | ActionKind::McpTool | ActionKind::Reply => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-action arguments. Each variant carries only what its handler reads; everything else
/// in the untyped argument bag is discarded when the step is built.
#[derive(Debug, Clone, PartialEq)]
pub enum StepArgs {
    IngestDocs {
        force: bool,
    },
    BuildSpecs,
    GenAll,
    McpTool {
        server_command: Option<String>,
        tool: Option<String>,
        params: BTreeMap<String, Value>,
    },
    Reply {
        text: Option<String>,
    },
}

impl StepArgs {
    pub fn kind(&self) -> ActionKind {
        match self {
            StepArgs::IngestDocs { .. } => ActionKind::IngestDocs,
            StepArgs::BuildSpecs => ActionKind::BuildSpecs,
            StepArgs::GenAll => ActionKind::GenAll,
            StepArgs::McpTool { .. } => ActionKind::McpTool,
            StepArgs::Reply { .. } => ActionKind::Reply,
        }
    }

    pub fn default_for(kind: ActionKind) -> Self {
        Self::from_raw(kind, &Map::new())
    }

    /// Builds typed arguments from an untrusted bag. Known keys with the wrong type are
    /// treated as absent.
    pub fn from_raw(kind: ActionKind, raw: &Map<String, Value>) -> Self {
        match kind {
            ActionKind::IngestDocs => StepArgs::IngestDocs {
                force: raw.get("force").and_then(Value::as_bool).unwrap_or(false),
            },
            ActionKind::BuildSpecs => StepArgs::BuildSpecs,
            ActionKind::GenAll => StepArgs::GenAll,
            ActionKind::McpTool => StepArgs::McpTool {
                server_command: non_empty_string(raw.get("server_command"))
                    .or_else(|| non_empty_string(raw.get("server_cmd"))),
                tool: non_empty_string(raw.get("tool")),
                params: raw
                    .get("params")
                    .and_then(Value::as_object)
                    .map(|params| {
                        params
                            .iter()
                            .map(|(key, value)| (key.clone(), value.clone()))
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            ActionKind::Reply => StepArgs::Reply {
                text: raw
                    .get("text")
                    .and_then(Value::as_str)
                    .filter(|text| !text.is_empty())
                    .map(str::to_string),
            },
        }
    }

    pub fn to_raw(&self) -> Map<String, Value> {
        let mut out = Map::new();
        match self {
            StepArgs::IngestDocs { force } => {
                if *force {
                    out.insert("force".to_string(), Value::Bool(true));
                }
            }
            StepArgs::BuildSpecs | StepArgs::GenAll => {}
            StepArgs::McpTool {
                server_command,
                tool,
                params,
            } => {
                if let Some(server_command) = server_command {
                    out.insert(
                        "server_command".to_string(),
                        Value::String(server_command.clone()),
                    );
                }
                if let Some(tool) = tool {
                    out.insert("tool".to_string(), Value::String(tool.clone()));
                }
                if !params.is_empty() {
                    out.insert(
                        "params".to_string(),
                        Value::Object(
                            params
                                .iter()
                                .map(|(key, value)| (key.clone(), value.clone()))
                                .collect(),
                        ),
                    );
                }
            }
            StepArgs::Reply { text } => {
                if let Some(text) = text {
                    out.insert("text".to_string(), Value::String(text.clone()));
                }
            }
        }
        out
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireStep", try_from = "WireStep")]
pub struct Step {
    pub id: i64,
    pub args: StepArgs,
    pub depends_on: Vec<i64>,
}

impl Step {
    pub fn new(id: i64, args: StepArgs) -> Self {
        Self {
            id,
            args,
            depends_on: Vec::new(),
        }
    }

    pub fn of_kind(id: i64, kind: ActionKind) -> Self {
        Self::new(id, StepArgs::default_for(kind))
    }

    pub fn with_deps(mut self, deps: impl IntoIterator<Item = i64>) -> Self {
        for dep in deps {
            self.add_dependency(dep);
        }
        self
    }

    pub fn action(&self) -> ActionKind {
        self.args.kind()
    }

    /// Appends `dep` unless it is already listed. Returns whether the list changed.
    pub fn add_dependency(&mut self, dep: i64) -> bool {
        if self.depends_on.contains(&dep) {
            return false;
        }
        self.depends_on.push(dep);
        true
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(WireStep::from(self.clone())).unwrap_or(Value::Null)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown action `{0}`")]
pub struct UnknownActionError(pub String);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireStep {
    id: i64,
    action: String,
    #[serde(default)]
    args: Map<String, Value>,
    #[serde(default)]
    depends_on: Vec<i64>,
}

impl From<Step> for WireStep {
    fn from(step: Step) -> Self {
        Self {
            id: step.id,
            action: step.action().as_str().to_string(),
            args: step.args.to_raw(),
            depends_on: step.depends_on,
        }
    }
}

impl TryFrom<WireStep> for Step {
    type Error = UnknownActionError;

    fn try_from(wire: WireStep) -> Result<Self, Self::Error> {
        let kind = ActionKind::parse(wire.action.as_str())
            .ok_or_else(|| UnknownActionError(wire.action.clone()))?;
        Ok(Step::new(wire.id, StepArgs::from_raw(kind, &wire.args)).with_deps(wire.depends_on))
    }
}

/// A set of steps. Order inside `steps` carries no meaning; only `depends_on` does.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// The always-valid linear plan used when a candidate cannot be repaired:
    /// ingest, build specs, generate, reply.
    pub fn canonical_fallback() -> Self {
        Self::new(vec![
            Step::of_kind(1, ActionKind::IngestDocs),
            Step::of_kind(2, ActionKind::BuildSpecs).with_deps([1]),
            Step::of_kind(3, ActionKind::GenAll).with_deps([2]),
            Step::new(
                4,
                StepArgs::Reply {
                    text: Some(FALLBACK_REPLY_TEXT.to_string()),
                },
            )
            .with_deps([3]),
        ])
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.steps.iter().map(|step| step.id).collect()
    }

    pub fn get(&self, id: i64) -> Option<&Step> {
        self.steps.iter().find(|step| step.id == id)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(Map::from_iter([(
            "steps".to_string(),
            Value::Array(self.steps.iter().map(Step::to_value).collect()),
        )]))
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
