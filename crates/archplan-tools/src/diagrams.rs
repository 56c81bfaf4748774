use archplan_engine::{CollaboratorError, GenerationContext, GenerationOutput, GenerationPipeline};

const AWS_SERVICES: [&str; 10] = [
    "elb",
    "ec2",
    "lambda",
    "s3",
    "rds",
    "dynamodb",
    "vpc",
    "api gateway",
    "sqs",
    "sns",
];

const GCP_SERVICES: [&str; 7] = [
    "cloud load balancing",
    "compute engine",
    "cloud run",
    "cloud storage",
    "cloud sql",
    "pubsub",
    "gke",
];

const GENERIC_CHAIN: [&str; 4] = ["INTERNET", "LB", "APP", "DB"];

/// Produces mermaid sources as text blobs. Nothing is rendered, so no image paths are
/// ever returned.
#[derive(Debug, Clone, Default)]
pub struct TextDiagramPipeline;

impl TextDiagramPipeline {
    pub fn new() -> Self {
        Self
    }
}

impl GenerationPipeline for TextDiagramPipeline {
    fn generate(&self, context: &GenerationContext) -> Result<GenerationOutput, CollaboratorError> {
        let mut texts = context
            .diagram_kinds
            .iter()
            .map(|kind| format!("%% {kind}\n{}", mermaid_for(kind)))
            .collect::<Vec<_>>();
        let haystack = format!("{}\n{}", context.spec_text, context.prompt);
        texts.push(format!(
            "%% topology\n{}",
            topology_flowchart(&context.providers, &haystack)
        ));
        Ok(GenerationOutput {
            images: Vec::new(),
            texts,
        })
    }
}

/// A skeleton diagram for one diagram kind; unknown kinds get a plain flowchart.
pub fn mermaid_for(kind: &str) -> &'static str {
    match kind {
        "class" => "classDiagram\nClassA <|-- ClassB\nClassA : +method()\nClassB : +call()",
        "sequence" => {
            "sequenceDiagram\nparticipant A\nparticipant B\nA->>B: request\nB-->>A: response"
        }
        "activity" => "flowchart TD\nA[Start] --> B{Decision} -->|Yes| C[Do] --> D[End]",
        "deployment" => "flowchart LR\nClient --> LB --> App --> DB",
        "component" => "flowchart LR\nUI --> API --> Service --> DB",
        _ => "flowchart LR\nA --> B",
    }
}

/// Chains the provider services mentioned in `text`, in catalogue order. No providers
/// means AWS; no matches means a generic four-node chain.
pub fn topology_flowchart(providers: &[String], text: &str) -> String {
    let lowered = text.to_lowercase();
    let wants = |name: &str| providers.iter().any(|provider| provider == name);

    let mut catalogue = Vec::new();
    if providers.is_empty() || wants("aws") {
        catalogue.extend(AWS_SERVICES);
    }
    if wants("gcp") {
        catalogue.extend(GCP_SERVICES);
    }

    let mut nodes = catalogue
        .into_iter()
        .filter(|service| lowered.contains(service))
        .map(|service| service.to_uppercase().replace(' ', "_"))
        .collect::<Vec<_>>();
    if nodes.is_empty() {
        nodes = GENERIC_CHAIN.iter().map(|node| node.to_string()).collect();
    }
    format!("flowchart LR\n{}", nodes.join(" --> "))
}

#[cfg(test)]
#[path = "diagrams_test.rs"]
mod tests;
