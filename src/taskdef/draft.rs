// ABOUTME: Builds the registration document for a new task definition revision.
// ABOUTME: Rewrites container images and carries over only the fields registration accepts.

use serde_json::{Map, Value};

use crate::cluster::{Tag, TaskDefinitionDescription};
use crate::types::ImageTarget;

use super::error::BuildError;

const FARGATE: &str = "FARGATE";

/// Optional fields carried into the new revision when present and non-null.
const OPTIONAL_FIELDS: &[&str] = &[
    "volumes",
    "placementConstraints",
    "networkMode",
    "taskRoleArn",
    "executionRoleArn",
    "runtimePlatform",
    "ephemeralStorage",
    "proxyConfiguration",
];

/// Fields only carried for Fargate-compatible definitions.
const FARGATE_FIELDS: &[&str] = &["requiresCompatibilities", "cpu", "memory", "executionRoleArn"];

/// A frozen "register new revision" request.
#[derive(Debug, Clone)]
pub struct TaskDefinitionDraft {
    document: Map<String, Value>,
    tags: Vec<Tag>,
    rewritten: usize,
    health_check: bool,
}

impl TaskDefinitionDraft {
    /// Project `source` into a registration document with images swapped
    /// for `target`. Tags are captured when `copy_tags` is set and the
    /// source has any.
    pub fn build(
        source: &TaskDefinitionDescription,
        target: &ImageTarget,
        copy_tags: bool,
    ) -> Result<Self, BuildError> {
        let definition = source
            .task_definition
            .as_object()
            .ok_or_else(|| BuildError::InvalidSourceDocument("not a JSON object".to_string()))?;

        let family = present(definition, "family")
            .ok_or_else(|| BuildError::InvalidSourceDocument("missing family".to_string()))?;
        let containers = present(definition, "containerDefinitions")
            .ok_or_else(|| {
                BuildError::InvalidSourceDocument("missing containerDefinitions".to_string())
            })?
            .as_array()
            .ok_or_else(|| {
                BuildError::InvalidSourceDocument("containerDefinitions is not a list".to_string())
            })?;

        let mut rewritten = 0;
        let mut new_containers = Vec::with_capacity(containers.len());
        for container in containers {
            let mut container = container
                .as_object()
                .cloned()
                .ok_or_else(|| {
                    BuildError::InvalidSourceDocument(
                        "container definition is not an object".to_string(),
                    )
                })?;

            let replacement = container
                .get("image")
                .and_then(Value::as_str)
                .and_then(|image| target.rewrite(image));
            if let Some(image) = replacement {
                tracing::debug!(container = ?container.get("name"), %image, "rewriting image");
                container.insert("image".to_string(), Value::String(image));
                rewritten += 1;
            }
            new_containers.push(Value::Object(container));
        }

        let health_check = new_containers
            .first()
            .and_then(|c| c.get("healthCheck"))
            .is_some_and(|hc| !hc.is_null());

        let mut document = Map::new();
        document.insert("family".to_string(), family.clone());
        document.insert("containerDefinitions".to_string(), Value::Array(new_containers));

        let fields = OPTIONAL_FIELDS.iter().chain(
            is_fargate(definition)
                .then_some(FARGATE_FIELDS)
                .unwrap_or_default(),
        );
        for field in fields {
            if let Some(value) = present(definition, field) {
                document.insert((*field).to_string(), value.clone());
            }
        }

        let tags = if copy_tags {
            source.tags.clone()
        } else {
            Vec::new()
        };

        Ok(Self {
            document,
            tags,
            rewritten,
            health_check,
        })
    }

    pub fn family(&self) -> &str {
        self.document
            .get("family")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Number of containers whose image was replaced.
    pub fn rewritten_containers(&self) -> usize {
        self.rewritten
    }

    pub fn first_container_has_health_check(&self) -> bool {
        self.health_check
    }

    /// Images of every container, in definition order.
    pub fn images(&self) -> Vec<&str> {
        self.document
            .get("containerDefinitions")
            .and_then(Value::as_array)
            .map(|containers| {
                containers
                    .iter()
                    .filter_map(|c| c.get("image").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn present<'a>(definition: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    definition.get(field).filter(|v| !v.is_null())
}

fn is_fargate(definition: &Map<String, Value>) -> bool {
    ["requiresCompatibilities", "compatibilities"]
        .iter()
        .filter_map(|field| definition.get(*field).and_then(Value::as_array))
        .flatten()
        .any(|c| c.as_str() == Some(FARGATE))
}
