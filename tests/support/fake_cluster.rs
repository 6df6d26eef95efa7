// ABOUTME: In-memory ClusterApi used by the integration tests.
// ABOUTME: Simulates one service, its revisions and tasks, and records every call.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use nonempty::NonEmpty;
use parking_lot::Mutex;
use serde_json::{Map, Value, json};

use ecs_deploy::cluster::{
    ApiError, ClusterApi, ContainerDescription, DefinitionStatus, DesiredStatus, RunTaskRequest,
    ServiceDeployment, ServiceDescription, SortOrder, Tag, TaskDefinitionDescription,
    TaskDescription, UpdateServiceRequest,
};
use ecs_deploy::types::{RevisionArn, ServiceName, TaskArn};

pub const CLUSTER: &str = "prod";
pub const SERVICE: &str = "web";
pub const FAMILY: &str = "web";

pub fn revision_arn(family: &str, revision: u64) -> RevisionArn {
    RevisionArn::new(format!(
        "arn:aws:ecs:eu-west-1:123456789012:task-definition/{family}:{revision}"
    ))
}

pub fn service_name() -> ServiceName {
    ServiceName::new(SERVICE).unwrap()
}

/// How tasks of a newly deployed revision behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskBehavior {
    /// Tasks reach RUNNING and report HEALTHY.
    Healthy,
    /// Tasks reach RUNNING but the health check never passes.
    RunningUnhealthy,
    /// No task of the new revision ever starts.
    Never,
}

/// A recorded API call.
#[derive(Debug, Clone)]
pub enum Call {
    DescribeService,
    DescribeTaskDefinition { task_definition: String, include_tags: bool },
    Register { document: Map<String, Value>, tags: Vec<Tag> },
    UpdateService(UpdateServiceRequest),
    ListTasks,
    DescribeTasks,
    ListTaskDefinitions { family_prefix: String, sort: SortOrder },
    Deregister(RevisionArn),
    RunTask(RunTaskRequest),
}

struct State {
    current: RevisionArn,
    desired_count: u32,
    definitions: Vec<(RevisionArn, TaskDefinitionDescription)>,
    inactive: HashSet<RevisionArn>,
    running: Vec<TaskDescription>,
    behavior: TaskBehavior,
    draining_polls: usize,
    in_flight: usize,
    update_failures_from: Option<usize>,
    updates: usize,
    deny_deregister: HashSet<RevisionArn>,
    job_statuses: VecDeque<(String, Option<i32>)>,
    last_job_status: Option<(String, Option<i32>)>,
    calls: Vec<Call>,
}

pub struct FakeCluster {
    state: Mutex<State>,
}

impl FakeCluster {
    /// A service running revision 1 of `web` with one healthy task.
    pub fn new() -> Self {
        let current = revision_arn(FAMILY, 1);
        let fake = Self {
            state: Mutex::new(State {
                current: current.clone(),
                desired_count: 1,
                definitions: Vec::new(),
                inactive: HashSet::new(),
                running: vec![task(&current, "RUNNING", Some("HEALTHY"), 0)],
                behavior: TaskBehavior::Healthy,
                draining_polls: 0,
                in_flight: 1,
                update_failures_from: None,
                updates: 0,
                deny_deregister: HashSet::new(),
                job_statuses: VecDeque::new(),
                last_job_status: None,
                calls: Vec::new(),
            }),
        };
        let _current = fake.add_definition(FAMILY, web_definition("shop/web:v1", false));
        fake
    }

    pub fn with_desired_count(self, count: u32) -> Self {
        self.state.lock().desired_count = count;
        self
    }

    pub fn with_task_behavior(self, behavior: TaskBehavior) -> Self {
        self.state.lock().behavior = behavior;
        self
    }

    /// Describe-service polls, after each update, that still report two
    /// active deployments.
    pub fn with_draining_polls(self, polls: usize) -> Self {
        self.state.lock().draining_polls = polls;
        self
    }

    /// Update-service calls from index `n` (0-based) on are rejected.
    pub fn reject_updates_from(self, n: usize) -> Self {
        self.state.lock().update_failures_from = Some(n);
        self
    }

    pub fn deny_deregister(self, revision: RevisionArn) -> Self {
        self.state.lock().deny_deregister.insert(revision);
        self
    }

    /// Statuses the one-off task reports, one per describe call; the last
    /// one repeats.
    pub fn with_job_statuses(self, statuses: &[(&str, Option<i32>)]) -> Self {
        self.state.lock().job_statuses = statuses
            .iter()
            .map(|(status, code)| (status.to_string(), *code))
            .collect();
        self
    }

    /// Replace the document of the current revision.
    pub fn with_current_definition(self, definition: Value) -> Self {
        {
            let mut state = self.state.lock();
            let current = state.current.clone();
            if let Some(entry) = state.definitions.iter_mut().find(|(r, _)| *r == current) {
                entry.1.task_definition = definition;
            }
        }
        self
    }

    pub fn with_tags(self, tags: Vec<Tag>) -> Self {
        {
            let mut state = self.state.lock();
            for (_, description) in state.definitions.iter_mut() {
                description.tags = tags.clone();
            }
        }
        self
    }

    /// Register an extra revision directly, returning its ARN.
    pub fn add_definition(&self, family: &str, definition: Value) -> RevisionArn {
        let mut state = self.state.lock();
        let next = state
            .definitions
            .iter()
            .filter(|(r, _)| r.family() == family)
            .count() as u64
            + 1;
        let arn = revision_arn(family, next);
        state.definitions.push((
            arn.clone(),
            TaskDefinitionDescription {
                task_definition: definition,
                tags: Vec::new(),
            },
        ));
        arn
    }

    pub fn current_revision(&self) -> RevisionArn {
        self.state.lock().current.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn updates(&self) -> Vec<UpdateServiceRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::UpdateService(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn registered_documents(&self) -> Vec<Map<String, Value>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Register { document, .. } => Some(document),
                _ => None,
            })
            .collect()
    }

    pub fn deregistered(&self) -> Vec<RevisionArn> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Deregister(revision) => Some(revision),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| predicate(c)).count()
    }
}

impl Default for FakeCluster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn describe_service(
        &self,
        _cluster: &str,
        service: &ServiceName,
    ) -> Result<ServiceDescription, ApiError> {
        let mut state = self.state.lock();
        state.calls.push(Call::DescribeService);

        let primary = ServiceDeployment {
            id: "ecs-svc/primary".to_string(),
            status: "PRIMARY".to_string(),
            task_definition: state.current.clone(),
            desired_count: state.desired_count,
            running_count: state.desired_count,
            rollout_state: None,
        };
        let mut deployments = vec![primary];
        if state.in_flight > 1 {
            if state.draining_polls > 0 {
                state.draining_polls -= 1;
                deployments.push(ServiceDeployment {
                    id: "ecs-svc/old".to_string(),
                    status: "ACTIVE".to_string(),
                    task_definition: revision_arn(FAMILY, 1),
                    desired_count: 0,
                    running_count: 1,
                    rollout_state: None,
                });
            } else {
                state.in_flight = 1;
            }
        }
        deployments.push(ServiceDeployment {
            id: "ecs-svc/gone".to_string(),
            status: "INACTIVE".to_string(),
            task_definition: revision_arn(FAMILY, 1),
            desired_count: 0,
            running_count: 0,
            rollout_state: None,
        });

        Ok(ServiceDescription {
            service_name: service.to_string(),
            service_arn: None,
            status: Some("ACTIVE".to_string()),
            task_definition: state.current.clone(),
            desired_count: state.desired_count,
            running_count: state.desired_count,
            deployments,
        })
    }

    async fn describe_task_definition(
        &self,
        task_definition: &str,
        include_tags: bool,
    ) -> Result<TaskDefinitionDescription, ApiError> {
        let mut state = self.state.lock();
        state.calls.push(Call::DescribeTaskDefinition {
            task_definition: task_definition.to_string(),
            include_tags,
        });

        let found = state
            .definitions
            .iter()
            .rev()
            .find(|(arn, _)| arn.as_str() == task_definition || arn.family() == task_definition)
            .map(|(_, description)| description.clone());

        match found {
            Some(mut description) => {
                if !include_tags {
                    description.tags.clear();
                }
                Ok(description)
            }
            None => Err(ApiError::not_found(
                format!("task definition {task_definition}"),
                "unable to describe task definition",
            )),
        }
    }

    async fn register_task_definition(
        &self,
        document: &Map<String, Value>,
        tags: &[Tag],
    ) -> Result<RevisionArn, ApiError> {
        let family = document
            .get("family")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        {
            let mut state = self.state.lock();
            state.calls.push(Call::Register {
                document: document.clone(),
                tags: tags.to_vec(),
            });
        }
        Ok(self.add_definition(&family, Value::Object(document.clone())))
    }

    async fn update_service(&self, request: &UpdateServiceRequest) -> Result<(), ApiError> {
        let mut state = self.state.lock();
        state.calls.push(Call::UpdateService(request.clone()));

        let index = state.updates;
        state.updates += 1;
        if state.update_failures_from.is_some_and(|from| index >= from) {
            return Err(ApiError::rejected("ecs update-service", "AccessDeniedException"));
        }

        if let Some(count) = request.desired_count {
            state.desired_count = count;
        }
        state.in_flight = 2;

        if let Some(ref revision) = request.task_definition {
            state.current = revision.clone();
            let started = match state.behavior {
                TaskBehavior::Healthy => Some(task(revision, "RUNNING", Some("HEALTHY"), 2)),
                TaskBehavior::RunningUnhealthy => {
                    Some(task(revision, "RUNNING", Some("UNKNOWN"), 2))
                }
                TaskBehavior::Never => None,
            };
            state.running.extend(started);
        }
        Ok(())
    }

    async fn list_tasks(
        &self,
        _cluster: &str,
        _service: &ServiceName,
        status: DesiredStatus,
    ) -> Result<Vec<TaskArn>, ApiError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ListTasks);
        assert_eq!(status, DesiredStatus::Running);
        Ok(state.running.iter().map(|t| t.task_arn.clone()).collect())
    }

    async fn describe_tasks(
        &self,
        _cluster: &str,
        tasks: &NonEmpty<TaskArn>,
    ) -> Result<Vec<TaskDescription>, ApiError> {
        let mut state = self.state.lock();
        state.calls.push(Call::DescribeTasks);

        let mut described: Vec<TaskDescription> = state
            .running
            .iter()
            .filter(|t| tasks.iter().any(|arn| *arn == t.task_arn))
            .cloned()
            .collect();

        if tasks.iter().any(|arn| *arn == job_arn()) {
            let status = match state.job_statuses.pop_front() {
                Some(status) => {
                    state.last_job_status = Some(status.clone());
                    status
                }
                None => state
                    .last_job_status
                    .clone()
                    .unwrap_or_else(|| ("PENDING".to_string(), None)),
            };
            described.push(job(&status.0, status.1));
        }
        Ok(described)
    }

    async fn list_task_definitions(
        &self,
        family_prefix: &str,
        status: DefinitionStatus,
        sort: SortOrder,
    ) -> Result<Vec<RevisionArn>, ApiError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ListTaskDefinitions {
            family_prefix: family_prefix.to_string(),
            sort,
        });
        assert_eq!(status, DefinitionStatus::Active);

        let mut revisions: Vec<RevisionArn> = state
            .definitions
            .iter()
            .map(|(arn, _)| arn.clone())
            .filter(|arn| arn.family().starts_with(family_prefix))
            .filter(|arn| !state.inactive.contains(arn))
            .collect();
        revisions.sort_by_key(|arn| (arn.family().to_string(), arn.revision()));
        if sort == SortOrder::Desc {
            revisions.reverse();
        }
        Ok(revisions)
    }

    async fn deregister_task_definition(&self, revision: &RevisionArn) -> Result<(), ApiError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Deregister(revision.clone()));
        if state.deny_deregister.contains(revision) {
            return Err(ApiError::rejected(
                "ecs deregister-task-definition",
                "AccessDeniedException",
            ));
        }
        state.inactive.insert(revision.clone());
        Ok(())
    }

    async fn run_task(&self, request: &RunTaskRequest) -> Result<TaskArn, ApiError> {
        self.state.lock().calls.push(Call::RunTask(request.clone()));
        Ok(job_arn())
    }
}

pub fn job_arn() -> TaskArn {
    TaskArn::new("arn:aws:ecs:eu-west-1:123456789012:task/prod/job")
}

fn task(
    revision: &RevisionArn,
    last_status: &str,
    health: Option<&str>,
    n: u32,
) -> TaskDescription {
    TaskDescription {
        task_arn: TaskArn::new(format!(
            "arn:aws:ecs:eu-west-1:123456789012:task/prod/{}-{n}",
            revision.revision().unwrap_or_default()
        )),
        task_definition_arn: revision.clone(),
        last_status: last_status.to_string(),
        health_status: health.map(str::to_string),
        stopped_reason: None,
        containers: Vec::new(),
    }
}

fn job(last_status: &str, exit_code: Option<i32>) -> TaskDescription {
    let stopped = last_status == "STOPPED";
    TaskDescription {
        task_arn: job_arn(),
        task_definition_arn: revision_arn("migrate", 2),
        last_status: last_status.to_string(),
        health_status: None,
        stopped_reason: stopped.then(|| "Essential container in task exited".to_string()),
        containers: vec![ContainerDescription {
            name: "app".to_string(),
            last_status: Some(last_status.to_string()),
            exit_code,
            reason: None,
        }],
    }
}

/// A minimal `web` definition using `image`.
pub fn web_definition(image: &str, health_check: bool) -> Value {
    let mut container = json!({
        "name": "web",
        "image": format!("123456789012.dkr.ecr.eu-west-1.amazonaws.com/{image}"),
        "essential": true,
        "portMappings": [{"containerPort": 8080}]
    });
    if health_check {
        container["healthCheck"] = json!({"command": ["CMD-SHELL", "curl -f localhost:8080"]});
    }
    json!({
        "taskDefinitionArn": "arn:aws:ecs:eu-west-1:123456789012:task-definition/web:1",
        "family": FAMILY,
        "revision": 1,
        "status": "ACTIVE",
        "containerDefinitions": [container],
        "networkMode": "awsvpc",
        "requiresAttributes": [{"name": "com.amazonaws.ecs.capability.ecr-auth"}],
        "compatibilities": ["EC2"]
    })
}

/// Full image reference matching `web_definition`.
pub fn web_image(tag: &str) -> String {
    format!("123456789012.dkr.ecr.eu-west-1.amazonaws.com/shop/web:{tag}")
}

/// Register `count` empty revisions of `family`, oldest first.
pub fn add_revisions(fake: &FakeCluster, family: &str, count: usize) -> Vec<RevisionArn> {
    (0..count)
        .map(|_| fake.add_definition(family, json!({"family": family, "containerDefinitions": []})))
        .collect()
}
