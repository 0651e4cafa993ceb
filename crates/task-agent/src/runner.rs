//! Tool call execution.
//!
//! Executes one model-requested tool call at a time: parses the untrusted
//! argument JSON, rewrites positional task references through the resolver,
//! applies the update-reroute rules, and runs the operation against the task
//! store. Any failure is captured as a failed invocation record; it never
//! aborts sibling calls in the same round.
//!
//! After every successful mutating call the owner's full list is re-fetched,
//! the position cache rebuilt, and a synthetic get-all invocation appended so
//! the model's next turn sees current state without another round trip.

use std::sync::Arc;

use assistant_core::{ToolArguments, ToolCallRequest};
use task_store::{NewTask, StatusFilter, TaskFilter, TaskPatch};
use tracing::{debug, info, warn};

use crate::catalog::ToolName;
use crate::resolver::{Resolution, Resolver};
use crate::store::{StoreOutcome, TaskStore};

/// Record of one executed (or synthetic) tool invocation.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// The tool call id this record answers.
    pub call_id: String,
    /// Wire name of the requested tool (may be unknown).
    pub tool: String,
    /// Structured result.
    pub result: StoreOutcome,
    /// Whether the operation was a successful state change.
    pub mutating: bool,
    /// Whether this record was injected by the runner rather than requested.
    pub synthetic: bool,
    /// The user-facing position the call referred to, when it was positional.
    pub position: Option<usize>,
    /// Whether the failure (if any) happened during reference resolution.
    pub resolution_failure: bool,
}

impl ToolInvocation {
    fn new(call_id: &str, tool: &str, result: StoreOutcome) -> Self {
        Self {
            call_id: call_id.to_string(),
            tool: tool.to_string(),
            result,
            mutating: false,
            synthetic: false,
            position: None,
            resolution_failure: false,
        }
    }

    /// The operation, when it names a known catalog entry.
    pub fn tool_name(&self) -> Option<ToolName> {
        ToolName::parse(&self.tool)
    }

    /// Whether this was a successful mutating operation.
    pub fn performed_mutation(&self) -> bool {
        self.mutating && self.result.success
    }
}

/// Executes requested tool calls against the store.
pub struct ToolRunner {
    store: Arc<dyn TaskStore>,
    resolver: Arc<Resolver>,
}

impl ToolRunner {
    /// Create a runner over a store and resolver.
    pub fn new(store: Arc<dyn TaskStore>, resolver: Arc<Resolver>) -> Self {
        Self { store, resolver }
    }

    /// Execute one requested call.
    ///
    /// Returns the invocation record, followed by a synthetic refresh record
    /// when the call mutated state.
    pub async fn run(&self, owner: &str, call: &ToolCallRequest) -> Vec<ToolInvocation> {
        let Some(tool) = ToolName::parse(&call.name) else {
            warn!("Model requested unknown tool: {}", call.name);
            return vec![ToolInvocation::new(
                &call.id,
                &call.name,
                StoreOutcome::fail(format!("Unknown tool: {}", call.name)),
            )];
        };

        let args = match call.parse_arguments() {
            Ok(values) => ToolArguments::new(values),
            Err(e) => {
                warn!("Malformed arguments for {}: {}", call.name, e);
                return vec![ToolInvocation::new(
                    &call.id,
                    &call.name,
                    StoreOutcome::fail("Could not parse the tool arguments."),
                )];
            }
        };

        debug!("Executing tool {} for owner {}", call.name, owner);

        let mut invocation = match tool {
            ToolName::AddTask => self.run_add(owner, call, &args).await,
            ToolName::ListTasks => self.run_list(owner, call, &args).await,
            ToolName::GetAllTasks => self.run_get_all(owner, call).await,
            ToolName::GetUserIdentity => {
                ToolInvocation::new(&call.id, &call.name, self.store.identity(owner).await)
            }
            ToolName::UpdateTask | ToolName::CompleteTask | ToolName::DeleteTask => {
                self.run_task_targeted(owner, tool, call, &args).await
            }
        };
        invocation.mutating = tool.is_mutating() && invocation.result.success;

        let mut records = vec![invocation];

        if records[0].performed_mutation() {
            info!("Tool {} mutated state; refreshing task list", call.name);
            records.push(self.synthetic_refresh(owner, tool, &call.id).await);
        }

        records
    }

    async fn run_add(
        &self,
        owner: &str,
        call: &ToolCallRequest,
        args: &ToolArguments,
    ) -> ToolInvocation {
        let Some(title) = non_empty(args.get_str("title")) else {
            return ToolInvocation::new(
                &call.id,
                &call.name,
                StoreOutcome::fail("Please provide a title for the new task."),
            );
        };

        let fields = NewTask {
            title,
            description: non_empty(args.get_str("description")),
            priority: non_empty(args.get_str("priority")),
            tags: non_empty(args.get_str("tags")),
            due_date: non_empty(args.get_str("due_date")),
            ai_generated: true,
            ai_context: non_empty(args.get_str("ai_context")),
        };

        ToolInvocation::new(&call.id, &call.name, self.store.add_task(owner, fields).await)
    }

    async fn run_list(
        &self,
        owner: &str,
        call: &ToolCallRequest,
        args: &ToolArguments,
    ) -> ToolInvocation {
        let filter = TaskFilter {
            status: args
                .get_str("status")
                .map(StatusFilter::parse)
                .unwrap_or_default(),
            limit: args.get_i64("limit"),
            offset: args.get_i64("offset"),
        };

        // A filtered listing does not rebuild the position cache: positions
        // are defined by the full list only.
        ToolInvocation::new(&call.id, &call.name, self.store.list_tasks(owner, filter).await)
    }

    async fn run_get_all(&self, owner: &str, call: &ToolCallRequest) -> ToolInvocation {
        // A full fetch is itself a fresh snapshot, so it rebuilds the cache.
        match self.resolver.refresh(self.store.as_ref(), owner).await {
            Ok(tasks) => ToolInvocation::new(
                &call.id,
                &call.name,
                StoreOutcome::ok(format!("You have {} tasks.", tasks.len())).with_tasks(tasks),
            ),
            Err(e) => {
                warn!("get_all_tasks failed for owner {}: {}", owner, e);
                ToolInvocation::new(
                    &call.id,
                    &call.name,
                    StoreOutcome::fail("I couldn't fetch your tasks right now. Please try again."),
                )
            }
        }
    }

    async fn run_task_targeted(
        &self,
        owner: &str,
        tool: ToolName,
        call: &ToolCallRequest,
        args: &ToolArguments,
    ) -> ToolInvocation {
        let raw_id = match args.require_str("task_id") {
            Ok(id) => id.trim().to_string(),
            Err(message) => {
                return ToolInvocation::new(&call.id, &call.name, StoreOutcome::fail(message));
            }
        };

        let mut position = None;
        let task_id = match self
            .resolver
            .resolve(self.store.as_ref(), owner, &raw_id)
            .await
        {
            Resolution::Verbatim => raw_id,
            Resolution::Resolved { task_id, .. } => {
                position = raw_id.parse().ok();
                debug!("Resolved position {} to task {}", raw_id, task_id);
                task_id
            }
            Resolution::OutOfRange {
                position,
                available,
            } => {
                let mut invocation = ToolInvocation::new(
                    &call.id,
                    &call.name,
                    StoreOutcome::fail(format!(
                        "Sorry, I couldn't find task number {}. You currently have {} tasks.",
                        position, available
                    )),
                );
                invocation.position = Some(position);
                invocation.resolution_failure = true;
                return invocation;
            }
            Resolution::StoreUnavailable => {
                let mut invocation = ToolInvocation::new(
                    &call.id,
                    &call.name,
                    StoreOutcome::fail(
                        "I couldn't look up your tasks right now. Please try again.",
                    ),
                );
                invocation.resolution_failure = true;
                return invocation;
            }
        };

        let result = match tool {
            ToolName::DeleteTask => self.store.delete_task(owner, &task_id).await,
            ToolName::CompleteTask => {
                let completed = args.get_bool("completed").unwrap_or(true);
                self.store.set_completion(owner, &task_id, completed).await
            }
            ToolName::UpdateTask => self.run_update(owner, &task_id, args).await,
            _ => unreachable!("run_task_targeted called with non-targeted tool"),
        };

        let mut invocation = ToolInvocation::new(&call.id, &call.name, result);
        invocation.position = position;
        invocation
    }

    async fn run_update(&self, owner: &str, task_id: &str, args: &ToolArguments) -> StoreOutcome {
        let patch = TaskPatch {
            title: non_empty(args.get_str("title")),
            description: non_empty(args.get_str("description")),
            completed: None,
            priority: non_empty(args.get_str("priority")),
            tags: non_empty(args.get_str("tags")),
            due_date: non_empty(args.get_str("due_date")),
            ai_context: non_empty(args.get_str("ai_context")),
        };
        let completed = args.get_bool("completed");

        // An update that only flips the completion flag is a completion
        if patch.is_empty() {
            return match completed {
                Some(state) => self.store.set_completion(owner, task_id, state).await,
                None => StoreOutcome::fail(
                    "Please tell me what to change: a new title, description, \
                     priority, tags, due date, or completion state.",
                ),
            };
        }

        let patch = TaskPatch { completed, ..patch };
        self.store.update_task(owner, task_id, patch).await
    }

    async fn synthetic_refresh(
        &self,
        owner: &str,
        tool: ToolName,
        call_id: &str,
    ) -> ToolInvocation {
        let refresh_id = format!("refresh_{}", call_id);
        let lead_in = match tool {
            ToolName::AddTask => "Task added successfully. Here is your updated list:",
            ToolName::UpdateTask => "Task updated successfully. Here is your updated list:",
            ToolName::CompleteTask => "Task marked as completed! Here is your updated list:",
            ToolName::DeleteTask => "Task deleted successfully. Here is your updated list:",
            _ => "Here is your updated list:",
        };

        let result = match self.resolver.refresh(self.store.as_ref(), owner).await {
            Ok(tasks) => StoreOutcome::ok(lead_in).with_tasks(tasks),
            Err(e) => {
                warn!("Post-mutation refresh failed for owner {}: {}", owner, e);
                StoreOutcome::fail("Could not refresh the task list.")
            }
        };

        let mut invocation =
            ToolInvocation::new(&refresh_id, ToolName::GetAllTasks.as_str(), result);
        invocation.synthetic = true;
        invocation
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteTaskStore;
    use task_store::{user, Database};

    async fn test_setup() -> (ToolRunner, Arc<SqliteTaskStore>, String) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let owner = user::create_user(db.pool(), "Alice", "alice@example.com")
            .await
            .unwrap()
            .id;

        let store = Arc::new(SqliteTaskStore::new(db));
        let runner = ToolRunner::new(store.clone(), Arc::new(Resolver::new()));
        (runner, store, owner)
    }

    fn call(id: &str, name: &str, arguments: &str) -> ToolCallRequest {
        ToolCallRequest::new(id, name, arguments)
    }

    async fn seed_tasks(runner: &ToolRunner, owner: &str, titles: &[&str]) {
        for (i, title) in titles.iter().enumerate() {
            let arguments = format!(r#"{{"title": "{}"}}"#, title);
            let records = runner
                .run(owner, &call(&format!("seed-{}", i), "add_task", &arguments))
                .await;
            assert!(records[0].result.success);
        }
    }

    #[tokio::test]
    async fn test_add_and_synthetic_refresh() {
        let (runner, _store, owner) = test_setup().await;

        let records = runner
            .run(&owner, &call("c1", "add_task", r#"{"title": "Buy milk"}"#))
            .await;

        assert_eq!(records.len(), 2);
        assert!(records[0].performed_mutation());
        assert_eq!(records[0].result.task_title.as_deref(), Some("Buy milk"));

        let refresh = &records[1];
        assert!(refresh.synthetic);
        assert_eq!(refresh.call_id, "refresh_c1");
        assert_eq!(refresh.tool, "get_all_tasks");
        assert_eq!(refresh.result.tasks.as_ref().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_and_malformed_arguments() {
        let (runner, _store, owner) = test_setup().await;

        let records = runner.run(&owner, &call("c1", "launch_rocket", "{}")).await;
        assert_eq!(records.len(), 1);
        assert!(!records[0].result.success);
        assert!(records[0].result.message.contains("launch_rocket"));

        let records = runner.run(&owner, &call("c2", "add_task", "{not json")).await;
        assert_eq!(records.len(), 1);
        assert!(!records[0].result.success);
    }

    #[tokio::test]
    async fn test_positional_delete_renumbers() {
        let (runner, _store, owner) = test_setup().await;
        seed_tasks(&runner, &owner, &["A", "B", "C"]).await;

        // Delete task 2 (B)
        let records = runner
            .run(&owner, &call("c1", "delete_task", r#"{"task_id": "2"}"#))
            .await;
        assert!(records[0].performed_mutation());
        assert_eq!(records[0].position, Some(2));

        let refreshed = records[1].result.tasks.as_ref().unwrap();
        let titles: Vec<&str> = refreshed.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["A", "C"]);

        // Position 2 now refers to C
        let records = runner
            .run(&owner, &call("c2", "complete_task", r#"{"task_id": "2"}"#))
            .await;
        assert!(records[0].performed_mutation());
        assert_eq!(records[0].result.task_title.as_deref(), Some("C"));
    }

    #[tokio::test]
    async fn test_position_out_of_range() {
        let (runner, _store, owner) = test_setup().await;
        seed_tasks(&runner, &owner, &["A", "B", "C"]).await;

        let records = runner
            .run(&owner, &call("c1", "delete_task", r#"{"task_id": "7"}"#))
            .await;

        assert_eq!(records.len(), 1);
        let failure = &records[0];
        assert!(!failure.result.success);
        assert!(failure.resolution_failure);
        assert!(failure.result.message.contains('7'));
        assert!(failure.result.message.contains('3'));
    }

    #[tokio::test]
    async fn test_update_completion_only_reroutes() {
        let (runner, _store, owner) = test_setup().await;
        seed_tasks(&runner, &owner, &["A"]).await;

        let records = runner
            .run(
                &owner,
                &call("c1", "update_task", r#"{"task_id": "1", "completed": true}"#),
            )
            .await;

        assert!(records[0].performed_mutation());
        assert_eq!(records[0].result.completed, Some(true));
        // The completion path produced the completion confirmation
        assert!(records[0].result.message.contains("completed"));
    }

    #[tokio::test]
    async fn test_update_preserves_omitted_fields() {
        let (runner, store, owner) = test_setup().await;

        let records = runner
            .run(
                &owner,
                &call(
                    "c1",
                    "add_task",
                    r#"{"title": "X", "description": "Y"}"#,
                ),
            )
            .await;
        let task_id = records[0].result.task_id.clone().unwrap();

        let records = runner
            .run(
                &owner,
                &call("c2", "update_task", r#"{"task_id": "1", "priority": "high"}"#),
            )
            .await;
        assert!(records[0].performed_mutation());

        let task = store.get_task(&owner, &task_id).await.unwrap();
        assert_eq!(task.title, "X");
        assert_eq!(task.description.as_deref(), Some("Y"));
        assert_eq!(task.priority, "high");
    }

    #[tokio::test]
    async fn test_update_with_nothing_to_change() {
        let (runner, _store, owner) = test_setup().await;
        seed_tasks(&runner, &owner, &["A"]).await;

        let records = runner
            .run(&owner, &call("c1", "update_task", r#"{"task_id": "1"}"#))
            .await;

        assert!(!records[0].result.success);
        assert!(records[0].result.message.contains("what to change"));
    }

    #[tokio::test]
    async fn test_delete_twice_fails_second_time() {
        let (runner, _store, owner) = test_setup().await;
        seed_tasks(&runner, &owner, &["A"]).await;

        let records = runner
            .run(&owner, &call("c1", "delete_task", r#"{"task_id": "1"}"#))
            .await;
        assert!(records[0].performed_mutation());
        let task_id = records[0].result.task_id.clone().unwrap();

        // Second delete by durable id: not found, not a silent success
        let arguments = format!(r#"{{"task_id": "{}"}}"#, task_id);
        let records = runner
            .run(&owner, &call("c2", "delete_task", &arguments))
            .await;
        assert_eq!(records.len(), 1);
        assert!(!records[0].result.success);
        assert!(records[0].result.message.contains("not found"));
    }

    #[tokio::test]
    async fn test_identity_lookup() {
        let (runner, _store, owner) = test_setup().await;

        let records = runner.run(&owner, &call("c1", "get_user_identity", "{}")).await;
        assert_eq!(records.len(), 1);
        assert!(records[0].result.success);
        assert!(records[0].result.message.contains("Alice"));
    }

    #[tokio::test]
    async fn test_list_tasks_filtered() {
        let (runner, _store, owner) = test_setup().await;
        seed_tasks(&runner, &owner, &["A", "B"]).await;
        runner
            .run(&owner, &call("c1", "complete_task", r#"{"task_id": "1"}"#))
            .await;

        let records = runner
            .run(&owner, &call("c2", "list_tasks", r#"{"status": "pending"}"#))
            .await;
        assert!(records[0].result.success);
        let tasks = records[0].result.tasks.as_ref().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "B");
    }
}
