//! Response sanitation and deterministic fallback synthesis.
//!
//! Model text is untrusted output: it can leak reasoning wrappers, fenced
//! code, or raw tool-call JSON, and some models answer mutations with stock
//! filler. [`finalize_reply`] guarantees the text shown to the user is clean
//! and non-empty, falling back to a message synthesized from the turn's tool
//! invocation records when the model's own text is unusable.

use crate::catalog::ToolName;
use crate::runner::ToolInvocation;
use crate::store::TaskView;

/// Recognized meta-commentary delimiter pairs.
const DELIMITERS: [(&str, &str); 10] = [
    ("<thought>", "</thought>"),
    ("<reasoning>", "</reasoning>"),
    ("<analysis>", "</analysis>"),
    ("<internal_thought>", "</internal_thought>"),
    ("<reflection>", "</reflection>"),
    ("<plan>", "</plan>"),
    ("<scratchpad>", "</scratchpad>"),
    ("[thinking]", "[/thinking]"),
    ("[reasoning]", "[/reasoning]"),
    ("[analysis]", "[/analysis]"),
];

/// Stock phrases some models emit instead of a real confirmation.
const ROBOTIC_PHRASES: [&str; 3] = [
    "Processed your request successfully.",
    "I've completed your request.",
    "I processed your request.",
];

/// Strip meta-commentary, leaked tool-call JSON, and fences; normalize
/// whitespace.
pub fn sanitize(raw: &str) -> String {
    let mut text = raw.to_string();

    // Keep only text after the last closing delimiter of each pair present
    for (open, close) in DELIMITERS {
        if text.contains(open) {
            if let Some(idx) = text.rfind(close) {
                text = text[idx + close.len()..].to_string();
            }
        }
    }

    text = strip_leaked_tool_call(&text);
    text = strip_code_fences(&text);
    text = drop_noise_lines(&text);
    collapse_whitespace(&text)
}

/// Whether the text is one of the known stock filler phrases.
pub fn is_robotic(text: &str) -> bool {
    let trimmed = text.trim();
    ROBOTIC_PHRASES.iter().any(|phrase| trimmed == *phrase)
}

/// Render a numbered task list, one task per line, in store order.
pub fn render_task_list(tasks: &[TaskView]) -> String {
    tasks
        .iter()
        .enumerate()
        .map(|(i, task)| {
            let status = if task.completed { "Completed" } else { "Pending" };
            format!("{}) {} — {}", i + 1, task.title, status)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Produce the final user-facing reply.
///
/// Uses the sanitized model text when it is usable; otherwise synthesizes a
/// deterministic message from the tool invocation records.
pub fn finalize_reply(
    raw: &str,
    invocations: &[ToolInvocation],
    current_tasks: Option<&[TaskView]>,
) -> String {
    let cleaned = sanitize(raw);
    if !cleaned.is_empty() && !is_robotic(&cleaned) {
        return cleaned;
    }
    fallback_reply(invocations, current_tasks)
}

/// Deterministic fallback built from the turn's tool results. Never empty.
pub fn fallback_reply(
    invocations: &[ToolInvocation],
    current_tasks: Option<&[TaskView]>,
) -> String {
    // First successful mutating operation wins
    if let Some(invocation) = invocations.iter().find(|inv| inv.performed_mutation()) {
        let confirmation = match invocation.tool_name() {
            Some(ToolName::AddTask) => match invocation.result.task_title.as_deref() {
                Some(title) => format!("I've added the task \"{}\" to your list!", title),
                None => "I've added the task to your list!".to_string(),
            },
            Some(ToolName::UpdateTask) => match invocation.position {
                Some(position) => format!("I've updated task #{} for you!", position),
                None => "I've updated the task for you!".to_string(),
            },
            Some(ToolName::DeleteTask) => "Task has been removed from your list!".to_string(),
            Some(ToolName::CompleteTask) => {
                if invocation.result.completed == Some(false) {
                    "Task has been marked as incomplete!".to_string()
                } else {
                    "Task has been completed!".to_string()
                }
            }
            _ => invocation.result.message.clone(),
        };

        return match current_tasks {
            Some(tasks) if !tasks.is_empty() => format!(
                "{}\n\nHere are your current tasks:\n{}",
                confirmation,
                render_task_list(tasks)
            ),
            Some(_) => format!("{}\n\nYour task list is now empty.", confirmation),
            None => confirmation,
        };
    }

    // Next, a successful read: show the list
    if let Some(invocation) = invocations
        .iter()
        .find(|inv| inv.result.success && inv.result.tasks.is_some())
    {
        let tasks = invocation.result.tasks.as_deref().unwrap_or_default();
        if tasks.is_empty() {
            return "You don't have any tasks yet.".to_string();
        }
        return format!(
            "You have {} tasks:\n{}",
            tasks.len(),
            render_task_list(tasks)
        );
    }

    // Otherwise the first failure explains itself
    if let Some(failure) = invocations.iter().find(|inv| !inv.result.success) {
        if failure.resolution_failure {
            if let Some(tasks) = current_tasks.filter(|t| !t.is_empty()) {
                return format!(
                    "{}\n\nHere are your current tasks:\n{}",
                    failure.result.message,
                    render_task_list(tasks)
                );
            }
        }
        return failure.result.message.clone();
    }

    // Any remaining success (e.g. identity lookup)
    if let Some(invocation) = invocations.iter().find(|inv| inv.result.success) {
        return invocation.result.message.clone();
    }

    "How can I help you with your tasks?".to_string()
}

fn strip_leaked_tool_call(text: &str) -> String {
    if !(text.contains("\"name\"") && text.contains("\"arguments\"")) {
        return text.to_string();
    }
    let Some(idx) = text.rfind("\"arguments\"") else {
        return text.to_string();
    };
    let rest = &text[idx..];

    // Keep whatever follows the call's closing braces
    if let Some(end) = rest.find("}}") {
        rest[end + 2..].to_string()
    } else if let Some(end) = rest.find('}') {
        rest[end + 1..].to_string()
    } else {
        String::new()
    }
}

fn strip_code_fences(text: &str) -> String {
    let mut result = text.to_string();
    while let Some(start) = result.find("```") {
        match result[start + 3..].find("```") {
            Some(offset) => {
                let end = start + 3 + offset + 3;
                result.replace_range(start..end, " ");
            }
            None => {
                result.replace_range(start..start + 3, "");
            }
        }
    }
    result.replace('`', "")
}

/// Drop hallucinated comment lines and bare assignments.
fn drop_noise_lines(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim();
            if trimmed.starts_with('#') || trimmed.starts_with("//") {
                return false;
            }
            !is_bare_assignment(trimmed)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_bare_assignment(line: &str) -> bool {
    let Some((left, _)) = line.split_once('=') else {
        return false;
    };
    let left = left.trim();
    !left.is_empty()
        && left
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && left.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}

fn collapse_whitespace(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut blank_run = 0usize;

    for line in text.lines() {
        let collapsed = collapse_spaces(line.trim_end());
        if collapsed.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
            lines.push(String::new());
        } else {
            blank_run = 0;
            lines.push(collapsed);
        }
    }

    lines.join("\n").trim().to_string()
}

fn collapse_spaces(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut last_was_space = false;
    for c in line.chars() {
        if c == ' ' {
            if !last_was_space {
                out.push(c);
            }
            last_was_space = true;
        } else {
            last_was_space = false;
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreOutcome;

    fn view(id: &str, title: &str, completed: bool) -> TaskView {
        TaskView {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            completed,
            priority: "medium".to_string(),
            tags: None,
            due_date: None,
            created_at: "2026-01-01 00:00:00".to_string(),
        }
    }

    fn invocation(tool: &str, result: StoreOutcome) -> ToolInvocation {
        let mut inv = ToolInvocation {
            call_id: "c1".to_string(),
            tool: tool.to_string(),
            result,
            mutating: false,
            synthetic: false,
            position: None,
            resolution_failure: false,
        };
        inv.mutating = inv
            .tool_name()
            .map(|t| t.is_mutating() && inv.result.success)
            .unwrap_or(false);
        inv
    }

    #[test]
    fn test_delimiter_round_trip() {
        let raw = "<thought>Let me think about this.</thought>Your task was added.";
        assert_eq!(sanitize(raw), "Your task was added.");

        let raw = "[thinking]hmm[/thinking]  Done!";
        assert_eq!(sanitize(raw), "Done!");
    }

    #[test]
    fn test_multiple_delimiter_pairs() {
        let raw = "<reasoning>first</reasoning><plan>second</plan>All set.";
        assert_eq!(sanitize(raw), "All set.");
    }

    #[test]
    fn test_unpaired_delimiter_left_alone() {
        // Opening tag without its closing tag is not a recognized pair
        let raw = "I added <thought> to your notes.";
        assert_eq!(sanitize(raw), raw);
    }

    #[test]
    fn test_leaked_tool_call_stripped() {
        let raw = r#"{"name": "add_task", "arguments": {"title": "Buy milk"}} Task added!"#;
        assert_eq!(sanitize(raw), "Task added!");
    }

    #[test]
    fn test_code_fences_stripped() {
        let raw = "Here you go:\n```json\n{\"a\": 1}\n```\nDone.";
        assert_eq!(sanitize(raw), "Here you go:\n\nDone.");
    }

    #[test]
    fn test_noise_lines_dropped() {
        let raw = "# internal note\nresult = compute()\nYour list is empty.";
        assert_eq!(sanitize(raw), "Your list is empty.");
    }

    #[test]
    fn test_whitespace_collapsed() {
        let raw = "Too   many    spaces.\n\n\n\nAnd blank lines.";
        assert_eq!(sanitize(raw), "Too many spaces.\n\nAnd blank lines.");
    }

    #[test]
    fn test_robotic_phrases() {
        assert!(is_robotic("Processed your request successfully."));
        assert!(is_robotic("  I've completed your request.  "));
        assert!(is_robotic("I processed your request."));
        assert!(!is_robotic("I've added the task for you."));
    }

    #[test]
    fn test_render_task_list_format() {
        let tasks = vec![view("a", "Buy milk", false), view("b", "Call mom", true)];
        let rendered = render_task_list(&tasks);
        assert_eq!(rendered, "1) Buy milk — Pending\n2) Call mom — Completed");
    }

    #[test]
    fn test_fallback_for_add() {
        let inv = invocation(
            "add_task",
            StoreOutcome::ok("Task 'Buy milk' added successfully!").with_task("id-1", "Buy milk"),
        );
        let tasks = vec![view("id-1", "Buy milk", false)];

        let reply = fallback_reply(&[inv], Some(&tasks));
        assert!(reply.contains("Buy milk"));
        assert!(reply.contains("1) Buy milk — Pending"));
    }

    #[test]
    fn test_finalize_replaces_robotic_reply() {
        let inv = invocation(
            "delete_task",
            StoreOutcome::ok("Task deleted successfully!").with_task("id-1", "A"),
        );
        let tasks = vec![view("id-2", "B", false)];

        let reply = finalize_reply("Processed your request successfully.", &[inv], Some(&tasks));
        assert!(reply.contains("removed from your list"));
        assert!(reply.contains("1) B — Pending"));
    }

    #[test]
    fn test_finalize_keeps_usable_text() {
        let reply = finalize_reply("Done, I deleted it for you.", &[], None);
        assert_eq!(reply, "Done, I deleted it for you.");
    }

    #[test]
    fn test_fallback_resolution_failure_appends_list() {
        let mut inv = invocation(
            "delete_task",
            StoreOutcome::fail("Sorry, I couldn't find task number 7. You currently have 3 tasks."),
        );
        inv.resolution_failure = true;
        inv.position = Some(7);
        let tasks = vec![
            view("a", "A", false),
            view("b", "B", false),
            view("c", "C", false),
        ];

        let reply = fallback_reply(&[inv], Some(&tasks));
        assert!(reply.contains("task number 7"));
        assert!(reply.contains("3) C — Pending"));
    }

    #[test]
    fn test_fallback_read_only_lists_tasks() {
        let inv = invocation(
            "get_all_tasks",
            StoreOutcome::ok("You have 2 tasks.")
                .with_tasks(vec![view("a", "A", false), view("b", "B", true)]),
        );

        let reply = fallback_reply(&[inv], None);
        assert!(reply.starts_with("You have 2 tasks:"));
        assert!(reply.contains("2) B — Completed"));
    }

    #[test]
    fn test_fallback_with_no_invocations() {
        let reply = fallback_reply(&[], None);
        assert!(!reply.is_empty());
    }
}
