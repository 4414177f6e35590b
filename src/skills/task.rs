//! Task skill: create and list reminders

use super::{failed, iso_date, string_field, SkillContext};
use crate::models::{ErrorKind, SkillResult, ToolCall};
use crate::tools::ToolGateway;
use crate::translation::{ReplyTemplate, TaskLine};
use std::sync::Arc;

pub struct TaskSkill {
    gateway: Arc<ToolGateway>,
}

impl TaskSkill {
    pub fn new(gateway: Arc<ToolGateway>) -> Self {
        Self { gateway }
    }

    pub async fn create_task(&self, ctx: &SkillContext) -> SkillResult {
        const TOOL: &str = "create_task";
        let entities = &ctx.entities;

        let Some(title) = entities.title.clone().filter(|t| !t.trim().is_empty()) else {
            return SkillResult::failure(ErrorKind::Validation);
        };
        let due_date = entities.date.map(iso_date);

        let call = ToolCall::new(TOOL)
            .arg("title", title.clone())
            .arg_opt("due_date", due_date.clone());

        match self.gateway.call(&call).await {
            Ok(result) => {
                let reply = ReplyTemplate::TaskCreated {
                    title: string_field(&result, "title").unwrap_or(title),
                    due_date: string_field(&result, "due_date").or(due_date),
                };
                SkillResult::ok(reply, result).with_tool_call(TOOL)
            }
            Err(e) => failed(TOOL, e),
        }
    }

    pub async fn list_tasks(&self, _ctx: &SkillContext) -> SkillResult {
        const TOOL: &str = "list_tasks";

        match self.gateway.call(&ToolCall::new(TOOL)).await {
            Ok(result) => {
                let tasks: Vec<TaskLine> = result
                    .get("tasks")
                    .and_then(|t| t.as_array())
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|item| {
                                Some(TaskLine {
                                    title: string_field(item, "title")?,
                                    due_date: string_field(item, "due_date"),
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                if tasks.is_empty() {
                    return SkillResult::no_data("tasks").with_tool_call(TOOL);
                }
                SkillResult::ok(ReplyTemplate::TaskList { tasks }, result).with_tool_call(TOOL)
            }
            Err(e) => failed(TOOL, e),
        }
    }
}
