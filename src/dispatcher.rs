//! Skill dispatcher
//!
//! Fixed Intent → Operation table. One skill operation per turn.

use crate::config::RouterConfig;
use crate::models::{ErrorKind, Intent, IntentResult, SkillResult};
use crate::skills::{BudgetSkill, InvestmentSkill, SkillContext, SpendingSkill, TaskSkill};
use crate::tools::ToolGateway;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A dispatchable skill operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AddTransaction,
    QuerySpending,
    HealthScore,
    SetBudget,
    BudgetStatus,
    SimulateInvestment,
    CreateTask,
    ListTasks,
}

impl Operation {
    /// GREETING, OFF_TOPIC and UNKNOWN have no operation.
    pub fn for_intent(intent: Intent) -> Option<Self> {
        match intent {
            Intent::AddTransaction => Some(Operation::AddTransaction),
            Intent::QuerySpending => Some(Operation::QuerySpending),
            Intent::HealthScore => Some(Operation::HealthScore),
            Intent::SetBudget => Some(Operation::SetBudget),
            Intent::QueryBudgetStatus => Some(Operation::BudgetStatus),
            Intent::SimulateInvestment => Some(Operation::SimulateInvestment),
            Intent::CreateTask => Some(Operation::CreateTask),
            Intent::ListTasks => Some(Operation::ListTasks),
            Intent::Greeting | Intent::OffTopic | Intent::Unknown => None,
        }
    }

    /// The one tool this operation calls.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Operation::AddTransaction => "add_transaction",
            Operation::QuerySpending => "analyze_spending",
            Operation::HealthScore => "get_health_score",
            Operation::SetBudget => "create_budget",
            Operation::BudgetStatus => "get_financial_summary",
            Operation::SimulateInvestment => "simulate_investment",
            Operation::CreateTask => "create_task",
            Operation::ListTasks => "list_tasks",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::AddTransaction => "Spending.add_transaction",
            Operation::QuerySpending => "Spending.query_spending",
            Operation::HealthScore => "Spending.health_score",
            Operation::SetBudget => "Budget.set_budget",
            Operation::BudgetStatus => "Budget.get_status",
            Operation::SimulateInvestment => "Investment.simulate",
            Operation::CreateTask => "Task.create_task",
            Operation::ListTasks => "Task.list_tasks",
        };
        write!(f, "{}", s)
    }
}

pub struct SkillDispatcher {
    spending: SpendingSkill,
    budget: BudgetSkill,
    investment: InvestmentSkill,
    task: TaskSkill,
}

impl SkillDispatcher {
    pub fn new(gateway: Arc<ToolGateway>, config: Arc<RouterConfig>) -> Self {
        Self {
            spending: SpendingSkill::new(gateway.clone(), config.clone()),
            budget: BudgetSkill::new(gateway.clone()),
            investment: InvestmentSkill::new(gateway.clone(), config),
            task: TaskSkill::new(gateway),
        }
    }

    /// Never returns an error; failures come back as a failed SkillResult.
    pub async fn dispatch(&self, intent: &IntentResult, ctx: &SkillContext) -> SkillResult {
        let Some(operation) = Operation::for_intent(intent.intent) else {
            warn!(intent = %intent.intent, "No skill operation for intent");
            return SkillResult::failure(ErrorKind::UnsupportedRequest);
        };

        debug!(
            intent = %intent.intent,
            operation = %operation,
            tool_name = operation.tool_name(),
            "Dispatching"
        );

        match operation {
            Operation::AddTransaction => self.spending.add_transaction(ctx).await,
            Operation::QuerySpending => self.spending.query_spending(ctx).await,
            Operation::HealthScore => self.spending.health_score(ctx).await,
            Operation::SetBudget => self.budget.set_budget(ctx).await,
            Operation::BudgetStatus => self.budget.get_status(ctx).await,
            Operation::SimulateInvestment => self.investment.simulate(ctx).await,
            Operation::CreateTask => self.task.create_task(ctx).await,
            Operation::ListTasks => self.task.list_tasks(ctx).await,
        }
    }
}
