//! Advisory Loop: periodic analysis of the company that emits proposals
//! for a human to approve.
//!
//! An evaluation computes a [`ProductState`], records a few thoughts in a
//! bounded ring buffer, and then emits at most one proposal of each kind
//! (mission, hire, tech), each behind its own gate. No proposal of any
//! kind is emitted while `max_pending_proposals` are already pending.

use std::collections::VecDeque;

use codeshop_types::{
    Change, EmployeeRole, EmployeeStatus, MissionStatus, Priority, ProductPhase, Proposal,
    ProposalId, ProposalKind, ProposalPayload, ProposalStatus, TaskDefinition, TaskStatus,
    TaskType, Thought,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::store::EntityStore;

/// Completion percentage below which the product is still being built.
const BUILDING_THRESHOLD_PERCENT: u8 = 50;

/// Shipped features below which the product is still shipping.
const SCALING_FEATURES: u32 = 3;

/// Read-only analysis of the company at one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductState {
    /// Coarse stage of the product.
    pub phase: ProductPhase,
    /// Tasks that exist.
    pub total_tasks: usize,
    /// Tasks that are done.
    pub done_tasks: usize,
    /// `done_tasks` as a whole percentage of `total_tasks`.
    pub completion_percent: u8,
    /// Tasks in `backlog` or `todo`.
    pub pending_tasks: usize,
    /// Employees with nothing to do.
    pub idle_employees: usize,
    /// Employees on staff.
    pub team_size: usize,
    /// Missions not yet completed or abandoned.
    pub open_missions: usize,
    /// Missions completed.
    pub features_shipped: u32,
    /// Ticks since the company was founded.
    pub elapsed_ticks: u64,
}

/// Advisor bookkeeping kept in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorState {
    last_evaluated_tick: u64,
    evaluations: u64,
    thoughts: VecDeque<Thought>,
    max_thoughts: usize,
    last_state: Option<ProductState>,
}

impl AdvisorState {
    /// Create an advisor that keeps at most `max_thoughts` thoughts.
    pub const fn new(max_thoughts: usize) -> Self {
        Self {
            last_evaluated_tick: 0,
            evaluations: 0,
            thoughts: VecDeque::new(),
            max_thoughts,
            last_state: None,
        }
    }

    /// Tick of the last evaluation (0 before the first).
    pub const fn last_evaluated_tick(&self) -> u64 {
        self.last_evaluated_tick
    }

    /// Number of evaluations run.
    pub const fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Recent thoughts, oldest first.
    pub fn thoughts(&self) -> impl Iterator<Item = &Thought> {
        self.thoughts.iter()
    }

    /// Product state computed by the last evaluation.
    pub const fn last_state(&self) -> Option<&ProductState> {
        self.last_state.as_ref()
    }

    fn think(&mut self, tick: u64, text: String) {
        debug!(tick, thought = %text, "Advisor thought");
        self.thoughts.push_back(Thought { tick, text });
        while self.thoughts.len() > self.max_thoughts {
            let _ = self.thoughts.pop_front();
        }
    }
}

/// A canned mission suggestion.
struct MissionIdea {
    name: &'static str,
    description: &'static str,
    tasks: &'static [(&'static str, TaskType, u64)],
}

const INCEPTION_IDEAS: &[MissionIdea] = &[
    MissionIdea {
        name: "MVP Landing Page",
        description: "A landing page that explains the product and collects signups",
        tasks: &[
            ("Landing page layout", TaskType::Design, 4),
            ("Signup form backend", TaskType::Feature, 6),
            ("Launch announcement copy", TaskType::Marketing, 3),
        ],
    },
    MissionIdea {
        name: "User Accounts",
        description: "Registration, login, and password reset",
        tasks: &[
            ("Account data model", TaskType::Infrastructure, 4),
            ("Login and registration", TaskType::Feature, 8),
            ("Auth screens", TaskType::Design, 4),
        ],
    },
];

const BUILDING_IDEAS: &[MissionIdea] = &[
    MissionIdea {
        name: "Search",
        description: "Full-text search across the product",
        tasks: &[
            ("Search index", TaskType::Infrastructure, 6),
            ("Search API", TaskType::Feature, 5),
            ("Search results UI", TaskType::Design, 4),
        ],
    },
    MissionIdea {
        name: "Notifications",
        description: "In-app and email notifications for important events",
        tasks: &[
            ("Notification service", TaskType::Feature, 6),
            ("Notification center UI", TaskType::Design, 4),
        ],
    },
    MissionIdea {
        name: "Settings Page",
        description: "Let users manage their profile and preferences",
        tasks: &[
            ("Preferences API", TaskType::Feature, 4),
            ("Settings layout", TaskType::Design, 3),
        ],
    },
];

const SHIPPING_IDEAS: &[MissionIdea] = &[
    MissionIdea {
        name: "Onboarding Flow",
        description: "Guide new users to their first success",
        tasks: &[
            ("Onboarding checklist", TaskType::Feature, 5),
            ("Welcome tour visuals", TaskType::Design, 4),
            ("Welcome email series", TaskType::Marketing, 3),
        ],
    },
    MissionIdea {
        name: "Billing",
        description: "Plans, checkout, and invoices",
        tasks: &[
            ("Payment provider integration", TaskType::Infrastructure, 7),
            ("Checkout flow", TaskType::Feature, 6),
            ("Pricing page copy", TaskType::Marketing, 3),
        ],
    },
];

const SCALING_IDEAS: &[MissionIdea] = &[
    MissionIdea {
        name: "Public API",
        description: "Documented API for third-party integrations",
        tasks: &[
            ("API keys and rate limits", TaskType::Infrastructure, 6),
            ("REST endpoints", TaskType::Feature, 8),
            ("Developer docs", TaskType::Marketing, 4),
        ],
    },
    MissionIdea {
        name: "Performance Pass",
        description: "Find and fix the slowest paths",
        tasks: &[
            ("Profiling harness", TaskType::Infrastructure, 4),
            ("Fix slow queries", TaskType::Bug, 5),
        ],
    },
    MissionIdea {
        name: "Analytics Dashboard",
        description: "Usage insights for customers",
        tasks: &[
            ("Event pipeline", TaskType::Infrastructure, 6),
            ("Dashboard charts", TaskType::Design, 5),
            ("Dashboard API", TaskType::Feature, 5),
        ],
    },
];

const fn ideas_for(phase: ProductPhase) -> &'static [MissionIdea] {
    match phase {
        ProductPhase::Inception => INCEPTION_IDEAS,
        ProductPhase::Building => BUILDING_IDEAS,
        ProductPhase::Shipping => SHIPPING_IDEAS,
        ProductPhase::Scaling => SCALING_IDEAS,
    }
}

impl EntityStore {
    /// Analyse the company without changing anything.
    pub fn product_state(&self) -> ProductState {
        let total_tasks = self.tasks.len();
        let done_tasks = self
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Done)
            .count();
        let completion_percent = done_tasks
            .saturating_mul(100)
            .checked_div(total_tasks)
            .and_then(|p| u8::try_from(p).ok())
            .unwrap_or(0);
        let features_shipped = self.stats.features_shipped;

        let phase = if total_tasks == 0 {
            ProductPhase::Inception
        } else if completion_percent < BUILDING_THRESHOLD_PERCENT {
            ProductPhase::Building
        } else if features_shipped < SCALING_FEATURES {
            ProductPhase::Shipping
        } else {
            ProductPhase::Scaling
        };

        ProductState {
            phase,
            total_tasks,
            done_tasks,
            completion_percent,
            pending_tasks: self.tasks.values().filter(|t| t.status.is_pending()).count(),
            idle_employees: self
                .employees
                .values()
                .filter(|e| e.status == EmployeeStatus::Idle)
                .count(),
            team_size: self.employees.len(),
            open_missions: self
                .missions
                .values()
                .filter(|m| !m.status.is_terminal())
                .count(),
            features_shipped,
            elapsed_ticks: self.clock.tick(),
        }
    }

    /// Whether an evaluation is due on the current tick.
    pub fn advisor_due(&self) -> bool {
        let interval = self.config.advisor.evaluation_interval_ticks.max(1);
        self.clock
            .tick()
            .saturating_sub(self.advisor.last_evaluated_tick)
            >= interval
    }

    /// Run an evaluation if the advisor is enabled and one is due.
    pub fn run_advisor_if_due(&mut self) -> Vec<ProposalId> {
        if self.config.advisor.enabled && self.advisor_due() {
            self.run_advisor()
        } else {
            Vec::new()
        }
    }

    /// Run one advisory evaluation now. Returns the proposals emitted.
    pub fn run_advisor(&mut self) -> Vec<ProposalId> {
        let tick = self.clock.tick();
        let state = self.product_state();
        self.advisor.last_evaluated_tick = tick;
        self.advisor.evaluations = self.advisor.evaluations.saturating_add(1);

        self.advisor.think(
            tick,
            format!(
                "Phase {:?}: {}/{} tasks done ({}%), {} feature(s) shipped.",
                state.phase,
                state.done_tasks,
                state.total_tasks,
                state.completion_percent,
                state.features_shipped
            ),
        );
        if state.idle_employees > 0 {
            self.advisor.think(
                tick,
                format!(
                    "{} teammate(s) idle with {} task(s) waiting.",
                    state.idle_employees, state.pending_tasks
                ),
            );
        }

        let mut created = Vec::new();
        created.extend(self.propose_mission(&state));
        created.extend(self.propose_hire(&state));
        created.extend(self.propose_tech());

        if created.is_empty() {
            self.advisor.think(tick, "Nothing to propose right now.".to_owned());
        }
        info!(tick, phase = ?state.phase, proposals = created.len(), "Advisor evaluated");
        self.advisor.last_state = Some(state);
        created
    }

    fn pending_count(&self) -> usize {
        self.pending_proposals().count()
    }

    fn pending_cap_reached(&self) -> bool {
        self.pending_count() >= self.config.advisor.max_pending_proposals
    }

    fn propose_mission(&mut self, state: &ProductState) -> Option<ProposalId> {
        let tick = self.clock.tick();
        if state.idle_employees == 0
            || state.pending_tasks >= state.idle_employees
            || state.open_missions >= self.config.advisor.max_active_missions
        {
            return None;
        }
        if self.pending_cap_reached() {
            self.advisor.think(
                tick,
                "Would suggest a mission, but the proposal inbox is full.".to_owned(),
            );
            return None;
        }

        let taken: Vec<String> = self
            .proposals
            .values()
            .filter(|p| p.is_pending())
            .filter_map(|p| match &p.payload {
                ProposalPayload::Mission { mission_name, .. } => Some(mission_name.to_lowercase()),
                _ => None,
            })
            .chain(
                self.missions
                    .values()
                    .filter(|m| m.status != MissionStatus::Abandoned)
                    .map(|m| m.name.to_lowercase()),
            )
            .collect();
        let candidates: Vec<&MissionIdea> = ideas_for(state.phase)
            .iter()
            .filter(|idea| !taken.contains(&idea.name.to_lowercase()))
            .collect();
        if candidates.is_empty() {
            self.advisor
                .think(tick, "Out of fresh mission ideas for this phase.".to_owned());
            return None;
        }

        let mut rng = StdRng::seed_from_u64(self.config.simulation.seed ^ tick);
        let idea = candidates.get(rng.random_range(0..candidates.len()))?;

        let tasks: Vec<TaskDefinition> = idea
            .tasks
            .iter()
            .map(|(title, task_type, ticks)| TaskDefinition::new(title, "", *task_type, *ticks))
            .collect();
        let priority = if state.phase == ProductPhase::Inception {
            Priority::High
        } else {
            Priority::Medium
        };
        let reasoning = format!(
            "{} idle teammate(s) but only {} task(s) waiting; the product is in {:?}.",
            state.idle_employees, state.pending_tasks, state.phase
        );
        self.advisor
            .think(tick, format!("Suggesting the {} mission.", idea.name));
        Some(self.add_proposal(
            format!("Start mission: {}", idea.name),
            idea.description.to_owned(),
            reasoning,
            priority,
            ProposalPayload::Mission {
                mission_name: idea.name.to_owned(),
                description: idea.description.to_owned(),
                priority,
                tasks,
            },
        ))
    }

    fn propose_hire(&mut self, state: &ProductState) -> Option<ProposalId> {
        let tick = self.clock.tick();
        if state.team_size >= self.config.advisor.hire_team_size_limit
            || self.treasury.funds() <= self.config.advisor.hire_funds_threshold
            || self.pending_proposals().any(|p| p.kind() == ProposalKind::Hire)
            || self.pending_cap_reached()
        {
            return None;
        }
        let role = EmployeeRole::CORE.into_iter().find(|role| {
            !self.employees.values().any(|e| e.role == *role)
                && !self.hire_intents.iter().any(|i| i.role == *role)
        })?;

        let cost = self.config.economy.salaries.for_role(role);
        self.advisor
            .think(tick, format!("The team has no {}.", role.as_str()));
        Some(self.add_proposal(
            format!("Hire a {}", role.as_str()),
            format!("Bring a {} on board for {cost}.", role.as_str()),
            format!(
                "Team of {} lacks a {}, and funds ({}) allow it.",
                state.team_size,
                role.as_str(),
                self.treasury.funds()
            ),
            Priority::Medium,
            ProposalPayload::Hire { role },
        ))
    }

    fn propose_tech(&mut self) -> Option<ProposalId> {
        let tick = self.clock.tick();
        if self.pending_proposals().any(|p| p.kind() == ProposalKind::Tech)
            || self.pending_cap_reached()
        {
            return None;
        }
        let completed = self.stats.tasks_completed;
        let funds = self.treasury.funds();
        let upgrade = self.upgrades.iter().find(|u| {
            !u.purchased && completed >= u.unlock_after_tasks && u.cost <= funds
        })?;
        let (id, name, description, cost) = (
            upgrade.id.clone(),
            upgrade.name.clone(),
            upgrade.description.clone(),
            upgrade.cost,
        );

        self.advisor
            .think(tick, format!("{name} is unlocked and affordable."));
        Some(self.add_proposal(
            format!("Buy {name}"),
            description,
            format!("{completed} tasks completed; {name} costs {cost} of {funds} available."),
            Priority::Low,
            ProposalPayload::Tech { upgrade_id: id },
        ))
    }

    fn add_proposal(
        &mut self,
        title: String,
        description: String,
        reasoning: String,
        priority: Priority,
        payload: ProposalPayload,
    ) -> ProposalId {
        let proposal = Proposal {
            id: ProposalId::new(),
            title,
            description,
            reasoning,
            priority,
            created_at: self.clock.tick(),
            status: ProposalStatus::Pending,
            payload,
        };
        let (proposal_id, kind) = (proposal.id, proposal.kind());
        info!(proposal_id = %proposal_id, kind = ?kind, title = %proposal.title, "Proposal created");
        self.proposals.insert(proposal_id, proposal);
        self.emit(Change::ProposalCreated { proposal_id, kind });
        proposal_id
    }
}
