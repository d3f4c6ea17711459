//! Human decisions on advisor proposals.
//!
//! Approval marks the proposal and dispatches its payload: a mission
//! proposal creates the mission with its backlog, a hire proposal records a
//! [`HireIntent`] for the operator to act on, and a tech proposal purchases
//! the upgrade. Only pending proposals can be decided.

use codeshop_types::{
    Change, EmployeeRole, HireIntent, MissionId, ProposalId, ProposalPayload, ProposalStatus,
    Severity,
};
use tracing::{info, warn};

use crate::store::EntityStore;

/// What approving a proposal did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalEffect {
    /// A mission was created in planning.
    MissionCreated(MissionId),
    /// A hire intent was recorded for the role.
    HireRequested(EmployeeRole),
    /// An upgrade purchase was attempted.
    UpgradeAttempted {
        /// Catalog id of the upgrade.
        upgrade_id: String,
        /// Whether the purchase went through.
        purchased: bool,
    },
}

impl EntityStore {
    /// Approve a pending proposal and dispatch its payload.
    ///
    /// Returns `None` when the proposal is unknown or already decided.
    pub fn approve_proposal(&mut self, proposal_id: ProposalId) -> Option<ProposalEffect> {
        let payload = self.decide(proposal_id, ProposalStatus::Approved)?;
        let tick = self.clock.tick();

        let effect = match payload {
            ProposalPayload::Mission {
                mission_name,
                description,
                priority,
                tasks,
            } => ProposalEffect::MissionCreated(self.create_mission_with_tasks(
                &mission_name,
                &description,
                priority,
                &tasks,
            )),
            ProposalPayload::Hire { role } => {
                self.hire_intents.push(HireIntent {
                    proposal_id,
                    role,
                    created_at: tick,
                });
                self.emit(Change::HireRequested { proposal_id, role });
                self.notify(
                    format!("Hiring approved: bring on a {}", role.as_str()),
                    Severity::Info,
                );
                ProposalEffect::HireRequested(role)
            }
            ProposalPayload::Tech { upgrade_id } => {
                let purchased = self.purchase_upgrade(&upgrade_id);
                ProposalEffect::UpgradeAttempted {
                    upgrade_id,
                    purchased,
                }
            }
        };
        info!(proposal_id = %proposal_id, effect = ?effect, "Proposal approved");
        Some(effect)
    }

    /// Reject a pending proposal. The record is kept.
    pub fn reject_proposal(&mut self, proposal_id: ProposalId) -> bool {
        let rejected = self.decide(proposal_id, ProposalStatus::Rejected).is_some();
        if rejected {
            info!(proposal_id = %proposal_id, "Proposal rejected");
        }
        rejected
    }

    /// Delete a pending proposal outright.
    pub fn dismiss_proposal(&mut self, proposal_id: ProposalId) -> bool {
        if !self.proposals.get(&proposal_id).is_some_and(|p| p.is_pending()) {
            warn!(proposal_id = %proposal_id, "Only pending proposals can be dismissed");
            return false;
        }
        let _ = self.proposals.remove(&proposal_id);
        self.emit(Change::ProposalDismissed { proposal_id });
        info!(proposal_id = %proposal_id, "Proposal dismissed");
        true
    }

    /// Move a pending proposal to `status` and hand back its payload.
    fn decide(
        &mut self,
        proposal_id: ProposalId,
        status: ProposalStatus,
    ) -> Option<ProposalPayload> {
        let proposal = self.proposals.get_mut(&proposal_id)?;
        if !proposal.is_pending() {
            warn!(
                proposal_id = %proposal_id,
                status = ?proposal.status,
                "Proposal already decided"
            );
            return None;
        }
        proposal.status = status;
        let payload = proposal.payload.clone();
        self.emit(Change::ProposalDecided {
            proposal_id,
            status,
        });
        Some(payload)
    }
}
