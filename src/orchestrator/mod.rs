//! Campaign orchestration: mesh -> prepare_solve -> submit, plus clean_solve.

pub mod catalog;
pub mod executor;
pub mod phases;
pub mod staging;
pub mod state;

use std::sync::Arc;

pub use catalog::events_for_iteration;
pub use phases::LinkDirection;
pub use state::Stage;

use crate::error::Result;
use crate::models::{CampaignContext, StageReport};
use crate::system::CommandRunner;

/// Stateless stage dispatcher.
///
/// Holds the campaign context and the runner used for external tools; nothing
/// about previous runs is remembered. Every stage re-inspects the filesystem.
#[derive(Clone)]
pub struct Orchestrator {
    ctx: CampaignContext,
    runner: Arc<dyn CommandRunner>,
}

impl Orchestrator {
    pub fn new(ctx: CampaignContext, runner: Arc<dyn CommandRunner>) -> Self {
        Orchestrator { ctx, runner }
    }

    pub fn context(&self) -> &CampaignContext {
        &self.ctx
    }

    /// Run one stage to completion. Fatal conditions abort the stage immediately.
    pub async fn run(&self, stage: Stage) -> Result<StageReport> {
        log::info!(
            "[Orchestrator] Stage {} for {}/{}",
            stage,
            self.ctx.paths.project_name(),
            self.ctx.iteration_name()
        );
        if let Some(requires) = stage.precondition() {
            log::debug!("[Orchestrator] Requires: {}", requires);
        }
        let runner = self.runner.as_ref();
        let result = match stage {
            Stage::Mesh => phases::mesh::reconcile(&self.ctx, runner).await,
            Stage::PrepareSolve => phases::link::reconcile(&self.ctx, LinkDirection::Prepare),
            Stage::CleanSolve => phases::link::reconcile(&self.ctx, LinkDirection::Clean),
            Stage::SubmitMesher => phases::submit::submit_mesher(&self.ctx, runner).await,
            Stage::SubmitSolver { first, last } => {
                phases::submit::submit_solver(&self.ctx, runner, first, last).await
            }
            Stage::SubmitEach { from } => phases::submit::submit_each(&self.ctx, runner, from).await,
        };

        if let Err(ref e) = result {
            log::error!("[Orchestrator] Stage {} aborted: {}", stage, e);
        }
        result
    }

    /// Operator prompt for stages that need confirmation, `None` otherwise.
    ///
    /// Reads the catalog or the iteration root to put real counts in the prompt.
    pub fn confirmation_prompt(&self, stage: Stage) -> Result<Option<String>> {
        if !stage.needs_confirmation() {
            return Ok(None);
        }
        let prompt = match stage {
            Stage::Mesh => {
                let events = events_for_iteration(&self.ctx.iteration_descriptor())?;
                format!(
                    "I'll be creating {} directories in {}.",
                    events.len() + 1,
                    self.ctx.paths.iteration_root().display()
                )
            }
            Stage::CleanSolve => format!(
                "Warning. This will delete all linked mesh files outside {}.",
                self.ctx.paths.mesh_dir().root().display()
            ),
            Stage::SubmitEach { from } => {
                let pending = phases::submit::pending_count(&self.ctx, from)?;
                format!(
                    "I'm about to submit {} jobs.",
                    pending.min(self.ctx.submission_cap)
                )
            }
            Stage::PrepareSolve | Stage::SubmitMesher | Stage::SubmitSolver { .. } => {
                return Ok(None)
            }
        };
        Ok(Some(prompt))
    }
}
