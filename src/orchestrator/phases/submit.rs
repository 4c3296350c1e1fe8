//! Submission stage: hand batch scripts to the scheduler.
//!
//! Submissions are sequential; each call blocks until the scheduler accepts the
//! job (not until it finishes). Job IDs are logged but not tracked.

use crate::error::Result;
use crate::models::{CampaignContext, JobKind, StageReport, SubmissionRequest};
use crate::orchestrator::executor::submit;
use crate::orchestrator::phases::link::event_directories;
use crate::system::CommandRunner;

/// Submit the mesher script from the mesh directory.
pub async fn submit_mesher(ctx: &CampaignContext, runner: &dyn CommandRunner) -> Result<StageReport> {
    let mut report = StageReport::new("submit_mesher");
    let request = SubmissionRequest {
        job_kind: JobKind::Mesher,
        array_range: None,
        target_directory: ctx.paths.mesh_dir().root().to_path_buf(),
    };
    report.submissions.push(submit(ctx, runner, request).await?);
    Ok(report)
}

/// Submit the solver job array for indices `first..=last`.
///
/// The range is not checked against the number of events.
pub async fn submit_solver(
    ctx: &CampaignContext,
    runner: &dyn CommandRunner,
    first: u32,
    last: u32,
) -> Result<StageReport> {
    let mut report = StageReport::new("submit_solver");
    let request = SubmissionRequest {
        job_kind: JobKind::Solver,
        array_range: Some((first, last)),
        target_directory: ctx.paths.campaign_root(),
    };
    report.submissions.push(submit(ctx, runner, request).await?);
    Ok(report)
}

/// Submit the per-event solver script in each event directory, starting at
/// index `from` of the sorted listing, at most `ctx.submission_cap` per
/// invocation. The remainder is left for a re-invocation with the next offset.
pub async fn submit_each(
    ctx: &CampaignContext,
    runner: &dyn CommandRunner,
    from: usize,
) -> Result<StageReport> {
    let mut report = StageReport::new("submit_each");
    let targets = event_directories(ctx)?;
    if from >= targets.len() {
        log::warn!(
            "[Submit] Nothing to submit: offset {} past the {} event directories",
            from,
            targets.len()
        );
        return Ok(report);
    }

    let batch = &targets[from..targets.len().min(from + ctx.submission_cap)];
    for run in batch {
        let request = SubmissionRequest {
            job_kind: JobKind::Solver,
            array_range: None,
            target_directory: run.root().to_path_buf(),
        };
        report.submissions.push(submit(ctx, runner, request).await?);
        report.touched(run.root());
    }

    let next = from + batch.len();
    if next < targets.len() {
        log::warn!(
            "[Submit] Submission cap of {} reached; {} directories left, re-run with --from {}",
            ctx.submission_cap,
            targets.len() - next,
            next
        );
    }
    Ok(report)
}

/// Number of directories `submit_each` would still consider from offset `from`.
pub fn pending_count(ctx: &CampaignContext, from: usize) -> Result<usize> {
    Ok(event_directories(ctx)?.len().saturating_sub(from))
}
