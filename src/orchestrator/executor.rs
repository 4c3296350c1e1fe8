//! External tool execution: the compile step and scheduler submissions.
//!
//! Only exit status is interpreted. Compiler output goes to a log file that is
//! the sole diagnostic on failure; scheduler stdout is kept for the report.

use crate::error::{OrchestratorError, Result};
use crate::models::{CampaignContext, JobKind, SubmissionRecord, SubmissionRequest};
use crate::system::{CommandRunner, Invocation};

/// Mode flag passed to the compile script.
pub const COMPILE_MODE: &str = "adjoint";

/// Invocation of the compile script inside the solver installation.
pub fn compile_invocation(ctx: &CampaignContext) -> Invocation {
    Invocation::new(
        format!("./{}", ctx.tools.compile_script),
        ctx.specfem_root.clone(),
    )
    .arg(ctx.compiler_suite.clone())
    .arg(COMPILE_MODE)
    .log_to(ctx.compilation_log())
}

/// Runs the compile script and waits. Non-zero exit is fatal.
pub async fn run_compiler(ctx: &CampaignContext, runner: &dyn CommandRunner) -> Result<()> {
    let invocation = compile_invocation(ctx);
    let command = invocation.command_line();
    log::info!(
        "[Mesh] [COMPILE] Running '{}' in {}",
        command,
        ctx.specfem_root.display()
    );

    let outcome = runner.run(invocation).await?;
    if !outcome.success() {
        log::error!("[Mesh] [COMPILE] Failed: {}", outcome.status_text());
        return Err(OrchestratorError::ExternalTool {
            command,
            status: outcome.status_text(),
            log: ctx.compilation_log(),
        });
    }

    log::info!("[Mesh] [COMPILE] Done (log: {})", ctx.compilation_log().display());
    Ok(())
}

/// Scheduler invocation for a request.
///
/// Mesher and per-event solver jobs run `<scheduler> <script>` inside the target
/// directory; job arrays add `--array=<first>-<last>` and the iteration name.
pub fn submission_invocation(ctx: &CampaignContext, request: &SubmissionRequest) -> Invocation {
    let base = Invocation::new(ctx.tools.scheduler.clone(), request.target_directory.clone());
    match (request.job_kind, request.array_spec()) {
        (JobKind::Mesher, _) => base.arg(ctx.tools.mesher_script.clone()),
        (JobKind::Solver, Some(range)) => base
            .arg(format!("--array={}", range))
            .arg(ctx.tools.solver_array_script.clone())
            .arg(ctx.iteration_name().to_string()),
        (JobKind::Solver, None) => base.arg(format!("./{}", ctx.tools.solver_script)),
    }
}

/// Hand one request to the scheduler and block until it is accepted.
pub async fn submit(
    ctx: &CampaignContext,
    runner: &dyn CommandRunner,
    request: SubmissionRequest,
) -> Result<SubmissionRecord> {
    let invocation = submission_invocation(ctx, &request);
    let command = invocation.command_line();
    log::info!(
        "[Submit] Submitting '{}' in {}",
        command,
        request.target_directory.display()
    );

    let outcome = runner.run(invocation).await?;
    if !outcome.success() {
        return Err(OrchestratorError::SubmissionRejected {
            command,
            cwd: request.target_directory.clone(),
            status: outcome.status_text(),
        });
    }

    for line in outcome.stdout.lines().filter(|l| !l.trim().is_empty()) {
        log::info!("[Submit] {}", line.trim());
    }

    Ok(SubmissionRecord {
        request,
        scheduler_output: outcome.stdout.trim().to_string(),
    })
}
