//! Scheduler submission: command shape, working directory, throttling, rejection.

mod common;

use common::{write_file, Campaign, MockRunner, EVENTS, ITERATION};
use specfem_stager::orchestrator::staging::build_run_directory;
use specfem_stager::{JobKind, Orchestrator, Stage};
use std::sync::Arc;

fn orchestrator(campaign: &Campaign, runner: &MockRunner) -> Orchestrator {
    Orchestrator::new(campaign.ctx.clone(), Arc::new(runner.clone()))
}

/// Event directories `E00..E<n>` plus `mesh` and a stray script.
fn campaign_with_run_dirs(count: usize) -> Campaign {
    let campaign = Campaign::with_events(&EVENTS);
    let paths = &campaign.ctx.paths;
    for i in 0..count {
        build_run_directory(&paths.run_dir(&format!("E{:02}", i))).unwrap();
    }
    build_run_directory(&paths.mesh_dir()).unwrap();
    write_file(
        &paths.iteration_root().join("job_solver_daint.sbatch"),
        "#!/bin/bash",
    );
    campaign
}

#[tokio::test]
async fn test_submit_solver_issues_single_array_call() {
    let campaign = Campaign::with_events(&EVENTS);
    let runner = MockRunner::new();
    let report = orchestrator(&campaign, &runner)
        .run(Stage::SubmitSolver { first: 0, last: 4 })
        .await
        .expect("submission accepted");

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "sbatch");
    assert_eq!(
        calls[0].args,
        vec![
            "--array=0-4".to_string(),
            "jobArray_solver_daint.sbatch".to_string(),
            ITERATION.to_string()
        ]
    );
    assert_eq!(calls[0].cwd, campaign.ctx.paths.campaign_root());

    assert_eq!(report.submissions.len(), 1);
    let record = &report.submissions[0];
    assert_eq!(record.request.job_kind, JobKind::Solver);
    assert_eq!(record.request.array_spec().as_deref(), Some("0-4"));
    assert_eq!(record.scheduler_output, "Submitted batch job 4242");
}

#[tokio::test]
async fn test_submit_mesher_runs_in_mesh_directory() {
    let campaign = campaign_with_run_dirs(1);
    let runner = MockRunner::new();
    orchestrator(&campaign, &runner)
        .run(Stage::SubmitMesher)
        .await
        .expect("submission accepted");

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].command_line(), "sbatch job_mesher_daint.sbatch");
    assert_eq!(calls[0].cwd, campaign.ctx.paths.mesh_dir().root());
}

#[tokio::test]
async fn test_submit_each_respects_cap() {
    let campaign = campaign_with_run_dirs(12);
    let runner = MockRunner::new();
    let report = orchestrator(&campaign, &runner)
        .run(Stage::SubmitEach { from: 0 })
        .await
        .expect("submissions accepted");

    let calls = runner.calls();
    assert_eq!(calls.len(), 10);
    assert_eq!(report.submissions.len(), 10);
    for (i, call) in calls.iter().enumerate() {
        assert_eq!(call.command_line(), "sbatch ./job_solver_daint.sbatch");
        assert_eq!(
            call.cwd,
            campaign.ctx.paths.run_dir(&format!("E{:02}", i)).root()
        );
    }
    assert!(calls
        .iter()
        .all(|c| c.cwd != campaign.ctx.paths.mesh_dir().root()));
}

#[tokio::test]
async fn test_submit_each_below_cap_submits_everything() {
    let campaign = campaign_with_run_dirs(3);
    let runner = MockRunner::new();
    orchestrator(&campaign, &runner)
        .run(Stage::SubmitEach { from: 0 })
        .await
        .expect("submissions accepted");
    assert_eq!(runner.calls().len(), 3);
}

#[tokio::test]
async fn test_rejected_submission_stops_stage() {
    let campaign = campaign_with_run_dirs(4);
    let runner = MockRunner::new().exiting("sbatch", 1);
    let err = orchestrator(&campaign, &runner)
        .run(Stage::SubmitEach { from: 0 })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "submission_rejected");
    assert_eq!(runner.calls().len(), 1);
}

#[tokio::test]
async fn test_rejected_array_submission() {
    let campaign = Campaign::with_events(&EVENTS);
    let runner = MockRunner::new().exiting("sbatch", 1);
    let err = orchestrator(&campaign, &runner)
        .run(Stage::SubmitSolver { first: 2, last: 3 })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "submission_rejected");
    assert!(err.to_string().contains("--array=2-3"));
}

#[test]
fn test_submit_each_prompt_counts_capped_jobs() {
    let campaign = campaign_with_run_dirs(12);
    let prompt = orchestrator(&campaign, &MockRunner::new())
        .confirmation_prompt(Stage::SubmitEach { from: 0 })
        .unwrap()
        .unwrap();
    assert_eq!(prompt, "I'm about to submit 10 jobs.");
}

#[tokio::test]
async fn test_submit_each_resumes_from_offset() {
    let campaign = campaign_with_run_dirs(12);
    let runner = MockRunner::new();
    let orchestrator = orchestrator(&campaign, &runner);

    let first = orchestrator
        .run(Stage::SubmitEach { from: 0 })
        .await
        .expect("first batch accepted");
    let second = orchestrator
        .run(Stage::SubmitEach { from: first.submissions.len() })
        .await
        .expect("second batch accepted");
    assert_eq!(first.submissions.len(), 10);
    assert_eq!(second.submissions.len(), 2);

    let submitted: Vec<_> = runner.calls().into_iter().map(|c| c.cwd).collect();
    let expected: Vec<_> = (0..12)
        .map(|i| campaign.ctx.paths.run_dir(&format!("E{:02}", i)).root().to_path_buf())
        .collect();
    assert_eq!(submitted, expected);
}

#[tokio::test]
async fn test_submit_each_offset_past_end_submits_nothing() {
    let campaign = campaign_with_run_dirs(3);
    let runner = MockRunner::new();
    let report = orchestrator(&campaign, &runner)
        .run(Stage::SubmitEach { from: 3 })
        .await
        .expect("empty batch");
    assert!(report.submissions.is_empty());
    assert!(runner.calls().is_empty());
}

#[test]
fn test_submit_each_prompt_counts_remaining_jobs() {
    let campaign = campaign_with_run_dirs(12);
    let prompt = orchestrator(&campaign, &MockRunner::new())
        .confirmation_prompt(Stage::SubmitEach { from: 10 })
        .unwrap()
        .unwrap();
    assert_eq!(prompt, "I'm about to submit 2 jobs.");
}
