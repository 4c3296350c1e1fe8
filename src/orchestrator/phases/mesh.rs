//! Mesh stage: materialize the campaign tree and compile the solver.
//!
//! Steps run strictly in order, each depending on the previous one's effects:
//! 1. Resolve the event catalog.
//! 2. Build a run directory per event plus `mesh`.
//! 3. Stage LASIF output files into each event's `DATA/`; the first event also
//!    seeds `mesh/DATA/`.
//! 4. Stage the submission `Par_file` into the solver installation.
//! 5. Compile (the only step that fails on an exit status).
//! 6. Distribute compiled binaries and `Par_file` to every run directory.
//! 7. Fan out submission scripts, the job-array script, the logs directory and
//!    topography data.
//!
//! Steps 3-4 and 6-7 use skipping primitives: a missing source only yields an
//! incomplete tree that later stages will notice.

use crate::error::Result;
use crate::models::{CampaignContext, StageReport};
use crate::orchestrator::catalog::events_for_iteration;
use crate::orchestrator::executor::run_compiler;
use crate::orchestrator::staging::{
    build_run_directory, copy_all, copy_into, ensure_dir, list_entries_or_empty,
};
use crate::system::{CommandRunner, RunDirectory};

/// Run directories for the catalog, events first, `mesh` last.
fn run_directories(ctx: &CampaignContext, events: &[String]) -> Vec<RunDirectory> {
    events
        .iter()
        .map(|event| ctx.paths.run_dir(event))
        .chain(std::iter::once(ctx.paths.mesh_dir()))
        .collect()
}

/// Steps 1-2: event list and directory skeletons. Fatal on any failure.
pub fn build_tree(ctx: &CampaignContext, report: &mut StageReport) -> Result<Vec<String>> {
    let events = events_for_iteration(&ctx.iteration_descriptor())?;
    log::info!(
        "[Mesh] [TREE] Creating {} event directories plus mesh in {}",
        events.len(),
        ctx.paths.iteration_root().display()
    );

    for run in run_directories(ctx, &events) {
        build_run_directory(&run)?;
        report.touched(run.root());
    }
    Ok(events)
}

/// Step 3: copy LASIF output folders into event `DATA/` directories.
///
/// A folder matches an event when its name contains both the iteration name and
/// the event name. Only the first catalog event seeds `mesh/DATA/`.
// TODO: confirm with the campaign owners that first-event seeding is the intended
// mesh input rule rather than an artifact of descriptor ordering.
pub fn stage_event_inputs(
    ctx: &CampaignContext,
    events: &[String],
    report: &mut StageReport,
) -> Result<()> {
    let seed_event = events.first();
    let mesh_data = ctx.paths.mesh_dir().data();

    for folder in list_entries_or_empty(&ctx.lasif_output())? {
        let folder_name = match folder.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if !folder_name.contains(ctx.iteration_name()) {
            continue;
        }

        for event in events.iter().filter(|e| folder_name.contains(e.as_str())) {
            log::debug!("[Mesh] [INPUT] {} -> {}", folder_name, event);
            let event_data = ctx.paths.run_dir(event).data();
            for outcome in copy_all(&folder, &event_data)? {
                report.record(outcome);
            }
            if Some(event) == seed_event {
                for outcome in copy_all(&folder, &mesh_data)? {
                    report.record(outcome);
                }
            }
        }
    }
    Ok(())
}

/// Step 6: compiled binaries and parameter file into every run directory.
pub fn distribute_binaries(
    ctx: &CampaignContext,
    events: &[String],
    report: &mut StageReport,
) -> Result<()> {
    log::info!("[Mesh] [DIST] Copying compiled binaries and parameter file");
    let compiled_par_file = ctx.specfem_data().join("Par_file");
    for run in run_directories(ctx, events) {
        for outcome in copy_all(&ctx.specfem_bin(), &run.bin())? {
            report.record(outcome);
        }
        report.record(copy_into(&compiled_par_file, &run.data())?);
    }
    Ok(())
}

/// Step 7: submission scripts, job-array script, logs dir, topography.
pub fn distribute_submission_files(
    ctx: &CampaignContext,
    events: &[String],
    report: &mut StageReport,
) -> Result<()> {
    log::info!("[Mesh] [DIST] Copying submission scripts");
    for run in run_directories(ctx, events) {
        for outcome in copy_all(&ctx.submission_dir(), run.root())? {
            report.record(outcome);
        }
    }

    let array_script = ctx.submission_dir().join(&ctx.tools.solver_array_script);
    report.record(copy_into(&array_script, &ctx.paths.campaign_root())?);
    ensure_dir(&ctx.paths.logs_dir())?;

    log::info!("[Mesh] [DIST] Copying topography information");
    let topo_dest = ctx.paths.mesh_dir().topo_bathy();
    ensure_dir(&topo_dest)?;
    for outcome in copy_all(&ctx.specfem_data().join("topo_bathy"), &topo_dest)? {
        report.record(outcome);
    }
    Ok(())
}

/// Full mesh stage.
pub async fn reconcile(ctx: &CampaignContext, runner: &dyn CommandRunner) -> Result<StageReport> {
    let mut report = StageReport::new("mesh");

    let events = build_tree(ctx, &mut report)?;

    log::info!("[Mesh] [INPUT] Copying initial files");
    stage_event_inputs(ctx, &events, &mut report)?;
    report.record(copy_into(&ctx.submission_par_file(), &ctx.specfem_data())?);

    run_compiler(ctx, runner).await?;

    distribute_binaries(ctx, &events, &mut report)?;
    distribute_submission_files(ctx, &events, &mut report)?;

    log::info!(
        "[Mesh] Done ({} staged, {} skipped). Submit the mesher in {}",
        report.applied,
        report.skipped,
        ctx.paths.mesh_dir().root().display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ToolNames;
    use crate::system::CampaignPaths;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn context(temp: &Path) -> CampaignContext {
        CampaignContext {
            paths: CampaignPaths::new(&temp.join("scratch"), "P", "S1"),
            lasif_root: temp.join("lasif"),
            specfem_root: temp.join("specfem"),
            compiler_suite: "cray".to_string(),
            tools: ToolNames::default(),
            submission_cap: 10,
        }
    }

    fn write_descriptor(ctx: &CampaignContext, events: &[&str]) {
        let body: String = events
            .iter()
            .map(|e| format!("<event><event_name>{}</event_name></event>", e))
            .collect();
        let path = ctx.iteration_descriptor();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("<iteration>{}</iteration>", body)).unwrap();
    }

    #[test]
    fn test_first_event_seeds_mesh() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path());
        write_descriptor(&ctx, &["E1", "E2", "E3"]);
        for event in ["E1", "E2", "E3"] {
            let folder = ctx.lasif_output().join(format!("ITERATION_S1__{}", event));
            fs::create_dir_all(&folder).unwrap();
            fs::write(folder.join(format!("CMTSOLUTION_{}", event)), event).unwrap();
        }

        let mut report = StageReport::new("mesh");
        let events = build_tree(&ctx, &mut report).unwrap();
        stage_event_inputs(&ctx, &events, &mut report).unwrap();

        let mesh_files: Vec<_> = fs::read_dir(ctx.paths.mesh_dir().data())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n != "cemRequest")
            .collect();
        assert_eq!(mesh_files, vec!["CMTSOLUTION_E1"]);
        for event in ["E1", "E2", "E3"] {
            assert!(ctx
                .paths
                .run_dir(event)
                .data()
                .join(format!("CMTSOLUTION_{}", event))
                .is_file());
        }
    }

    #[test]
    fn test_folders_for_other_iterations_ignored() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path());
        write_descriptor(&ctx, &["E1"]);
        let folder = ctx.lasif_output().join("ITERATION_S0__E1");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join("STATIONS"), "").unwrap();

        let mut report = StageReport::new("mesh");
        let events = build_tree(&ctx, &mut report).unwrap();
        stage_event_inputs(&ctx, &events, &mut report).unwrap();
        assert!(!ctx.paths.run_dir("E1").data().join("STATIONS").exists());
        assert_eq!(report.applied, 0);
    }

    #[test]
    fn test_missing_descriptor_creates_nothing() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path());
        let mut report = StageReport::new("mesh");
        let err = build_tree(&ctx, &mut report).unwrap_err();
        assert_eq!(err.kind(), "missing_descriptor");
        assert!(!ctx.paths.iteration_root().exists());
    }
}
