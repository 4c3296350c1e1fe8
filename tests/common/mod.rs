//! Shared fixtures for the integration tests: a campaign laid out in a temp
//! directory and a runner that records invocations instead of spawning them.

#![allow(dead_code)]

use futures::future::BoxFuture;
use specfem_stager::{
    load_parameter_file, CampaignContext, CommandOutcome, CommandRunner, Invocation,
    OrchestratorError,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const ITERATION: &str = "S1";
pub const PROJECT: &str = "P";
pub const EVENTS: [&str; 2] = ["GCMT_event_ALPHA", "GCMT_event_BETA"];

/// Records every invocation and answers with a configurable exit code per program.
#[derive(Clone)]
pub struct MockRunner {
    calls: Arc<Mutex<Vec<Invocation>>>,
    exit_codes: Arc<Mutex<HashMap<String, i32>>>,
    stdout: String,
}

impl MockRunner {
    pub fn new() -> Self {
        MockRunner {
            calls: Arc::new(Mutex::new(Vec::new())),
            exit_codes: Arc::new(Mutex::new(HashMap::new())),
            stdout: "Submitted batch job 4242\n".to_string(),
        }
    }

    /// Make `program` exit with `code`.
    pub fn exiting(self, program: &str, code: i32) -> Self {
        self.exit_codes
            .lock()
            .unwrap()
            .insert(program.to_string(), code);
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, invocation: Invocation) -> BoxFuture<'static, Result<CommandOutcome, OrchestratorError>> {
        let code = self
            .exit_codes
            .lock()
            .unwrap()
            .get(&invocation.program)
            .copied()
            .unwrap_or(0);
        let stdout = if invocation.log_file.is_some() {
            String::new()
        } else {
            self.stdout.clone()
        };
        self.calls.lock().unwrap().push(invocation);
        Box::pin(async move {
            Ok(CommandOutcome {
                code: Some(code),
                stdout,
            })
        })
    }
}

/// A LASIF project, a solver installation and an empty scratch area.
pub struct Campaign {
    pub temp: TempDir,
    pub ctx: CampaignContext,
}

impl Campaign {
    /// Inputs for `events`, context loaded through a real parameter file.
    pub fn with_events(events: &[&str]) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = temp.path();

        write_descriptor(&root.join("lasif"), events);
        for event in events {
            let folder = root
                .join("lasif/OUTPUT")
                .join(format!("ITERATION_{}__{}", ITERATION, event));
            write_file(&folder.join("CMTSOLUTION"), event);
            write_file(&folder.join("STATIONS"), &format!("stations for {}", event));
        }

        let submission = root.join("lasif/SUBMISSION");
        write_file(&submission.join("Par_file"), "NCHUNKS = 6");
        write_file(&submission.join("job_mesher_daint.sbatch"), "#!/bin/bash");
        write_file(&submission.join("job_solver_daint.sbatch"), "#!/bin/bash");
        write_file(&submission.join("jobArray_solver_daint.sbatch"), "#!/bin/bash");

        let specfem = root.join("specfem");
        write_file(&specfem.join("bin/xmeshfem3D"), "");
        write_file(&specfem.join("bin/xspecfem3D"), "");
        write_file(&specfem.join("DATA/topo_bathy/topo_bathy_etopo4.dat"), "0 0");
        write_file(&specfem.join("mk_daint.sh"), "#!/bin/bash");

        let param_file = root.join("parameters.txt");
        write_file(
            &param_file,
            &format!(
                "compiler_suite cray\nproject_name {}\nscratch_path {}\nspecfem_root {}\nlasif_path {}\niteration_name {}\n",
                PROJECT,
                root.join("scratch").display(),
                specfem.display(),
                root.join("lasif").display(),
                ITERATION
            ),
        );
        let ctx = load_parameter_file(&param_file)
            .expect("parameter file loads")
            .into_context()
            .expect("parameters are valid");

        Campaign { temp, ctx }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Pretend the mesher ran: database files plus mesher output.
    pub fn fake_mesher_output(&self) -> Vec<PathBuf> {
        let mesh = self.ctx.paths.mesh_dir();
        let databases: Vec<PathBuf> = ["proc000000_reg1_solver_data.bin", "proc000001_reg1_solver_data.bin"]
            .iter()
            .map(|name| mesh.databases_mpi().join(name))
            .collect();
        for db in &databases {
            write_file(db, "mesh");
        }
        write_file(&mesh.output_files().join("values_from_mesher.h"), "// mesher");
        databases
    }
}

pub fn write_descriptor(lasif: &Path, events: &[&str]) {
    let body: String = events
        .iter()
        .map(|e| format!("  <event>\n    <event_name>{}</event_name>\n  </event>\n", e))
        .collect();
    write_file(
        &lasif
            .join("ITERATIONS")
            .join(format!("ITERATION_{}.xml", ITERATION)),
        &format!(
            "<?xml version='1.0' encoding='UTF-8'?>\n<iteration>\n  <iteration_name>{}</iteration_name>\n{}</iteration>\n",
            ITERATION, body
        ),
    );
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(path, content).expect("Failed to write fixture file");
}

/// Sorted entry names of a directory.
pub fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("read_dir {}: {}", dir.display(), e))
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
