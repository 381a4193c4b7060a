use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use common::filename::has_extension;
use common::storage::StagingStore;
use common::{Location, layout};
use serde_json::json;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::analyzer::{Analyzer, Invocation};
use crate::config::{AnalyzerCommand, RunnerConfig};
use crate::error::{Result, RunError};
use crate::pipeline::{InputRequirement, Pipeline, PipelineKind};

/// A successful run: the result file exists and awaits delivery.
#[derive(Debug)]
pub struct JobOutcome {
    pub kind: PipelineKind,
    pub location: Location,
    /// Per-request delivery path, relative to the staging store root.
    pub result_path: PathBuf,
    pub download_name: String,
    pub stdout: String,
}

/// Validates staged inputs, invokes the analyzer and locates its result.
pub struct JobRunner {
    store: Arc<dyn StagingStore>,
    analyzer: Arc<dyn Analyzer>,
    config: RunnerConfig,
    leases: HashMap<PipelineKind, Arc<Mutex<()>>>,
}

impl JobRunner {
    pub fn new(
        store: Arc<dyn StagingStore>,
        analyzer: Arc<dyn Analyzer>,
        config: RunnerConfig,
    ) -> Self {
        let leases = PipelineKind::ALL
            .into_iter()
            .map(|kind| (kind, Arc::new(Mutex::new(()))))
            .collect();
        Self {
            store,
            analyzer,
            config,
            leases,
        }
    }

    pub fn store(&self) -> &Arc<dyn StagingStore> {
        &self.store
    }

    fn command(&self, kind: PipelineKind) -> &AnalyzerCommand {
        match kind {
            PipelineKind::Equipment => &self.config.equipment,
            PipelineKind::HazardAnalysis => &self.config.jha,
        }
    }

    /// Run one pipeline for one location.
    ///
    /// `request_id` correlates log lines and names the delivery copy of the
    /// result. The configured timeout covers both the wait for the pipeline
    /// lease and the analyzer itself.
    pub async fn run(
        &self,
        location: &str,
        kind: PipelineKind,
        request_id: u64,
    ) -> Result<JobOutcome> {
        let location = Location::parse(location)?;
        let span = info_span!("job", request_id, location = %location, pipeline = %kind);
        self.run_inner(location, kind, request_id)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        location: Location,
        kind: PipelineKind,
        request_id: u64,
    ) -> Result<JobOutcome> {
        let limit = Duration::from_secs(self.config.timeout_secs);
        let deadline = Instant::now() + limit;
        let pipeline = kind.pipeline(&location);

        debug!("Validating inputs");
        self.validate_inputs(&pipeline, &location).await?;
        self.store.ensure(&layout::delivery_dir()).await?;

        let lease = self.acquire_lease(kind, deadline, limit).await?;

        // A result left behind by a failed run must not pass for ours.
        if self.store.delete(&pipeline.result_file).await? {
            warn!(path = %pipeline.result_file.display(), "Removed stale result file");
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        let invocation = self.invocation(&pipeline, &location, remaining)?;
        info!(command = %invocation.display_argv(), "Invoking analyzer");

        let output = self
            .analyzer
            .run(&invocation)
            .await
            .map_err(|e| match e {
                RunError::TimedOut { .. } => RunError::TimedOut { limit },
                other => other,
            })
            .inspect_err(|e| {
                warn!(error = %e, "Analyzer did not complete");
            })?;

        debug!(stdout = %output.stdout, "Analyzer stdout");
        if !output.stderr.is_empty() {
            warn!(stderr = %output.stderr, "Analyzer stderr");
        }

        if !output.success() {
            return Err(RunError::ProcessFailed {
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        if let Some(sentinel) = pipeline.match_sentinel(&output.stdout) {
            return Err(RunError::invalid_input(
                sentinel.message,
                Some(json!(output.stdout)),
            ));
        }

        if !self.store.exists(&pipeline.result_file).await? {
            return Err(RunError::OutputMissing {
                path: pipeline.result_file,
                stdout: output.stdout,
            });
        }

        let delivery = layout::delivery_file(request_id, &pipeline.download_name);
        self.store.rename(&pipeline.result_file, &delivery).await?;
        drop(lease);

        info!(result = %delivery.display(), "Analyzer produced result");
        Ok(JobOutcome {
            kind,
            location,
            result_path: delivery,
            download_name: pipeline.download_name,
            stdout: output.stdout,
        })
    }

    /// Every input directory must exist, then every one must hold at least
    /// one accepted file.
    async fn validate_inputs(&self, pipeline: &Pipeline, location: &Location) -> Result<()> {
        for input in &pipeline.inputs {
            if !self.store.exists(&input.dir).await? {
                return Err(RunError::invalid_input(
                    format!(
                        "{} path does not exist: {}",
                        input.label,
                        input.dir.display()
                    ),
                    Some(json!({ "path": input.dir.display().to_string() })),
                ));
            }
        }

        for input in &pipeline.inputs {
            let valid = self.accepted_files(input).await?;
            if valid.is_empty() {
                let listing = self.store.list(&input.dir).await?;
                return Err(RunError::invalid_input(
                    format!("No valid {} found for location {location}", input.label),
                    Some(json!({
                        "path": input.dir.display().to_string(),
                        "files": listing,
                    })),
                ));
            }
            debug!(input = input.label, files = valid.len(), "Input validated");
        }
        Ok(())
    }

    async fn accepted_files(&self, input: &InputRequirement) -> Result<Vec<String>> {
        let names: Vec<String> = if input.recursive {
            self.store
                .list_recursive(&input.dir)
                .await?
                .into_iter()
                .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .collect()
        } else {
            self.store.list(&input.dir).await?
        };
        Ok(names
            .into_iter()
            .filter(|name| has_extension(name, input.extensions))
            .collect())
    }

    fn invocation(
        &self,
        pipeline: &Pipeline,
        location: &Location,
        timeout: Duration,
    ) -> Result<Invocation> {
        let command = self.command(pipeline.kind);
        let uploads_root = self.store.resolve(&layout::uploads_dir())?;
        let output_root = self.store.resolve(&layout::output_dir())?;

        let mut args = command.args.clone();
        args.extend(pipeline.analyzer_args(location, &uploads_root, &output_root));

        Ok(Invocation {
            program: command.program.clone(),
            args,
            working_dir: command.working_dir.clone(),
            timeout,
            max_output_bytes: self.config.max_output_bytes,
        })
    }

    /// Hold the pipeline's fixed result path until the result has been moved
    /// to its delivery path. Waiting past `deadline` is a timeout.
    async fn acquire_lease(
        &self,
        kind: PipelineKind,
        deadline: Instant,
        limit: Duration,
    ) -> Result<Option<OwnedMutexGuard<()>>> {
        if !self.config.serialize_runs {
            return Ok(None);
        }
        let Some(mutex) = self.leases.get(&kind).cloned() else {
            return Ok(None);
        };
        if let Ok(guard) = mutex.clone().try_lock_owned() {
            return Ok(Some(guard));
        }

        info!("Waiting for another {kind} run to finish");
        match tokio::time::timeout_at(deadline, mutex.lock_owned()).await {
            Ok(guard) => Ok(Some(guard)),
            Err(_) => {
                warn!("Gave up waiting for the {kind} pipeline");
                Err(RunError::TimedOut { limit })
            }
        }
    }
}
