//! Main orchestrator for governance runs.
//!
//! The orchestrator is the sole owner and mutator of `AppState`. It reduces
//! `Action`s, sequences the pipeline stages, keeps the audit log and
//! publishes a full snapshot to every subscriber after each mutation.
//!
//! State lives behind a single mutex that is never held across an `.await`.
//! Snapshots are published while the lock is held, so subscribers see
//! mutations in the order they were applied. Subscriber callbacks must not
//! call back into the orchestrator synchronously.
//!
//! Every mutation made after a suspension point is guarded by the run's
//! token. Resetting or selecting a framework drops the token, so a run that
//! was in flight at that moment can no longer touch state. A run whose
//! future is dropped before it finishes (timeout, aborted task, panicking
//! generator) is failed by its `RunGuard`.

use std::cell::Cell;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::Utc;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::adapters::Generator;
use crate::catalog::Catalog;
use crate::domain::{
    Action, AppState, ConfigPatch, Contributor, Domain, FinalOutput, GovernanceLayer,
    IntrospectionReport, LogEntry, Module, RunStatus, Stage, STEP_CONFIGURING, STEP_EXECUTING,
    STEP_FRAMEWORK_LOADED,
};

use super::analysis::{affective_trajectory, coherence_graph, summarize};
use super::error::OrchestratorError;
use super::pacing::{pause, StagePacing};
use super::scanner::PatternScanner;
use super::subscribers::{Subscriber, SubscriberId, SubscriberRegistry};

/// Output that replaces generated text when the Security stage fires
pub const REDACTION_NOTICE: &str =
    "[REDACTED: Potential prompt injection attempt blocked by WildCore engine.]";

/// Breach simulation result when nothing matched
pub const SIMULATION_PASSED: &str =
    "[SIMULATION PASSED] No immediate breach vector detected in the prompt.";

/// Error recorded when a run is dropped before reaching Complete or Failed
const RUN_CANCELLED: &str = "Run cancelled before completion";

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Instance whose subscribers are being called on this thread
    static PUBLISHING: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Marks the current thread as delivering snapshots for one instance
struct PublishMarker {
    previous: Option<u64>,
}

impl PublishMarker {
    fn enter(instance: u64) -> Self {
        let previous = PUBLISHING.with(|p| p.replace(Some(instance)));
        Self { previous }
    }
}

impl Drop for PublishMarker {
    fn drop(&mut self) {
        PUBLISHING.with(|p| p.set(self.previous));
    }
}

/// Identity of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunToken(u64);

/// Fails its run on drop unless the run already ended or was abandoned
struct RunGuard {
    shared: Arc<Shared>,
    token: RunToken,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut core = self.shared.lock();
        if core.active_run != Some(self.token) {
            return;
        }

        warn!(run = self.token.0, "Run dropped before completion");
        core.state.error = Some(RUN_CANCELLED.to_string());
        core.log(LogEntry::new(Module::System, "Error", RUN_CANCELLED));
        core.end_run(RunStatus::Failed {
            error: RUN_CANCELLED.to_string(),
        });
        core.publish();
    }
}

/// Why the pipeline stopped before finalizing
enum Abort {
    /// The run was abandoned by a reset; discard silently
    Stale,
    /// A stage failed
    Failed(OrchestratorError),
}

/// Mutable state guarded by the orchestrator lock
struct Core {
    instance: u64,
    state: AppState,
    subscribers: SubscriberRegistry,

    /// Token of the run in flight; the single run-in-progress flag
    active_run: Option<RunToken>,

    /// Monotonic start of the current run, basis for log offsets
    run_clock: Option<Instant>,

    next_token: u64,
}

impl Core {
    fn new(instance: u64) -> Self {
        Self {
            instance,
            state: AppState::baseline(),
            subscribers: SubscriberRegistry::new(),
            active_run: None,
            run_clock: None,
            next_token: 0,
        }
    }

    fn publish(&self) {
        let _marker = PublishMarker::enter(self.instance);
        self.subscribers.publish(&self.state);
    }

    fn log(&mut self, entry: LogEntry) {
        self.state.logs.append(entry, self.run_clock);
        self.publish();
    }

    fn begin_run(&mut self, stage: Stage) -> RunToken {
        self.next_token += 1;
        let token = RunToken(self.next_token);

        self.active_run = Some(token);
        self.run_clock = Some(Instant::now());
        self.state.run.status = RunStatus::Running { stage };
        self.state.run.started_at = Some(Utc::now());
        self.state.run.partial_output.clear();

        token
    }

    fn end_run(&mut self, status: RunStatus) {
        self.active_run = None;
        self.run_clock = None;
        self.state.run.status = status;
        self.state.run.started_at = None;
    }

    fn abandon_run(&mut self) {
        if let Some(token) = self.active_run.take() {
            info!(run = token.0, "Abandoning in-flight run");
        }
        self.run_clock = None;
    }

    fn structural_rules(&self) -> BTreeSet<String> {
        self.state
            .active_framework
            .as_ref()
            .map(|f| f.structural_rule_ids())
            .unwrap_or_default()
    }
}

struct Shared {
    instance: u64,
    catalog: Catalog,
    generator: Arc<dyn Generator>,
    scanner: PatternScanner,
    pacing: StagePacing,
    core: Mutex<Core>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Core> {
        debug_assert!(
            PUBLISHING.with(Cell::get) != Some(self.instance),
            "subscriber callback re-entered the orchestrator"
        );
        // A panicking subscriber must not wedge the orchestrator
        self.core
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Builder for an orchestrator instance
pub struct OrchestratorBuilder {
    catalog: Catalog,
    generator: Arc<dyn Generator>,
    scanner: PatternScanner,
    pacing: StagePacing,
}

impl OrchestratorBuilder {
    /// Replace the built-in injection patterns
    pub fn scanner(mut self, scanner: PatternScanner) -> Self {
        self.scanner = scanner;
        self
    }

    /// Replace the default stage delays
    pub fn pacing(mut self, pacing: StagePacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn build(self) -> Orchestrator {
        let instance = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);
        Orchestrator {
            shared: Arc::new(Shared {
                instance,
                catalog: self.catalog,
                generator: self.generator,
                scanner: self.scanner,
                pacing: self.pacing,
                core: Mutex::new(Core::new(instance)),
            }),
        }
    }
}

/// Governance pipeline orchestrator.
///
/// Cloning yields another handle to the same instance.
#[derive(Clone)]
pub struct Orchestrator {
    shared: Arc<Shared>,
}

impl Orchestrator {
    /// Create an orchestrator with default scanner and pacing
    pub fn new(catalog: Catalog, generator: Arc<dyn Generator>) -> Self {
        Self::builder(catalog, generator).build()
    }

    pub fn builder(catalog: Catalog, generator: Arc<dyn Generator>) -> OrchestratorBuilder {
        OrchestratorBuilder {
            catalog,
            generator,
            scanner: PatternScanner::default(),
            pacing: StagePacing::default(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.shared.catalog
    }

    pub fn pacing(&self) -> &StagePacing {
        &self.shared.pacing
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> AppState {
        self.lock().state.clone()
    }

    /// Register a snapshot callback; it immediately receives the current state.
    ///
    /// Callbacks run while the orchestrator lock is held. A callback must not
    /// call any method on this orchestrator (not even `snapshot`), or it will
    /// deadlock; debug builds panic instead. Use the `&AppState` it receives,
    /// or hand work to another task (for example with `spawn`).
    pub fn subscribe<F>(&self, callback: F) -> SubscriberId
    where
        F: Fn(&AppState) + Send + Sync + 'static,
    {
        let mut guard = self.lock();
        let core = &mut *guard;
        let subscriber: Subscriber = Arc::new(callback);
        let id = {
            let _marker = PublishMarker::enter(core.instance);
            core.subscribers.register(subscriber, &core.state)
        };
        debug!(%id, "Subscriber registered");
        id
    }

    /// Remove a callback; removing an absent one is a no-op
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.lock().subscribers.unregister(id);
        debug!(%id, removed, "Subscriber unregistered");
        removed
    }

    /// Whether a run is in flight
    pub fn is_running(&self) -> bool {
        self.lock().active_run.is_some()
    }

    /// Dispatch on a background task
    pub fn spawn(&self, action: Action) -> JoinHandle<Result<(), OrchestratorError>> {
        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.dispatch(action).await })
    }

    /// Apply an action.
    ///
    /// Synchronous actions complete before this returns. The two execute
    /// actions resolve when their run reaches Complete or Failed.
    #[instrument(skip(self, action), fields(action = action.name()))]
    pub async fn dispatch(&self, action: Action) -> Result<(), OrchestratorError> {
        match action {
            Action::SelectFramework(id) => self.select_framework(&id),
            Action::ResetFramework => {
                self.reset_framework();
                Ok(())
            }
            Action::SetPrompt(text) => {
                self.set_prompt(text);
                Ok(())
            }
            Action::SetActiveDomain(domain) => {
                self.set_active_domain(domain);
                Ok(())
            }
            Action::UpdateConfig(patch) => {
                self.update_config(&patch);
                Ok(())
            }
            Action::ApplyDeclarativeSpec(spec) => self.apply_declarative_spec(&spec),
            Action::ExecuteNarrative(prompt) => self.execute_narrative(prompt).await,
            Action::ExecuteBreachSimulation(prompt) => self.execute_breach_simulation(prompt).await,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Core> {
        self.shared.lock()
    }

    fn guard_run(&self, token: RunToken) -> RunGuard {
        RunGuard {
            shared: Arc::clone(&self.shared),
            token,
        }
    }

    /// Run `f` only if `token` still identifies the active run
    fn guarded<R>(&self, token: RunToken, f: impl FnOnce(&mut Core) -> R) -> Result<R, Abort> {
        let mut core = self.lock();
        if core.active_run != Some(token) {
            return Err(Abort::Stale);
        }
        Ok(f(&mut *core))
    }

    fn enter_stage(&self, token: RunToken, stage: Stage) -> Result<(), Abort> {
        self.guarded(token, |core| {
            debug!(%stage, "Entering stage");
            core.state.run.status = RunStatus::Running { stage };
            core.publish();
        })
    }

    // ------------------------------------------------------------------
    // Synchronous actions
    // ------------------------------------------------------------------

    fn select_framework(&self, id: &str) -> Result<(), OrchestratorError> {
        let Some(framework) = self.shared.catalog.get(id).cloned() else {
            warn!(framework = %id, "Unknown framework requested");
            return Err(OrchestratorError::UnknownFramework(id.to_string()));
        };

        let mut core = self.lock();
        core.abandon_run();

        let previous_prompt = std::mem::take(&mut core.state.prompt);
        let structural = framework.structural_rule_ids();

        let mut state = AppState::baseline();
        state.prompt = framework
            .first_sample_prompt()
            .map(str::to_string)
            .unwrap_or(previous_prompt);
        state.config.structural.active_rules = structural.clone();
        state.run.progress_step = STEP_FRAMEWORK_LOADED;

        let details = format!("Selected \"{}\"", framework.title);
        let metadata = json!({
            "framework": framework.id,
            "structural_rules": structural.len(),
        });
        state.active_framework = Some(framework);
        core.state = state;
        core.publish();

        core.log(LogEntry::new(Module::System, "Framework Loaded", details).with_metadata(metadata));
        info!(framework = %id, "Framework loaded");
        Ok(())
    }

    fn reset_framework(&self) {
        let mut core = self.lock();
        core.abandon_run();
        core.state = AppState::baseline();
        core.publish();
        info!("State reset to baseline");
    }

    fn set_prompt(&self, text: String) {
        let mut core = self.lock();
        core.state.prompt = text;
        core.publish();
    }

    fn set_active_domain(&self, domain: Domain) {
        let mut core = self.lock();
        core.state.active_domain = domain;
        core.state.run.advance_to(STEP_CONFIGURING);
        core.publish();
    }

    fn update_config(&self, patch: &ConfigPatch) {
        let mut core = self.lock();
        let allowed = core.structural_rules();

        let changes = core.state.config.apply(patch, &allowed);
        core.state.run.advance_to(STEP_CONFIGURING);
        core.publish();

        let layer = patch.layer();
        debug!(%layer, ?changes, "Configuration updated");
        core.log(LogEntry::new(
            Module::from(layer),
            "Configuration Change",
            format!("Updated settings: {}", changes.join(", ")),
        ));
    }

    fn apply_declarative_spec(&self, spec: &serde_json::Value) -> Result<(), OrchestratorError> {
        let mut core = self.lock();

        let constraints = spec.get("constraints").and_then(|c| c.as_array());
        let reason = match (&core.state.active_framework, constraints) {
            (None, _) => Some("no active framework"),
            (_, None) => Some("`constraints` must be a list of rule ids"),
            _ => None,
        };
        if let Some(reason) = reason {
            warn!(%reason, "Rejecting declarative spec");
            core.log(LogEntry::new(
                Module::System,
                "Error",
                format!("Invalid spec format provided: {}.", reason),
            ));
            return Err(OrchestratorError::MalformedSpec(reason.to_string()));
        }

        let constraints = constraints.map(Vec::as_slice).unwrap_or_default();
        let allowed = core.structural_rules();
        let active: BTreeSet<String> = constraints
            .iter()
            .filter_map(|c| c.as_str())
            .filter(|id| allowed.contains(*id))
            .map(str::to_string)
            .collect();
        let ignored = constraints
            .iter()
            .filter(|c| c.as_str().map_or(true, |id| !allowed.contains(id)))
            .count();

        let count = active.len();
        core.state.config.structural.active_rules = active;
        core.state.run.advance_to(STEP_CONFIGURING);
        core.publish();

        core.log(
            LogEntry::new(
                Module::Structural,
                "Specification Loaded",
                format!("Loaded spec with {} active rules.", count),
            )
            .with_metadata(json!({ "applied": count, "ignored": ignored })),
        );
        info!(applied = count, ignored, "Declarative spec applied");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pipeline run
    // ------------------------------------------------------------------

    #[instrument(skip(self, prompt))]
    async fn execute_narrative(&self, prompt: String) -> Result<(), OrchestratorError> {
        let token = {
            let mut core = self.lock();

            if prompt.trim().is_empty() || core.state.active_framework.is_none() {
                debug!("Nothing to execute");
                return Ok(());
            }
            if core.active_run.is_some() {
                warn!("Rejecting run: another run is in progress");
                return Err(OrchestratorError::RunAlreadyInProgress);
            }

            core.state.logs.clear();
            core.state.final_output = None;
            core.state.introspection_report = None;
            core.state.graph_data = Default::default();
            core.state.affective_data.clear();
            core.state.error = None;
            core.state.run.advance_to(STEP_EXECUTING);
            let token = core.begin_run(Stage::Generation);
            core.publish();

            core.log(LogEntry::new(
                Module::User,
                "Execution Start",
                format!("Prompt: \"{}\"", prompt),
            ));
            info!(run = token.0, "Run started");
            token
        };
        let _guard = self.guard_run(token);

        match self.run_stages(token, &prompt).await {
            Ok(()) => Ok(()),
            Err(Abort::Stale) => {
                info!(run = token.0, "Discarding result of abandoned run");
                Ok(())
            }
            Err(Abort::Failed(err)) => {
                self.fail_run(token, &err);
                Err(err)
            }
        }
    }

    async fn run_stages(&self, token: RunToken, prompt: &str) -> Result<(), Abort> {
        let pacing = &self.shared.pacing;
        let mut contributors: Vec<Contributor> = Vec::new();

        // Generation
        self.enter_stage(token, Stage::Generation)?;
        pause(pacing.delay_for(Stage::Generation)).await;
        let generator_name = self.shared.generator.name().to_string();
        self.guarded(token, |core| {
            core.log(LogEntry::new(
                Module::Llm,
                "Generation",
                format!("Requesting raw output from '{}'...", generator_name),
            ));
        })?;

        let raw_output = match self.shared.generator.generate(prompt).await {
            Ok(text) => text,
            Err(e) => {
                return Err(Abort::Failed(OrchestratorError::GenerationFailure(format!(
                    "{:#}",
                    e
                ))))
            }
        };

        self.guarded(token, |core| {
            core.state.run.partial_output = raw_output.clone();
            core.publish();
            core.log(LogEntry::new(
                Module::Llm,
                "Generation Complete",
                format!("Received raw output of {} characters.", raw_output.chars().count()),
            ));
        })?;

        // Security: scans the input prompt, not the generated text
        self.enter_stage(token, Stage::Security)?;
        pause(pacing.delay_for(Stage::Security)).await;
        let detection = self.shared.scanner.scan(prompt);
        let redacted_span = self.guarded(token, |core| {
            let sensitivity = core.state.config.security.injection_sensitivity;
            match detection {
                Some(found) => {
                    warn!(pattern = %found.pattern, "Injection detected in prompt");
                    core.state.run.partial_output = REDACTION_NOTICE.to_string();
                    core.state.final_output = Some(FinalOutput::Highlighted {
                        text: REDACTION_NOTICE.to_string(),
                        highlight: found.segment.clone(),
                    });
                    core.publish();
                    core.log(
                        LogEntry::new(
                            Module::Security,
                            "Injection Detected",
                            format!(
                                "Prompt contains patterns flagged as high-risk (sensitivity: {}).",
                                sensitivity
                            ),
                        )
                        .with_metadata(json!({
                            "pattern": found.pattern,
                            "segment": found.segment,
                            "start": found.start,
                            "end": found.end,
                        })),
                    );
                    Some(found.segment)
                }
                None => {
                    core.log(LogEntry::new(
                        Module::Security,
                        "Scan Clear",
                        format!(
                            "No injection patterns found in prompt (sensitivity: {}).",
                            sensitivity
                        ),
                    ));
                    None
                }
            }
        })?;
        let redacted = redacted_span.is_some();

        // Structural
        self.enter_stage(token, Stage::Structural)?;
        let active_count = self.guarded(token, |core| {
            let active = core.state.config.structural.active_rules.len();
            if active > 0 {
                let target = if redacted { "redacted" } else { "generated" };
                core.log(LogEntry::new(
                    Module::Structural,
                    "Applying Constraints",
                    format!(
                        "Applying {} active structural rules to the {} output.",
                        active, target
                    ),
                ));
            }
            active
        })?;

        let mut rules_validated = 0;
        if active_count > 0 {
            pause(pacing.delay_for(Stage::Structural)).await;
            let validated = self.guarded(token, |core| {
                let rules: Vec<_> = match core.state.active_framework {
                    Some(ref framework) => framework
                        .rules_in(GovernanceLayer::Structural)
                        .filter(|r| core.state.config.structural.active_rules.contains(&r.id))
                        .cloned()
                        .collect(),
                    None => Vec::new(),
                };
                for rule in &rules {
                    core.log(
                        LogEntry::new(
                            Module::Structural,
                            "Constraint Enforced",
                            format!("{}: {}", rule.name, rule.description),
                        )
                        .with_metadata(json!({ "rule": rule.id })),
                    );
                }
                rules.len()
            })?;
            rules_validated = validated;

            contributors.push(Contributor::new(
                "constraint-lattice",
                GovernanceLayer::Structural.engine_name(),
                format!("Validated output against {} structural rules.", validated),
            ));
        } else {
            debug!("No active structural rules; skipping enforcement");
        }

        // Symbolic
        self.enter_stage(token, Stage::Symbolic)?;
        pause(pacing.delay_for(Stage::Symbolic)).await;
        let coherence = self.guarded(token, |core| {
            let symbolic = core.state.config.symbolic.clone();
            let graph = coherence_graph(symbolic.archetype_projection);
            let node_count = graph.nodes.len();

            core.state.graph_data = graph;
            core.publish();
            core.log(LogEntry::new(
                Module::Symbolic,
                "Coherence Refined",
                format!(
                    "Topology built with {} nodes. Coherence strength: {}.",
                    node_count, symbolic.coherence_strength
                ),
            ));
            symbolic.coherence_strength
        })?;
        contributors.push(Contributor::new(
            "symbolic-coherence",
            "Symbolic Coherence",
            format!("Refined semantic consistency to a '{}' level.", coherence),
        ));

        // Phenomenological
        self.enter_stage(token, Stage::Phenomenological)?;
        pause(pacing.delay_for(Stage::Phenomenological)).await;
        let congruence = self.guarded(token, |core| {
            let target = core.state.config.phenomenological.affective_congruence_target;
            let trajectory = affective_trajectory();
            let samples = trajectory.len();

            core.state.affective_data = trajectory;
            core.publish();
            core.log(LogEntry::new(
                Module::Phenomenological,
                "Resonance Tracked",
                format!(
                    "Affective trajectory of {} samples toward a '{}' target.",
                    samples, target
                ),
            ));
            target
        })?;
        contributors.push(Contributor::new(
            "phenomenological-resonance",
            "Phenomenological Resonance",
            format!("Calibrated affective tone to a '{}' target.", congruence),
        ));

        // Finalize
        self.enter_stage(token, Stage::Finalize)?;
        self.guarded(token, |core| {
            let framework_id = core
                .state
                .active_framework
                .as_ref()
                .map(|f| f.id.clone())
                .unwrap_or_default();
            let summary = summarize(redacted, rules_validated, coherence, congruence);
            let report = IntrospectionReport::new(framework_id, contributors, summary);

            core.state.final_output = Some(match redacted_span {
                Some(segment) => FinalOutput::Highlighted {
                    text: REDACTION_NOTICE.to_string(),
                    highlight: segment,
                },
                None => FinalOutput::Text(core.state.run.partial_output.clone()),
            });
            core.state.introspection_report = Some(report);
            core.publish();

            core.log(LogEntry::new(
                Module::System,
                "Pipeline Complete",
                "Final output and introspection report generated.",
            ));
            core.end_run(RunStatus::Complete);
            core.publish();
            info!(run = token.0, redacted, "Run completed");
        })
    }

    fn fail_run(&self, token: RunToken, err: &OrchestratorError) {
        let message = err.to_string();
        let applied = self.guarded(token, |core| {
            error!(run = token.0, error = %message, "Run failed");
            core.state.error = Some(message.clone());
            core.log(LogEntry::new(Module::System, "Error", message.clone()));
            core.end_run(RunStatus::Failed {
                error: message.clone(),
            });
            core.publish();
        });
        if applied.is_err() {
            info!(run = token.0, "Failure of abandoned run discarded");
        }
    }

    // ------------------------------------------------------------------
    // Breach simulation
    // ------------------------------------------------------------------

    #[instrument(skip(self, prompt))]
    async fn execute_breach_simulation(&self, prompt: String) -> Result<(), OrchestratorError> {
        let token = {
            let mut core = self.lock();
            if core.active_run.is_some() {
                warn!("Rejecting breach simulation: another run is in progress");
                return Err(OrchestratorError::RunAlreadyInProgress);
            }
            if !core.state.config.security.simulation_enabled {
                warn!("Breach simulation requested while disabled");
                return Err(OrchestratorError::SimulationDisabled);
            }

            core.state.logs.clear();
            core.state.final_output = None;
            let token = core.begin_run(Stage::Security);
            core.publish();

            core.log(LogEntry::new(
                Module::Security,
                "Breach Simulation",
                format!("Testing prompt: \"{}\"", prompt),
            ));
            token
        };

        let _guard = self.guard_run(token);
        pause(self.shared.pacing.breach_delay()).await;
        let detection = self.shared.scanner.scan(&prompt);

        let outcome = self.guarded(token, |core| {
            match detection {
                Some(found) => {
                    core.state.final_output = Some(FinalOutput::Highlighted {
                        text: format!(
                            "[BREACH DETECTED] The prompt attempted to bypass safeguards. \
                             Malicious segment identified: \"{}\"",
                            found.segment
                        ),
                        highlight: found.segment.clone(),
                    });
                    core.publish();
                    core.log(
                        LogEntry::new(
                            Module::Security,
                            "Breach Detected",
                            format!("Malicious pattern found: \"{}\"", found.segment),
                        )
                        .with_metadata(json!({
                            "pattern": found.pattern,
                            "segment": found.segment,
                        })),
                    );
                }
                None => {
                    core.state.final_output = Some(FinalOutput::Text(SIMULATION_PASSED.to_string()));
                    core.publish();
                    core.log(LogEntry::new(
                        Module::Security,
                        "Simulation Clear",
                        "No malicious pattern found.",
                    ));
                }
            }
            core.end_run(RunStatus::Complete);
            core.publish();
        });

        if outcome.is_err() {
            info!(run = token.0, "Discarding result of abandoned breach simulation");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticGenerator;

    fn orchestrator() -> Orchestrator {
        Orchestrator::builder(Catalog::builtin(), Arc::new(StaticGenerator::new("ok")))
            .pacing(StagePacing::none())
            .build()
    }

    #[tokio::test]
    async fn test_select_framework_seeds_structural_rules() {
        let orch = orchestrator();
        orch.dispatch(Action::SelectFramework("constitution".to_string()))
            .await
            .unwrap();

        let state = orch.snapshot();
        assert_eq!(state.config.structural.active_rules.len(), 4);
        assert_eq!(state.run.progress_step, STEP_FRAMEWORK_LOADED);
        assert_eq!(state.logs.len(), 1);
        assert_eq!(state.logs.entries()[0].event, "Framework Loaded");
        assert_eq!(state.logs.entries()[0].time_offset, 0.0);
    }

    #[tokio::test]
    async fn test_unknown_framework_leaves_state_untouched() {
        let orch = orchestrator();
        let err = orch
            .dispatch(Action::SelectFramework("nope".to_string()))
            .await
            .unwrap_err();

        assert_eq!(err, OrchestratorError::UnknownFramework("nope".to_string()));
        assert_eq!(orch.snapshot(), AppState::baseline());
    }

    #[tokio::test]
    async fn test_run_token_cleared_after_completion() {
        let orch = orchestrator();
        orch.dispatch(Action::SelectFramework("bitcoin".to_string()))
            .await
            .unwrap();
        orch.dispatch(Action::ExecuteNarrative("Explain blocks".to_string()))
            .await
            .unwrap();

        assert!(!orch.is_running());
        let state = orch.snapshot();
        assert_eq!(state.run.status, RunStatus::Complete);
        assert!(state.run.started_at.is_none());
    }

    #[tokio::test]
    async fn test_spawned_dispatch_runs_to_completion() {
        let orch = orchestrator();
        orch.dispatch(Action::SelectFramework("acls".to_string()))
            .await
            .unwrap();

        let handle = orch.spawn(Action::ExecuteNarrative("Summarize the algorithm".to_string()));
        handle.await.unwrap().unwrap();

        assert!(orch.snapshot().introspection_report.is_some());
    }
}
