//! Orchestrator: the `init -> normalizing -> generating -> [iterating ->
//! validating -> critiquing -> scoring -> (refining?)]* -> costing ->
//! (furnishing) -> done|failed` state machine that drives one run.
//!
//! Runs as a detached task per job; communicates only through the job store
//! (status/result snapshots) and the progress hub (live events). A passing
//! score always ends the iteration loop, even if nothing else would have.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::agents::cost::{CostAgent, CostInput};
use crate::agents::critic::{CriticAgent, CriticInput};
use crate::agents::furniture::FurnitureAgent;
use crate::agents::input::InputAgent;
use crate::agents::refinement::{RefinementAgent, RefinementInput};
use crate::agents::spatial::SpatialAgent;
use crate::agents::Agent;
use crate::jobstore::SharedJobStore;
use crate::llm::{LlmProvider, ModelRouter};
use crate::models::config::ProjectConfig;
use crate::models::event::{
    AgentCompleteData, AgentStartData, CompletedData, ErrorData, IterationStartData, ProgressEvent,
    ScoreUpdateData, ViolationUpdateData,
};
use crate::models::job::JobStatus;
use crate::models::plan::{Compliance, ComplianceItem, ComplianceStatus, FloorPlanGraph, GeneratedPlan, IterationRecord};
use crate::progress_hub::SharedProgressHub;
use crate::validators::{cultural, regulatory};

pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

/// How long a job's progress channel survives past its terminal event,
/// giving slow subscribers a grace window to still receive the replay
/// before the channel is torn down.
const PROGRESS_RETIRE_GRACE: Duration = Duration::from_secs(300);

/// Flipped by the transport layer on a cancellation request; checked by the
/// orchestrator between agent steps and between iterations.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct OrchestratorDeps {
    pub llm: Arc<dyn LlmProvider>,
    pub router: Arc<ModelRouter>,
    pub job_store: SharedJobStore,
    pub progress_hub: SharedProgressHub,
    pub max_iterations: u32,
    pub convergence_threshold: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("agent '{agent}' failed: {source}")]
    Agent { agent: &'static str, #[source] source: crate::agents::AgentError },
    #[error("run cancelled")]
    Cancelled,
}

async fn emit(hub: &SharedProgressHub, job_id: &str, event: ProgressEvent) {
    hub.publish(job_id, event).await;
}

async fn run_agent<In: Send + Sync, Out: Send + Sync>(
    hub: &SharedProgressHub,
    job_id: &str,
    agent: &dyn Agent<In, Out>,
    model_hint: &str,
    input: In,
) -> Result<(Out, String, Option<u64>), RunError> {
    emit(
        hub,
        job_id,
        ProgressEvent::AgentStart(AgentStartData { agent: agent.name().to_string(), model: model_hint.to_string() }),
    )
    .await;

    let result = agent.execute(input).await.map_err(|source| RunError::Agent { agent: agent.name(), source })?;

    emit(
        hub,
        job_id,
        ProgressEvent::AgentComplete(AgentCompleteData {
            agent: agent.name().to_string(),
            model: result.metadata.model_used.clone(),
            duration_ms: result.metadata.duration_ms,
            token_count: result.metadata.token_count,
        }),
    )
    .await;

    Ok((result.data, result.metadata.model_used, result.metadata.token_count))
}

/// Run a full generation job to completion, updating the job store and
/// broadcasting progress the whole way. Never panics on agent failure; every
/// fallible step is converted into either a recoverable default or a
/// terminal `failed` status plus `error` event.
pub async fn run(deps: Arc<OrchestratorDeps>, job_id: String, config: ProjectConfig, cancel: CancelFlag) {
    deps.job_store
        .update(&job_id, |job| job.status = JobStatus::Running)
        .await
        .ok();

    if let Err(err) = run_inner(&deps, &job_id, config, &cancel).await {
        let (message, reason) = match &err {
            RunError::Cancelled => ("run cancelled".to_string(), "cancelled"),
            RunError::Agent { agent, source } => (format!("{agent} agent failed: {source}"), "agent_failure"),
        };
        error!(job_id = %job_id, error = %message, "orchestration failed");
        deps.job_store
            .update(&job_id, |job| {
                job.status = JobStatus::Failed;
                job.error = Some(message.clone());
            })
            .await
            .ok();
        emit(&deps.progress_hub, &job_id, ProgressEvent::Error(ErrorData { message, reason: reason.to_string() }))
            .await;
    }

    retire_after_grace(deps, job_id);
}

/// Retire a job's progress channel once nobody reconnecting to it could
/// still expect a live stream, without blocking the caller on the wait.
fn retire_after_grace(deps: Arc<OrchestratorDeps>, job_id: String) {
    tokio::spawn(async move {
        tokio::time::sleep(PROGRESS_RETIRE_GRACE).await;
        deps.progress_hub.retire(&job_id).await;
    });
}

async fn run_inner(
    deps: &Arc<OrchestratorDeps>,
    job_id: &str,
    config: ProjectConfig,
    cancel: &CancelFlag,
) -> Result<(), RunError> {
    let input_agent = InputAgent { llm: deps.llm.clone(), router: deps.router.clone() };
    let input_model = deps.router.config_for(crate::llm::AgentRole::Input).model_id;
    let (spec, _, _) = run_agent(&deps.progress_hub, job_id, &input_agent, &input_model, config).await?;

    if cancel.is_cancelled() {
        return Err(RunError::Cancelled);
    }

    let spatial_agent = SpatialAgent { llm: deps.llm.clone(), router: deps.router.clone() };
    let spatial_model = deps.router.config_for(crate::llm::AgentRole::Spatial).model_id;
    let (mut plan, _, _) =
        run_agent(&deps.progress_hub, job_id, &spatial_agent, &spatial_model, spec.clone()).await?;

    let max_iterations = deps.max_iterations.max(1);
    let mut history: Vec<IterationRecord> = Vec::new();
    let mut converged = false;
    let mut iteration_count = 0u32;

    for iteration in 1..=max_iterations {
        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }

        iteration_count = iteration;
        emit(
            &deps.progress_hub,
            job_id,
            ProgressEvent::IterationStart(IterationStartData { iteration, max_iterations }),
        )
        .await;
        deps.job_store
            .update(job_id, |job| {
                job.progress.phase = "iterating".to_string();
                job.progress.iteration = iteration;
                job.progress.max_iterations = max_iterations;
            })
            .await
            .ok();

        let regulatory_result = regulatory::validate(
            &plan.rooms,
            spec.plot_width,
            spec.plot_depth,
            &spec.municipal_profile,
            spec.floors,
        );
        emit(
            &deps.progress_hub,
            job_id,
            ProgressEvent::ViolationUpdate(ViolationUpdateData {
                category: "regulatory".to_string(),
                violations: regulatory_result.violations.clone(),
                items: regulatory_result.items.clone(),
                score: regulatory_result.score,
            }),
        )
        .await;

        let cultural_result = cultural::validate(&plan.rooms, spec.strictness_coefficient);
        emit(
            &deps.progress_hub,
            job_id,
            ProgressEvent::ViolationUpdate(ViolationUpdateData {
                category: "cultural".to_string(),
                violations: cultural_result.violations.clone(),
                items: cultural_result.items.clone(),
                score: cultural_result.score,
            }),
        )
        .await;

        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }

        let critic_agent = CriticAgent { llm: deps.llm.clone(), router: deps.router.clone() };
        let critic_model = deps.router.config_for(crate::llm::AgentRole::Critic).model_id;
        let critic_input =
            CriticInput { plan: plan.clone(), regulatory: regulatory_result.clone(), cultural: cultural_result.clone() };
        let (critique, _, _) =
            run_agent(&deps.progress_hub, job_id, &critic_agent, &critic_model, critic_input).await?;

        let score = crate::scorer::score(
            regulatory_result.score,
            cultural_result.score,
            critique.spatial_subscore(),
            critique.overall_confidence,
            deps.convergence_threshold,
        );
        emit(
            &deps.progress_hub,
            job_id,
            ProgressEvent::ScoreUpdate(ScoreUpdateData { iteration, score: score.clone() }),
        )
        .await;

        history.push(IterationRecord {
            iteration,
            plan_snapshot: plan.clone(),
            regulatory: regulatory_result.clone(),
            cultural: cultural_result.clone(),
            critique: critique.clone(),
            score: score.clone(),
        });
        if history.len() > 5 {
            history.remove(0);
        }

        if score.passes_threshold {
            converged = true;
            break;
        }

        if iteration < max_iterations {
            if cancel.is_cancelled() {
                return Err(RunError::Cancelled);
            }
            let refinement_agent = RefinementAgent { llm: deps.llm.clone(), router: deps.router.clone() };
            let refinement_model = deps.router.config_for(crate::llm::AgentRole::Refinement).model_id;
            let refinement_input = RefinementInput {
                plan: plan.clone(),
                spec: spec.clone(),
                regulatory: regulatory_result,
                cultural: cultural_result,
                critique,
            };
            let (refined, _, _) = run_agent(
                &deps.progress_hub,
                job_id,
                &refinement_agent,
                &refinement_model,
                refinement_input,
            )
            .await?;
            plan = refined;
        }
    }

    let last_record = history.last().cloned();

    deps.job_store
        .update(job_id, |job| job.progress.phase = "costing".to_string())
        .await
        .ok();

    let cost_agent = CostAgent { llm: deps.llm.clone(), router: deps.router.clone() };
    let cost_input = CostInput { plan: plan.clone(), spec: spec.clone() };
    let mut cost_failure: Option<ComplianceItem> = None;
    let cost_output = match cost_agent.execute(cost_input).await {
        Ok(output) => output.data,
        Err(err) => {
            info!(error = %err, "cost agent failed, continuing with an empty bill of materials");
            cost_failure = Some(ComplianceItem {
                rule: "cost_estimation".to_string(),
                status: ComplianceStatus::Warn,
                message: "cost agent failed, bill of materials omitted".to_string(),
                recommendation: None,
            });
            crate::agents::cost::CostOutput { bom: Vec::new(), cost_range: Default::default() }
        }
    };

    deps.job_store
        .update(job_id, |job| job.progress.phase = "furnishing".to_string())
        .await
        .ok();

    let furniture_agent = FurnitureAgent { llm: deps.llm.clone(), router: deps.router.clone() };
    let furniture = match furniture_agent.execute(plan.rooms.clone()).await {
        Ok(output) => Some(output.data),
        Err(err) => {
            info!(error = %err, "furniture agent failed, continuing without furniture");
            None
        }
    };

    let mut regulatory_items = last_record.as_ref().map(|r| r.regulatory.items.clone()).unwrap_or_default();
    regulatory_items.extend(cost_failure);
    let compliance = Compliance {
        regulatory: regulatory_items,
        cultural: last_record.as_ref().map(|r| r.cultural.items.clone()).unwrap_or_default(),
    };

    let generated_plan = assemble_generated_plan(&plan, compliance, cost_output, furniture);
    let final_score = last_record.map(|r| r.score.final_score).unwrap_or(0.0);

    deps.job_store
        .update(job_id, |job| {
            job.status = JobStatus::Completed;
            job.progress.phase = "done".to_string();
            job.result = Some(generated_plan.clone());
        })
        .await
        .ok();

    emit(
        &deps.progress_hub,
        job_id,
        ProgressEvent::Completed(CompletedData {
            final_plan: generated_plan,
            final_score,
            converged,
            iteration_count,
        }),
    )
    .await;

    Ok(())
}

fn assemble_generated_plan(
    plan: &FloorPlanGraph,
    compliance: Compliance,
    cost: crate::agents::cost::CostOutput,
    furniture: Option<Vec<crate::models::plan::FurnitureItem>>,
) -> GeneratedPlan {
    GeneratedPlan {
        design_log: plan.design_log.clone(),
        rooms: plan.rooms.iter().map(|r| r.room.clone()).collect(),
        total_area: plan.total_area,
        built_up_area: plan.built_up_area,
        plot_coverage_ratio: plan.plot_coverage_ratio,
        compliance,
        bom: cost.bom,
        total_cost_range: cost.cost_range,
        furniture,
        floors: None,
    }
}

