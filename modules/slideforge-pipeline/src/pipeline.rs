use std::sync::Arc;

use agent_client::{build_user_input, AgentService, ResponseRequest, TextFormat};
use render_client::Renderer;
use slideforge_common::{Aspect, JobStep};
use slideforge_store::JobStore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::extract::parse_json_from_output_text;
use crate::provision::{self, ProvisioningContext};
use crate::prompts;
use crate::schema::StructuredOutput;
use crate::types::{FileResearchOutput, PlannerOutput, ValidatorOutput, WebResearchOutput};
use crate::validate::count_slide_sections;

const MAX_GENERATE_ATTEMPTS: usize = 3;
const MAX_VALIDATOR_ISSUES_IN_MESSAGE: usize = 8;
const MAX_FILE_RESEARCH_KEYWORDS: usize = 12;

/// The multi-agent slide generation state machine. See spec §4.6.
pub struct Pipeline {
    client: Arc<dyn AgentService>,
    store: Arc<JobStore>,
    renderer: Arc<dyn Renderer>,
    provisioning: Arc<ProvisioningContext>,
    model_deployment_name: String,
}

impl Pipeline {
    pub fn new(
        client: Arc<dyn AgentService>,
        store: Arc<JobStore>,
        renderer: Arc<dyn Renderer>,
        provisioning: Arc<ProvisioningContext>,
        model_deployment_name: String,
    ) -> Self {
        Self {
            client,
            store,
            renderer,
            provisioning,
            model_deployment_name,
        }
    }

    /// Runs the pipeline for one job to completion. Planner/research
    /// failures degrade gracefully; generator/validator/render failures
    /// propagate to the caller, which marks the job `failed`. See
    /// spec §4.6.7.
    pub async fn run(&self, job_id: &str, cancellation: &CancellationToken) -> Result<(), PipelineError> {
        self.await_cancellable(self.provisioning.wait_ready(), cancellation).await?;

        let input = self
            .store
            .get_input(job_id)
            .await?
            .ok_or_else(|| PipelineError::MissingInput(job_id.to_string()))?;

        let effective_prompt = prompts::compose_effective_prompt(&input.prompt, input.aspect);

        self.set_step(job_id, JobStep::Plan).await?;
        let outline = self.run_planner(&effective_prompt, input.image_data_url.as_deref(), &input.prompt).await;

        self.set_step(job_id, JobStep::ResearchWeb).await?;
        let (web, file) = tokio::join!(
            self.run_web_research(&outline),
            self.run_file_research(&effective_prompt, &outline),
        );
        self.set_step(job_id, JobStep::ResearchFile).await?;

        self.merge_sources(job_id, &web, &file).await?;

        let html = self
            .generate_validate_loop(job_id, &effective_prompt, input.aspect, &outline, &web, &file, cancellation)
            .await?;

        let png = self
            .await_cancellable(self.renderer.render(&html, input.aspect), cancellation)
            .await??;
        self.store.save_preview_png(job_id, &png).await?;

        self.store
            .update(job_id, |s| {
                s.status = slideforge_common::JobStatus::Succeeded;
                s.step = None;
                s.error = None;
            })
            .await?;

        info!(job_id, "pipeline completed");
        Ok(())
    }

    async fn await_cancellable<F, T>(&self, fut: F, cancellation: &CancellationToken) -> Result<T, PipelineError>
    where
        F: std::future::Future<Output = T>,
    {
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(PipelineError::Cancelled),
            result = fut => Ok(result),
        }
    }

    async fn set_step(&self, job_id: &str, step: JobStep) -> Result<(), PipelineError> {
        self.store.update(job_id, move |s| s.step = Some(step)).await?;
        Ok(())
    }

    async fn run_planner(&self, effective_prompt: &str, image_data_url: Option<&str>, raw_prompt: &str) -> PlannerOutput {
        let request = ResponseRequest {
            model: self.model_deployment_name.clone(),
            assistant_id: self.provisioning.agent_id(provision::PLANNER),
            input: vec![build_user_input(effective_prompt, image_data_url)],
            tools: vec![],
            text: Some(TextFormat { format: PlannerOutput::response_schema() }),
        };

        match self.client.create_response(&request).await {
            Ok(envelope) => match parse_json_from_output_text::<PlannerOutput>(&envelope) {
                Ok(output) => output.normalize(raw_prompt),
                Err(err) => {
                    warn!(error = %err, "planner output failed to parse, falling back");
                    PlannerOutput::fallback(raw_prompt)
                }
            },
            Err(err) => {
                warn!(error = %err, "planner call failed, falling back");
                PlannerOutput::fallback(raw_prompt)
            }
        }
    }

    async fn run_web_research(&self, outline: &PlannerOutput) -> WebResearchOutput {
        if outline.search_queries.is_empty() {
            return WebResearchOutput::default();
        }

        let queries_block = outline.search_queries.join("\n");
        let request = ResponseRequest {
            model: self.model_deployment_name.clone(),
            assistant_id: self.provisioning.agent_id(provision::WEB_RESEARCH),
            input: vec![build_user_input(&queries_block, None)],
            tools: vec![agent_client::ToolSpec::WebSearchPreview],
            text: Some(TextFormat { format: WebResearchOutput::response_schema() }),
        };

        match self.client.create_response(&request).await {
            Ok(envelope) => parse_json_from_output_text::<WebResearchOutput>(&envelope).unwrap_or_else(|err| {
                warn!(error = %err, "web research output failed to parse, degrading");
                WebResearchOutput::default()
            }),
            Err(err) => {
                warn!(error = %err, "web research call failed, degrading");
                WebResearchOutput::default()
            }
        }
    }

    async fn run_file_research(&self, effective_prompt: &str, outline: &PlannerOutput) -> FileResearchOutput {
        let Some(vector_store_id) = self.provisioning.vector_store_id() else {
            return FileResearchOutput::default();
        };

        let mut keywords: Vec<String> = outline.key_constraints.clone();
        keywords.extend(outline.outline.iter().map(|o| o.title.clone()));
        let mut seen = std::collections::HashSet::new();
        keywords.retain(|k| seen.insert(k.to_lowercase()));
        keywords.truncate(MAX_FILE_RESEARCH_KEYWORDS);

        let prompt = format!("{effective_prompt}\n\nKeywords: {}", keywords.join(", "));
        let request = ResponseRequest {
            model: self.model_deployment_name.clone(),
            assistant_id: self.provisioning.agent_id(provision::FILE_RESEARCH),
            input: vec![build_user_input(&prompt, None)],
            tools: vec![agent_client::ToolSpec::FileSearch { vector_store_ids: vec![vector_store_id] }],
            text: Some(TextFormat { format: FileResearchOutput::response_schema() }),
        };

        match self.client.create_response(&request).await {
            Ok(envelope) => parse_json_from_output_text::<FileResearchOutput>(&envelope).unwrap_or_else(|err| {
                warn!(error = %err, "file research output failed to parse, degrading");
                FileResearchOutput::default()
            }),
            Err(err) => {
                warn!(error = %err, "file research call failed, degrading");
                FileResearchOutput::default()
            }
        }
    }

    async fn merge_sources(
        &self,
        job_id: &str,
        web: &WebResearchOutput,
        file: &FileResearchOutput,
    ) -> Result<(), PipelineError> {
        let urls: Vec<String> = web.citations.iter().map(|c| c.url.clone()).collect();
        let files: Vec<String> = file.citations.iter().map(|c| c.filename.clone()).collect();
        if urls.is_empty() && files.is_empty() {
            return Ok(());
        }

        self.store
            .update(job_id, move |s| {
                s.sources.urls.extend(urls.clone());
                s.sources.files.extend(files.clone());
            })
            .await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn generate_validate_loop(
        &self,
        job_id: &str,
        effective_prompt: &str,
        aspect: Aspect,
        outline: &PlannerOutput,
        web: &WebResearchOutput,
        file: &FileResearchOutput,
        cancellation: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let mut fixed_prompt_appendix: Option<String> = None;

        for attempt in 0..MAX_GENERATE_ATTEMPTS {
            self.set_step(job_id, JobStep::GenerateHtml).await?;

            let html = self
                .await_cancellable(
                    self.call_generator(effective_prompt, aspect, outline, web, file, fixed_prompt_appendix.as_deref()),
                    cancellation,
                )
                .await??;

            self.store.save_html(job_id, &html).await?;

            self.set_step(job_id, JobStep::Validate).await?;
            let validation = self
                .await_cancellable(self.call_validator(&html, aspect), cancellation)
                .await??;

            let slide_count = count_slide_sections(&html);

            if validation.ok && slide_count == 1 {
                return Ok(html);
            }

            let mut issues = validation.issues.clone();
            if slide_count != 1 {
                issues.insert(0, format!("Expected exactly 1 <section class=\"slide\">, found {slide_count}"));
            }

            if attempt + 1 == MAX_GENERATE_ATTEMPTS {
                let message = issues.into_iter().take(MAX_VALIDATOR_ISSUES_IN_MESSAGE).collect::<Vec<_>>().join("; ");
                return Err(PipelineError::ValidationExhausted(message));
            }

            fixed_prompt_appendix = Some(if !validation.fixed_prompt_appendix.is_empty() {
                let mut appendix = validation.fixed_prompt_appendix.clone();
                if slide_count != 1 {
                    appendix.push('\n');
                    appendix.push_str(&format!("Expected exactly 1 <section class=\"slide\">, found {slide_count}"));
                }
                appendix
            } else {
                prompts::synthesize_fix_appendix(&issues)
            });
        }

        unreachable!("loop always returns within MAX_GENERATE_ATTEMPTS")
    }

    async fn call_generator(
        &self,
        effective_prompt: &str,
        aspect: Aspect,
        outline: &PlannerOutput,
        web: &WebResearchOutput,
        file: &FileResearchOutput,
        fixed_prompt_appendix: Option<&str>,
    ) -> Result<String, PipelineError> {
        let mut prompt = format!(
            "{effective_prompt}\n\nOutline:\n{}\n\nWeb findings:\n{}\n\nFile snippets:\n{}",
            serde_json::to_string(&outline.outline).unwrap_or_default(),
            web.findings.join("\n"),
            file.snippets.join("\n"),
        );
        if let Some(appendix) = fixed_prompt_appendix {
            prompt.push_str("\n\n---\n");
            prompt.push_str(appendix);
        }

        let request = ResponseRequest {
            model: self.model_deployment_name.clone(),
            assistant_id: self.provisioning.agent_id(provision::HTML_GENERATOR),
            input: vec![build_user_input(&prompt, None)],
            tools: vec![],
            text: None,
        };
        let _ = aspect;

        let envelope = self.client.create_response(&request).await?;
        let text = crate::extract::extract_output_text(&envelope);
        Ok(crate::extract::strip_code_fences(&text).trim().to_string())
    }

    async fn call_validator(&self, html: &str, aspect: Aspect) -> Result<ValidatorOutput, PipelineError> {
        let prompt = format!(
            "Aspect: {}\nCanvas: {}x{}\nSafe margin: {}px\n\nHTML:\n{html}",
            aspect.as_str(),
            aspect.canvas().0,
            aspect.canvas().1,
            aspect.safe_margin(),
        );

        let request = ResponseRequest {
            model: self.model_deployment_name.clone(),
            assistant_id: self.provisioning.agent_id(provision::VALIDATOR),
            input: vec![build_user_input(&prompt, None)],
            tools: vec![],
            text: Some(TextFormat { format: ValidatorOutput::response_schema() }),
        };

        let envelope = self.client.create_response(&request).await?;
        parse_json_from_output_text::<ValidatorOutput>(&envelope)
    }
}
