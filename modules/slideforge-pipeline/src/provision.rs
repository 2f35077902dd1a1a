use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use agent_client::{AgentDefinition, AgentService, ToolSpec};
use slideforge_store::StateStore;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::prompts;

const VECTOR_STORE_ID_KEY: &str = "vectorStoreId";

const SEED_EXTENSIONS: [&str; 3] = ["md", "pdf", "txt"];
const VECTOR_STORE_NAME: &str = "seed-data";
const VECTOR_STORE_READY_TIMEOUT: Duration = Duration::from_secs(120);

/// The five canonical agent names. `file-research` is only reconciled
/// when a vector store exists. See spec §4.2.
pub const PLANNER: &str = "planner";
pub const WEB_RESEARCH: &str = "web-research";
pub const FILE_RESEARCH: &str = "file-research";
pub const HTML_GENERATOR: &str = "html-generator";
pub const VALIDATOR: &str = "validator";

/// Process-wide state written once by the provisioning supervisor and
/// read-only thereafter. See spec §3/§5.
pub struct ProvisioningContext {
    vector_store_id: RwLock<Option<String>>,
    agent_ids: RwLock<HashMap<String, String>>,
    fired: AtomicBool,
    notify: Notify,
}

impl Default for ProvisioningContext {
    fn default() -> Self {
        Self {
            vector_store_id: RwLock::new(None),
            agent_ids: RwLock::new(HashMap::new()),
            fired: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }
}

impl ProvisioningContext {
    pub fn vector_store_id(&self) -> Option<String> {
        self.vector_store_id.read().unwrap().clone()
    }

    pub fn agent_id(&self, name: &str) -> Option<String> {
        self.agent_ids.read().unwrap().get(name).cloned()
    }

    /// A one-shot latch: fires at most once, observable by any number
    /// of waiters without starvation. See spec §9.
    pub async fn wait_ready(&self) {
        if self.fired.load(Ordering::Acquire) {
            return;
        }
        let notified = self.notify.notified();
        if self.fired.load(Ordering::Acquire) {
            return;
        }
        notified.await;
    }

    fn fire(&self) {
        self.fired.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }
}

pub struct ProvisioningSupervisor {
    client: Arc<dyn AgentService>,
    state_store: Arc<StateStore>,
    model_deployment_name: String,
    seed_data_dir: PathBuf,
}

impl ProvisioningSupervisor {
    pub fn new(
        client: Arc<dyn AgentService>,
        state_store: Arc<StateStore>,
        model_deployment_name: String,
        seed_data_dir: PathBuf,
    ) -> Self {
        Self {
            client,
            state_store,
            model_deployment_name,
            seed_data_dir,
        }
    }

    /// Runs exactly once at boot. Failures are logged but never prevent
    /// the ready signal — the orchestrator tolerates a missing vector
    /// store or a partial agent map. See spec §4.2.
    pub async fn run(&self, context: &ProvisioningContext) {
        let vector_store_id = self.decide_vector_store().await;
        if let Some(id) = &vector_store_id {
            *context.vector_store_id.write().unwrap() = Some(id.clone());
        } else {
            info!("file research unavailable: no vector store provisioned");
        }

        self.reconcile_agents(context, vector_store_id.as_deref()).await;

        context.fire();
        info!("provisioning ready");
    }

    async fn decide_vector_store(&self) -> Option<String> {
        let stored_id = match self.state_store.get(VECTOR_STORE_ID_KEY).await {
            Ok(id) => id,
            Err(err) => {
                warn!(error = %err, "failed to read state store, ignoring stored vector store id");
                None
            }
        };

        if let Some(id) = stored_id {
            match self.client.wait_vector_store_ready(&id, VECTOR_STORE_READY_TIMEOUT).await {
                Ok(()) => return Some(id),
                Err(err) => {
                    warn!(error = %err, vector_store_id = %id, "stored vector store did not become ready");
                    return None;
                }
            }
        }

        let seed_files = scan_seed_files(&self.seed_data_dir);
        if seed_files.is_empty() {
            return None;
        }

        let mut file_ids = Vec::with_capacity(seed_files.len());
        for path in &seed_files {
            match self.client.upload_file(path).await {
                Ok(id) => file_ids.push(id),
                Err(err) => warn!(error = %err, file = %path.display(), "failed to upload seed file"),
            }
        }
        if file_ids.is_empty() {
            return None;
        }

        let vector_store_id = match self.client.create_vector_store(VECTOR_STORE_NAME, &file_ids).await {
            Ok(id) => id,
            Err(err) => {
                warn!(error = %err, "failed to create vector store");
                return None;
            }
        };

        if let Err(err) = self
            .client
            .wait_vector_store_ready(&vector_store_id, VECTOR_STORE_READY_TIMEOUT)
            .await
        {
            warn!(error = %err, "vector store did not become ready in time");
            return None;
        }

        if let Err(err) = self.state_store.set(VECTOR_STORE_ID_KEY, &vector_store_id).await {
            warn!(error = %err, "failed to persist vector store id");
        }

        Some(vector_store_id)
    }

    async fn reconcile_agents(&self, context: &ProvisioningContext, vector_store_id: Option<&str>) {
        let existing = match self.client.list_agents_by_name().await {
            Ok(map) => map,
            Err(err) => {
                warn!(error = %err, "failed to list existing agents, assuming none exist");
                HashMap::new()
            }
        };

        let mut definitions = vec![
            (PLANNER, AgentDefinition {
                name: PLANNER.to_string(),
                model: self.model_deployment_name.clone(),
                instructions: prompts::PLANNER_INSTRUCTIONS.to_string(),
                tools: vec![],
            }),
            (WEB_RESEARCH, AgentDefinition {
                name: WEB_RESEARCH.to_string(),
                model: self.model_deployment_name.clone(),
                instructions: prompts::WEB_RESEARCH_INSTRUCTIONS.to_string(),
                tools: vec![ToolSpec::WebSearchPreview],
            }),
            (HTML_GENERATOR, AgentDefinition {
                name: HTML_GENERATOR.to_string(),
                model: self.model_deployment_name.clone(),
                instructions: prompts::HTML_GENERATOR_INSTRUCTIONS.to_string(),
                tools: vec![],
            }),
            (VALIDATOR, AgentDefinition {
                name: VALIDATOR.to_string(),
                model: self.model_deployment_name.clone(),
                instructions: prompts::VALIDATOR_INSTRUCTIONS.to_string(),
                tools: vec![],
            }),
        ];

        if let Some(vector_store_id) = vector_store_id {
            definitions.push((FILE_RESEARCH, AgentDefinition {
                name: FILE_RESEARCH.to_string(),
                model: self.model_deployment_name.clone(),
                instructions: prompts::FILE_RESEARCH_INSTRUCTIONS.to_string(),
                tools: vec![ToolSpec::FileSearch {
                    vector_store_ids: vec![vector_store_id.to_string()],
                }],
            }));
        }

        for (name, definition) in definitions {
            let reconciled_id = match existing.get(name) {
                Some(id) => match self.client.update_agent(id, &definition).await {
                    Ok(()) => Some(id.clone()),
                    Err(err) => {
                        warn!(error = %err, agent = name, "failed to update agent");
                        None
                    }
                },
                None => match self.client.create_agent(&definition).await {
                    Ok(id) => Some(id),
                    Err(err) => {
                        warn!(error = %err, agent = name, "failed to create agent");
                        None
                    }
                },
            };

            if let Some(id) = reconciled_id {
                context.agent_ids.write().unwrap().insert(name.to_string(), id);
            }
        }
    }
}

fn scan_seed_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| SEED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}
