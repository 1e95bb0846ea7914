//! Generation run.
//!
//! Tables are processed one at a time, in catalog order:
//!
//! ```text
//! for each table:  columns/foreign keys ─▶ classify ─▶ build ─▶ emit ─▶ registry.record
//! after the last:  registry.seal ─▶ registry.render ─▶ init-models.ts
//! ```
//!
//! Nothing touches the filesystem until [`GenerationOutput::write_to`], which
//! is only reachable after the whole run succeeded.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::catalog::CatalogFacade;
use crate::emitter::{emit_entity, emit_registry, Artifact, EmitConfig};
use crate::error::{GenerateError, GenerateResult};
use crate::inference::InferenceEngine;
use crate::model::{self, EntityDescription, Pluralization};
use crate::registry::RelationshipRegistry;

/// Cooperative cancellation flag shared between a run and its controller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for a generation run.
#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    pub pluralization: Pluralization,
    pub emit: EmitConfig,
    /// Fetch all metadata concurrently up front, then classify locally.
    pub prefetch: bool,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    /// Entity descriptions in table order.
    pub entities: Vec<EntityDescription>,
    /// One model file per entity, then `init-models.ts`.
    pub artifacts: Vec<Artifact>,
    /// SHA-256 over every artifact's name and contents, lowercase hex.
    pub digest: String,
}

impl GenerationOutput {
    fn new(entities: Vec<EntityDescription>, artifacts: Vec<Artifact>) -> Self {
        let mut hasher = Sha256::new();
        for artifact in &artifacts {
            hasher.update(artifact.file_name.as_bytes());
            hasher.update([0u8]);
            hasher.update(artifact.contents.as_bytes());
            hasher.update([0u8]);
        }
        let digest = format!("{:x}", hasher.finalize());
        Self {
            entities,
            artifacts,
            digest,
        }
    }

    /// Write every artifact into `dir`, creating it if needed.
    ///
    /// Files are staged as `.<name>.tmp` and renamed once all of them are
    /// written; on failure the staged files are removed.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> GenerateResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| GenerateError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut staged = Vec::with_capacity(self.artifacts.len());
        for artifact in &self.artifacts {
            let tmp = dir.join(format!(".{}.tmp", artifact.file_name));
            if let Err(source) = fs::write(&tmp, &artifact.contents) {
                discard(&staged);
                return Err(GenerateError::Io { path: tmp, source });
            }
            staged.push((tmp, dir.join(&artifact.file_name)));
        }

        let mut written = Vec::with_capacity(staged.len());
        for (i, (tmp, path)) in staged.iter().enumerate() {
            if let Err(source) = fs::rename(tmp, path) {
                discard(&staged[i..]);
                return Err(GenerateError::Io {
                    path: path.clone(),
                    source,
                });
            }
            written.push(path.clone());
        }
        tracing::info!(dir = %dir.display(), files = written.len(), "artifacts written");
        Ok(written)
    }
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}

/// Runs the generation pipeline over a catalog facade.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    engine: InferenceEngine,
    emit: EmitConfig,
    prefetch: bool,
    cancel: CancelToken,
}

impl Generator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self {
            engine: InferenceEngine::new(options.pluralization),
            emit: options.emit,
            prefetch: options.prefetch,
            cancel: CancelToken::new(),
        }
    }

    /// Builder: share an existing cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn check_cancelled(&self, table: &str) -> GenerateResult<()> {
        if self.cancel.is_cancelled() {
            tracing::warn!(table, "generation cancelled");
            return Err(GenerateError::Cancelled {
                table: table.to_string(),
            });
        }
        Ok(())
    }

    /// Run the whole pipeline. Either every artifact is produced or an error
    /// names the offending table, column or edge.
    pub async fn run(&self, facade: &CatalogFacade) -> GenerateResult<GenerationOutput> {
        if self.prefetch {
            let snapshot = facade.prefetch().await?;
            let local = CatalogFacade::open(Arc::new(snapshot), facade.options().clone()).await?;
            return self.run_sequential(&local).await;
        }
        self.run_sequential(facade).await
    }

    async fn run_sequential(&self, facade: &CatalogFacade) -> GenerateResult<GenerationOutput> {
        let tables = facade.list_tables();
        let mut registry = RelationshipRegistry::new();
        let mut entities = Vec::with_capacity(tables.len());
        let mut artifacts = Vec::with_capacity(tables.len() + 1);

        for table in tables {
            self.check_cancelled(table)?;

            let columns = facade.columns_of(table).await?;
            let edges = facade.foreign_keys_of(table).await?;
            let relationships = self.engine.classify_table(facade, table, &edges).await?;
            let entity = model::build(table, &columns, relationships);
            let artifact = emit_entity(&entity, &self.emit);

            // Last point where the table can be abandoned without a trace.
            self.check_cancelled(table)?;
            registry.record(entity.entity_name.clone(), entity.relationships.clone())?;

            tracing::info!(
                table = %table,
                entity = %entity.entity_name,
                columns = entity.columns.len(),
                relationships = entity.relationships.len(),
                "processed table"
            );
            artifacts.push(artifact);
            entities.push(entity);
        }

        registry.seal()?;
        let aggregate = registry.render(|entries| emit_registry(entries, &self.emit))?;
        artifacts.push(aggregate);

        let output = GenerationOutput::new(entities, artifacts);
        tracing::info!(
            entities = output.entities.len(),
            digest = %output.digest,
            "generation complete"
        );
        Ok(output)
    }
}
