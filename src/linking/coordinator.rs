//! Batch coordinator
//!
//! Builds the title index once, then runs read → extract regions →
//! substitute → write for every document on a bounded pool of tokio tasks.
//! A failing document is recorded in the report and never stops the batch.
//! Cancelling the run's token stops dispatch, including a dispatch that is
//! waiting for a free slot; documents already running finish normally.

use super::regions::extract_protected_regions;
use super::substitute::{substitute_links_with, SubstituteOptions};
use super::titles::{TitleFilter, TitleIndex};
use super::types::{Document, DocumentId, LinkError};
use crate::config::LinkerConfig;
use crate::storage::DocumentStore;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Where a document's processing failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Read,
    Write,
    /// The worker task itself died
    Worker,
}

/// A document that could not be processed
#[derive(Debug, Clone, Serialize)]
pub struct DocumentFailure {
    pub id: DocumentId,
    pub stage: FailureStage,
    pub kind: String,
    pub message: String,
}

/// What happened to one document
#[derive(Debug)]
pub enum DocumentOutcome {
    Unchanged,
    /// Links were inserted (and written, unless this is a dry run)
    Edited { links: usize },
    Failed { stage: FailureStage, error: LinkError },
}

/// Aggregated result of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Documents handed to the coordinator
    pub found: usize,
    /// Documents read successfully
    pub scanned: usize,
    /// Documents whose new content was persisted (or would be, in a dry run)
    pub edited: Vec<DocumentId>,
    /// Links inserted into the edited documents
    pub links_inserted: usize,
    pub failures: Vec<DocumentFailure>,
    /// Documents skipped because the run was cancelled
    pub not_dispatched: usize,
    pub dry_run: bool,
}

impl BatchReport {
    fn new(found: usize, dry_run: bool) -> Self {
        Self {
            found,
            dry_run,
            ..Self::default()
        }
    }

    fn record(&mut self, id: DocumentId, outcome: DocumentOutcome) {
        match outcome {
            DocumentOutcome::Unchanged => self.scanned += 1,
            DocumentOutcome::Edited { links } => {
                self.scanned += 1;
                self.links_inserted += links;
                self.edited.push(id);
            }
            DocumentOutcome::Failed { stage, error } => {
                if stage != FailureStage::Read {
                    self.scanned += 1;
                }
                warn!(document = %id, ?stage, error = %error, "document failed");
                let kind = match &error {
                    LinkError::Storage(storage) => storage.kind().to_string(),
                    _ => "worker".to_string(),
                };
                self.failures.push(DocumentFailure {
                    id,
                    stage,
                    kind,
                    message: error.to_string(),
                });
            }
        }
    }

    fn finish(&mut self) {
        self.edited.sort();
        self.failures.sort_by(|a, b| a.id.cmp(&b.id));
    }

    pub fn edited_count(&self) -> usize {
        self.edited.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn was_cancelled(&self) -> bool {
        self.not_dispatched > 0
    }
}

/// Settings each worker needs, copied out of the config
#[derive(Debug, Clone, Copy)]
struct WorkerSettings {
    dry_run: bool,
    skip_self_links: bool,
}

/// Link one document: read, protect, substitute, write back if changed.
async fn process_document<S: DocumentStore + ?Sized>(
    store: &S,
    index: &TitleIndex,
    id: &DocumentId,
    settings: WorkerSettings,
) -> DocumentOutcome {
    let content = match store.read(id).await {
        Ok(content) => content,
        Err(e) => {
            return DocumentOutcome::Failed {
                stage: FailureStage::Read,
                error: e.into(),
            }
        }
    };

    let mut document = Document::new(id.clone(), content);
    let options = match document.title() {
        Some(title) if settings.skip_self_links => SubstituteOptions::new().excluding(&title),
        _ => SubstituteOptions::new(),
    };

    let regions = extract_protected_regions(&document.content);
    let substitution = substitute_links_with(&document.content, index, &regions, &options);
    let links = substitution.link_count();
    document.apply(substitution);

    if !document.dirty {
        debug!(document = %id, regions = regions.len(), "unchanged");
        return DocumentOutcome::Unchanged;
    }

    if !settings.dry_run {
        if let Err(e) = store.write(&document.id, &document.content).await {
            return DocumentOutcome::Failed {
                stage: FailureStage::Write,
                error: e.into(),
            };
        }
    }

    debug!(document = %id, links, dry_run = settings.dry_run, "linked");
    DocumentOutcome::Edited { links }
}

/// Runs a linking pass over a set of documents
pub struct BatchCoordinator<S: DocumentStore + ?Sized + 'static> {
    store: Arc<S>,
    config: LinkerConfig,
    cancel: CancellationToken,
}

impl<S: DocumentStore + ?Sized + 'static> BatchCoordinator<S> {
    pub fn new(store: Arc<S>, config: LinkerConfig) -> Self {
        Self {
            store,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token (e.g. one a signal handler cancels)
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &LinkerConfig {
        &self.config
    }

    /// Link every document in `ids`.
    ///
    /// The title index is complete before the first document is dispatched.
    /// Only an invalid config or an unbuildable index fails the whole run.
    pub async fn run(&self, ids: Vec<DocumentId>) -> Result<BatchReport, LinkError> {
        self.config.validate()?;

        let filter = TitleFilter {
            min_length: self.config.min_title_length,
        };
        let index = Arc::new(TitleIndex::build(&ids, filter)?);
        info!(documents = ids.len(), titles = index.len(), "title index built");

        let settings = WorkerSettings {
            dry_run: self.config.dry_run,
            skip_self_links: self.config.skip_self_links,
        };
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut report = BatchReport::new(ids.len(), settings.dry_run);
        let mut workers: Vec<(DocumentId, JoinHandle<DocumentOutcome>)> =
            Vec::with_capacity(ids.len());

        for id in ids {
            // A cancel that lands while all slots are busy wins over the next free slot
            let acquired = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                permit = semaphore.clone().acquire_owned() => Some(permit),
            };
            let Some(permit) = acquired else {
                report.not_dispatched += 1;
                continue;
            };
            let permit =
                permit.map_err(|e| LinkError::Worker(format!("Semaphore error: {}", e)))?;

            let store = Arc::clone(&self.store);
            let index = Arc::clone(&index);
            let task_id = id.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                process_document(store.as_ref(), &index, &task_id, settings).await
            });
            workers.push((id, handle));
        }

        if report.was_cancelled() {
            info!(skipped = report.not_dispatched, "cancelled, waiting for in-flight documents");
        }

        for (id, handle) in workers {
            let outcome = handle.await.unwrap_or_else(|e| DocumentOutcome::Failed {
                stage: FailureStage::Worker,
                error: LinkError::Worker(e.to_string()),
            });
            report.record(id, outcome);
        }
        report.finish();

        info!(
            scanned = report.scanned,
            edited = report.edited_count(),
            links = report.links_inserted,
            failures = report.failures.len(),
            dry_run = report.dry_run,
            "batch complete"
        );
        Ok(report)
    }
}
