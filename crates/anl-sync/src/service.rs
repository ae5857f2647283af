//! Export, import, and download between IDOL, the staging folder, and
//! Doccano.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anl_config::AnlConfig;
use anl_core::errors::CoreError;
use anl_core::outcomes::{
    ExportSummary, ImportOutcome, ProjectResolution, PullOutcome, PushSummary,
};
use anl_core::project::{DEFAULT_TEXT_FIELD, Project};
use anl_core::query::QueryRecord;
use anl_core::staging::{AnnotatedRecord, StagingRecord};
use anl_doccano::{DoccanoClient, DoccanoUser};
use anl_idol::{IdolClient, IdolDocument, IdolHit};
use serde_jsonlines::JsonLinesWriter;

use crate::error::SyncError;
use crate::ports::{AnnotationService, SearchIndex};

/// References per `DREDELETEREF` command when moving exported documents.
pub const REMOVE_BATCH: usize = 100;

/// Documents per `DREADDDATA` command.
pub const INDEX_BATCH: usize = 80;

/// Upload format for staging files (one JSON object per line).
pub const UPLOAD_FORMAT: &str = "json";

/// Download format for annotated documents.
pub const DOWNLOAD_FORMAT: &str = "jsonl";

/// Fetch the logged-in identity and log it.
///
/// A non-superuser account is allowed but logged as a warning.
///
/// # Errors
///
/// Returns [`SyncError::Doccano`] if the identity request fails.
pub async fn authenticate<A: AnnotationService + ?Sized>(
    annotations: &A,
) -> Result<DoccanoUser, SyncError> {
    let me = annotations.me().await?;
    tracing::info!(username = %me.username, superuser = me.is_superuser, "Doccano login");
    if !me.is_superuser {
        tracing::warn!(username = %me.username, "user is not a super-user");
    }
    Ok(me)
}

pub struct SyncService<A, S> {
    annotations: A,
    index: Option<S>,
    tempfolder: PathBuf,
}

impl SyncService<DoccanoClient, IdolClient> {
    /// Log in to Doccano and build the IDOL client when `[idol]` is set.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] without a usable `[doccano]` section,
    /// and client errors from logging in.
    pub async fn connect(config: &AnlConfig) -> Result<Self, SyncError> {
        let doccano = config.require_doccano()?;
        let timeout = Duration::from_secs(config.general.timeout_secs);

        let client =
            DoccanoClient::login(&doccano.url, &doccano.username, &doccano.password, timeout)
                .await?;
        authenticate(&client).await?;

        let index = if config.idol.is_configured() {
            Some(IdolClient::new(
                &config.idol.aci_url,
                config.idol.index_endpoint(),
                timeout,
            )?)
        } else {
            tracing::debug!("no [idol] section, index operations disabled");
            None
        };

        Ok(Self::new(client, index, config.general.tempfolder.clone()))
    }
}

impl<A: AnnotationService, S: SearchIndex> SyncService<A, S> {
    pub fn new(annotations: A, index: Option<S>, tempfolder: impl Into<PathBuf>) -> Self {
        Self {
            annotations,
            index,
            tempfolder: tempfolder.into(),
        }
    }

    pub fn tempfolder(&self) -> &Path {
        &self.tempfolder
    }

    /// The IDOL client, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NoIndex`] when the service was built without one.
    pub fn search_index(&self) -> Result<&S, SyncError> {
        self.index.as_ref().ok_or(SyncError::NoIndex)
    }

    /// Match `project` against Doccano by exact (trimmed) name.
    ///
    /// Returns a copy with `id` and `project_type` set, or `None` after
    /// logging an error when no project has that name.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Doccano`] if the project list cannot be fetched.
    pub async fn resolve_project(&self, project: &Project) -> Result<Option<Project>, SyncError> {
        let name = project.lookup_name();
        let projects = self.annotations.projects().await?;
        tracing::debug!(count = projects.len(), "doccano projects");

        let Some(found) = projects.into_iter().find(|p| p.name == name) else {
            tracing::error!(project = name, "project does not exist in Doccano");
            return Ok(None);
        };

        tracing::info!(project = name, id = found.id, "Doccano project");
        let mut resolved = project.clone();
        resolved.id = Some(found.id);
        resolved.project_type = Some(found.project_type);
        Ok(Some(resolved))
    }

    /// [`Self::resolve_project`] shaped for display.
    ///
    /// # Errors
    ///
    /// Same as [`Self::resolve_project`].
    pub async fn describe_project(&self, project: &Project) -> Result<ProjectResolution, SyncError> {
        let resolved = self.resolve_project(project).await?;
        Ok(ProjectResolution {
            name: project.lookup_name().to_string(),
            found: resolved.is_some(),
            id: resolved.as_ref().and_then(|p| p.id),
            project_type: resolved.and_then(|p| p.project_type),
        })
    }

    /// Query IDOL for unlabeled documents and write them to the staging file.
    ///
    /// Selected documents are moved out of their source database into
    /// `project.database` after each query. The move is not transactional:
    /// a failed add leaves the documents deleted from the source.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NoIndex`] without IDOL,
    /// [`SyncError::NoDatabase`] when `project.database` is blank,
    /// [`SyncError::Core`] for label fields that are not JSON, and I/O or
    /// IDOL errors.
    pub async fn export_training_from_idol(
        &self,
        project: &Project,
    ) -> Result<ExportSummary, SyncError> {
        let index = self.search_index()?;
        if project.database.trim().is_empty() {
            return Err(SyncError::NoDatabase(project.lookup_name().to_string()));
        }
        let target = project.staging_path(&self.tempfolder);

        fs::create_dir_all(&self.tempfolder).map_err(|e| SyncError::io(&self.tempfolder, e))?;
        if target.exists() {
            fs::remove_file(&target).map_err(|e| SyncError::io(&target, e))?;
        }
        let file = File::create(&target).map_err(|e| SyncError::io(&target, e))?;
        let mut writer = JsonLinesWriter::new(BufWriter::new(file));

        let mut summary = ExportSummary {
            project: project.lookup_name().to_string(),
            file: target.clone(),
            queries: project.queries.len(),
            records_written: 0,
            references_moved: 0,
        };

        for spec in &project.queries {
            let query = QueryRecord::unlabeled(spec, &project.datafield);
            let hits = index.query(&query).await?;
            tracing::debug!(text = %query.text, fieldtext = %query.fieldtext, hits = hits.len(), "idol query");

            let mut references = BTreeSet::new();
            let mut selected = Vec::new();
            for mut hit in hits {
                let text = hit.first(&project.textfield).unwrap_or_default().to_string();
                if !StagingRecord::is_exportable(&text) {
                    continue;
                }

                let raw = hit.first(&project.datafield).unwrap_or("[]");
                let labels: serde_json::Value =
                    serde_json::from_str(raw).map_err(|source| CoreError::InvalidLabels {
                        reference: hit.reference.clone(),
                        source,
                    })?;
                hit.fields = vec![(project.datafield.clone(), labels.clone())];

                writer
                    .write(&StagingRecord { text, labels })
                    .map_err(|e| SyncError::io(&target, e))?;
                summary.records_written += 1;
                references.insert(hit.reference.clone());
                selected.push(hit);
            }

            if !references.is_empty() {
                let references: Vec<String> = references.into_iter().collect();
                index.remove_documents(&references, REMOVE_BATCH).await?;
                index
                    .index_documents(&selected, &project.database, INDEX_BATCH)
                    .await?;
                tracing::info!(
                    count = references.len(),
                    database = %project.database,
                    "moved exported documents"
                );
                summary.references_moved += references.len();
            }
        }

        writer.flush().map_err(|e| SyncError::io(&target, e))?;
        tracing::info!(
            file = %target.display(),
            records = summary.records_written,
            "staging file written"
        );
        Ok(summary)
    }

    /// Upload the staging file into the resolved Doccano project.
    ///
    /// The local file is removed only when Doccano answers 2xx.
    ///
    /// # Errors
    ///
    /// Returns Doccano errors from resolution or upload transport, and I/O
    /// errors from removing the uploaded file.
    pub async fn import_training_into_doccano(
        &self,
        project: &Project,
    ) -> Result<ImportOutcome, SyncError> {
        let Some(project) = self.resolve_project(project).await? else {
            return Ok(ImportOutcome::ProjectNotFound {
                project: project.lookup_name().to_string(),
            });
        };
        let Some(project_id) = project.id else {
            return Ok(ImportOutcome::ProjectNotFound {
                project: project.lookup_name().to_string(),
            });
        };

        let file = project.staging_path(&self.tempfolder);
        if !file.exists() {
            tracing::error!(file = %file.display(), "staging file does not exist");
            return Ok(ImportOutcome::MissingFile { file });
        }

        let status = self
            .annotations
            .upload(project_id, UPLOAD_FORMAT, &file)
            .await?;
        if (200..300).contains(&status) {
            tracing::info!(status, file = %file.display(), "file uploaded to Doccano");
            fs::remove_file(&file).map_err(|e| SyncError::io(&file, e))?;
            Ok(ImportOutcome::Uploaded {
                project_id,
                file,
                status,
            })
        } else {
            tracing::error!(status, file = %file.display(), "error uploading file");
            Ok(ImportOutcome::Rejected {
                project_id,
                file,
                status,
            })
        }
    }

    /// Export from IDOL, then upload the result.
    ///
    /// # Errors
    ///
    /// Errors from either step.
    pub async fn export_idol_to_doccano(
        &self,
        project: &Project,
    ) -> Result<PushSummary, SyncError> {
        let export = self.export_training_from_idol(project).await?;
        let import = self.import_training_into_doccano(project).await?;
        Ok(PushSummary { export, import })
    }

    /// Download annotated documents into `<tempfolder>/<name>.annotated.jsonl`
    /// and optionally index them into `project.database`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Download`] for unparsable lines,
    /// [`SyncError::NoIndex`] when `reindex` is set without IDOL, and
    /// client or I/O errors.
    pub async fn export_doccano_to_idol(
        &self,
        project: &Project,
        reindex: bool,
    ) -> Result<PullOutcome, SyncError> {
        let Some(project) = self.resolve_project(project).await? else {
            return Ok(PullOutcome::ProjectNotFound {
                project: project.lookup_name().to_string(),
            });
        };
        let Some(project_id) = project.id else {
            return Ok(PullOutcome::ProjectNotFound {
                project: project.lookup_name().to_string(),
            });
        };

        let body = self
            .annotations
            .download(project_id, DOWNLOAD_FORMAT)
            .await?;
        tracing::info!(project_id, bytes = body.len(), "downloaded annotations");
        let records = parse_download(&body)?;

        let file = project.annotated_path(&self.tempfolder);
        fs::create_dir_all(&self.tempfolder).map_err(|e| SyncError::io(&self.tempfolder, e))?;
        serde_jsonlines::write_json_lines(&file, &records).map_err(|e| SyncError::io(&file, e))?;
        tracing::info!(file = %file.display(), records = records.len(), "annotations written");

        let mut indexed = 0;
        if reindex {
            let index = self.search_index()?;
            let documents: Vec<IdolHit> = records
                .iter()
                .map(|record| annotated_hit(&project, project_id, record))
                .collect();
            index
                .index_documents(&documents, &project.database, INDEX_BATCH)
                .await?;
            indexed = documents.len();
            tracing::info!(count = indexed, database = %project.database, "annotations indexed");
        }

        Ok(PullOutcome::Downloaded {
            project_id,
            file,
            records: records.len(),
            indexed,
        })
    }
}

/// Parse a JSONL body, skipping blank lines.
fn parse_download(body: &str) -> Result<Vec<AnnotatedRecord>, SyncError> {
    body.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| SyncError::Download {
                line: idx + 1,
                source,
            })
        })
        .collect()
}

/// An IDOL document for a downloaded record.
///
/// The reference comes from `meta.reference` when Doccano kept it, else it
/// is derived from the Doccano ids.
fn annotated_hit(project: &Project, project_id: u64, record: &AnnotatedRecord) -> IdolHit {
    let reference = record
        .meta
        .get("reference")
        .and_then(serde_json::Value::as_str)
        .map_or_else(
            || format!("doccano/{project_id}/{}", record.id.unwrap_or_default()),
            ToString::to_string,
        );

    let mut document = IdolDocument::new();
    document.insert(project.textfield.clone(), vec![record.text.clone()]);
    if project.textfield != DEFAULT_TEXT_FIELD {
        document.insert(DEFAULT_TEXT_FIELD.to_string(), vec![record.text.clone()]);
    }

    IdolHit {
        reference,
        database: Some(project.database.clone()),
        title: None,
        document,
        fields: vec![(project.datafield.clone(), record.labels.clone())],
    }
}
