//! Sync flows against in-memory Doccano and IDOL fakes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anl_core::outcomes::{ImportOutcome, PullOutcome};
use anl_core::project::Project;
use anl_core::query::{QueryRecord, QuerySpec};
use anl_doccano::{DoccanoError, DoccanoProject, DoccanoUser};
use anl_idol::{IdolDocument, IdolError, IdolHit};
use anl_sync::{AnnotationService, SearchIndex, SyncError, SyncService, authenticate};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

#[derive(Default)]
struct FakeDoccano {
    superuser: bool,
    projects: Vec<DoccanoProject>,
    upload_status: u16,
    download_body: String,
    uploads: Mutex<Vec<(u64, String, String)>>,
}

#[async_trait]
impl AnnotationService for FakeDoccano {
    async fn me(&self) -> Result<DoccanoUser, DoccanoError> {
        Ok(DoccanoUser {
            id: Some(1),
            username: "annotator".into(),
            is_superuser: self.superuser,
            is_staff: false,
        })
    }

    async fn projects(&self) -> Result<Vec<DoccanoProject>, DoccanoError> {
        Ok(self.projects.clone())
    }

    async fn upload(
        &self,
        project_id: u64,
        format: &str,
        path: &Path,
    ) -> Result<u16, DoccanoError> {
        let body = fs::read_to_string(path).unwrap();
        self.uploads
            .lock()
            .unwrap()
            .push((project_id, format.to_string(), body));
        Ok(self.upload_status)
    }

    async fn download(&self, _project_id: u64, format: &str) -> Result<String, DoccanoError> {
        assert_eq!(format, "jsonl");
        Ok(self.download_body.clone())
    }
}

#[derive(Default)]
struct FakeIdol {
    hits: Vec<IdolHit>,
    queries: Mutex<Vec<QueryRecord>>,
    removed: Mutex<Vec<(Vec<String>, usize)>>,
    indexed: Mutex<Vec<(Vec<IdolHit>, String, usize)>>,
}

#[async_trait]
impl SearchIndex for FakeIdol {
    async fn query(&self, query: &QueryRecord) -> Result<Vec<IdolHit>, IdolError> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.hits.clone())
    }

    async fn remove_documents(
        &self,
        references: &[String],
        batch_size: usize,
    ) -> Result<Vec<u64>, IdolError> {
        self.removed
            .lock()
            .unwrap()
            .push((references.to_vec(), batch_size));
        Ok(vec![1])
    }

    async fn index_documents(
        &self,
        documents: &[IdolHit],
        database: &str,
        batch_size: usize,
    ) -> Result<Vec<u64>, IdolError> {
        self.indexed
            .lock()
            .unwrap()
            .push((documents.to_vec(), database.to_string(), batch_size));
        Ok(vec![2])
    }
}

fn doccano_project(id: u64, name: &str) -> DoccanoProject {
    DoccanoProject {
        id,
        name: name.into(),
        description: String::new(),
        project_type: "SequenceLabeling".into(),
    }
}

fn hit(reference: &str, text: &str, labels: Option<&str>) -> IdolHit {
    let mut document = IdolDocument::new();
    document.insert("DRECONTENT".into(), vec![text.into()]);
    if let Some(labels) = labels {
        document.insert("LABELS".into(), vec![labels.into()]);
    }
    IdolHit {
        reference: reference.into(),
        database: Some("News".into()),
        document,
        ..IdolHit::default()
    }
}

fn project() -> Project {
    let mut project = Project::named(" Reviews ");
    project.database = "Staging".into();
    project.queries = vec![QuerySpec {
        text: "*".into(),
        fieldtext: "MATCH{news}:CATEGORY".into(),
    }];
    project
}

fn service(
    doccano: FakeDoccano,
    idol: Option<FakeIdol>,
    folder: &Path,
) -> SyncService<FakeDoccano, FakeIdol> {
    SyncService::new(doccano, idol, folder)
}

#[tokio::test]
async fn authenticate_allows_non_superusers() {
    let doccano = FakeDoccano::default();
    let me = authenticate(&doccano).await.unwrap();
    assert_eq!(me.username, "annotator");
    assert!(!me.is_superuser);
}

#[tokio::test]
async fn resolve_matches_trimmed_name_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let doccano = FakeDoccano {
        projects: vec![
            doccano_project(1, "reviews"),
            doccano_project(2, "Reviews"),
            doccano_project(3, "Reviews"),
        ],
        ..FakeDoccano::default()
    };
    let service = service(doccano, None, dir.path());

    let resolved = service.resolve_project(&project()).await.unwrap().unwrap();
    assert_eq!(resolved.id, Some(2));
    assert_eq!(resolved.project_type.as_deref(), Some("SequenceLabeling"));
}

#[tokio::test]
async fn resolve_reports_missing_project() {
    let dir = tempfile::tempdir().unwrap();
    let doccano = FakeDoccano {
        projects: vec![doccano_project(1, "Other")],
        ..FakeDoccano::default()
    };
    let service = service(doccano, None, dir.path());

    assert!(service.resolve_project(&project()).await.unwrap().is_none());
    let description = service.describe_project(&project()).await.unwrap();
    assert!(!description.found);
    assert_eq!(description.name, "Reviews");
}

#[tokio::test]
async fn export_writes_staging_file_and_moves_documents() {
    let dir = tempfile::tempdir().unwrap();
    let idol = FakeIdol {
        hits: vec![
            hit("news/1", "Vacinação avança no país", None),
            hit("news/2", "too short", None),
            hit("news/3", "President Obama visited", Some(r#"[[10, 15, "PERSON"]]"#)),
        ],
        ..FakeIdol::default()
    };
    let service = service(FakeDoccano::default(), Some(idol), dir.path());
    let project = project();

    let summary = service.export_training_from_idol(&project).await.unwrap();
    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.references_moved, 2);
    assert_eq!(summary.file, dir.path().join(" Reviews .tmp"));

    let contents = fs::read_to_string(&summary.file).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(
        lines,
        vec![
            json!({"text": "Vacinação avança no país", "labels": []}),
            json!({"text": "President Obama visited", "labels": [[10, 15, "PERSON"]]}),
        ]
    );
    assert!(contents.contains("Vacinação"), "non-ASCII must not be escaped");

    let idol = service_index(&service);
    let queries = idol.queries.lock().unwrap();
    assert_eq!(
        queries[0].fieldtext,
        "(MATCH{news}:CATEGORY) AND (NOT EXISTS{}:LABELS)"
    );

    let removed = idol.removed.lock().unwrap();
    assert_eq!(
        removed[0],
        (vec!["news/1".to_string(), "news/3".to_string()], 100)
    );

    let indexed = idol.indexed.lock().unwrap();
    let (documents, database, batch) = &indexed[0];
    assert_eq!(database, "Staging");
    assert_eq!(*batch, 80);
    assert_eq!(documents.len(), 2);
    assert_eq!(
        documents[1].fields,
        vec![("LABELS".to_string(), json!([[10, 15, "PERSON"]]))]
    );
}

fn service_index(service: &SyncService<FakeDoccano, FakeIdol>) -> &FakeIdol {
    service.search_index().unwrap()
}

#[tokio::test]
async fn export_without_hits_leaves_empty_file_and_index_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(FakeDoccano::default(), Some(FakeIdol::default()), dir.path());
    let mut project = project();
    project.tempfile = Some("reviews.jsonl".into());

    fs::write(dir.path().join("reviews.jsonl"), "stale\n").unwrap();
    let summary = service.export_training_from_idol(&project).await.unwrap();

    assert_eq!(summary.records_written, 0);
    assert_eq!(fs::read_to_string(&summary.file).unwrap(), "");
    assert!(service_index(&service).removed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn export_rejects_malformed_labels() {
    let dir = tempfile::tempdir().unwrap();
    let idol = FakeIdol {
        hits: vec![hit("news/9", "Long enough text here", Some("not json"))],
        ..FakeIdol::default()
    };
    let service = service(FakeDoccano::default(), Some(idol), dir.path());

    let err = service.export_training_from_idol(&project()).await.unwrap_err();
    assert!(matches!(err, SyncError::Core(_)));
}

#[tokio::test]
async fn export_requires_index() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(FakeDoccano::default(), None, dir.path());
    assert!(matches!(
        service.export_training_from_idol(&project()).await,
        Err(SyncError::NoIndex)
    ));
}

#[rstest]
#[case::empty("")]
#[case::blank("  ")]
#[tokio::test]
async fn export_refuses_project_without_database(#[case] database: &str) {
    let dir = tempfile::tempdir().unwrap();
    let idol = FakeIdol {
        hits: vec![hit("news/1", "Vacinação avança no país", None)],
        ..FakeIdol::default()
    };
    let service = service(FakeDoccano::default(), Some(idol), dir.path());
    let mut project = project();
    project.database = database.into();
    let staging = dir.path().join(" Reviews .tmp");
    fs::write(&staging, "kept\n").unwrap();

    let err = service.export_training_from_idol(&project).await.unwrap_err();
    assert!(matches!(err, SyncError::NoDatabase(ref name) if name == "Reviews"));

    let idol = service_index(&service);
    assert!(idol.queries.lock().unwrap().is_empty());
    assert!(idol.removed.lock().unwrap().is_empty());
    assert!(idol.indexed.lock().unwrap().is_empty());
    assert_eq!(fs::read_to_string(&staging).unwrap(), "kept\n");
}

fn staged(dir: &Path) -> PathBuf {
    let path = dir.join(" Reviews .tmp");
    fs::write(&path, "{\"text\":\"Great price, would buy\",\"labels\":[]}\n").unwrap();
    path
}

#[tokio::test]
async fn import_uploads_and_removes_file_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = staged(dir.path());
    let doccano = FakeDoccano {
        projects: vec![doccano_project(4, "Reviews")],
        upload_status: 201,
        ..FakeDoccano::default()
    };
    let service = service(doccano, None, dir.path());

    let outcome = service.import_training_into_doccano(&project()).await.unwrap();
    assert_eq!(
        outcome,
        ImportOutcome::Uploaded {
            project_id: 4,
            file: path.clone(),
            status: 201
        }
    );
    assert!(!path.exists());
}

#[tokio::test]
async fn import_keeps_file_when_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = staged(dir.path());
    let doccano = FakeDoccano {
        projects: vec![doccano_project(4, "Reviews")],
        upload_status: 400,
        ..FakeDoccano::default()
    };
    let service = service(doccano, None, dir.path());

    let outcome = service.import_training_into_doccano(&project()).await.unwrap();
    assert!(matches!(outcome, ImportOutcome::Rejected { status: 400, .. }));
    assert!(path.exists());
}

#[rstest]
#[case::below_range(199, false)]
#[case::ok(200, true)]
#[case::last_success(299, true)]
#[case::redirect(300, false)]
#[tokio::test]
async fn import_treats_only_2xx_as_uploaded(#[case] status: u16, #[case] uploaded: bool) {
    let dir = tempfile::tempdir().unwrap();
    let path = staged(dir.path());
    let doccano = FakeDoccano {
        projects: vec![doccano_project(4, "Reviews")],
        upload_status: status,
        ..FakeDoccano::default()
    };
    let service = service(doccano, None, dir.path());

    let outcome = service.import_training_into_doccano(&project()).await.unwrap();
    let expected = if uploaded {
        ImportOutcome::Uploaded {
            project_id: 4,
            file: path.clone(),
            status,
        }
    } else {
        ImportOutcome::Rejected {
            project_id: 4,
            file: path.clone(),
            status,
        }
    };
    assert_eq!(outcome, expected);
    assert_eq!(path.exists(), !uploaded);
}

#[tokio::test]
async fn import_reports_missing_file_and_project() {
    let dir = tempfile::tempdir().unwrap();
    let doccano = FakeDoccano {
        projects: vec![doccano_project(4, "Reviews")],
        upload_status: 201,
        ..FakeDoccano::default()
    };
    let service = service(doccano, None, dir.path());
    assert!(matches!(
        service.import_training_into_doccano(&project()).await.unwrap(),
        ImportOutcome::MissingFile { .. }
    ));

    let dir = tempfile::tempdir().unwrap();
    staged(dir.path());
    let service = self::service(FakeDoccano::default(), None, dir.path());
    assert_eq!(
        service.import_training_into_doccano(&project()).await.unwrap(),
        ImportOutcome::ProjectNotFound {
            project: "Reviews".into()
        }
    );
}

#[tokio::test]
async fn push_exports_then_uploads() {
    let dir = tempfile::tempdir().unwrap();
    let doccano = FakeDoccano {
        projects: vec![doccano_project(4, "Reviews")],
        upload_status: 200,
        ..FakeDoccano::default()
    };
    let idol = FakeIdol {
        hits: vec![hit("news/1", "Great price, would buy again", None)],
        ..FakeIdol::default()
    };
    let service = service(doccano, Some(idol), dir.path());

    let summary = service.export_idol_to_doccano(&project()).await.unwrap();
    assert_eq!(summary.export.records_written, 1);
    assert!(summary.import.is_uploaded());
}

#[tokio::test]
async fn pull_writes_annotations_and_reindexes() {
    let dir = tempfile::tempdir().unwrap();
    let doccano = FakeDoccano {
        projects: vec![doccano_project(4, "Reviews")],
        download_body: concat!(
            r#"{"id": 1, "text": "President Obama", "labels": [[10, 15, "PERSON"]], "meta": {"reference": "news/3"}}"#,
            "\n",
            r#"{"id": 2, "text": "Nobody here", "labels": []}"#,
            "\n"
        )
        .into(),
        ..FakeDoccano::default()
    };
    let service = service(doccano, Some(FakeIdol::default()), dir.path());

    let outcome = service
        .export_doccano_to_idol(&project(), true)
        .await
        .unwrap();
    let file = dir.path().join("Reviews.annotated.jsonl");
    assert_eq!(
        outcome,
        PullOutcome::Downloaded {
            project_id: 4,
            file: file.clone(),
            records: 2,
            indexed: 2,
        }
    );
    assert_eq!(fs::read_to_string(&file).unwrap().lines().count(), 2);

    let indexed = service_index(&service).indexed.lock().unwrap();
    let (documents, database, _) = &indexed[0];
    assert_eq!(database, "Staging");
    assert_eq!(documents[0].reference, "news/3");
    assert_eq!(documents[1].reference, "doccano/4/2");
}

#[tokio::test]
async fn pull_without_reindex_needs_no_index() {
    let dir = tempfile::tempdir().unwrap();
    let doccano = FakeDoccano {
        projects: vec![doccano_project(4, "Reviews")],
        download_body: r#"{"id": 1, "text": "t", "label": ["positive"]}"#.into(),
        ..FakeDoccano::default()
    };
    let service = service(doccano, None, dir.path());

    let outcome = service
        .export_doccano_to_idol(&project(), false)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        PullOutcome::Downloaded {
            records: 1,
            indexed: 0,
            ..
        }
    ));
    assert!(matches!(
        service.export_doccano_to_idol(&project(), true).await,
        Err(SyncError::NoIndex)
    ));
}
