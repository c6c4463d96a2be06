//! Tests for TreeService: loading seed files and applying operation batches

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use treegrid::application::services::{Operation, OperationKind, TreeService};
use treegrid::application::{ApplicationError, Severity};
use treegrid::domain::{DomainError, ErrorKind, Node, NodeId, NodePatch};
use treegrid::infrastructure::traits::{FileSystem, RealFileSystem};
use treegrid::util::testing;

/// In-memory filesystem for service tests.
#[derive(Default)]
struct MemoryFileSystem {
    files: Mutex<HashMap<PathBuf, String>>,
}

impl MemoryFileSystem {
    fn with_file(path: &str, content: &str) -> Self {
        let fs = Self::default();
        fs.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), content.to_string());
        fs
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.exists(path)
    }

    fn ensure_parent(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

const SEED: &str = r#"[
    {"id": 1, "parent": null, "label": "A"},
    {"id": 2, "parent": 1, "label": "B"},
    {"id": 3, "parent": 2, "label": "C"}
]"#;

fn loaded_service() -> TreeService {
    testing::init_test_setup();
    let fs = Arc::new(MemoryFileSystem::with_file("/seed.json", SEED));
    let mut service = TreeService::new(fs);
    service.load(Path::new("/seed.json")).unwrap();
    service
}

fn ids(nodes: &[Node]) -> Vec<String> {
    nodes.iter().map(|n| n.id.to_string()).collect()
}

// ============================================================
// Loading
// ============================================================

#[test]
fn given_seed_file_when_loading_then_store_populated() {
    let service = loaded_service();
    assert_eq!(service.store().len(), 3);
    assert_eq!(
        service.store().get_item(&NodeId::from("3")).unwrap().parent,
        Some(NodeId::from(2u64))
    );
}

#[test]
fn given_real_seed_file_when_loading_then_store_populated() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nodes.json");
    std::fs::write(&path, SEED).unwrap();

    let mut service = TreeService::new(Arc::new(RealFileSystem));
    let count = service.load(&path).unwrap();

    assert_eq!(count, 3);
}

#[test]
fn given_missing_file_when_loading_then_input_not_found() {
    let mut service = TreeService::new(Arc::new(MemoryFileSystem::default()));
    let err = service.load(Path::new("/nope.json")).unwrap_err();
    assert!(matches!(err, ApplicationError::InputNotFound(_)));
}

#[test]
fn given_malformed_json_when_loading_then_parse_error() {
    let fs = Arc::new(MemoryFileSystem::with_file("/bad.json", "[{\"id\": 1}"));
    let mut service = TreeService::new(fs);
    let err = service.load(Path::new("/bad.json")).unwrap_err();
    assert!(matches!(err, ApplicationError::Parse { .. }), "got {err:?}");
}

#[test]
fn given_cyclic_seed_when_loading_then_domain_error() {
    let fs = Arc::new(MemoryFileSystem::with_file(
        "/cycle.json",
        r#"[{"id": "a", "parent": "b", "label": "A"}, {"id": "b", "parent": "a", "label": "B"}]"#,
    ));
    let mut service = TreeService::new(fs);
    let err = service.load(Path::new("/cycle.json")).unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::CycleDetected { .. })
    ));
}

// ============================================================
// Operations
// ============================================================

#[test]
fn given_operations_json_when_parsing_then_tagged_variants() {
    let fs = Arc::new(MemoryFileSystem::with_file(
        "/ops.json",
        r#"[
            {"op": "add", "id": 4, "parent": 1, "label": "D"},
            {"op": "update", "id": 4, "label": "renamed"},
            {"op": "update", "id": 3, "parent": null},
            {"op": "remove", "id": "2"}
        ]"#,
    ));
    let service = TreeService::new(fs);

    let ops = service.read_operations(Path::new("/ops.json")).unwrap();

    assert_eq!(
        ops,
        vec![
            Operation::Add(Node::child(4, 1, "D")),
            Operation::Update(NodePatch::new(4).with_label("renamed")),
            Operation::Update(NodePatch::new(3).with_root()),
            Operation::Remove { id: NodeId::from(2u64) },
        ]
    );
}

#[test]
fn given_batch_with_failures_when_applying_then_continues_and_reports() {
    let mut service = loaded_service();

    let outcomes = service.apply_all(vec![
        Operation::Update(NodePatch::new(1).with_parent(3)),
        Operation::Add(Node::child(4, 1, "D")),
        Operation::Add(Node::root(1, "dup")),
        Operation::Remove { id: NodeId::from(2u64) },
        Operation::Remove { id: NodeId::from(2u64) },
    ]);

    let kinds: Vec<Option<ErrorKind>> = outcomes
        .iter()
        .map(|o| o.result.as_ref().err().map(DomainError::kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            Some(ErrorKind::CycleDetected),
            None,
            Some(ErrorKind::DuplicateId),
            None,
            Some(ErrorKind::NotFound),
        ]
    );
    assert_eq!(outcomes[3].kind, OperationKind::Remove);
    assert_eq!(
        outcomes[3].result,
        Ok(vec![NodeId::from(2u64), NodeId::from(3u64)])
    );
    assert_eq!(ids(&service.store().get_tree_data_for_grid()), vec!["1", "4"]);
}

#[test]
fn given_service_when_building_grid_view_then_rows_follow_store() {
    let mut service = loaded_service();
    service.apply(Operation::Update(NodePatch::new(2).with_label("Bee")));

    let view = service.grid_view(
        &[treegrid::application::ColumnDef::default()],
        treegrid::application::DefaultColumnDef::default(),
    );

    assert_eq!(view.row_data[1].label, "Bee");
    assert_eq!(
        view.row_data[2].path,
        Some(vec![NodeId::from(1u64), NodeId::from(2u64), NodeId::from(3u64)])
    );
}

/// Counts events at WARN and ERROR.
struct LoudEvents(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for LoudEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if matches!(*event.metadata().level(), Level::WARN | Level::ERROR) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[test]
fn given_failing_operations_when_applying_then_nothing_logged_above_debug() {
    let loud = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(LoudEvents(Arc::clone(&loud)));
    let fs = Arc::new(MemoryFileSystem::with_file("/seed.json", SEED));

    let outcomes = tracing::subscriber::with_default(subscriber, || {
        let mut service = TreeService::new(fs);
        service.load(Path::new("/seed.json")).unwrap();
        service.apply_all(vec![
            Operation::Update(NodePatch::new(1).with_parent(3)),
            Operation::Remove { id: NodeId::from(9u64) },
        ])
    });

    assert_eq!(loud.load(Ordering::SeqCst), 0);
    let diagnostics: Vec<_> = outcomes.iter().filter_map(|o| o.diagnostic()).collect();
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(
        diagnostics[0].message,
        "assigning parent 3 to node 1 would create a cyclic dependency"
    );
    assert_eq!(diagnostics[1].severity, Severity::Warning);
    assert_eq!(diagnostics[1].message, "node with id=9 not found");
}

#[test]
fn given_successful_operation_when_applying_then_no_diagnostic() {
    let mut service = loaded_service();
    let outcome = service.apply(Operation::Add(Node::child(4, 3, "D")));
    assert!(outcome.is_ok());
    assert_eq!(outcome.diagnostic(), None);
}
