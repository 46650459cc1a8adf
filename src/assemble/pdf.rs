use crate::assemble::{in_ordinal_order, AssemblyError, PageArtifact};
use crate::output::{commit_staged, discard_staged, staging_path, ObserverSet};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Page attributes a page may inherit from its page-tree ancestors
const INHERITABLE: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Result of binding PDF files together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReport {
    /// Pages in the merged document
    pub pages: usize,

    /// Inputs that could not be read as PDF, with the reason
    pub rejected: Vec<(PathBuf, String)>,
}

/// Structural PDF merge primitive
pub trait PdfBinder: Send + Sync {
    /// Merges `inputs`, in order, into a new document at `output`
    fn bind(&self, inputs: &[PathBuf], output: &Path) -> Result<BindReport, AssemblyError>;

    /// Rewrites `path` in place to reduce its size
    fn optimize(&self, path: &Path) -> Result<(), AssemblyError>;
}

/// [`PdfBinder`] built on `lopdf`
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfBinder;

impl PdfBinder for LopdfBinder {
    fn bind(&self, inputs: &[PathBuf], output: &Path) -> Result<BindReport, AssemblyError> {
        let mut report = BindReport::default();
        let mut documents = Vec::new();

        for path in inputs {
            match Document::load(path) {
                Ok(document) if !document.get_pages().is_empty() => documents.push(document),
                Ok(_) => report.rejected.push((path.clone(), "document has no pages".to_string())),
                Err(e) => report.rejected.push((path.clone(), e.to_string())),
            }
        }

        if documents.is_empty() {
            return Err(AssemblyError::NoValidPages);
        }

        let (mut merged, pages) = merge_documents(documents)?;
        report.pages = pages;
        merged.save(output)?;
        Ok(report)
    }

    fn optimize(&self, path: &Path) -> Result<(), AssemblyError> {
        let mut document = Document::load(path)?;
        document.prune_objects();
        document.delete_zero_length_streams();
        document.compress();

        let staging = staging_path(path);
        if let Err(e) = document.save(&staging) {
            let _ = std::fs::remove_file(&staging);
            return Err(e.into());
        }
        std::fs::rename(&staging, path)?;
        Ok(())
    }
}

/// Copies every page of `documents` into one document, preserving order
fn merge_documents(documents: Vec<Document>) -> Result<(Document, usize), AssemblyError> {
    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut document in documents {
        document.renumber_objects_with(max_id);
        max_id = document.max_id + 1;

        for (_, page_id) in document.get_pages() {
            if let Ok(page) = document.get_dictionary(page_id) {
                let mut page = page.clone();
                inherit_attributes(&document, &mut page);
                pages.push((page_id, page));
            }
        }
        objects.extend(document.objects);
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Dictionary)> = None;
    let mut page_tree: Option<(ObjectId, Dictionary)> = None;

    for (object_id, object) in objects {
        match type_name(&object) {
            Some(b"Catalog") => {
                if catalog.is_none() {
                    catalog = object.as_dict().ok().map(|d| (object_id, d.clone()));
                }
            }
            Some(b"Pages") => {
                if page_tree.is_none() {
                    page_tree = object.as_dict().ok().map(|d| (object_id, d.clone()));
                }
            }
            // Pages are re-inserted below; outlines point into the old trees
            Some(b"Page") | Some(b"Outlines") | Some(b"Outline") => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let (tree_id, mut tree) =
        page_tree.ok_or_else(|| AssemblyError::Pdf("no page tree found".to_string()))?;
    let (catalog_id, mut catalog) =
        catalog.ok_or_else(|| AssemblyError::Pdf("no document catalog found".to_string()))?;

    let page_count = pages.len();
    let kids: Vec<Object> = pages.iter().map(|(id, _)| Object::Reference(*id)).collect();

    for (page_id, mut page) in pages {
        page.set("Parent", Object::Reference(tree_id));
        merged.objects.insert(page_id, Object::Dictionary(page));
    }

    tree.remove(b"Parent");
    tree.set("Kids", Object::Array(kids));
    tree.set("Count", Object::Integer(page_count as i64));
    merged.objects.insert(tree_id, Object::Dictionary(tree));

    catalog.set("Pages", Object::Reference(tree_id));
    catalog.remove(b"Outlines");
    merged.objects.insert(catalog_id, Object::Dictionary(catalog));

    merged.trailer.set("Root", Object::Reference(catalog_id));
    merged.max_id = merged.objects.keys().map(|(id, _)| *id).max().unwrap_or(0);
    merged.renumber_objects();
    merged.compress();

    Ok((merged, page_count))
}

/// Copies inherited attributes onto the page so it survives re-parenting
fn inherit_attributes(document: &Document, page: &mut Dictionary) {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut hops = 0;

    while let Some(parent_id) = parent {
        let Ok(node) = document.get_dictionary(parent_id) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();

        // Guard against cyclic page trees
        hops += 1;
        if hops > 64 {
            break;
        }
    }
}

fn type_name(object: &Object) -> Option<&[u8]> {
    let dictionary = match object {
        Object::Dictionary(dictionary) => dictionary,
        Object::Stream(stream) => &stream.dict,
        _ => return None,
    };
    dictionary.get(b"Type").and_then(Object::as_name).ok()
}

/// Outcome of a successful merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub output: PathBuf,

    /// Per-page files that contributed pages
    pub merged_files: usize,

    /// Pages in the combined document
    pub pages: usize,

    /// Files left out (missing, empty, or unreadable)
    pub skipped: Vec<PathBuf>,

    /// False when the compaction pass failed and the file was kept as merged
    pub optimized: bool,
}

/// Merges per-page PDFs into `output` in ordinal order
///
/// Missing and zero-length files are skipped with a notification. With no
/// valid input left the merge fails and nothing is written. Compaction after
/// the merge is best-effort: its failure is reported but the merge succeeds.
pub async fn merge_pdfs(
    artifacts: &[PageArtifact],
    output: &Path,
    binder: Arc<dyn PdfBinder>,
    observers: &ObserverSet,
) -> Result<MergeOutcome, AssemblyError> {
    let mut valid = Vec::new();
    let mut skipped = Vec::new();

    for artifact in in_ordinal_order(artifacts) {
        let reason = match tokio::fs::metadata(&artifact.path).await {
            Ok(meta) if meta.len() > 0 => None,
            Ok(_) => Some("file is empty"),
            Err(_) => Some("file is missing"),
        };
        match reason {
            None => valid.push(artifact.path.clone()),
            Some(reason) => {
                observers.notify_artifact_skipped(&artifact.path, reason).await;
                skipped.push(artifact.path.clone());
            }
        }
    }

    if valid.is_empty() {
        return Err(AssemblyError::NoValidPages);
    }

    tracing::info!("Merging {} PDF files into {}", valid.len(), output.display());

    let staging = staging_path(output);
    let bound = {
        let binder = Arc::clone(&binder);
        let staging = staging.clone();
        tokio::task::spawn_blocking(move || binder.bind(&valid, &staging))
            .await
            .map_err(|e| AssemblyError::Pdf(format!("merge task failed: {}", e)))?
    };

    let report = match bound {
        Ok(report) => report,
        Err(e) => {
            discard_staged(&staging).await;
            return Err(e);
        }
    };

    for (path, reason) in &report.rejected {
        observers.notify_artifact_skipped(path, reason).await;
        skipped.push(path.clone());
    }

    if let Err(e) = commit_staged(&staging, output).await {
        discard_staged(&staging).await;
        return Err(e.into());
    }

    let optimized = {
        let binder = Arc::clone(&binder);
        let path = output.to_path_buf();
        match tokio::task::spawn_blocking(move || binder.optimize(&path)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                observers.notify_optimization_warning(&e.to_string()).await;
                false
            }
            Err(e) => {
                observers
                    .notify_optimization_warning(&format!("optimization task failed: {}", e))
                    .await;
                false
            }
        }
    };

    let merged_files = artifacts.len() - skipped.len();
    tracing::info!(
        "Created {} ({} pages from {} files)",
        output.display(),
        report.pages,
        merged_files
    );

    Ok(MergeOutcome {
        output: output.to_path_buf(),
        merged_files,
        pages: report.pages,
        skipped,
        optimized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{ObservedEvent, RecordingObserver};
    use lopdf::Stream;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use url::Url;

    /// Writes a one-page PDF whose MediaBox sits on the page tree node
    fn write_pdf(path: &Path, text: &str) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set("Contents", Object::Reference(content_id));
        let page_id = doc.add_object(page);

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
        pages.set("Count", Object::Integer(1));
        pages.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ]),
        );
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        doc.save(path).unwrap();
    }

    fn artifact(ordinal: usize, path: PathBuf) -> PageArtifact {
        PageArtifact {
            ordinal,
            url: Url::parse(&format!("https://docs.example.com/{}", ordinal)).unwrap(),
            path,
        }
    }

    fn recording() -> (Arc<RecordingObserver>, ObserverSet) {
        let recorder = Arc::new(RecordingObserver::new());
        let mut set = ObserverSet::new();
        set.register(recorder.clone());
        (recorder, set)
    }

    #[tokio::test]
    async fn test_merge_skips_missing_and_empty_files() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("000_a.pdf");
        let b = dir.path().join("002_b.pdf");
        let empty = dir.path().join("003_empty.pdf");
        write_pdf(&a, "first");
        write_pdf(&b, "second");
        std::fs::write(&empty, b"").unwrap();

        let artifacts = vec![
            artifact(0, a),
            artifact(1, dir.path().join("001_missing.pdf")),
            artifact(2, b),
            artifact(3, empty.clone()),
        ];
        let output = dir.path().join("combined.pdf");
        let (recorder, observers) = recording();

        let outcome = merge_pdfs(&artifacts, &output, Arc::new(LopdfBinder), &observers)
            .await
            .unwrap();

        assert_eq!(outcome.pages, 2);
        assert_eq!(outcome.merged_files, 2);
        assert_eq!(outcome.skipped.len(), 2);
        assert!(!staging_path(&output).exists());

        let merged = Document::load(&output).unwrap();
        assert_eq!(merged.get_pages().len(), 2);
        for (_, page_id) in merged.get_pages() {
            let page = merged.get_dictionary(page_id).unwrap();
            assert!(page.has(b"MediaBox"));
        }

        assert!(recorder
            .events()
            .contains(&ObservedEvent::ArtifactSkipped { path: empty }));
    }

    #[tokio::test]
    async fn test_merge_without_valid_pages_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("combined.pdf");
        let artifacts = vec![artifact(0, dir.path().join("missing.pdf"))];

        let result = merge_pdfs(&artifacts, &output, Arc::new(LopdfBinder), &ObserverSet::new()).await;

        assert!(matches!(result, Err(AssemblyError::NoValidPages)));
        assert!(!output.exists());
        assert!(!staging_path(&output).exists());
    }

    #[tokio::test]
    async fn test_merge_rejects_unreadable_pdf() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("000_good.pdf");
        let bad = dir.path().join("001_bad.pdf");
        write_pdf(&good, "ok");
        std::fs::write(&bad, b"not a pdf at all").unwrap();

        let output = dir.path().join("combined.pdf");
        let outcome = merge_pdfs(
            &[artifact(0, good), artifact(1, bad.clone())],
            &output,
            Arc::new(LopdfBinder),
            &ObserverSet::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.pages, 1);
        assert_eq!(outcome.skipped, vec![bad]);
    }

    /// Records the order of inputs and fails optimization
    #[derive(Default)]
    struct FakeBinder {
        inputs: Mutex<Vec<PathBuf>>,
    }

    impl PdfBinder for FakeBinder {
        fn bind(&self, inputs: &[PathBuf], output: &Path) -> Result<BindReport, AssemblyError> {
            self.inputs.lock().unwrap().extend(inputs.iter().cloned());
            std::fs::write(output, b"%PDF-fake")?;
            Ok(BindReport {
                pages: inputs.len(),
                rejected: Vec::new(),
            })
        }

        fn optimize(&self, _path: &Path) -> Result<(), AssemblyError> {
            Err(AssemblyError::Pdf("compaction not supported".to_string()))
        }
    }

    #[tokio::test]
    async fn test_merge_orders_by_ordinal_and_tolerates_optimize_failure() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (0..3)
            .map(|i| {
                let path = dir.path().join(format!("{:03}.pdf", i));
                std::fs::write(&path, b"%PDF").unwrap();
                path
            })
            .collect();

        let artifacts = vec![
            artifact(2, paths[2].clone()),
            artifact(0, paths[0].clone()),
            artifact(1, paths[1].clone()),
        ];
        let binder = Arc::new(FakeBinder::default());
        let (recorder, observers) = recording();
        let output = dir.path().join("combined.pdf");

        let outcome = merge_pdfs(&artifacts, &output, binder.clone(), &observers)
            .await
            .unwrap();

        assert_eq!(*binder.inputs.lock().unwrap(), paths);
        assert!(!outcome.optimized);
        assert!(output.exists());
        assert!(recorder.events().contains(&ObservedEvent::OptimizationWarning));
    }
}
