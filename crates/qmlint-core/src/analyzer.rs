// Copyright 2026 The qmlint Authors
// SPDX-License-Identifier: Apache-2.0

//! The batch analysis driver.
//!
//! An [`Analyzer`] runs one analysis: it parses the configured file or
//! folder into a fresh [`Context`], runs the rule grammar over every
//! cleanly parsed file, and optionally rewrites sources.
//!
//! # Cancellation
//!
//! A run may be hosted on a background thread ([`Analyzer::spawn`]).
//! The only cross-thread signals are the stop flag - checked between
//! files and between sibling subdirectories, so cancellation latency is
//! bounded by one file parse - and a mutex-guarded snapshot of the
//! diagnostics, updated after each file, which a progress UI may read
//! while the run proceeds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use camino::{Utf8Path, Utf8PathBuf};

use crate::analyse;
use crate::context::{encode_latin1, Context, Diagnostic, DiagnosticKind, File};
use crate::emit::{to_source, Beautifier};
use crate::rules::Grammar;
use crate::source_analysis::Position;

/// What to analyze: a single file or a folder of `.qml` / `.js` files.
#[derive(Debug, Clone)]
pub enum Target {
    File(Utf8PathBuf),
    Folder(Utf8PathBuf),
}

/// Configuration and state for one analysis run.
pub struct Analyzer {
    grammar: Grammar,
    target: Target,
    include_imports: bool,
    include_subfolders: bool,
    rewrite: bool,
    remove_unused: bool,
    beautifier: Option<Box<dyn Beautifier + Send>>,
    stop_requested: Arc<AtomicBool>,
    shared_diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("target", &self.target)
            .field("include_imports", &self.include_imports)
            .field("include_subfolders", &self.include_subfolders)
            .field("rewrite", &self.rewrite)
            .field("remove_unused", &self.remove_unused)
            .finish_non_exhaustive()
    }
}

impl Analyzer {
    /// Creates an analyzer for `target` using `grammar`.
    #[must_use]
    pub fn new(grammar: Grammar, target: Target) -> Self {
        Self {
            grammar,
            target,
            include_imports: false,
            include_subfolders: false,
            rewrite: false,
            remove_unused: false,
            beautifier: None,
            stop_requested: Arc::new(AtomicBool::new(false)),
            shared_diagnostics: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Also parse files named by string imports.
    pub fn set_include_imports(&mut self, value: bool) {
        self.include_imports = value;
    }

    /// Recurse into subfolders of a folder target.
    pub fn set_include_subfolders(&mut self, value: bool) {
        self.include_subfolders = value;
    }

    /// Rewrite analyzed files with emitted (and beautified) source.
    pub fn set_rewrite(&mut self, value: bool) {
        self.rewrite = value;
    }

    /// Drop unreferenced declarations before rewriting.
    pub fn set_remove_unused(&mut self, value: bool) {
        self.remove_unused = value;
    }

    /// Installs the external beautify step applied to rewritten source.
    pub fn set_beautifier(&mut self, beautifier: Box<dyn Beautifier + Send>) {
        self.beautifier = Some(beautifier);
    }

    /// The cooperative cancellation flag. Setting it makes the run
    /// return at the next file boundary; an in-flight parse of a single
    /// file is not interrupted.
    #[must_use]
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_requested)
    }

    /// A live, mutex-guarded view of the diagnostics, for progress
    /// readers on other threads. Updated after each file completes.
    #[must_use]
    pub fn shared_diagnostics(&self) -> Arc<Mutex<Vec<Diagnostic>>> {
        Arc::clone(&self.shared_diagnostics)
    }

    /// Runs the analysis to completion (or until stopped) and returns
    /// the full diagnostic list in emission order.
    pub fn analyze(&mut self) -> Vec<Diagnostic> {
        let mut context = Context::new();
        context.set_include_imports(self.include_imports);

        match self.target.clone() {
            Target::File(path) => {
                self.analyze_file(&mut context, &path);
            }
            Target::Folder(path) => {
                self.analyze_folder(&mut context, &path);
            }
        }

        context.diagnostics
    }

    /// Consumes the analyzer and runs it on a background thread. The
    /// worker owns the context exclusively from start to completion;
    /// observe progress through [`Analyzer::shared_diagnostics`] and
    /// cancel through [`Analyzer::stop_flag`].
    pub fn spawn(mut self) -> std::thread::JoinHandle<Vec<Diagnostic>> {
        std::thread::spawn(move || self.analyze())
    }

    fn analyze_folder(&mut self, context: &mut Context, folder: &Utf8Path) -> bool {
        if self.stop_requested.load(Ordering::Relaxed) {
            return false;
        }

        let mut files = Vec::new();
        let mut subfolders = Vec::new();
        let walker = walkdir::WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in walker.into_iter().filter_map(Result::ok) {
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.path().to_path_buf()) else {
                continue;
            };
            if entry.file_type().is_dir() {
                subfolders.push(path);
            } else if matches!(path.extension(), Some("qml" | "js")) {
                files.push(path);
            }
        }

        for path in files {
            self.analyze_file(context, &path);
            if self.stop_requested.load(Ordering::Relaxed) {
                return false;
            }
        }

        if self.include_subfolders {
            for subfolder in subfolders {
                if !self.analyze_folder(context, &subfolder) {
                    return false;
                }
            }
        }
        true
    }

    fn analyze_file(&mut self, context: &mut Context, path: &Utf8Path) {
        tracing::info!(%path, "analyzing");
        let before = context.diagnostics.len();
        context.add_file(path.to_path_buf());
        context.parse();

        let succeeded = context.file_by_path(path).is_some_and(File::success);
        if succeeded {
            context.run_grammar(&self.grammar, path);
            if self.rewrite {
                self.rewrite_file(context, path);
            }
        }

        // Publish progress for readers on other threads.
        let snapshot = context.diagnostics[before..].to_vec();
        if let Ok(mut shared) = self.shared_diagnostics.lock() {
            shared.extend(snapshot);
        }
    }

    fn rewrite_file(&self, context: &mut Context, path: &Utf8Path) {
        let remove_unused = self.remove_unused;
        let Some(file) = context.file_by_path_mut(path) else {
            return;
        };
        let Some(source) = file.source_mut() else {
            return;
        };

        if remove_unused {
            analyse::remove_unused_symbols(&mut source.ast, source.root);
        }

        let mut text = to_source(&source.ast, source.root);
        if let Some(beautifier) = &self.beautifier {
            text = beautifier.beautify(text);
        }

        if let Err(error) = std::fs::write(path.as_std_path(), encode_latin1(&text)) {
            // An IO failure aborts only this file's rewrite.
            tracing::warn!(%path, %error, "rewrite failed");
            context.diagnostics.push(Diagnostic::new(
                DiagnosticKind::Io,
                path.to_path_buf(),
                Position::default(),
                ecow::eco_format!("Cannot rewrite file: {error}"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_file(dir: &std::path::Path, name: &str, contents: &str) -> Utf8PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(contents.as_bytes()).expect("write");
        Utf8PathBuf::from_path_buf(path).expect("utf-8 path")
    }

    fn empty_grammar() -> Grammar {
        Grammar::load_str("<Root></Root>").expect("grammar")
    }

    #[test]
    fn analyzes_a_single_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(dir.path(), "Main.qml", "Item { property int unused: 0 }");

        let mut analyzer = Analyzer::new(empty_grammar(), Target::File(path));
        let diagnostics = analyzer.analyze();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].text, "Unreferenced property");
    }

    #[test]
    fn folder_analysis_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "B.qml", "Item { property int b: 0 }");
        write_file(dir.path(), "A.qml", "Item { property int a: 0 }");
        write_file(dir.path(), "notes.txt", "not source");

        let mut analyzer = Analyzer::new(
            empty_grammar(),
            Target::Folder(Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()),
        );
        let diagnostics = analyzer.analyze();
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].file.as_str().ends_with("A.qml"));
        assert!(diagnostics[1].file.as_str().ends_with("B.qml"));
    }

    #[test]
    fn subfolders_require_the_flag() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("sub")).expect("mkdir");
        write_file(dir.path(), "Top.qml", "Item { property int t: 0 }");
        write_file(&dir.path().join("sub"), "Nested.qml", "Item { property int n: 0 }");

        let folder = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let mut flat = Analyzer::new(empty_grammar(), Target::Folder(folder.clone()));
        assert_eq!(flat.analyze().len(), 1);

        let mut deep = Analyzer::new(empty_grammar(), Target::Folder(folder));
        deep.set_include_subfolders(true);
        assert_eq!(deep.analyze().len(), 2);
    }

    #[test]
    fn stop_flag_halts_before_the_next_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "A.qml", "Item { property int a: 0 }");
        write_file(dir.path(), "B.qml", "Item { property int b: 0 }");

        let mut analyzer = Analyzer::new(
            empty_grammar(),
            Target::Folder(Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()),
        );
        analyzer.stop_flag().store(true, Ordering::Relaxed);
        assert!(analyzer.analyze().is_empty());
    }

    #[test]
    fn rewrite_normalizes_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(dir.path(), "Main.qml", "Item{width:1+2}");

        let mut analyzer = Analyzer::new(empty_grammar(), Target::File(path.clone()));
        analyzer.set_rewrite(true);
        analyzer.analyze();

        let rewritten = std::fs::read_to_string(path.as_std_path()).expect("read");
        assert_eq!(rewritten, "Item {\n    width: 1 + 2\n}\n");
    }

    #[test]
    fn rewrite_with_remove_unused_drops_declarations() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(
            dir.path(),
            "Main.qml",
            "Item { property int dead: 0\nwidth: 5 }",
        );

        let mut analyzer = Analyzer::new(empty_grammar(), Target::File(path.clone()));
        analyzer.set_rewrite(true);
        analyzer.set_remove_unused(true);
        analyzer.analyze();

        let rewritten = std::fs::read_to_string(path.as_std_path()).expect("read");
        assert!(!rewritten.contains("dead"), "rewritten was: {rewritten}");
        assert!(rewritten.contains("width: 5"));
    }

    #[test]
    fn syntax_error_skips_rewrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let original = "Item {";
        let path = write_file(dir.path(), "Broken.qml", original);

        let mut analyzer = Analyzer::new(empty_grammar(), Target::File(path.clone()));
        analyzer.set_rewrite(true);
        let diagnostics = analyzer.analyze();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::Syntax);
        let untouched = std::fs::read_to_string(path.as_std_path()).expect("read");
        assert_eq!(untouched, original, "failed files must not be rewritten");
    }

    #[test]
    fn shared_diagnostics_see_progress() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(dir.path(), "Main.qml", "Item { property int unused: 0 }");

        let mut analyzer = Analyzer::new(empty_grammar(), Target::File(path));
        let shared = analyzer.shared_diagnostics();
        let diagnostics = analyzer.analyze();
        let seen = shared.lock().expect("lock");
        assert_eq!(*seen, diagnostics);
    }

    #[test]
    fn spawn_runs_on_a_worker_thread() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(dir.path(), "Main.qml", "Item { property int unused: 0 }");

        let analyzer = Analyzer::new(empty_grammar(), Target::File(path));
        let handle = analyzer.spawn();
        let diagnostics = handle.join().expect("worker thread");
        assert_eq!(diagnostics.len(), 1);
    }
}
