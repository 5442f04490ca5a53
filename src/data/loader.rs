// ============================================================
// Layer 4 — Parallel Corpus Loader
// ============================================================
// Reads a translation corpus stored as two plain-text files
// with one sentence per line:
//
//   source.txt          target.txt
//   ───────────         ───────────
//   the house           das haus
//   a small cat         eine kleine katze
//
// Line N of the source file is aligned with line N of the
// target file. Both files must therefore have the same number
// of lines; a mismatch almost always means a truncated or
// shifted file, so it is reported as an error instead of being
// silently zipped to the shorter length.
//
// Every line goes through the Preprocessor. Pairs where either
// side is empty after cleaning are dropped.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (An I/O Project)

use anyhow::{bail, Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::data::preprocessor::Preprocessor;
use crate::domain::sentence_pair::SentencePair;
use crate::domain::traits::CorpusSource;

/// Loads aligned sentence pairs from two text files.
/// Implements the CorpusSource trait from Layer 3.
pub struct ParallelCorpusLoader {
    source_path:  PathBuf,
    target_path:  PathBuf,
    preprocessor: Preprocessor,
}

impl ParallelCorpusLoader {
    pub fn new(source_path: impl Into<PathBuf>, target_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path:  source_path.into(),
            target_path:  target_path.into(),
            preprocessor: Preprocessor::new(),
        }
    }
}

impl CorpusSource for ParallelCorpusLoader {
    fn load_pairs(&self) -> Result<Vec<SentencePair>> {
        let sources = read_lines(&self.source_path)?;
        let targets = read_lines(&self.target_path)?;

        if sources.len() != targets.len() {
            bail!(
                "Line count mismatch: '{}' has {} lines, '{}' has {}",
                self.source_path.display(),
                sources.len(),
                self.target_path.display(),
                targets.len(),
            );
        }

        let total = sources.len();
        let pairs: Vec<SentencePair> = sources
            .iter()
            .zip(targets.iter())
            .map(|(s, t)| {
                SentencePair::new(self.preprocessor.clean_line(s), self.preprocessor.clean_line(t))
            })
            .filter(SentencePair::is_complete)
            .collect();

        if pairs.len() < total {
            tracing::debug!("Dropped {} incomplete pairs", total - pairs.len());
        }
        tracing::info!(
            "Loaded {} sentence pairs from '{}'",
            pairs.len(),
            self.source_path.display()
        );
        Ok(pairs)
    }
}

/// Read a UTF-8 file and split it into lines. `lines()` handles
/// both `\n` and `\r\n` endings and ignores a final newline.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read corpus file '{}'", path.display()))?;
    Ok(text.lines().map(str::to_owned).collect())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_pairs_are_aligned_by_line() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "src.txt", "the house\r\na  small cat\n");
        let tgt = write(&dir, "tgt.txt", "das haus\r\neine kleine katze\n");

        let pairs = ParallelCorpusLoader::new(src, tgt).load_pairs().unwrap();

        assert_eq!(
            pairs,
            vec![
                SentencePair::new("the house", "das haus"),
                SentencePair::new("a small cat", "eine kleine katze"),
            ]
        );
    }

    #[test]
    fn test_incomplete_pairs_are_dropped() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "src.txt", "one\n\nthree\n");
        let tgt = write(&dir, "tgt.txt", "eins\nzwei\n \t\n");

        let pairs = ParallelCorpusLoader::new(src, tgt).load_pairs().unwrap();
        assert_eq!(pairs, vec![SentencePair::new("one", "eins")]);
    }

    #[test]
    fn test_line_count_mismatch_is_an_error() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "src.txt", "one\ntwo\n");
        let tgt = write(&dir, "tgt.txt", "eins\n");

        let err = ParallelCorpusLoader::new(src, tgt).load_pairs().unwrap_err();
        assert!(err.to_string().contains("Line count mismatch"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let tgt = write(&dir, "tgt.txt", "eins\n");

        let result = ParallelCorpusLoader::new(dir.path().join("nope.txt"), tgt).load_pairs();
        assert!(result.is_err());
    }
}
