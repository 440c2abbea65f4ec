use std::{
    ffi::OsStr,
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::Local;
use tracing::info;

use crate::{
    error::{Error, Result},
    vectorizer::{Field, VectorizerPair},
};

/// `strftime` format of the artifact suffix. Zero padded, so the
/// lexicographic order of file names is the chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";
pub const ARTIFACT_EXTENSION: &str = "cbor";

/// Directory tree of `VectorizerPair` artifacts:
/// `<root>/<language>/<shop>/vect_<COL>/vect_<COL>_<YYYYMMDD_HHMM>.cbor`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn field_dir(&self, language: &str, shop: &str, field: Field) -> PathBuf {
        self.root
            .join(language)
            .join(shop)
            .join(format!("vect_{}", field.column()))
    }

    pub fn artifact_name(field: Field, timestamp: &str) -> String {
        format!("vect_{}_{timestamp}.{ARTIFACT_EXTENSION}", field.column())
    }

    /// Save under the current local time.
    pub fn save(&self, pair: &VectorizerPair) -> Result<PathBuf> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.save_as(pair, &timestamp)
    }

    /// Save under an explicit timestamp suffix, replacing any artifact of the
    /// same name.
    ///
    /// The artifact is written next to its final name then renamed, so
    /// `latest` never returns a partially written file.
    pub fn save_as(&self, pair: &VectorizerPair, timestamp: &str) -> Result<PathBuf> {
        let dir = self.field_dir(&pair.language, &pair.shop, pair.field);
        fs::create_dir_all(&dir)?;
        let path = dir.join(Self::artifact_name(pair.field, timestamp));
        let tmp = path.with_extension(format!("{ARTIFACT_EXTENSION}.tmp"));
        info!(path = %path.display(), "saving vectorizer artifact");
        if let Err(e) = write_cbor(&tmp, pair) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, &path)?;
        Ok(path)
    }

    /// Lexicographically last `.cbor` file of the field directory.
    pub fn latest(&self, language: &str, shop: &str, field: Field) -> Result<PathBuf> {
        let dir = self.field_dir(language, shop, field);
        let entries = fs::read_dir(&dir).map_err(|_| {
            Error::NotFound(format!("no artifact directory {}", dir.display()))
        })?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let is_artifact = Path::new(&name).extension() == Some(OsStr::new(ARTIFACT_EXTENSION));
            if is_artifact && entry.file_type()?.is_file() {
                files.push(name);
            }
        }
        files
            .into_iter()
            .max()
            .map(|name| dir.join(name))
            .ok_or_else(|| Error::NotFound(format!("no artifact in {}", dir.display())))
    }

    /// Load an explicit artifact, or the latest one of (language, shop, field).
    pub fn load(
        &self,
        language: &str,
        shop: &str,
        field: Field,
        path: Option<&Path>,
    ) -> Result<VectorizerPair> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => self.latest(language, shop, field)?,
        };
        info!(path = %path.display(), "loading vectorizer artifact");
        let file = File::open(&path)
            .map_err(|e| Error::NotFound(format!("{}: {e}", path.display())))?;
        let pair: VectorizerPair = serde_cbor::from_reader(BufReader::new(file))?;
        if pair.field != field {
            return Err(Error::ArtifactMismatch(format!(
                "{} holds a {} vectorizer, expected {}",
                path.display(),
                pair.field,
                field
            )));
        }
        Ok(pair)
    }
}

fn write_cbor(path: &Path, pair: &VectorizerPair) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_cbor::to_writer(&mut writer, pair)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_layout() {
        let store = ArtifactStore::new("histo");
        assert_eq!(
            store.field_dir("fr", "emb", Field::Comment),
            PathBuf::from("histo/fr/emb/vect_COMMENT")
        );
        assert_eq!(
            ArtifactStore::artifact_name(Field::Description, "20240102_0304"),
            "vect_DESCR_ORDER_20240102_0304.cbor"
        );
    }

    #[test]
    fn missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let err = store.latest("fr", "emb", Field::Comment).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn empty_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::create_dir_all(store.field_dir("fr", "emb", Field::Comment)).unwrap();
        let err = store.load("fr", "emb", Field::Comment, None).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    fn pair() -> VectorizerPair {
        let report: crate::report::Report = serde_json::from_str(
            r#"{"ORDER_ID": "1", "CODE_SHOP": "EMB", "DESCR_ORDER": "robot", "COMMENT": "pince changee"}"#,
        )
        .unwrap();
        VectorizerPair::fit("fr", "emb", Field::Comment, &[report], &crate::text::Normalizer::default())
    }

    #[test]
    fn leftover_temporary_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let saved = store.save_as(&pair(), "20240101_0000").unwrap();
        let field_dir = store.field_dir("fr", "emb", Field::Comment);
        fs::write(field_dir.join("vect_COMMENT_20990101_0000.cbor.tmp"), b"").unwrap();
        assert_eq!(store.latest("fr", "emb", Field::Comment).unwrap(), saved);
        assert_eq!(fs::read_dir(&field_dir).unwrap().count(), 2);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_write_is_reported_and_keeps_the_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let pair = pair();
        let good = store.save_as(&pair, "20240101_0000").unwrap();

        let field_dir = store.field_dir("fr", "emb", Field::Comment);
        std::os::unix::fs::symlink("/dev/full", field_dir.join("vect_COMMENT_20990101_0000.cbor.tmp"))
            .unwrap();
        let err = store.save_as(&pair, "20990101_0000").unwrap_err();
        assert!(matches!(err, Error::Io(_) | Error::Artifact(_)));

        assert_eq!(store.latest("fr", "emb", Field::Comment).unwrap(), good);
        assert_eq!(store.load("fr", "emb", Field::Comment, None).unwrap(), pair);
    }
}
