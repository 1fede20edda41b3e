use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use unicode_normalization::UnicodeNormalization;

use crate::{
    config::ALLOWED_EXTENSIONS,
    error::{AppError, UploadError},
};

/// A file that has been written to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub original_name: String,
    pub stored_name: String,
    pub path: PathBuf,
    pub size: usize,
    pub extension: String,
}

/// Lowercased text after the last `.`, if there is a dot at all.
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Checks the client-supplied name of the `crop_image` part and returns its extension.
///
/// `None` means the form carried no file under that field.
pub fn validate_filename(filename: Option<&str>) -> Result<String, UploadError> {
    let filename = filename.ok_or(UploadError::MissingFile)?;
    if filename.is_empty() {
        return Err(UploadError::EmptyFilename);
    }
    match extension_of(filename) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        _ => Err(UploadError::UnsupportedType),
    }
}

/// Reduces a client-supplied name to a flat, ASCII-only name safe to use on disk.
///
/// Accented letters are decomposed (NFKD) first so `café` keeps its `e`.
pub fn secure_filename(raw: &str) -> String {
    let flattened: String = raw
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

pub fn stored_name(raw: &str, now: NaiveDateTime) -> String {
    format!("{}_{}", now.format("%Y%m%d_%H%M%S"), secure_filename(raw))
}

/// True for names that could have come out of [`stored_name`], i.e. safe to join onto the upload dir.
pub fn is_stored_name(name: &str) -> bool {
    !name.is_empty() && secure_filename(name) == name
}

/// Writes `bytes` under `dir/stored_name`. Never replaces an existing file.
pub async fn persist(
    dir: &Path,
    original_name: &str,
    stored_name: String,
    extension: String,
    bytes: &[u8],
) -> Result<UploadedImage, AppError> {
    let path = dir.join(&stored_name);
    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
    {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            return Err(AppError::Conflict(stored_name))
        }
        Err(err) => return Err(err.into()),
    };
    file.write_all(bytes).await?;
    file.flush().await?;

    Ok(UploadedImage {
        original_name: original_name.to_string(),
        stored_name,
        path,
        size: bytes.len(),
        extension,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn validation_order() {
        assert_eq!(validate_filename(None), Err(UploadError::MissingFile));
        assert_eq!(validate_filename(Some("")), Err(UploadError::EmptyFilename));
        assert_eq!(
            validate_filename(Some("notes.txt")),
            Err(UploadError::UnsupportedType)
        );
        assert_eq!(
            validate_filename(Some("no_extension")),
            Err(UploadError::UnsupportedType)
        );
        assert_eq!(
            validate_filename(Some("trailing.")),
            Err(UploadError::UnsupportedType)
        );
    }

    #[test]
    fn extension_match_ignores_case() {
        assert_eq!(validate_filename(Some("leaf.PNG")).unwrap(), "png");
        assert_eq!(validate_filename(Some("pod.Jpeg")).unwrap(), "jpeg");
        assert_eq!(validate_filename(Some("a.b.gif")).unwrap(), "gif");
        assert_eq!(validate_filename(Some("x.jpg")).unwrap(), "jpg");
    }

    #[test]
    fn secure_filename_strips_paths_and_junk() {
        assert_eq!(secure_filename("leaf.PNG"), "leaf.PNG");
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename(r"C:\photos\pod 1.jpg"), "C_photos_pod_1.jpg");
        assert_eq!(secure_filename("my  cocoa  leaf.png"), "my_cocoa_leaf.png");
        assert_eq!(secure_filename("caf\u{e9}<script>.gif"), "cafescript.gif");
        assert_eq!(secure_filename("caf\u{e9}.gif"), "cafe.gif");
        assert_eq!(secure_filename("\u{ff41}\u{ff42}.png"), "ab.png");
        assert_eq!(secure_filename("\u{5716}.png"), "png");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn stored_name_is_timestamp_prefixed() {
        assert_eq!(stored_name("leaf.PNG", noon()), "20240115_120000_leaf.PNG");
        assert_eq!(
            stored_name("../farm/pod.jpg", noon()),
            "20240115_120000_farm_pod.jpg"
        );
    }

    #[test]
    fn stored_names_are_recognised() {
        assert!(is_stored_name("20240115_120000_leaf.PNG"));
        assert!(!is_stored_name(""));
        assert!(!is_stored_name(".."));
        assert!(!is_stored_name("../secret.png"));
        assert!(!is_stored_name("a b.png"));
    }

    #[tokio::test]
    async fn persist_writes_once_and_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let name = stored_name("leaf.png", noon());

        let image = persist(dir.path(), "leaf.png", name.clone(), "png".into(), b"\x89PNG")
            .await
            .unwrap();
        assert_eq!(image.stored_name, name);
        assert_eq!(image.size, 4);
        assert_eq!(std::fs::read(&image.path).unwrap(), b"\x89PNG");

        let second = persist(dir.path(), "leaf.png", name.clone(), "png".into(), b"other").await;
        assert!(matches!(second, Err(AppError::Conflict(n)) if n == name));
        assert_eq!(std::fs::read(dir.path().join(&name)).unwrap(), b"\x89PNG");
    }
}
