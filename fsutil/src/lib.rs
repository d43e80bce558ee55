use std::{
    fs,
    path::{Path, PathBuf},
};

pub mod error {
    use std::{io, path::PathBuf};

    pub type Result<T> = std::result::Result<T, self::Error>;

    type Msg = &'static str;

    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("{0} ({1}): {2}")]
        SingleIO(Msg, PathBuf, #[source] io::Error),

        #[error("Not a file: '{0}'")]
        NotAFile(PathBuf),
    }
}
pub use error::{Error, Result};

#[must_use]
pub fn read_to_string(filepath: impl AsRef<Path>) -> Result<String> {
    let filepath = filepath.as_ref();
    let bytes = fs::read(filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.to_owned(), e))?;
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            log::warn!(
                "'{}' is not valid UTF-8; invalid bytes are replaced",
                filepath.to_string_lossy()
            );
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

#[must_use]
pub fn ensure_file(filepath: impl AsRef<Path>) -> Result<()> {
    let filepath = filepath.as_ref();
    let meta = fs::metadata(filepath)
        .map_err(|e| Error::SingleIO("Cannot access file", filepath.to_owned(), e))?;
    if meta.is_file() {
        Ok(())
    } else {
        Err(Error::NotAFile(filepath.to_owned()))
    }
}

/// Find `filename` in `dir` and its ancestors, nearest first.
pub fn find_file_in_ancestors(dir: impl AsRef<Path>, filename: &str) -> Option<PathBuf> {
    dir.as_ref()
        .ancestors()
        .map(|d| d.join(filename))
        .find(|path| path.is_file())
}

/// Normalize the path
/// ```
/// use fsutil::normalize_path;
/// use std::path::Path;
///
/// assert_eq!(normalize_path("./cases/.hidden/././in.txt"), Path::new("cases/.hidden/in.txt"));
/// assert_eq!(normalize_path("cases/sub/../../bar/."), Path::new("bar"));
/// assert_eq!(normalize_path("../foo/../cases.txt"), Path::new("../cases.txt"));
/// assert_eq!(normalize_path("/"), Path::new("/"));
/// assert_eq!(normalize_path("./foo/"), Path::new("foo"));
/// assert_eq!(normalize_path("./././."), Path::new("."));
/// ```
pub fn normalize_path(path: impl AsRef<Path>) -> PathBuf {
    use ::std::path::Component;
    let components = path.as_ref().components();
    let mut stack = Vec::with_capacity(components.size_hint().1.unwrap_or(4));
    for c in components {
        match c {
            Component::CurDir => (),
            Component::ParentDir if !stack.is_empty() => {
                stack.pop();
            }
            _ => {
                stack.push(c);
            }
        }
    }
    if stack.is_empty() {
        stack.push(Component::CurDir);
    }
    stack.iter().collect()
}

/// Absolute form of `path` for display; does not touch the file system
/// beyond reading the current dir, so it works for paths that do not exist.
pub fn absolute_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        return self::normalize_path(path);
    }
    match std::env::current_dir() {
        Ok(cwd) => self::normalize_path(cwd.join(path)),
        Err(_) => self::normalize_path(path),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn absolute_path_of_missing_file() {
        let p = absolute_path("no/such/../cases.txt");
        assert!(p.is_absolute());
        assert!(p.ends_with("no/cases.txt"));
    }

    #[test]
    fn ensure_file_rejects_dir_and_missing() {
        let dir = std::env::temp_dir();
        assert!(matches!(ensure_file(&dir), Err(Error::NotAFile(_))));
        assert!(matches!(
            ensure_file(dir.join("casegrade-definitely-missing.txt")),
            Err(Error::SingleIO(..))
        ));
    }
}
