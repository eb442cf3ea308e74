use anyhow::Context as _;

/// Resolves an asset source string to raw bytes.
///
/// Closures of the right shape implement this, so tests and embedders can
/// serve bytes from memory or a network client.
pub trait Fetch: Send + Sync {
    fn fetch(&self, src: &str) -> anyhow::Result<Vec<u8>>;
}

/// Reads sources as filesystem paths.
#[derive(Debug, Copy, Clone, Default)]
pub struct FileFetch;

impl Fetch for FileFetch {
    fn fetch(&self, src: &str) -> anyhow::Result<Vec<u8>> {
        std::fs::read(src).with_context(|| format!("failed to read {src}"))
    }
}

impl<F> Fetch for F
where
    F: Fn(&str) -> anyhow::Result<Vec<u8>> + Send + Sync,
{
    fn fetch(&self, src: &str) -> anyhow::Result<Vec<u8>> {
        self(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_fetch_reports_the_path() {
        let err = FileFetch.fetch("does/not/exist.png").unwrap_err();
        assert!(format!("{err:#}").contains("does/not/exist.png"));
    }

    #[test]
    fn closures_fetch() {
        let fetch = |src: &str| -> anyhow::Result<Vec<u8>> { Ok(src.as_bytes().to_vec()) };
        assert_eq!(fetch.fetch("abc").unwrap(), b"abc");
    }
}
