//! Feed list loading and run settings.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::fetch::is_valid_url;
use crate::TARGET_CONFIG;

pub const DEFAULT_CONFIG_PATH: &str = "feeds.json";
pub const DEFAULT_OUTPUT_DIR: &str = "feeds";
pub const DEFAULT_INDEX_PATH: &str = "index.html";
pub const DEFAULT_INDEX_TITLE: &str = "RSS Proxy";

/// One mirrored feed. Identity is `file`, the destination relative to the
/// output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedDescriptor {
    pub name: String,
    pub source: String,
    pub file: String,
}

/// Where a run reads its feed list and writes its outputs.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub config_path: PathBuf,
    pub output_dir: PathBuf,
    pub index_path: PathBuf,
    pub index_title: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            index_title: DEFAULT_INDEX_TITLE.to_string(),
        }
    }
}

impl MirrorConfig {
    /// Mirror everything under `root`, laid out as `root/feeds/` and
    /// `root/index.html`.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            config_path: root.join(DEFAULT_CONFIG_PATH),
            output_dir: root.join(DEFAULT_OUTPUT_DIR),
            index_path: root.join(DEFAULT_INDEX_PATH),
            index_title: DEFAULT_INDEX_TITLE.to_string(),
        }
    }

    pub fn destination(&self, feed: &FeedDescriptor) -> PathBuf {
        self.output_dir.join(&feed.file)
    }

    /// Prefix for links from the index page into the output directory: the
    /// output directory relative to the directory holding the index, using
    /// `..` where it lies outside. Empty when both are the same directory.
    pub fn link_prefix(&self) -> String {
        let base = std::env::current_dir().unwrap_or_default();
        let index_dir = self.index_path.parent().unwrap_or_else(|| Path::new(""));
        relative_link(&base, index_dir, &self.output_dir)
    }
}

/// Lexically resolve `path` against `base` into its components, folding `.`
/// and `..`. Root and drive prefixes stay as leading components that `..`
/// never removes.
fn absolute_components(base: &Path, path: &Path) -> Vec<String> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut parts: Vec<String> = Vec::new();
    let mut anchored = 0;
    for component in joined.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                parts.push(component.as_os_str().to_string_lossy().into_owned());
                anchored = parts.len();
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.len() > anchored {
                    parts.pop();
                }
            }
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
        }
    }
    parts
}

/// Path from directory `from` to `to`, `/`-separated, both resolved against `base`.
fn relative_link(base: &Path, from: &Path, to: &Path) -> String {
    let from_parts = absolute_components(base, from);
    let to_parts = absolute_components(base, to);

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    // Different roots or drives have no relative path between them
    if common == 0 {
        return base.join(to).to_string_lossy().replace('\\', "/");
    }

    let mut parts: Vec<&str> = vec![".."; from_parts.len() - common];
    parts.extend(to_parts[common..].iter().map(String::as_str));
    parts.join("/")
}

/// Read and validate the feed list at `path`.
pub fn load_feeds(path: &Path) -> Result<Vec<FeedDescriptor>, ConfigError> {
    debug!(target: TARGET_CONFIG, "Reading feed list from {}", path.display());

    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let feeds = parse_feeds(&text, path)?;
    info!(target: TARGET_CONFIG, "Loaded {} feeds from {}", feeds.len(), path.display());
    Ok(feeds)
}

/// Parse a JSON array of feed descriptors. `path` is only used for errors.
///
/// Each `file` is rewritten to its normalized `/`-separated form, so two
/// spellings of the same destination are caught as duplicates.
pub fn parse_feeds(text: &str, path: &Path) -> Result<Vec<FeedDescriptor>, ConfigError> {
    let mut feeds: Vec<FeedDescriptor> =
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    validate_feeds(&mut feeds)?;
    Ok(feeds)
}

fn validate_feeds(feeds: &mut [FeedDescriptor]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for (index, feed) in feeds.iter_mut().enumerate() {
        let invalid = |reason: String| ConfigError::InvalidEntry {
            index,
            name: feed.name.clone(),
            reason,
        };

        if feed.name.trim().is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        if !is_valid_url(&feed.source) {
            return Err(invalid(format!("source is not an http(s) URL: {}", feed.source)));
        }
        let Some(file) = normalize_file(&feed.file) else {
            return Err(invalid(format!(
                "file must be a relative path to a file inside the output directory: {}",
                feed.file
            )));
        };
        if !seen.insert(file.clone()) {
            return Err(invalid(format!("duplicate file {}", file)));
        }
        feed.file = file;
    }

    Ok(())
}

/// Normalized `/`-separated form of a destination, or `None` unless it is
/// non-empty, relative, made only of plain components, and names a file
/// rather than a directory.
fn normalize_file(file: &str) -> Option<String> {
    let last_segment = file.rsplit(['/', '\\']).next().unwrap_or("");
    if file.trim().is_empty() || last_segment.is_empty() || last_segment == "." {
        return None;
    }

    let mut parts = Vec::new();
    for component in Path::new(file).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(text: &str) -> Result<Vec<FeedDescriptor>, ConfigError> {
        parse_feeds(text, Path::new("feeds.json"))
    }

    #[test]
    fn test_parse_feeds() {
        let feeds = parse(
            r#"[
                {"name": "A", "source": "http://x/a.xml", "file": "a.xml"},
                {"name": "B", "source": "https://y/b.rss", "file": "news/b.xml"}
            ]"#,
        )
        .unwrap();

        assert_eq!(feeds.len(), 2);
        assert_eq!(
            feeds[0],
            FeedDescriptor {
                name: "A".to_string(),
                source: "http://x/a.xml".to_string(),
                file: "a.xml".to_string(),
            }
        );
        assert_eq!(feeds[1].file, "news/b.xml");
    }

    #[test]
    fn test_empty_list_is_valid() {
        assert!(parse("[]").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(parse("{not json"), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            parse(r#"[{"name": "A", "source": "http://x/a.xml"}]"#),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_entries() {
        let cases = [
            r#"[{"name": "", "source": "http://x/a.xml", "file": "a.xml"}]"#,
            r#"[{"name": "A", "source": "ftp://x/a.xml", "file": "a.xml"}]"#,
            r#"[{"name": "A", "source": "not a url", "file": "a.xml"}]"#,
            r#"[{"name": "A", "source": "http://x/a.xml", "file": "../a.xml"}]"#,
            r#"[{"name": "A", "source": "http://x/a.xml", "file": "/etc/a.xml"}]"#,
            r#"[{"name": "A", "source": "http://x/a.xml", "file": ""}]"#,
        ];
        for case in cases {
            assert!(
                matches!(parse(case), Err(ConfigError::InvalidEntry { index: 0, .. })),
                "accepted {}",
                case
            );
        }
    }

    #[test]
    fn test_rejects_duplicate_file() {
        let err = parse(
            r#"[
                {"name": "A", "source": "http://x/a.xml", "file": "a.xml"},
                {"name": "B", "source": "http://x/b.xml", "file": "a.xml"}
            ]"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEntry { index: 1, .. }));
    }

    #[test]
    fn test_load_feeds_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "A", "source": "http://x/a.xml", "file": "a.xml"}}]"#
        )
        .unwrap();

        let feeds = load_feeds(file.path()).unwrap();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].name, "A");
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_feeds(&dir.path().join("feeds.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_link_prefix() {
        assert_eq!(MirrorConfig::default().link_prefix(), "feeds");

        let config = MirrorConfig::rooted_at(Path::new("/srv/mirror"));
        assert_eq!(config.link_prefix(), "feeds");
        assert_eq!(
            config.destination(&FeedDescriptor {
                name: "A".to_string(),
                source: "http://x/a.xml".to_string(),
                file: "a.xml".to_string(),
            }),
            PathBuf::from("/srv/mirror/feeds/a.xml")
        );

        let config = MirrorConfig {
            output_dir: PathBuf::from("public/mirror/feeds"),
            index_path: PathBuf::from("public/index.html"),
            ..MirrorConfig::default()
        };
        assert_eq!(config.link_prefix(), "mirror/feeds");

        let config = MirrorConfig {
            output_dir: PathBuf::from("./out"),
            index_path: PathBuf::from("index.html"),
            ..MirrorConfig::default()
        };
        assert_eq!(config.link_prefix(), "out");
    }

    #[test]
    fn test_link_prefix_climbs_out_of_index_dir() {
        let config = MirrorConfig {
            output_dir: PathBuf::from("feeds"),
            index_path: PathBuf::from("site/index.html"),
            ..MirrorConfig::default()
        };
        assert_eq!(config.link_prefix(), "../feeds");

        let config = MirrorConfig {
            output_dir: PathBuf::from("/srv/data/feeds"),
            index_path: PathBuf::from("/srv/www/index.html"),
            ..MirrorConfig::default()
        };
        assert_eq!(config.link_prefix(), "../data/feeds");

        let config = MirrorConfig {
            output_dir: PathBuf::from("/srv/www"),
            index_path: PathBuf::from("/srv/www/index.html"),
            ..MirrorConfig::default()
        };
        assert_eq!(config.link_prefix(), "");
    }

    #[test]
    fn test_link_prefix_mixes_absolute_and_relative_paths() {
        let cwd = std::env::current_dir().unwrap();
        let config = MirrorConfig {
            output_dir: cwd.join("feeds"),
            index_path: PathBuf::from("index.html"),
            ..MirrorConfig::default()
        };
        assert_eq!(config.link_prefix(), "feeds");
    }

    #[test]
    fn test_relative_link() {
        let base = Path::new("/work");
        assert_eq!(relative_link(base, Path::new(""), Path::new("feeds")), "feeds");
        assert_eq!(relative_link(base, Path::new("a/b"), Path::new("a/c/d")), "../c/d");
        assert_eq!(relative_link(base, Path::new("a/./b/.."), Path::new("a/feeds")), "feeds");
        assert_eq!(relative_link(base, Path::new("site"), Path::new("/other/feeds")), "../../other/feeds");
        assert_eq!(relative_link(base, Path::new("/../.."), Path::new("/feeds")), "feeds");
    }

    #[test]
    fn test_file_spellings_are_normalized() {
        let feeds = parse(
            r#"[{"name": "A", "source": "http://x/a.xml", "file": "sub//a.xml"}]"#,
        )
        .unwrap();
        assert_eq!(feeds[0].file, "sub/a.xml");
    }

    #[test]
    fn test_rejects_duplicate_file_spelled_differently() {
        let err = parse(
            r#"[
                {"name": "A", "source": "http://x/a.xml", "file": "sub/a.xml"},
                {"name": "B", "source": "http://x/b.xml", "file": "sub//a.xml"}
            ]"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEntry { index: 1, .. }));
    }

    #[test]
    fn test_rejects_directory_like_file() {
        for file in ["a.xml/", "sub/", "a.xml/.", ".", "./a.xml"] {
            let text = format!(
                r#"[{{"name": "A", "source": "http://x/a.xml", "file": "{}"}}]"#,
                file
            );
            assert!(
                matches!(parse(&text), Err(ConfigError::InvalidEntry { index: 0, .. })),
                "accepted {}",
                file
            );
        }
    }
}
