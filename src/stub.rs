//! Derives the filesystem-safe identifier (the "stub") that names an item's
//! output file and the directory holding its comments and children.

use regex_lite::Regex;
use std::sync::LazyLock;

/// Matches the last path segment of a URL ending in a slash, e.g. `hello`
/// in `https://example.com/2010/05/hello/`.
static TRAILING_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*/(.+)/$").unwrap());

/// Matches one or more characters that may not appear in a stub.
static INVALID_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+").unwrap());

/// Matches runs of hyphens.
static HYPHEN_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").unwrap());

/// Builds the stub for an item. The trailing path segment of `guid` wins,
/// then that of `link`; otherwise the lower-cased `title` is used. The result
/// only contains `[A-Za-z0-9_-]`, never contains `--`, and is never empty.
pub fn stub(guid: Option<&str>, link: Option<&str>, title: Option<&str>) -> String {
    let source = guid
        .and_then(trailing_segment)
        .or_else(|| link.and_then(trailing_segment))
        .map(str::to_owned)
        .unwrap_or_else(|| title.unwrap_or_default().to_lowercase());
    fold(&source)
}

fn trailing_segment(url: &str) -> Option<&str> {
    TRAILING_SEGMENT_RE
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Replaces every disallowed character with a hyphen and collapses hyphen
/// runs. An input that folds to nothing becomes `-`.
pub fn fold(input: &str) -> String {
    let replaced = INVALID_RUN_RE.replace_all(input, "-");
    let collapsed = HYPHEN_RUN_RE.replace_all(&replaced, "-");
    if collapsed.is_empty() {
        String::from("-")
    } else {
        collapsed.into_owned()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct TestCase {
        guid: Option<&'static str>,
        link: Option<&'static str>,
        title: Option<&'static str>,
        wanted: &'static str,
    }

    fn stub_test(test_case: &TestCase) {
        let found = stub(test_case.guid, test_case.link, test_case.title);
        assert_eq!(
            test_case.wanted, found,
            "wanted \"{}\"; found \"{}\"",
            test_case.wanted, found
        );
    }

    #[test]
    fn test_stub_from_guid_segment() {
        stub_test(&TestCase {
            guid: Some("http://example.com/hello-world/"),
            link: Some("http://example.com/other/"),
            title: Some("Ignored"),
            wanted: "hello-world",
        })
    }

    #[test]
    fn test_stub_uses_last_segment_only() {
        stub_test(&TestCase {
            guid: Some("http://example.com/2010/05/deep/"),
            link: None,
            title: None,
            wanted: "deep",
        })
    }

    #[test]
    fn test_stub_folds_segment_characters() {
        stub_test(&TestCase {
            guid: Some("http://example.com/caf%c3%a9.au-lait/"),
            link: None,
            title: None,
            wanted: "caf-c3-a9-au-lait",
        })
    }

    #[test]
    fn test_stub_falls_back_to_link() {
        stub_test(&TestCase {
            guid: Some("http://example.com/?p=42"),
            link: Some("http://example.com/from-link/"),
            title: Some("Title"),
            wanted: "from-link",
        })
    }

    #[test]
    fn test_stub_falls_back_to_lowercased_title() {
        stub_test(&TestCase {
            guid: Some("http://example.com/?p=42"),
            link: Some("http://example.com/?page_id=42"),
            title: Some("Hello, \"World\"!"),
            wanted: "hello-world-",
        })
    }

    #[test]
    fn test_stub_never_empty() {
        stub_test(&TestCase {
            guid: None,
            link: None,
            title: Some("!!!"),
            wanted: "-",
        });
        stub_test(&TestCase {
            guid: None,
            link: None,
            title: None,
            wanted: "-",
        });
    }

    #[test]
    fn test_fold_collapses_existing_hyphen_runs() {
        assert_eq!("a-b", fold("a---b"));
        assert_eq!("a-b", fold("a - b"));
        assert_eq!("under_score", fold("under_score"));
    }
}
