//! The preview document the browser executes.
//!
//! Every editing pass replaces the whole document: nothing from a previous
//! run survives except what the browser itself caches.
//!
//! An open tab follows along on its own. `FileSandbox` stamps each document
//! with a version and writes the same version to a small script next to it;
//! the document polls that script and reloads itself when the two differ.
//! Script elements load from `file://` where `fetch` would be refused.

use std::borrow::Cow;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use tempfile::NamedTempFile;
use tracing::debug;

/// How often an open preview checks for a newer document.
pub const RELOAD_POLL_MS: u64 = 500;

/// Global the version script calls with the current version.
const VERSION_CALLBACK: &str = "__jsxSandboxVersion";

/// Where the preview document goes when no `--preview` path is given.
pub fn default_preview_path() -> PathBuf {
    std::env::temp_dir()
        .join("jsx-sandbox")
        .join("preview.html")
}

fn script_close_pattern() -> &'static Regex {
    static SCRIPT_CLOSE: OnceLock<Regex> = OnceLock::new();
    SCRIPT_CLOSE.get_or_init(|| Regex::new(r"(?i)</(script)").expect("script pattern is valid"))
}

/// Escape `</script` so module code cannot end its own script element.
fn escape_script(code: &str) -> Cow<'_, str> {
    script_close_pattern().replace_all(code, r"<\/$1")
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

/// Build the full HTML document that runs `code` as an ES module mounted
/// next to an empty `#app` element.
pub fn sandbox_document(code: &str, stylesheet: Option<&str>) -> String {
    let link = stylesheet.map_or_else(String::new, |href| {
        format!(
            "\n    <link rel=\"stylesheet\" href=\"{}\">",
            escape_attr(href)
        )
    });
    format!(
        "<!DOCTYPE html>\n<html>\n  <head>\n    <meta charset=\"utf-8\">{link}\n  </head>\n  <body>\n    <div id=\"app\"></div>\n    <script type=\"module\">\n{}\n    </script>\n  </body>\n</html>\n",
        escape_script(code)
    )
}

/// The execution context that receives each new document.
pub trait Sandbox {
    /// Replace the current document with `document`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document could not be delivered; the previous
    /// document stays in place.
    fn load(&mut self, document: &str) -> io::Result<()>;

    /// Human-readable location of the document, shown in the status panel.
    fn location(&self) -> String;
}

/// Classic script that reloads the page once `version_src` reports a
/// version other than `version`.
fn live_reload_script(version_src: &str, version: &str) -> String {
    let src = serde_json::Value::String(version_src.to_string()).to_string();
    let version = serde_json::Value::String(version.to_string()).to_string();
    format!(
        r#"<script>
(function () {{
  var version = {version};
  window.{VERSION_CALLBACK} = function (next) {{
    if (next !== version) location.reload();
  }};
  setInterval(function () {{
    var poll = document.createElement("script");
    poll.src = {src} + "?" + Date.now();
    poll.onload = poll.onerror = function () {{ poll.remove(); }};
    document.head.appendChild(poll);
  }}, {RELOAD_POLL_MS});
}})();
</script>"#
    )
}

/// Put `script` at the end of the document head, or in front of a
/// document without one.
fn inject_head_script(document: &str, script: &str) -> String {
    match document.find("</head>") {
        Some(at) => format!("{}{script}\n  {}", &document[..at], &document[at..]),
        None => format!("{script}\n{document}"),
    }
}

/// Writes the document to a file that a browser tab points at.
///
/// Writes go to a temporary file in the same directory which is then
/// renamed over the target, so a reload never sees a half-written document.
/// With live reload on (the default) a `<name>.version.js` file is kept
/// next to the document and every load bumps it.
#[derive(Debug, Clone)]
pub struct FileSandbox {
    path: PathBuf,
    live_reload: bool,
    loads: u64,
}

impl FileSandbox {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            live_reload: true,
            loads: 0,
        }
    }

    #[must_use]
    pub fn with_live_reload(mut self, enabled: bool) -> Self {
        self.live_reload = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The version script polled by the document.
    pub fn version_path(&self) -> PathBuf {
        self.path.with_extension("version.js")
    }

    fn directory(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// Replace `target` with `contents` through a temporary sibling.
    fn replace_file(&self, target: &Path, contents: &str) -> io::Result<()> {
        let mut file = NamedTempFile::new_in(self.directory())?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        file.persist(target).map_err(|err| err.error)?;
        Ok(())
    }

    /// A version no earlier run of the program has used for this file.
    fn next_version(&mut self) -> String {
        self.loads += 1;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis());
        format!("{stamp:x}-{}", self.loads)
    }
}

impl Sandbox for FileSandbox {
    fn load(&mut self, document: &str) -> io::Result<()> {
        fs::create_dir_all(self.directory())?;
        if !self.live_reload {
            self.replace_file(&self.path, document)?;
            debug!(path = %self.path.display(), bytes = document.len(), "preview document replaced");
            return Ok(());
        }

        let version = self.next_version();
        let version_path = self.version_path();
        let version_src = version_path
            .file_name()
            .map_or_else(String::new, |name| name.to_string_lossy().into_owned());
        let stamped = inject_head_script(document, &live_reload_script(&version_src, &version));
        // Document first: a tab that sees the new version must find the new document.
        self.replace_file(&self.path, &stamped)?;
        let callback = serde_json::Value::String(version.clone()).to_string();
        self.replace_file(
            &version_path,
            &format!("window.{VERSION_CALLBACK} && window.{VERSION_CALLBACK}({callback});\n"),
        )?;
        debug!(
            path = %self.path.display(),
            bytes = stamped.len(),
            %version,
            "preview document replaced"
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_document_mounts_app_and_runs_module() {
        let doc = sandbox_document("import a from 'a'\nrender(a)", None);
        assert!(doc.contains("<div id=\"app\"></div>"));
        assert!(doc.contains("<script type=\"module\">\nimport a from 'a'\nrender(a)\n"));
        assert!(!doc.contains("stylesheet"));
    }

    #[test]
    fn test_document_links_stylesheet() {
        let doc = sandbox_document("x()", Some("/iframe.css?v=\"1\""));
        assert!(doc.contains("<link rel=\"stylesheet\" href=\"/iframe.css?v=&quot;1&quot;\">"));
    }

    #[test]
    fn test_script_close_tags_are_escaped() {
        let doc = sandbox_document("const s = '</script><SCRIPT>'; const t = '</SCRIPT>'", None);
        assert!(doc.contains("'<\\/script><SCRIPT>'"));
        assert!(doc.contains("'<\\/SCRIPT>'"));
        assert_eq!(doc.matches("</script>").count(), 1);
    }

    #[test]
    fn test_file_sandbox_replaces_whole_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("preview.html");
        let mut sandbox = FileSandbox::new(&path).with_live_reload(false);

        sandbox.load("<p>first</p>").unwrap();
        sandbox.load("<p>second</p>").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>second</p>");
        assert_eq!(sandbox.location(), path.display().to_string());
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    fn version_of(script: &str) -> String {
        let start = script.find('(').unwrap() + 1;
        let end = script.rfind(')').unwrap();
        serde_json::from_str(&script[start..end]).unwrap()
    }

    #[test]
    fn test_each_load_bumps_version_seen_by_open_tab() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preview.html");
        let mut sandbox = FileSandbox::new(&path);

        sandbox.load(&sandbox_document("first()", None)).unwrap();
        let first_doc = fs::read_to_string(&path).unwrap();
        let first = version_of(&fs::read_to_string(sandbox.version_path()).unwrap());
        assert!(first_doc.contains(&format!("var version = \"{first}\";")));
        assert!(first_doc.contains("poll.src = \"preview.version.js\""));

        sandbox.load(&sandbox_document("first()", None)).unwrap();
        let second_doc = fs::read_to_string(&path).unwrap();
        let second = version_of(&fs::read_to_string(sandbox.version_path()).unwrap());
        assert_ne!(first, second);
        assert!(second_doc.contains(&format!("var version = \"{second}\";")));
        // The tab still showing the first document sees a different version.
        assert!(!second_doc.contains(&first));
    }

    #[test]
    fn test_reload_script_sits_in_head_before_module() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preview.html");
        let mut sandbox = FileSandbox::new(&path);
        sandbox.load(&sandbox_document("run()", None)).unwrap();

        let doc = fs::read_to_string(&path).unwrap();
        let reload = doc.find("location.reload()").unwrap();
        assert!(reload < doc.find("</head>").unwrap());
        assert!(reload < doc.find("<script type=\"module\">").unwrap());
        assert!(doc.contains(&format!("}}, {RELOAD_POLL_MS});")));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_reload_script_prepended_without_head() {
        let injected = inject_head_script("<p>x</p>", "<script></script>");
        assert_eq!(injected, "<script></script>\n<p>x</p>");
    }

    #[test]
    fn test_default_preview_path_is_html() {
        assert_eq!(
            default_preview_path().extension().and_then(|e| e.to_str()),
            Some("html")
        );
    }
}
