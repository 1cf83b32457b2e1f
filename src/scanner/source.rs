//! Module reference scanner for JS/TS source files.
//!
//! Walks one file's text and yields every literal module specifier it can
//! find, tagged with the syntax form it appeared in. The scanner is
//! deliberately forgiving: content it cannot make sense of simply yields
//! no references.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// File extensions considered source files.
const SOURCE_EXTENSIONS: [&str; 4] = ["ts", "tsx", "js", "jsx"];

/// Syntax form a reference was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefForm {
    /// `import x from "y"` / `export { x } from "y"` / `import "y"`
    ImportFrom,
    /// `import x = require("y")`
    ImportEquals,
    /// `require("y")`
    RequireCall,
    /// `require.resolve("y")`
    RequireResolve,
    /// `import("y")`
    DynamicImport,
    /// `require.ensure(["a", "b"], ...)` - one reference per element
    BatchEnsure,
}

/// A raw module reference found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReference {
    /// The literal module specifier.
    pub specifier: String,
    /// The file the reference came from.
    pub file: PathBuf,
    /// The syntax form the reference appeared in.
    pub form: RefForm,
}

// Alternation order matters: at a shared starting position the earlier
// alternative wins, so import-equals must come before the bare require
// forms and the batch forms before require(. The `[^.\w$]` prefix on the
// require forms keeps `obj.require(...)` from matching. A batch callee is
// any name containing both "require" and "ensure", dotted (`require.ensure`)
// or fused in one identifier (`requireEnsure`), in either order.
static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)
          \bimport\s+[A-Za-z_$][\w$]*\s*=\s*require\s*\(\s*["'](?P<eq>[^"']+)["']
        | \b(?:import|export)\b[^;'"]*?\bfrom\s*["'](?P<from>[^"']+)["']
        | \bimport\s*["'](?P<bare>[^"']+)["']
        | (?:^|[^.\w$])
          (?:
              [\w$]*require[\w$]*\s*\.\s*[\w$]*ensure[\w$]*
            | [\w$]*(?i:require)[\w$]*(?i:ensure)[\w$]*
            | [\w$]*(?i:ensure)[\w$]*(?i:require)[\w$]*
          )
          \s*\(\s*\[(?P<batch>[^\]]*)\]
        | (?:^|[^.\w$])require\s*\.\s*resolve\s*\(\s*["'](?P<resolve>[^"']+)["']
        | (?:^|[^.\w$])require\s*\(\s*["'](?P<call>[^"']+)["']
        | \bimport\s*\(\s*["'](?P<dyn>[^"']+)["']
        "#,
    )
    .unwrap()
});

static STRING_LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"']+)["']"#).unwrap());

/// Strip `//` and `/* */` comments, leaving string literals intact.
///
/// Quoted spans are copied through verbatim so a comment marker inside a
/// string (`"https://x"`, `"/*"`) never swallows the code after it.
fn strip_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' | '`' => {
                out.push(c);
                while let Some(inner) = chars.next() {
                    out.push(inner);
                    if inner == '\\' {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    } else if inner == c {
                        break;
                    }
                }
            }
            '/' => match chars.peek() {
                Some('/') => {
                    for inner in chars.by_ref() {
                        if inner == '\n' {
                            out.push('\n');
                            break;
                        }
                    }
                }
                Some('*') => {
                    chars.next();
                    let mut prev = '\0';
                    for inner in chars.by_ref() {
                        if prev == '*' && inner == '/' {
                            break;
                        }
                        prev = inner;
                    }
                    out.push(' ');
                }
                _ => out.push(c),
            },
            _ => out.push(c),
        }
    }
    out
}

/// Whether a path should be scanned at all.
///
/// Test files and files outside the recognized source extensions never
/// contribute references to a deployable manifest.
pub fn is_scannable(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    if !SOURCE_EXTENSIONS.contains(&ext) {
        return false;
    }

    if path
        .components()
        .any(|c| c.as_os_str() == "__tests__")
    {
        return false;
    }

    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    if stem.ends_with(".spec") || stem.to_lowercase().ends_with("test") {
        return false;
    }

    true
}

/// Scan a file on disk.
///
/// An unreadable, empty, or skipped file yields an empty sequence; that is
/// not an error condition.
pub fn scan_file(path: &Path) -> References {
    if !is_scannable(path) {
        return References::empty(path);
    }

    match std::fs::read_to_string(path) {
        Ok(content) => scan(path, &content),
        Err(err) => {
            tracing::debug!("skipping unreadable file {}: {}", path.display(), err);
            References::empty(path)
        }
    }
}

/// Scan source text directly.
pub fn scan(path: &Path, content: &str) -> References {
    // Comments off the table first, so commented-out imports don't count.
    References {
        file: path.to_path_buf(),
        text: strip_comments(content),
        pos: 0,
        pending: VecDeque::new(),
    }
}

/// A lazy, finite, non-restartable sequence of references from one file.
#[derive(Debug)]
pub struct References {
    file: PathBuf,
    text: String,
    pos: usize,
    pending: VecDeque<RawReference>,
}

impl References {
    fn empty(path: &Path) -> Self {
        References {
            file: path.to_path_buf(),
            text: String::new(),
            pos: 0,
            pending: VecDeque::new(),
        }
    }

    fn reference(&self, specifier: &str, form: RefForm) -> RawReference {
        RawReference {
            specifier: specifier.to_string(),
            file: self.file.clone(),
            form,
        }
    }
}

impl Iterator for References {
    type Item = RawReference;

    fn next(&mut self) -> Option<RawReference> {
        loop {
            if let Some(reference) = self.pending.pop_front() {
                return Some(reference);
            }

            if self.pos >= self.text.len() {
                return None;
            }

            let captures = REFERENCE_RE.captures_at(&self.text, self.pos)?;
            self.pos = captures.get(0).map(|m| m.end())?;

            let tagged = [
                ("eq", RefForm::ImportEquals),
                ("from", RefForm::ImportFrom),
                ("bare", RefForm::ImportFrom),
                ("resolve", RefForm::RequireResolve),
                ("call", RefForm::RequireCall),
                ("dyn", RefForm::DynamicImport),
            ];
            for (group, form) in tagged {
                if let Some(m) = captures.name(group) {
                    return Some(self.reference(m.as_str(), form));
                }
            }

            if let Some(array) = captures.name("batch") {
                for literal in STRING_LITERAL_RE.captures_iter(array.as_str()) {
                    let reference = self.reference(&literal[1], RefForm::BatchEnsure);
                    self.pending.push_back(reference);
                }
                // An ensure call with no string literals yields nothing;
                // loop around for the next match.
            }
        }
    }
}
