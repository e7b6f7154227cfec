/// Case-definition XML handling
///
/// This module provides functionality to:
/// - Load case XML, recovering from junk bytes before the first tag
/// - Patch parameter values for a sweep variant (dp, TimeMax, rotation)
/// - Carry solver-critical `<execution>` sections into cloned variants
/// - Summarize what the case generator will actually read

pub mod patch;
pub mod report;
pub mod sections;

pub use patch::{update_dp, update_rotation, update_time_max, PatchLog};
pub use report::{echo_report, EchoReport};
pub use sections::preserve_critical_sections;

use std::error::Error;
use std::path::{Path, PathBuf};
use xmltree::{Element, ParseError, XMLNode};

/// A parsed case-definition document. Cloning is a deep copy, so a variant
/// can be patched without touching the source tree.
#[derive(Debug, Clone)]
pub struct CaseDoc {
    pub root: Element,
}

/// Result of loading a case XML from disk.
pub struct LoadedCase {
    pub doc: CaseDoc,
    /// True when leading junk had to be stripped before parsing succeeded.
    pub cleaned: bool,
    /// Backup of the original bytes, written only when cleaning happened.
    pub preclean_backup: Option<PathBuf>,
}

impl CaseDoc {
    pub fn parse_str(xml: &str) -> Result<CaseDoc, ParseError> {
        Ok(CaseDoc {
            root: Element::parse(xml.as_bytes())?,
        })
    }

    /// First descendant element with this name, in document order.
    pub fn find_descendant(&self, name: &str) -> Option<&Element> {
        find_descendant(&self.root, name)
    }

    pub fn find_descendant_mut(&mut self, name: &str) -> Option<&mut Element> {
        find_descendant_mut(&mut self.root, name)
    }

    /// First `child` element sitting directly under a `parent` descendant.
    pub fn find_nested(&self, parent: &str, child: &str) -> Option<&Element> {
        find_nested(&self.root, parent, child)
    }

    /// Serializes the document (with XML declaration) to `path`.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        self.root
            .write(writer)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Copies an existing file aside to `<name>.bak` before overwriting it.
    /// Returns the backup path when one was made.
    pub fn write_with_backup<P: AsRef<Path>>(&self, path: P) -> std::io::Result<Option<PathBuf>> {
        let path = path.as_ref();
        let backup = if path.exists() {
            Some(crate::io::backup_file(path, ".bak")?)
        } else {
            None
        };
        self.write_to(path)?;
        Ok(backup)
    }
}

/// Loads a case XML. If parsing fails, strips everything before the first
/// `<` (BOMs, editor junk, stray log lines), backs the original up as
/// `<name>.preclean.bak`, rewrites the file cleaned, and parses again.
pub fn load_with_sanitize<P: AsRef<Path>>(path: P) -> Result<LoadedCase, Box<dyn Error>> {
    let path = path.as_ref();
    let raw = std::fs::read(path)?;
    if let Ok(root) = Element::parse(raw.as_slice()) {
        return Ok(LoadedCase {
            doc: CaseDoc { root },
            cleaned: false,
            preclean_backup: None,
        });
    }
    let text = String::from_utf8_lossy(&raw);
    let cleaned = match text.find('<') {
        Some(i) if i > 0 => text[i..].to_string(),
        _ => text.trim_start_matches('\u{feff}').to_string(),
    };
    let backup = crate::io::backup_file(path, ".preclean.bak")?;
    std::fs::write(path, &cleaned)?;
    let root = Element::parse(cleaned.as_bytes())?;
    Ok(LoadedCase {
        doc: CaseDoc { root },
        cleaned: true,
        preclean_backup: Some(backup),
    })
}

pub fn find_descendant<'a>(el: &'a Element, name: &str) -> Option<&'a Element> {
    for child in &el.children {
        if let XMLNode::Element(e) = child {
            if e.name == name {
                return Some(e);
            }
            if let Some(found) = find_descendant(e, name) {
                return Some(found);
            }
        }
    }
    None
}

pub fn find_descendant_mut<'a>(el: &'a mut Element, name: &str) -> Option<&'a mut Element> {
    for child in el.children.iter_mut() {
        if let XMLNode::Element(e) = child {
            if e.name == name {
                return Some(e);
            }
            if let Some(found) = find_descendant_mut(e, name) {
                return Some(found);
            }
        }
    }
    None
}

pub fn find_nested<'a>(el: &'a Element, parent: &str, child: &str) -> Option<&'a Element> {
    for node in &el.children {
        if let XMLNode::Element(e) = node {
            if e.name == parent {
                if let Some(c) = e.get_child(child) {
                    return Some(c);
                }
            }
            if let Some(found) = find_nested(e, parent, child) {
                return Some(found);
            }
        }
    }
    None
}

pub fn find_nested_mut<'a>(el: &'a mut Element, parent: &str, child: &str) -> Option<&'a mut Element> {
    for node in el.children.iter_mut() {
        if let XMLNode::Element(e) = node {
            if e.name == parent && e.get_child(child).is_some() {
                return e.get_mut_child(child);
            }
            if let Some(found) = find_nested_mut(e, parent, child) {
                return Some(found);
            }
        }
    }
    None
}

/// Calls `f` on every descendant element named `name`, in document order.
pub fn visit_named_mut(el: &mut Element, name: &str, f: &mut dyn FnMut(&mut Element)) {
    for node in el.children.iter_mut() {
        if let XMLNode::Element(e) = node {
            if e.name == name {
                f(e);
            }
            visit_named_mut(e, name, f);
        }
    }
}

/// Direct child with this name, created on demand.
pub fn ensure_child_mut<'a>(parent: &'a mut Element, name: &str) -> &'a mut Element {
    if parent.get_child(name).is_none() {
        parent.children.push(XMLNode::Element(Element::new(name)));
    }
    parent.get_mut_child(name).unwrap()
}

/// The `<execution>` block, created directly under the root if absent.
pub(crate) fn ensure_execution_mut(root: &mut Element) -> &mut Element {
    if find_descendant(root, "execution").is_none() {
        root.children.push(XMLNode::Element(Element::new("execution")));
    }
    find_descendant_mut(root, "execution").unwrap()
}

pub(crate) fn ensure_params_mut(root: &mut Element) -> &mut Element {
    let exec = ensure_execution_mut(root);
    ensure_child_mut(exec, "parameters")
}

pub fn attr<'a>(el: &'a Element, key: &str) -> Option<&'a str> {
    el.attributes.get(key).map(String::as_str)
}

pub fn set_attr(el: &mut Element, key: &str, value: &str) {
    el.attributes.insert(key.to_string(), value.to_string());
}

/// Concatenated text content, trimmed.
pub fn text_of(el: &Element) -> String {
    let mut out = String::new();
    for child in &el.children {
        if let XMLNode::Text(t) = child {
            out.push_str(t);
        }
    }
    out.trim().to_string()
}

/// Replaces the element's text content. Only used on leaf value nodes, so
/// dropping every text child is safe.
pub fn set_text(el: &mut Element, text: &str) {
    el.children.retain(|c| !matches!(c, XMLNode::Text(_)));
    el.children.push(XMLNode::Text(text.to_string()));
}

/// The `v` attribute if present, otherwise non-empty text content.
pub fn value_of(el: &Element) -> Option<String> {
    if let Some(v) = el.attributes.get("v") {
        return Some(v.clone());
    }
    let t = text_of(el);
    if t.is_empty() {
        None
    } else {
        Some(t)
    }
}
