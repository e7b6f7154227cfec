use xmltree::{Element, XMLNode};

use crate::casedef::{attr, find_descendant, find_nested, value_of, CaseDoc};

/// What the patched document will actually hand the toolchain, looked up
/// the same way the tools do it. `None` means the value is simply absent.
#[derive(Debug, Default, Clone)]
pub struct EchoReport {
    /// Geometry-definition dp attribute, falling back to the Dp parameter.
    pub dp: Option<String>,
    pub time_max: Option<String>,
    pub vres_id: Option<String>,
    pub motion_units: Option<String>,
    pub motion_freq: Option<String>,
    pub motion_ampl: Option<String>,
}

pub fn echo_report(doc: &CaseDoc) -> EchoReport {
    let mut report = EchoReport::default();

    if let Some(def) = find_nested(&doc.root, "geometry", "definition") {
        report.dp = attr(def, "dp").map(str::to_string);
    }
    if report.dp.is_none() {
        report.dp = param_value(&doc.root, "dp");
    }

    report.time_max = param_value(&doc.root, "timemax").or_else(|| tmax_fallback(&doc.root));
    report.vres_id = param_value(&doc.root, "vresid");

    if let Some(mv) = find_descendant(&doc.root, "mvrotsinu") {
        report.motion_units = attr(mv, "anglesunits").map(str::to_string);
        report.motion_freq = mv.get_child("freq").and_then(value_of);
        report.motion_ampl = mv.get_child("ampl").and_then(value_of);
    }

    report
}

/// Value of the first `<parameter>` anywhere in the document whose key
/// matches case-insensitively.
fn param_value(root: &Element, key: &str) -> Option<String> {
    for child in &root.children {
        if let XMLNode::Element(e) = child {
            if e.name == "parameter" {
                let matches = e
                    .attributes
                    .get("key")
                    .map(|k| k.eq_ignore_ascii_case(key))
                    .unwrap_or(false);
                if matches {
                    return e.attributes.get("value").cloned();
                }
            }
            if let Some(v) = param_value(e, key) {
                return Some(v);
            }
        }
    }
    None
}

/// Cases without a TimeMax parameter sometimes carry the end time as a
/// bare `<tmax>` node, possibly nested under `<time>` or `<simulation>`.
fn tmax_fallback(root: &Element) -> Option<String> {
    let candidates = [
        find_descendant(root, "tmax"),
        find_descendant(root, "time").and_then(|t| find_descendant(t, "tmax")),
        find_descendant(root, "simulation").and_then(|s| find_descendant(s, "tmax")),
    ];
    for node in candidates.into_iter().flatten() {
        if let Some(v) = value_of(node) {
            return Some(v);
        }
    }
    None
}
