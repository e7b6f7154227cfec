use xmltree::{Element, XMLNode};

use crate::casedef::{
    ensure_execution_mut, ensure_params_mut, find_descendant_mut, find_nested_mut, set_attr,
    set_text, text_of, visit_named_mut, CaseDoc,
};
use crate::units::AngleUnit;
use crate::utils::fmt_g;

/// Changes one patch pass made, one line per change. Empty means the
/// document already carried the requested values.
#[derive(Debug, Default, Clone)]
pub struct PatchLog {
    entries: Vec<String>,
}

impl PatchLog {
    fn note(&mut self, entry: String) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn changed(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Injects `dp` everywhere the toolchain might read it from: the
/// `<execution>` parameter list, every `<geometry><definition dp=...>`,
/// the dp child nodes under the first definition and under `<constants>`,
/// and finally any other dp-named element or `name="dp"` attribute holder
/// outside the parameter list.
///
/// Applying the same dp twice yields an empty log.
pub fn update_dp(doc: &mut CaseDoc, dp: f64) -> PatchLog {
    let mut log = PatchLog::default();
    let new_val = fmt_g(dp);

    // The solver reads Dp from its parameter list; VResId -1 disables
    // variable-resolution lookups that would override it.
    // The solver also needs execution/constants; a case without one gets an
    // empty section that the dp upsert below fills.
    {
        let exec = ensure_execution_mut(&mut doc.root);
        if exec.get_child("constants").is_none() {
            exec.children.push(XMLNode::Element(Element::new("constants")));
            log.note("! Created missing <constants> section".to_string());
        }
    }

    {
        let params = ensure_params_mut(&mut doc.root);
        ensure_param(params, "VResId", -1.0, &mut log);
        ensure_param(params, "Dp", dp, &mut log);
        ensure_param(params, "DP", dp, &mut log);
    }

    // The case generator reads the definition attribute.
    visit_named_mut(&mut doc.root, "geometry", &mut |geo| {
        for node in geo.children.iter_mut() {
            if let XMLNode::Element(def) = node {
                if def.name != "definition" {
                    continue;
                }
                let old = def.attributes.get("dp").cloned();
                if old.as_deref() != Some(new_val.as_str()) {
                    let was = old.as_deref().unwrap_or("unset").to_string();
                    set_attr(def, "dp", &new_val);
                    set_attr(def, "comment", &format!("Custom dp from batch (was {})", was));
                    log.note(format!(
                        "* Updated geometry/definition dp: {} -> {}",
                        was, new_val
                    ));
                }
            }
        }
    });

    if let Some(def) = find_nested_mut(&mut doc.root, "geometry", "definition") {
        upsert_dp_child(def, &new_val, "geometry/definition", &mut log);
    }

    if let Some(constants) = find_descendant_mut(&mut doc.root, "constants") {
        upsert_dp_child(constants, &new_val, "constants", &mut log);
    }

    walk_generic_dp(&mut doc.root, false, &new_val, &mut log);
    log
}

/// Upserts the TimeMax parameter. Leaves the document untouched when the
/// value is already the requested one.
pub fn update_time_max(doc: &mut CaseDoc, t_end: f64) -> PatchLog {
    let mut log = PatchLog::default();
    let new_val = fmt_g(t_end);
    let params = ensure_params_mut(&mut doc.root);
    match find_param_mut(params, "TimeMax") {
        None => {
            let mut p = Element::new("parameter");
            set_attr(&mut p, "key", "TimeMax");
            set_attr(&mut p, "value", &new_val);
            set_attr(&mut p, "comment", "Set by batch script (was unset)");
            params.children.push(XMLNode::Element(p));
            log.note(format!("+ Created parameter TimeMax={}", new_val));
        }
        Some(p) => {
            let old = p.attributes.get("value").cloned();
            if old.as_deref() != Some(new_val.as_str()) {
                let was = old.as_deref().unwrap_or("unset").to_string();
                set_attr(p, "value", &new_val);
                set_attr(p, "comment", &format!("Set by batch script (was {})", was));
                log.note(format!("* Updated parameter TimeMax: {} -> {}", was, new_val));
            }
        }
    }
    log
}

/// Rewrites every `<mvrotsinu>` rotation block: sets the angle units,
/// the duration when non-negative, and replaces the freq/ampl children.
/// Returns how many blocks were touched (0 when the case has no motion).
pub fn update_rotation(
    doc: &mut CaseDoc,
    freq_hz: f64,
    ampl: f64,
    unit: AngleUnit,
    duration: f64,
) -> usize {
    let mut updated = 0;
    visit_named_mut(&mut doc.root, "mvrotsinu", &mut |mv| {
        set_attr(mv, "anglesunits", unit.label());
        if duration >= 0.0 {
            set_attr(mv, "duration", &fmt_g(duration));
        }
        mv.children
            .retain(|c| !matches!(c, XMLNode::Element(e) if e.name == "freq" || e.name == "ampl"));

        let mut freq = Element::new("freq");
        set_attr(&mut freq, "v", &fmt_g(freq_hz));
        set_attr(&mut freq, "units_comment", "1/s");
        mv.children.push(XMLNode::Element(freq));

        let mut ampl_node = Element::new("ampl");
        set_attr(&mut ampl_node, "v", &fmt_g(ampl));
        set_attr(&mut ampl_node, "units_comment", unit.label());
        mv.children.push(XMLNode::Element(ampl_node));

        updated += 1;
    });
    updated
}

/// Case-insensitive key lookup among direct `<parameter>` children.
fn find_param_mut<'a>(params: &'a mut Element, key: &str) -> Option<&'a mut Element> {
    params.children.iter_mut().find_map(|c| match c {
        XMLNode::Element(e)
            if e.name == "parameter"
                && e.attributes
                    .get("key")
                    .map(|k| k.eq_ignore_ascii_case(key))
                    .unwrap_or(false) =>
        {
            Some(e)
        }
        _ => None,
    })
}

fn ensure_param(params: &mut Element, key: &str, value: f64, log: &mut PatchLog) {
    let new_val = fmt_g(value);
    match find_param_mut(params, key) {
        None => {
            let mut p = Element::new("parameter");
            set_attr(&mut p, "key", key);
            set_attr(&mut p, "value", &new_val);
            set_attr(&mut p, "comment", "Custom value from batch script");
            params.children.push(XMLNode::Element(p));
            log.note(format!("+ Created parameter {}={}", key, new_val));
        }
        Some(p) => {
            let old = p.attributes.get("value").cloned();
            if old.as_deref() != Some(new_val.as_str()) {
                let was = old.as_deref().unwrap_or("unset").to_string();
                set_attr(p, "value", &new_val);
                set_attr(p, "comment", &format!("Updated from batch script (was {})", was));
                log.note(format!("* Updated parameter {}: {} -> {}", key, was, new_val));
            }
        }
    }
}

/// Sets a dp child node (spelled `lattice_dp` in older cases) under
/// `parent`, writing both the `v` attribute and the text content.
fn upsert_dp_child(parent: &mut Element, new_val: &str, where_: &str, log: &mut PatchLog) {
    let has_lattice = parent.get_child("lattice_dp").is_some();
    if !has_lattice && parent.get_child("dp").is_none() {
        let mut node = Element::new("dp");
        node.attributes.insert("v".into(), new_val.to_string());
        node.children.push(XMLNode::Text(new_val.to_string()));
        parent.children.push(XMLNode::Element(node));
        log.note(format!("+ Created {}/dp = {}", where_, new_val));
        return;
    }
    let name = if has_lattice { "lattice_dp" } else { "dp" };
    let node = parent.get_mut_child(name).unwrap();
    let old = match node.attributes.get("v") {
        Some(v) if !v.is_empty() => v.clone(),
        _ => text_of(node),
    };
    if old != new_val {
        set_attr(node, "v", new_val);
        set_text(node, new_val);
        log.note(format!("* Updated {}/dp: {} -> {}", where_, old, new_val));
    }
}

/// Last-resort dp pass: any element named `dp`, or carrying a
/// `name="dp"`/`Name="dp"` attribute, gets the value too. Anything under a
/// `<parameters>` element is skipped since the parameter pass owns those.
fn walk_generic_dp(el: &mut Element, under_parameters: bool, new_val: &str, log: &mut PatchLog) {
    for node in el.children.iter_mut() {
        if let XMLNode::Element(e) = node {
            let inside = under_parameters || e.name == "parameters";
            if !inside && is_generic_dp(e) {
                apply_generic_dp(e, new_val, log);
            }
            walk_generic_dp(e, inside, new_val, log);
        }
    }
}

fn is_generic_dp(e: &Element) -> bool {
    e.name == "dp"
        || e.attributes.get("name").map(String::as_str) == Some("dp")
        || e.attributes.get("Name").map(String::as_str) == Some("dp")
}

fn apply_generic_dp(e: &mut Element, new_val: &str, log: &mut PatchLog) {
    let label = if e.name == "dp" {
        "dp element".to_string()
    } else {
        format!("{}[@name='dp']", e.name)
    };
    if let Some(old) = e.attributes.get("v").cloned() {
        if old != new_val {
            set_attr(e, "v", new_val);
            log.note(format!("* Updated {} v attribute: {} -> {}", label, old, new_val));
        }
    } else if e.children.iter().all(|c| !matches!(c, XMLNode::Element(_))) {
        let old = text_of(e);
        if old != new_val {
            set_text(e, new_val);
            log.note(format!("* Updated {} text: {} -> {}", label, old, new_val));
        }
    }
}
