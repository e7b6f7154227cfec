use xmltree::{Element, XMLNode};

use crate::casedef::{ensure_child_mut, ensure_execution_mut, find_nested, CaseDoc};

/// Makes sure the variant document keeps the `<execution>` sections the
/// solver refuses to run without, pulling them from the source case when
/// the variant lost them. Existing sections in the variant are never
/// overwritten. Returns one note per repair performed.
pub fn preserve_critical_sections(variant: &mut CaseDoc, source: &CaseDoc) -> Vec<String> {
    let mut notes = Vec::new();

    let src_constants = find_nested(&source.root, "execution", "constants").cloned();
    let src_constantsdef = find_nested(&source.root, "casedef", "constantsdef").cloned();
    let src_special = find_nested(&source.root, "execution", "special").cloned();
    let src_particles = find_nested(&source.root, "execution", "particles").cloned();

    let exec = ensure_execution_mut(&mut variant.root);

    match src_constants {
        Some(constants) => {
            if exec.get_child("constants").is_none() {
                exec.children.push(XMLNode::Element(constants));
                notes.push("! Copied <constants> section from original XML".to_string());
            }
        }
        None => match src_constantsdef {
            Some(cdef) => {
                // Pre-generation cases keep their constants under
                // <casedef><constantsdef>; the solver wants <constants>.
                // dp is excluded since the patcher owns that value.
                notes.push(
                    "! Found <constantsdef> in source, converting to <constants> format"
                        .to_string(),
                );
                let constants = ensure_child_mut(exec, "constants");
                for child in &cdef.children {
                    if let XMLNode::Element(e) = child {
                        if e.name != "dp" {
                            constants.children.push(XMLNode::Element(e.clone()));
                        }
                    }
                }
            }
            None => {
                if exec.get_child("constants").is_none() {
                    exec.children.push(XMLNode::Element(Element::new("constants")));
                    notes.push(
                        "! Created empty <constants> section (none in original)".to_string(),
                    );
                }
            }
        },
    }

    if exec.get_child("special").is_none() {
        match src_special {
            Some(special) => {
                exec.children.push(XMLNode::Element(special));
                notes.push("! Copied <special> section from original XML".to_string());
            }
            None => {
                exec.children.push(XMLNode::Element(Element::new("special")));
                notes.push("! Created minimal <special> section".to_string());
            }
        }
    }

    if exec.get_child("particles").is_none() {
        if let Some(particles) = src_particles {
            exec.children.push(XMLNode::Element(particles));
            notes.push("! Copied <particles> section from original XML".to_string());
        }
    }

    notes
}
