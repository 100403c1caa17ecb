//! Path template matching.
//!
//! Applications register templates such as `/vlan/{id}/member/{port}`.
//! A concrete request path is matched segment by segment; `{name}` segments
//! capture the corresponding path segment as a variable.

use std::collections::BTreeMap;

/// A request path resolved against a registered template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInfo {
    /// The concrete path as received.
    pub path: String,
    /// The template that matched (e.g., `/vlan/{id}`).
    pub template: String,
    /// Captured variables by name.
    pub vars: BTreeMap<String, String>,
}

impl PathInfo {
    /// Builds a path info from an already known template and variables.
    pub fn new<I, K, V>(template: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let template = template.into();
        let vars: BTreeMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            path: expand(&template, &vars),
            template,
            vars,
        }
    }

    /// Matches `path` against `templates`, returning the first match.
    ///
    /// A trailing slash on the path is ignored. Returns `None` when the path
    /// is not absolute or no template has the same shape.
    pub fn match_path(path: &str, templates: &[&str]) -> Option<Self> {
        let segments = split(path)?;

        templates.iter().find_map(|template| {
            let pattern = split(template)?;
            if pattern.len() != segments.len() {
                return None;
            }

            let mut vars = BTreeMap::new();
            for (pat, seg) in pattern.iter().zip(&segments) {
                match var_name(pat) {
                    Some(name) if !seg.is_empty() => {
                        vars.insert(name.to_string(), seg.to_string());
                    }
                    Some(_) => return None,
                    None if pat == seg => {}
                    None => return None,
                }
            }

            Some(Self {
                path: path.to_string(),
                template: template.to_string(),
                vars,
            })
        })
    }

    /// Returns a captured variable.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

/// Splits an absolute path into segments; `None` if it lacks the leading `/`.
fn split(path: &str) -> Option<Vec<&str>> {
    let rest = path.trim_end_matches('/').strip_prefix('/')?;
    Some(rest.split('/').collect())
}

fn var_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

fn expand(template: &str, vars: &BTreeMap<String, String>) -> String {
    split(template)
        .unwrap_or_default()
        .iter()
        .map(|seg| match var_name(seg).and_then(|name| vars.get(name)) {
            Some(value) => format!("/{}", value),
            None => format!("/{}", seg),
        })
        .collect()
}
