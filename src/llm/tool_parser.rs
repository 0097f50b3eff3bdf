//! Tool parser for extracting a tool call from free-text model output
//!
//! The model answers with one XML-ish block per turn:
//!
//! ```text
//! <write_file><path>a.py</path><content>print(1)</content></write_file>
//! ```
//!
//! Only the first complete `<name>...</name>` block is honored. Its inner
//! content is parsed as XML; each immediate child element becomes one
//! parameter. Markup that is not well formed yields no parameters rather
//! than an error.

use std::sync::LazyLock;

use regex::Regex;

use crate::llm::types::{Parameters, ToolInvocation};

static OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([a-z_]+)>").expect("tool tag pattern is valid"));

/// Extract at most one tool invocation from a raw model response
///
/// Returns `ToolInvocation::none()` when no tag pair is present. Unknown tool
/// names still produce an invocation so the dispatcher can report them.
pub fn parse_invocation(response: &str) -> ToolInvocation {
    match find_tool_block(response) {
        Some((name, inner)) => ToolInvocation::new(name, parse_parameters(name, inner)),
        None => ToolInvocation::none(),
    }
}

/// Locate the first `<name>` that has a matching `</name>` after it
///
/// The inner content ends at the nearest closing tag, so nested blocks of
/// the same name are not balanced.
fn find_tool_block(response: &str) -> Option<(&str, &str)> {
    for caps in OPEN_TAG.captures_iter(response) {
        let open = caps.get(0)?;
        let name = caps.get(1)?.as_str();
        let close = format!("</{}>", name);
        let rest = &response[open.end()..];
        if let Some(pos) = rest.find(&close) {
            return Some((name, &rest[..pos]));
        }
    }
    None
}

/// Parse the children of a tool block into a parameter map
fn parse_parameters(name: &str, inner: &str) -> Parameters {
    let wrapped = format!("<{name}>{inner}</{name}>");
    let doc = match roxmltree::Document::parse(&wrapped) {
        Ok(doc) => doc,
        Err(e) => {
            log::debug!("Malformed parameters in <{}> block: {}", name, e);
            return Parameters::new();
        }
    };

    doc.root_element()
        .children()
        .filter(|node| node.is_element())
        .map(|node| {
            let value = node.text().map(str::trim).unwrap_or_default();
            (node.tag_name().name().to_string(), value.to_string())
        })
        .collect()
}
