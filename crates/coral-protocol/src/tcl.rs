//! TCL brace-list parser for array CLI output
//!
//! The array CLI, once `setclienv csvtable 1` is in effect, emits structured
//! data as nested TCL brace lists. This parser materializes three list levels
//! below the outer container (top item, sub, sub-sub); anything nested deeper
//! is kept verbatim as an opaque token that callers can re-parse if needed.
//! The depth cap keeps parsing O(n) and bounds memory against hostile input.

use crate::error::ProtocolError;

/// A parsed TCL value: a bare token or a brace-delimited list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TclNode {
    /// A scalar token
    Word(String),
    /// A brace-delimited list of nodes
    List(Vec<TclNode>),
}

impl TclNode {
    /// The token if this node is a scalar
    pub fn as_word(&self) -> Option<&str> {
        match self {
            TclNode::Word(w) => Some(w),
            TclNode::List(_) => None,
        }
    }

    /// The elements if this node is a list
    pub fn as_list(&self) -> Option<&[TclNode]> {
        match self {
            TclNode::Word(_) => None,
            TclNode::List(items) => Some(items),
        }
    }
}

/// Deepest brace level that is materialized as a list.
///
/// Level 1 is the outer container (it becomes the returned sequence itself),
/// levels 2..=4 are top item, sub, and sub-sub. A brace opened at level 4
/// starts an opaque token instead of a fifth list level.
const MAX_LIST_DEPTH: usize = 4;

/// Parse CLI output into its sequence of top items.
///
/// The outermost brace layer of the input is the result container: its
/// elements are the returned top items. Input without any braces yields an
/// empty sequence (upstream treats such output as a plain message).
/// Unbalanced braces are an error. Tokens outside all braces are discarded.
pub fn parse(input: &str) -> Result<Vec<TclNode>, ProtocolError> {
    let mut result: Vec<TclNode> = Vec::new();
    // Open lists at levels 2..=4; level-1 content goes straight into `result`.
    let mut stack: Vec<Vec<TclNode>> = Vec::new();
    let mut token: Option<String> = None;
    let mut depth: usize = 0;
    // Non-zero while capturing an opaque group below the materialized levels
    let mut opaque_depth: usize = 0;

    for (position, c) in input.char_indices() {
        if opaque_depth > 0 {
            token.get_or_insert_with(String::new).push(c);
            match c {
                '{' => opaque_depth += 1,
                '}' => opaque_depth -= 1,
                _ => {}
            }
            continue;
        }

        match c {
            '{' => {
                if depth == MAX_LIST_DEPTH {
                    // Too deep to materialize: keep the group verbatim
                    token.get_or_insert_with(String::new).push(c);
                    opaque_depth = 1;
                } else {
                    flush(&mut token, depth, &mut stack, &mut result);
                    depth += 1;
                    if depth >= 2 {
                        stack.push(Vec::new());
                    }
                }
            }
            '}' => {
                if depth == 0 {
                    return Err(ProtocolError::UnexpectedClose { position });
                }
                flush(&mut token, depth, &mut stack, &mut result);
                if depth >= 2 {
                    let closed = TclNode::List(stack.pop().unwrap_or_default());
                    match stack.last_mut() {
                        Some(parent) => parent.push(closed),
                        None => result.push(closed),
                    }
                }
                depth -= 1;
            }
            ' ' | '\t' | '\n' | '\r' => {
                flush(&mut token, depth, &mut stack, &mut result);
            }
            _ => {
                token.get_or_insert_with(String::new).push(c);
            }
        }
    }

    if depth > 0 || opaque_depth > 0 {
        return Err(ProtocolError::UnclosedGroup {
            depth: depth + opaque_depth,
        });
    }

    Ok(result)
}

/// Append a pending token to the innermost open list.
///
/// Tokens at level 1 are scalar top items; tokens at level 0 (outside all
/// braces) are discarded.
fn flush(
    token: &mut Option<String>,
    depth: usize,
    stack: &mut [Vec<TclNode>],
    result: &mut Vec<TclNode>,
) {
    if let Some(word) = token.take() {
        if depth == 0 {
            return;
        }
        match stack.last_mut() {
            Some(list) => list.push(TclNode::Word(word)),
            None => result.push(TclNode::Word(word)),
        }
    }
}

/// Render a sequence of top items back to TCL brace-list text.
///
/// Inverse of [`parse`] for structures within the materialized depth.
pub fn serialize(items: &[TclNode]) -> String {
    let mut out = String::from("{");
    write_nodes(items, &mut out);
    out.push('}');
    out
}

fn write_nodes(nodes: &[TclNode], out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        match node {
            TclNode::Word(w) => out.push_str(w),
            TclNode::List(items) => {
                out.push('{');
                write_nodes(items, out);
                out.push('}');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(s: &str) -> TclNode {
        TclNode::Word(s.to_string())
    }

    fn list(items: Vec<TclNode>) -> TclNode {
        TclNode::List(items)
    }

    #[test]
    fn test_parse_two_top_items() {
        let parsed = parse("{{a 1} {b {x y}}}").unwrap();
        assert_eq!(
            parsed,
            vec![
                list(vec![word("a"), word("1")]),
                list(vec![word("b"), list(vec![word("x"), word("y")])]),
            ]
        );
    }

    #[test]
    fn test_parse_no_braces_is_empty() {
        assert!(parse("Error: foo not found").unwrap().is_empty());
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_empty_braces_yield_empty_list() {
        let parsed = parse("{{a {}}}").unwrap();
        assert_eq!(parsed, vec![list(vec![word("a"), list(vec![])])]);
    }

    #[test]
    fn test_parse_scalar_top_item() {
        let parsed = parse("{a {b c}}").unwrap();
        assert_eq!(parsed, vec![word("a"), list(vec![word("b"), word("c")])]);
    }

    #[test]
    fn test_parse_multiple_containers_merge() {
        let parsed = parse("{{a 1}} {{b 2}}").unwrap();
        assert_eq!(
            parsed,
            vec![
                list(vec![word("a"), word("1")]),
                list(vec![word("b"), word("2")]),
            ]
        );
    }

    #[test]
    fn test_parse_sub_sub_level_materialized() {
        let parsed = parse("{{a {b {c d}}}}").unwrap();
        assert_eq!(
            parsed,
            vec![list(vec![
                word("a"),
                list(vec![word("b"), list(vec![word("c"), word("d")])]),
            ])]
        );
    }

    #[test]
    fn test_parse_deep_nesting_kept_opaque() {
        // The group below sub-sub keeps braces and interior whitespace
        let parsed = parse("{{a {b {c {d  e}}}}}").unwrap();
        assert_eq!(
            parsed,
            vec![list(vec![
                word("a"),
                list(vec![word("b"), list(vec![word("c"), word("{d  e}")])]),
            ])]
        );
    }

    #[test]
    fn test_parse_unbalanced_open() {
        assert!(matches!(
            parse("{{a 1}"),
            Err(ProtocolError::UnclosedGroup { .. })
        ));
    }

    #[test]
    fn test_parse_unbalanced_close() {
        assert!(matches!(
            parse("{a 1}}"),
            Err(ProtocolError::UnexpectedClose { .. })
        ));
    }

    #[test]
    fn test_roundtrip_within_depth_cap() {
        let items = vec![
            list(vec![word("a"), word("1")]),
            list(vec![
                word("b"),
                list(vec![word("x"), list(vec![word("y"), word("z")])]),
            ]),
        ];
        assert_eq!(parse(&serialize(&items)).unwrap(), items);
    }

    #[test]
    fn test_whitespace_variants_separate_tokens() {
        let parsed = parse("{{a\t1}\n{b   2}}").unwrap();
        assert_eq!(
            parsed,
            vec![
                list(vec![word("a"), word("1")]),
                list(vec![word("b"), word("2")]),
            ]
        );
    }
}
