//! Interface descriptors: naming the positional fields of parsed CLI rows
//!
//! The array describes the layout of each structured command's output via the
//! `gettpdinterface` command. Its rows are turned into [`Descriptor`]s here,
//! and [`project`] walks a descriptor against a parsed row to produce the
//! JSON-shaped record the WSAPI path would have returned.

use serde_json::{Map, Value};

use crate::error::ProtocolError;
use crate::tcl::TclNode;

/// One entry of a descriptor: how to name the next positional field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKey {
    /// Plain key: the raw field is taken as-is
    Scalar(String),
    /// Nested block: the raw field is a sub-list projected with `sub_keys`
    Nested {
        /// Key under which the projected records are stored
        header: String,
        /// Keys for the positional fields of each inner record
        sub_keys: Vec<String>,
    },
}

/// Field layout for one structured command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Keys in output order
    pub keys: Vec<FieldKey>,
}

/// Field key that carries an embedded IP record, expanded through the
/// descriptor named by [`IP_DESCRIPTOR`].
const EMBEDDED_IP_KEY: &str = "IpInfo";

/// Descriptor consulted to expand embedded IP records
pub const IP_DESCRIPTOR: &str = "getfsip";

/// Build `(command, descriptor)` pairs from parsed `gettpdinterface` rows.
///
/// Each row's first field is the command name; remaining scalar fields become
/// plain keys and remaining sub-lists become nested keys (first element is
/// the header, the rest are the inner keys). Callers filter the output
/// against their command allow-list.
pub fn parse_interfaces(items: &[TclNode]) -> Result<Vec<(String, Descriptor)>, ProtocolError> {
    let mut interfaces = Vec::with_capacity(items.len());

    for item in items {
        let fields = item.as_list().ok_or_else(|| {
            ProtocolError::MalformedInterface("interface row is not a list".to_string())
        })?;
        let mut fields = fields.iter();

        let name = fields
            .next()
            .and_then(TclNode::as_word)
            .ok_or_else(|| {
                ProtocolError::MalformedInterface(
                    "interface row does not start with a command name".to_string(),
                )
            })?
            .to_string();

        let mut keys = Vec::new();
        for field in fields {
            match field {
                TclNode::Word(key) => keys.push(FieldKey::Scalar(key.clone())),
                TclNode::List(parts) => {
                    let mut words = parts.iter().filter_map(TclNode::as_word);
                    let header = words.next().ok_or_else(|| {
                        ProtocolError::MalformedInterface(format!(
                            "empty nested key in interface for '{name}'"
                        ))
                    })?;
                    keys.push(FieldKey::Nested {
                        header: header.to_string(),
                        sub_keys: words.map(str::to_string).collect(),
                    });
                }
            }
        }

        interfaces.push((name, Descriptor { keys }));
    }

    Ok(interfaces)
}

/// Project one parsed row into a JSON record using `descriptor`.
///
/// Walks the descriptor in order, consuming one raw field per key. `lookup`
/// resolves secondary descriptors (currently only the embedded-IP expansion);
/// passing a closure that always returns `None` disables that hook.
pub fn project<F>(descriptor: &Descriptor, raw: &[TclNode], lookup: F) -> Value
where
    F: Fn(&str) -> Option<Descriptor>,
{
    let mut record = Map::new();
    let mut fields = raw.iter();

    for key in &descriptor.keys {
        let Some(field) = fields.next() else {
            break;
        };

        match key {
            FieldKey::Scalar(name) => {
                let value = scalar_value(name, field, &lookup as &dyn Fn(&str) -> Option<Descriptor>);
                record.insert(name.clone(), value);
            }
            FieldKey::Nested { header, sub_keys } => {
                record.insert(header.clone(), project_rows(sub_keys, field));
            }
        }
    }

    Value::Object(record)
}

/// Value for a plain key, applying the comment-join and IP-expansion hooks
fn scalar_value(
    name: &str,
    field: &TclNode,
    lookup: &dyn Fn(&str) -> Option<Descriptor>,
) -> Value {
    if name == "comment" {
        if let TclNode::List(parts) = field {
            return Value::String(join_tokens(parts));
        }
    }

    if name == EMBEDDED_IP_KEY {
        if let Some(ip_descriptor) = lookup(IP_DESCRIPTOR) {
            if let TclNode::List(rows) = field {
                let records: Vec<Value> = match rows.first() {
                    Some(TclNode::List(_)) => rows
                        .iter()
                        .map(|row| {
                            let inner = row.as_list().unwrap_or(std::slice::from_ref(row));
                            project(&ip_descriptor, inner, lookup)
                        })
                        .collect(),
                    _ => vec![project(&ip_descriptor, rows, lookup)],
                };
                return Value::Array(records);
            }
        }
    }

    node_value(field)
}

/// Project a raw field into a list of records keyed by `sub_keys`.
///
/// A scalar binds the first key; a list of scalars zips into one record; a
/// list of lists yields one record per inner list.
fn project_rows(sub_keys: &[String], field: &TclNode) -> Value {
    let records = match field {
        TclNode::Word(w) => {
            vec![zip_record(sub_keys, std::slice::from_ref(&TclNode::Word(w.clone())))]
        }
        TclNode::List(items) => {
            if items.iter().any(|item| matches!(item, TclNode::List(_))) {
                items
                    .iter()
                    .map(|inner| match inner {
                        TclNode::List(values) => zip_record(sub_keys, values),
                        TclNode::Word(_) => zip_record(sub_keys, std::slice::from_ref(inner)),
                    })
                    .collect()
            } else {
                vec![zip_record(sub_keys, items)]
            }
        }
    };

    Value::Array(records)
}

/// Pair positional values with their keys; extra values or keys are dropped
fn zip_record(sub_keys: &[String], values: &[TclNode]) -> Value {
    let mut record = Map::new();
    for (key, value) in sub_keys.iter().zip(values.iter()) {
        record.insert(key.clone(), node_value(value));
    }
    Value::Object(record)
}

/// Raw JSON rendering of a node: tokens become strings, lists become arrays
fn node_value(node: &TclNode) -> Value {
    match node {
        TclNode::Word(w) => Value::String(w.clone()),
        TclNode::List(items) => Value::Array(items.iter().map(node_value).collect()),
    }
}

/// Join comment tokens back into a single string.
///
/// Nested lists keep their braces so no content is lost.
fn join_tokens(parts: &[TclNode]) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        match part {
            TclNode::Word(w) => out.push_str(w),
            TclNode::List(items) => {
                out.push('{');
                out.push_str(&join_tokens(items));
                out.push('}');
            }
        }
    }
    out
}
