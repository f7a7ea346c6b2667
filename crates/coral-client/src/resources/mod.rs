//! Resource-specific operations layered on the dispatcher
//!
//! Each module wraps one resource family. Wrappers are thin: they name the
//! transport realization they use and delegate to the collaborator surface
//! of [`crate::CoralClient`].

pub mod cpgs;
pub mod filepersona;
pub mod hosts;
pub mod qos;
pub mod remotecopy;
pub mod sets;
pub mod system;
pub mod vluns;
pub mod volumes;

use serde_json::Value;

/// Merge caller-supplied optional fields into a request body
pub(crate) fn merge_optional(body: &mut Value, optional: Option<&Value>) {
    if let (Value::Object(target), Some(Value::Object(extra))) = (body, optional) {
        for (k, v) in extra {
            target.insert(k.clone(), v.clone());
        }
    }
}
