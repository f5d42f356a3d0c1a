//! Argument decoding for agent calls.
//!
//! ConnMan calls the agent with one of two argument shapes:
//!
//! - `(os)`: service path and error string (`ReportError`)
//! - `(oa{sv})`: service path and a map of requested fields (`RequestInput`)
//!
//! The decoder recognizes the shape from the arguments' structure alone and
//! pulls out what it can. It never fails: unknown shapes and value types are
//! recorded as diagnostics and the caller still dispatches on the method name.

use log::{debug, warn};

use crate::api::models::{DecodeDiagnostic, DecodedRequest, RawEntry, RequestShape};
use crate::types::constants::field;
use crate::types::payload::{self, Payload};

/// Decodes a call's arguments into a [`DecodedRequest`].
///
/// The arguments are only borrowed; nothing from them is retained beyond the
/// owned copies placed in the returned record.
pub fn decode(args: &[Payload]) -> DecodedRequest {
    let mut req = DecodedRequest::default();

    match args {
        [Payload::ObjectPath(path), Payload::Str(error)] => {
            debug!("Object path:{}", path.as_str());
            debug!("Error:{error}");
            req.shape = Some(RequestShape::ObjectWithErrorString);
            req.object_id = Some(path.clone());
            req.error_message = Some(error.clone());
        }
        [Payload::ObjectPath(path), Payload::Map(fields)] => {
            debug!("Object path:{}", path.as_str());
            req.shape = Some(RequestShape::ObjectWithFieldMap);
            req.object_id = Some(path.clone());
            decode_fields(fields, &mut req);
        }
        _ => {
            let sig = payload::signature(args);
            debug!("Unrecognized invocation parameters: {sig}");
            req.diagnostics
                .push(DecodeDiagnostic::UnrecognizedSignature(sig));
        }
    }

    req
}

/// Walks the outer `a{sv}` of a `RequestInput` call.
fn decode_fields(fields: &[(String, Payload)], req: &mut DecodedRequest) {
    for (name, value) in fields {
        debug!("{name}[{}]", value.signature());
        match value {
            Payload::Map(inner) => decode_field_map(name, inner, req),
            other => unhandled(req, name, None, other),
        }
    }
}

/// Walks one field's nested `a{sv}`, e.g. `{"Type": "psk", ...}`.
fn decode_field_map(name: &str, inner: &[(String, Payload)], req: &mut DecodedRequest) {
    for (key, value) in inner {
        match value {
            Payload::Str(s) => {
                debug!("{key}[s] = {s}");
                if key == field::TYPE {
                    req.requested_type = Some(s.clone());
                }
                req.entries.push(RawEntry {
                    field: name.to_string(),
                    key: key.clone(),
                    type_tag: value.signature(),
                    value: s.clone(),
                });
            }
            other => unhandled(req, name, Some(key.as_str()), other),
        }
    }
}

fn unhandled(req: &mut DecodedRequest, field: &str, key: Option<&str>, value: &Payload) {
    let diag = DecodeDiagnostic::UnhandledType {
        field: field.to_string(),
        key: key.map(str::to_string),
        type_tag: value.signature(),
    };
    warn!("{diag}");
    req.diagnostics.push(diag);
}
