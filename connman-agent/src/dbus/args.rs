//! Reading call arguments off the wire.
//!
//! Arguments are read straight from the message body, guided by its
//! signature. Field maps keep their wire order and repeated keys, and a
//! variant is only looked into where the agent protocol puts one: as the
//! value of an `a{sv}`. Anywhere else it stays opaque.

use std::fmt;

use log::debug;
use serde::Deserialize;
use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use zbus::Message;
use zvariant::{DynamicDeserialize, DynamicType, OwnedObjectPath, Signature};

use crate::types::payload::Payload;

/// Extracts a call's arguments in tagged form.
///
/// A call without arguments, or whose body cannot be read, yields no
/// arguments; the decoder treats that like any other unrecognized shape.
pub fn call_args(msg: &Message) -> Vec<Payload> {
    let body = msg.body();
    if matches!(body.signature(), Signature::Unit) {
        return Vec::new();
    }
    match body.deserialize::<CallArgs>() {
        Ok(call) => call.args,
        Err(e) => {
            debug!("No readable arguments ({}): {e}", body.signature());
            Vec::new()
        }
    }
}

/// A message body read as a list of tagged arguments.
struct CallArgs {
    signature: Signature,
    args: Vec<Payload>,
}

impl DynamicType for CallArgs {
    fn signature(&self) -> Signature {
        self.signature.clone()
    }
}

impl<'de> DynamicDeserialize<'de> for CallArgs {
    type Deserializer = CallArgsSeed;

    fn deserializer_for_signature(signature: &Signature) -> zvariant::Result<CallArgsSeed> {
        // a single-argument body is not wrapped in a structure
        let signature = match signature {
            Signature::Structure(_) => signature.clone(),
            single => Signature::structure([single.clone()]),
        };
        Ok(CallArgsSeed { signature })
    }
}

struct CallArgsSeed {
    signature: Signature,
}

impl DynamicType for CallArgsSeed {
    fn signature(&self) -> Signature {
        self.signature.clone()
    }
}

impl<'de> DeserializeSeed<'de> for CallArgsSeed {
    type Value = CallArgs;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<CallArgs, D::Error> {
        let args = deserializer.deserialize_seq(ArgsVisitor {
            signature: &self.signature,
        })?;
        Ok(CallArgs {
            signature: self.signature,
            args,
        })
    }
}

struct ArgsVisitor<'s> {
    signature: &'s Signature,
}

impl<'de> Visitor<'de> for ArgsVisitor<'_> {
    type Value = Vec<Payload>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call arguments of type {}", self.signature)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<Payload>, A::Error> {
        let Signature::Structure(fields) = self.signature else {
            return Ok(Vec::new());
        };
        let mut args = Vec::new();
        for field in fields.iter() {
            match seq.next_element_seed(PayloadSeed::new(field))? {
                Some(arg) => args.push(arg),
                None => break,
            }
        }
        Ok(args)
    }
}

/// Reads one value of a known signature into a [`Payload`].
struct PayloadSeed<'s> {
    signature: &'s Signature,
    /// Set for the values of an `a{sv}`, where the variant is part of the protocol.
    in_field_map: bool,
}

impl<'s> PayloadSeed<'s> {
    fn new(signature: &'s Signature) -> Self {
        Self {
            signature,
            in_field_map: false,
        }
    }

    fn field_value(signature: &'s Signature) -> Self {
        Self {
            signature,
            in_field_map: true,
        }
    }
}

impl<'de> DeserializeSeed<'de> for PayloadSeed<'_> {
    type Value = Payload;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Payload, D::Error> {
        match self.signature {
            Signature::Str => String::deserialize(deserializer).map(Payload::Str),
            Signature::ObjectPath => {
                OwnedObjectPath::deserialize(deserializer).map(Payload::ObjectPath)
            }
            Signature::Bool => bool::deserialize(deserializer).map(Payload::Bool),
            Signature::Variant if self.in_field_map => deserializer.deserialize_seq(VariantVisitor),
            Signature::Dict { key, value }
                if matches!(key.signature(), Signature::Str)
                    && matches!(value.signature(), Signature::Variant) =>
            {
                deserializer.deserialize_map(FieldMapVisitor {
                    value: value.signature(),
                })
            }
            Signature::Array(element) => deserializer.deserialize_seq(SeqVisitor {
                element: element.signature(),
            }),
            other => {
                IgnoredAny::deserialize(deserializer)?;
                Ok(Payload::Other(other.to_string()))
            }
        }
    }
}

/// A variant's content, read with the signature it carries.
struct VariantVisitor;

impl<'de> Visitor<'de> for VariantVisitor {
    type Value = Payload;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a variant")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Payload, A::Error> {
        let signature: Signature = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        seq.next_element_seed(PayloadSeed::new(&signature))?
            .ok_or_else(|| de::Error::invalid_length(1, &self))
    }
}

/// An `a{sv}`, entries in wire order.
struct FieldMapVisitor<'s> {
    value: &'s Signature,
}

impl<'de> Visitor<'de> for FieldMapVisitor<'_> {
    type Value = Payload;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string-keyed map of variants")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Payload, A::Error> {
        let mut entries = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            let value = map.next_value_seed(PayloadSeed::field_value(self.value))?;
            entries.push((key, value));
        }
        Ok(Payload::Map(entries))
    }
}

struct SeqVisitor<'s> {
    element: &'s Signature,
}

impl<'de> Visitor<'de> for SeqVisitor<'_> {
    type Value = Payload;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an array of {}", self.element)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Payload, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element_seed(PayloadSeed::new(self.element))? {
            items.push(item);
        }
        Ok(Payload::Seq {
            element: self.element.to_string(),
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{DecodeDiagnostic, RawEntry, RequestShape};
    use crate::core::decode::decode;
    use crate::dbus::reply::FieldReply;
    use crate::types::payload;
    use serde::ser::{Serialize, SerializeMap, Serializer};
    use std::collections::HashMap;
    use zvariant::{ObjectPath, SerializeValue, Type, Value};

    const SERVICE: &str = "/net/connman/service/wifi_x";

    fn call(method: &'static str) -> zbus::message::Builder<'static> {
        Message::method_call("/net/connman/BifrostWiFiAgent", method)
            .unwrap()
            .interface("net.connman.Agent")
            .unwrap()
    }

    fn service() -> ObjectPath<'static> {
        ObjectPath::try_from(SERVICE).unwrap()
    }

    fn inner(entries: &[(&str, &str)]) -> FieldReply {
        FieldReply::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    /// Outer `RequestInput` map, written in the given order with repeats kept.
    struct OrderedFields(Vec<(&'static str, FieldReply)>);

    impl Type for OrderedFields {
        const SIGNATURE: &'static Signature = <HashMap<String, Value<'static>> as Type>::SIGNATURE;
    }

    impl Serialize for OrderedFields {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.0.len()))?;
            for (name, value) in &self.0 {
                map.serialize_entry(name, &SerializeValue(value))?;
            }
            map.end()
        }
    }

    #[test]
    fn reads_object_and_error_string() {
        let msg = call("ReportError")
            .build(&(service(), "invalid-key"))
            .unwrap();

        let args = call_args(&msg);
        assert_eq!(payload::signature(&args), "(os)");

        let req = decode(&args);
        assert_eq!(req.shape, Some(RequestShape::ObjectWithErrorString));
        assert_eq!(req.object_id.as_ref().map(|p| p.as_str()), Some(SERVICE));
        assert_eq!(req.error_message.as_deref(), Some("invalid-key"));
    }

    #[test]
    fn field_map_keeps_wire_order() {
        let fields = OrderedFields(vec![
            ("WPS", inner(&[("Type", "wpspin")])),
            ("Passphrase", inner(&[("Type", "psk"), ("Requirement", "mandatory")])),
        ]);
        let msg = call("RequestInput").build(&(service(), fields)).unwrap();

        let args = call_args(&msg);
        assert_eq!(payload::signature(&args), "(oa{sv})");

        let req = decode(&args);
        assert_eq!(req.shape, Some(RequestShape::ObjectWithFieldMap));
        let keys: Vec<_> = req
            .entries
            .iter()
            .map(|e| format!("{}.{}", e.field, e.key))
            .collect();
        assert_eq!(keys, ["WPS.Type", "Passphrase.Type", "Passphrase.Requirement"]);
        // the last "Type" on the wire wins, not the last in key order
        assert_eq!(req.requested_type.as_deref(), Some("psk"));
    }

    #[test]
    fn field_map_keeps_repeated_keys() {
        let fields = OrderedFields(vec![
            ("Passphrase", inner(&[("Type", "wep"), ("Type", "psk")])),
            ("Passphrase", inner(&[("Type", "wpspin")])),
        ]);
        let msg = call("RequestInput").build(&(service(), fields)).unwrap();

        let req = decode(&call_args(&msg));
        assert_eq!(
            req.entries,
            ["wep", "psk", "wpspin"]
                .iter()
                .map(|value| RawEntry {
                    field: "Passphrase".into(),
                    key: "Type".into(),
                    type_tag: "s".into(),
                    value: value.to_string(),
                })
                .collect::<Vec<_>>()
        );
        assert_eq!(req.requested_type.as_deref(), Some("wpspin"));
    }

    #[test]
    fn field_values_keep_their_types() {
        let mut passphrase: HashMap<&str, Value<'_>> = HashMap::new();
        passphrase.insert("Type", Value::from("psk"));
        passphrase.insert("Alternates", Value::from(vec!["WPS"]));
        let mut fields: HashMap<&str, Value<'_>> = HashMap::new();
        fields.insert("Passphrase", Value::from(passphrase));
        fields.insert("Hidden", Value::from(true));
        let msg = call("RequestInput").build(&(service(), fields)).unwrap();

        let req = decode(&call_args(&msg));
        assert_eq!(req.requested_type.as_deref(), Some("psk"));
        assert!(req.diagnostics.contains(&DecodeDiagnostic::UnhandledType {
            field: "Passphrase".into(),
            key: Some("Alternates".into()),
            type_tag: "as".into(),
        }));
        assert!(req.diagnostics.contains(&DecodeDiagnostic::UnhandledType {
            field: "Hidden".into(),
            key: None,
            type_tag: "b".into(),
        }));
    }

    #[test]
    fn top_level_variant_is_not_unwrapped() {
        let msg = call("ReportError")
            .build(&(service(), Value::from("invalid-key")))
            .unwrap();

        let args = call_args(&msg);
        assert_eq!(payload::signature(&args), "(ov)");

        let req = decode(&args);
        assert!(req.is_empty());
        assert_eq!(
            req.diagnostics,
            vec![DecodeDiagnostic::UnrecognizedSignature("(ov)".into())]
        );
    }

    #[test]
    fn string_map_is_not_a_field_map() {
        let mut fields = HashMap::new();
        fields.insert("Passphrase", "psk");
        let msg = call("RequestInput").build(&(service(), fields)).unwrap();

        let args = call_args(&msg);
        assert_eq!(payload::signature(&args), "(oa{ss})");

        let req = decode(&args);
        assert!(req.is_empty());
        assert_eq!(
            req.diagnostics,
            vec![DecodeDiagnostic::UnrecognizedSignature("(oa{ss})".into())]
        );
    }

    #[test]
    fn arrays_report_their_element_type() {
        let empty: Vec<String> = Vec::new();
        let msg = call("RequestInput").build(&(service(), empty)).unwrap();

        let args = call_args(&msg);
        assert_eq!(payload::signature(&args), "(oas)");
        assert!(decode(&args).is_empty());
    }

    #[test]
    fn single_argument_body() {
        let msg = call("ReportError").build(&service()).unwrap();

        let args = call_args(&msg);
        assert_eq!(payload::signature(&args), "(o)");
        assert!(decode(&args).is_empty());
    }

    #[test]
    fn empty_body() {
        let msg = call("Release").build(&()).unwrap();

        assert!(call_args(&msg).is_empty());
        let req = decode(&call_args(&msg));
        assert!(req.is_empty());
        assert_eq!(
            req.diagnostics,
            vec![DecodeDiagnostic::UnrecognizedSignature("()".into())]
        );
    }

    #[test]
    fn other_values_keep_their_signature() {
        let msg = call("RequestInput")
            .build(&(service(), 7u32, (1u8, "x")))
            .unwrap();

        let args = call_args(&msg);
        assert_eq!(payload::signature(&args), "(ou(ys))");
        assert_eq!(args[1], Payload::Other("u".into()));
    }
}
