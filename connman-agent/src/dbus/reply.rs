//! Wire form of `RequestInput` replies.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use zvariant::{Signature, Type, Value};

/// An `a{sv}` whose values are strings, serialized in insertion order.
///
/// Unlike a `HashMap`, keys may repeat: ConnMan receives every entry, e.g.
/// two `Passphrase` candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReply(Vec<(String, String)>);

impl FieldReply {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.0
    }
}

impl Type for FieldReply {
    const SIGNATURE: &'static Signature = <HashMap<String, Value<'static>> as Type>::SIGNATURE;
}

impl Serialize for FieldReply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, &Value::from(value.as_str()))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbus::call_args;
    use crate::types::payload::Payload;
    use zbus::Message;

    fn passphrases() -> FieldReply {
        FieldReply::new(vec![
            ("Passphrase".into(), "passphrase_0".into()),
            ("Passphrase".into(), "passphrase_1".into()),
        ])
    }

    #[test]
    fn signature_is_string_variant_map() {
        assert_eq!(FieldReply::SIGNATURE.to_string(), "a{sv}");
    }

    #[test]
    fn keeps_duplicate_keys_in_order() {
        let reply = passphrases();
        assert_eq!(reply.fields().len(), 2);

        let msg = Message::method_call("/net/connman/BifrostWiFiAgent", "RequestInput")
            .unwrap()
            .build(&reply)
            .unwrap();
        assert_eq!(msg.body().signature().to_string(), "a{sv}");

        assert_eq!(
            call_args(&msg),
            vec![Payload::Map(vec![
                ("Passphrase".into(), Payload::from("passphrase_0")),
                ("Passphrase".into(), Payload::from("passphrase_1")),
            ])]
        );
    }
}
