//! Deserializer over a `serde_json::Value` that maps wire names back to the
//! field names a struct declares. Only struct members are matched; map keys
//! reach the target type untouched.

use serde::Deserialize;
use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{self, DeserializeSeed, Deserializer as _, Error as _, IntoDeserializer, Visitor};
use serde_json::{Error, Value};

use super::FieldNaming;

pub(super) struct Renaming {
    value: Value,
    naming: FieldNaming,
}

impl Renaming {
    pub(super) fn new(value: Value, naming: FieldNaming) -> Self {
        Self { value, naming }
    }
}

/// The declared field whose wire name is `key`, or `key` itself when none is.
fn declared_name(key: String, fields: &'static [&'static str], naming: FieldNaming) -> String {
    fields
        .iter()
        .find(|field| naming.apply(field) == key)
        .map(|field| (*field).to_owned())
        .unwrap_or(key)
}

fn visit_object<'de, V, I>(entries: I, visitor: V) -> Result<V::Value, Error>
where
    V: Visitor<'de>,
    I: Iterator<Item = (String, Renaming)>,
{
    let mut access = MapDeserializer::<_, Error>::new(entries);
    let value = visitor.visit_map(&mut access)?;
    access.end()?;
    Ok(value)
}

impl<'de> IntoDeserializer<'de, Error> for Renaming {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

impl<'de> de::Deserializer<'de> for Renaming {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        let naming = self.naming;
        match self.value {
            Value::Array(items) => {
                let mut access = SeqDeserializer::<_, Error>::new(
                    items.into_iter().map(|item| Renaming::new(item, naming)),
                );
                let value = visitor.visit_seq(&mut access)?;
                access.end()?;
                Ok(value)
            }
            Value::Object(map) => visit_object(
                map.into_iter()
                    .map(|(key, member)| (key, Renaming::new(member, naming))),
                visitor,
            ),
            other => de::Deserializer::deserialize_any(other, visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        let naming = self.naming;
        match self.value {
            Value::Object(map) => visit_object(
                map.into_iter().map(move |(key, member)| {
                    (declared_name(key, fields, naming), Renaming::new(member, naming))
                }),
                visitor,
            ),
            other => Renaming::new(other, naming).deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        let naming = self.naming;
        match self.value {
            Value::String(variant) => {
                visitor.visit_enum(IntoDeserializer::<'de, Error>::into_deserializer(variant))
            }
            Value::Object(map) if map.len() == 1 => {
                let (variant, content) = map
                    .into_iter()
                    .next()
                    .ok_or_else(|| Error::custom("enum object has no variant"))?;
                visitor.visit_enum(VariantRenaming {
                    variant,
                    content: Renaming::new(content, naming),
                })
            }
            other => de::Deserializer::deserialize_enum(other, name, variants, visitor),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier ignored_any
    }
}

struct VariantRenaming {
    variant: String,
    content: Renaming,
}

impl<'de> de::EnumAccess<'de> for VariantRenaming {
    type Error = Error;
    type Variant = Renaming;

    fn variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<(S::Value, Renaming), Error> {
        let variant = seed.deserialize(IntoDeserializer::<'de, Error>::into_deserializer(
            self.variant,
        ))?;
        Ok((variant, self.content))
    }
}

impl<'de> de::VariantAccess<'de> for Renaming {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Error> {
        <()>::deserialize(self)
    }

    fn newtype_variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<S::Value, Error> {
        seed.deserialize(self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        de::Deserializer::deserialize_any(self, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        de::Deserializer::deserialize_struct(self, "", fields, visitor)
    }
}
