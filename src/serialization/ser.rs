//! Serializer producing a `serde_json::Value` where only struct fields are
//! renamed and dropped when null. Map keys and map entries pass through as-is.

use serde::Serialize;
use serde::ser::{self, Error as _, Serializer as _};
use serde_json::value::Serializer as ValueSerializer;
use serde_json::{Error, Map, Value};

use super::FieldNaming;

#[derive(Clone, Copy, Debug)]
pub(super) struct Shaper {
    omit_null: bool,
    naming: FieldNaming,
}

impl Shaper {
    pub(super) fn new(omit_null: bool, naming: FieldNaming) -> Self {
        Self { omit_null, naming }
    }
}

fn wrap_variant(variant: &'static str, value: Value) -> Value {
    let mut object = Map::with_capacity(1);
    object.insert(variant.to_owned(), value);
    Value::Object(object)
}

fn map_key<T: Serialize + ?Sized>(key: &T) -> Result<String, Error> {
    match key.serialize(ValueSerializer)? {
        Value::String(key) => Ok(key),
        Value::Number(key) => Ok(key.to_string()),
        Value::Bool(key) => Ok(key.to_string()),
        _ => Err(Error::custom("map key must be a string")),
    }
}

impl ser::Serializer for Shaper {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SeqShaper;
    type SerializeTuple = SeqShaper;
    type SerializeTupleStruct = SeqShaper;
    type SerializeTupleVariant = TupleVariantShaper;
    type SerializeMap = MapShaper;
    type SerializeStruct = StructShaper;
    type SerializeStructVariant = StructVariantShaper;

    fn serialize_bool(self, v: bool) -> Result<Value, Error> {
        ValueSerializer.serialize_bool(v)
    }

    fn serialize_i8(self, v: i8) -> Result<Value, Error> {
        ValueSerializer.serialize_i8(v)
    }

    fn serialize_i16(self, v: i16) -> Result<Value, Error> {
        ValueSerializer.serialize_i16(v)
    }

    fn serialize_i32(self, v: i32) -> Result<Value, Error> {
        ValueSerializer.serialize_i32(v)
    }

    fn serialize_i64(self, v: i64) -> Result<Value, Error> {
        ValueSerializer.serialize_i64(v)
    }

    fn serialize_i128(self, v: i128) -> Result<Value, Error> {
        ValueSerializer.serialize_i128(v)
    }

    fn serialize_u8(self, v: u8) -> Result<Value, Error> {
        ValueSerializer.serialize_u8(v)
    }

    fn serialize_u16(self, v: u16) -> Result<Value, Error> {
        ValueSerializer.serialize_u16(v)
    }

    fn serialize_u32(self, v: u32) -> Result<Value, Error> {
        ValueSerializer.serialize_u32(v)
    }

    fn serialize_u64(self, v: u64) -> Result<Value, Error> {
        ValueSerializer.serialize_u64(v)
    }

    fn serialize_u128(self, v: u128) -> Result<Value, Error> {
        ValueSerializer.serialize_u128(v)
    }

    fn serialize_f32(self, v: f32) -> Result<Value, Error> {
        ValueSerializer.serialize_f32(v)
    }

    fn serialize_f64(self, v: f64) -> Result<Value, Error> {
        ValueSerializer.serialize_f64(v)
    }

    fn serialize_char(self, v: char) -> Result<Value, Error> {
        ValueSerializer.serialize_char(v)
    }

    fn serialize_str(self, v: &str) -> Result<Value, Error> {
        ValueSerializer.serialize_str(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, Error> {
        ValueSerializer.serialize_bytes(v)
    }

    fn serialize_none(self) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, Error> {
        Ok(Value::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, Error> {
        Ok(wrap_variant(variant, value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqShaper, Error> {
        Ok(SeqShaper {
            shaper: self,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqShaper, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqShaper, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<TupleVariantShaper, Error> {
        Ok(TupleVariantShaper {
            variant,
            seq: self.serialize_seq(Some(len))?,
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapShaper, Error> {
        Ok(MapShaper {
            shaper: self,
            map: Map::new(),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<StructShaper, Error> {
        Ok(StructShaper {
            shaper: self,
            map: Map::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<StructVariantShaper, Error> {
        Ok(StructVariantShaper {
            variant,
            fields: self.serialize_struct(variant, len)?,
        })
    }
}

pub(super) struct SeqShaper {
    shaper: Shaper,
    items: Vec<Value>,
}

impl ser::SerializeSeq for SeqShaper {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        self.items.push(value.serialize(self.shaper)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Array(self.items))
    }
}

impl ser::SerializeTuple for SeqShaper {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, Error> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqShaper {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, Error> {
        ser::SerializeSeq::end(self)
    }
}

pub(super) struct TupleVariantShaper {
    variant: &'static str,
    seq: SeqShaper,
}

impl ser::SerializeTupleVariant for TupleVariantShaper {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        ser::SerializeSeq::serialize_element(&mut self.seq, value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(wrap_variant(self.variant, ser::SerializeSeq::end(self.seq)?))
    }
}

pub(super) struct MapShaper {
    shaper: Shaper,
    map: Map<String, Value>,
    next_key: Option<String>,
}

impl ser::SerializeMap for MapShaper {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), Error> {
        self.next_key = Some(map_key(key)?);
        Ok(())
    }

    // Entries keep their key and their nulls.
    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| Error::custom("map value serialized before its key"))?;
        self.map.insert(key, value.serialize(self.shaper)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Object(self.map))
    }
}

pub(super) struct StructShaper {
    shaper: Shaper,
    map: Map<String, Value>,
}

impl ser::SerializeStruct for StructShaper {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        let value = value.serialize(self.shaper)?;
        if self.shaper.omit_null && value.is_null() {
            return Ok(());
        }
        self.map.insert(self.shaper.naming.apply(key), value);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Object(self.map))
    }
}

pub(super) struct StructVariantShaper {
    variant: &'static str,
    fields: StructShaper,
}

impl ser::SerializeStructVariant for StructVariantShaper {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        ser::SerializeStruct::serialize_field(&mut self.fields, key, value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(wrap_variant(self.variant, ser::SerializeStruct::end(self.fields)?))
    }
}
