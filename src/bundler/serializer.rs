//! Convert a `Serialize` implementation into `swc_ecma_ast` literals.
//!
//! Integers that fit within the safe integer range of a double are
//! serialized to numbers, larger values become `BigInt` literals.
use serde::ser::{self, Impossible, Serialize};
use std::error::Error as StdError;
use std::fmt;

use num_bigint::BigInt as BigIntValue;

use swc_common::DUMMY_SP;
use swc_ecma_ast::*;

/// Largest integer a double represents exactly.
const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

#[inline]
pub(crate) fn str_lit(value: &str) -> Str {
    Str {
        span: DUMMY_SP,
        value: value.into(),
        has_escape: false,
        kind: StrKind::Synthesized,
    }
}

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    ObjectKeyType,
    Unsupported(&'static str),
    Custom(String),
}

impl ser::Error for Error {
    #[cold]
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectKeyType => write!(
                f,
                "object literal key type is not supported, expecting string or number"
            ),
            Self::Unsupported(kind) => {
                write!(f, "{} values cannot be serialized to a literal", kind)
            }
            Self::Custom(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl StdError for Error {}

/// Enumeration of serialized values.
#[derive(Debug, Eq, PartialEq)]
pub enum Value {
    Object(ObjectLit),
    Array(ArrayLit),
    String(Str),
    Bool(Bool),
    Number(Number),
    BigInt(BigInt),
    Null(Null),
}

impl Value {
    pub fn into_boxed_expr(self) -> Box<Expr> {
        match self {
            Value::Object(obj) => Box::new(Expr::Object(obj)),
            Value::Array(arr) => Box::new(Expr::Array(arr)),
            Value::String(val) => Box::new(Expr::Lit(Lit::Str(val))),
            Value::Bool(flag) => Box::new(Expr::Lit(Lit::Bool(flag))),
            Value::Number(num) => Box::new(Expr::Lit(Lit::Num(num))),
            Value::BigInt(num) => Box::new(Expr::Lit(Lit::BigInt(num))),
            Value::Null(null) => Box::new(Expr::Lit(Lit::Null(null))),
        }
    }
}

/// Serialize a value to an expression.
pub fn to_expr<T: Serialize + ?Sized>(value: &T) -> Result<Box<Expr>, Error> {
    let mut serializer = Serializer;
    Ok(value.serialize(&mut serializer)?.into_boxed_expr())
}

/// Serialize to an array literal.
pub struct SerializeArray<'a> {
    literal: ArrayLit,
    ser: &'a mut Serializer,
}

impl<'a> ser::SerializeSeq for SerializeArray<'a> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize,
    {
        let value = value.serialize(&mut *self.ser)?;
        self.literal.elems.push(Some(ExprOrSpread {
            spread: None,
            expr: value.into_boxed_expr(),
        }));
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Array(self.literal))
    }
}

impl<'a> ser::SerializeTuple for SerializeArray<'a> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        ser::SerializeSeq::end(self)
    }
}

/// Serialize to an object literal.
pub struct SerializeObject<'a> {
    literal: ObjectLit,
    key: Option<PropName>,
    ser: &'a mut Serializer,
}

impl<'a> SerializeObject<'a> {
    fn push(&mut self, key: PropName, value: Value) {
        self.literal
            .props
            .push(PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
                key,
                value: value.into_boxed_expr(),
            }))));
    }
}

impl<'a> ser::SerializeStruct for SerializeObject<'a> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error>
    where
        T: Serialize,
    {
        let value = value.serialize(&mut *self.ser)?;
        self.push(PropName::Str(str_lit(key)), value);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Object(self.literal))
    }
}

impl<'a> ser::SerializeMap for SerializeObject<'a> {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        let key = match key.serialize(&mut *self.ser)? {
            Value::String(lit) => PropName::Str(lit),
            Value::Number(num) => PropName::Num(num),
            Value::BigInt(num) => PropName::BigInt(num),
            _ => return Err(Error::ObjectKeyType),
        };
        self.key = Some(key);
        Ok(())
    }

    fn serialize_value<T: ?Sized>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize,
    {
        let key = self
            .key
            .take()
            .ok_or_else(|| Error::Custom("map value without a key".into()))?;
        let value = value.serialize(&mut *self.ser)?;
        self.push(key, value);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Object(self.literal))
    }
}

/// Perform serialization into AST nodes.
pub struct Serializer;

impl Serializer {
    fn integer(v: u64, negative: bool) -> Value {
        if v <= MAX_SAFE_INTEGER {
            let value = v as f64;
            Value::Number(Number {
                span: DUMMY_SP,
                value: if negative { -value } else { value },
            })
        } else {
            let value = BigIntValue::from(v);
            Value::BigInt(BigInt {
                span: DUMMY_SP,
                value: if negative { -value } else { value },
            })
        }
    }
}

impl<'a> ser::Serializer for &'a mut Serializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeArray<'a>;
    type SerializeTuple = SerializeArray<'a>;
    type SerializeTupleStruct = Impossible<Value, Error>;
    type SerializeTupleVariant = Impossible<Value, Error>;
    type SerializeMap = SerializeObject<'a>;
    type SerializeStruct = SerializeObject<'a>;
    type SerializeStructVariant = Impossible<Value, Error>;

    fn serialize_bool(self, v: bool) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Bool(Bool {
            span: DUMMY_SP,
            value: v,
        }))
    }

    fn serialize_i8(self, v: i8) -> Result<Self::Ok, Self::Error> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<Self::Ok, Self::Error> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<Self::Ok, Self::Error> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<Self::Ok, Self::Error> {
        Ok(Serializer::integer(v.unsigned_abs(), v < 0))
    }

    fn serialize_u8(self, v: u8) -> Result<Self::Ok, Self::Error> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u16(self, v: u16) -> Result<Self::Ok, Self::Error> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u32(self, v: u32) -> Result<Self::Ok, Self::Error> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u64(self, v: u64) -> Result<Self::Ok, Self::Error> {
        Ok(Serializer::integer(v, false))
    }

    fn serialize_f32(self, v: f32) -> Result<Self::Ok, Self::Error> {
        self.serialize_f64(v as f64)
    }

    fn serialize_f64(self, v: f64) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Number(Number {
            span: DUMMY_SP,
            value: v,
        }))
    }

    fn serialize_char(self, v: char) -> Result<Self::Ok, Self::Error> {
        let mut buf = [0; 4];
        self.serialize_str(v.encode_utf8(&mut buf))
    }

    fn serialize_str(self, v: &str) -> Result<Self::Ok, Self::Error> {
        Ok(Value::String(str_lit(v)))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<Self::Ok, Self::Error> {
        Err(Error::Unsupported("bytes"))
    }

    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        self.serialize_unit()
    }

    fn serialize_some<T>(self, value: &T) -> Result<Self::Ok, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        Ok(Value::Null(Null { span: DUMMY_SP }))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok, Self::Error> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Self::Ok, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        Err(Error::Unsupported("newtype variant"))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Ok(SerializeArray {
            ser: self,
            literal: ArrayLit {
                span: DUMMY_SP,
                elems: Vec::with_capacity(len.unwrap_or(0)),
            },
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        Err(Error::Unsupported("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Err(Error::Unsupported("tuple variant"))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Ok(SerializeObject {
            ser: self,
            key: None,
            literal: ObjectLit {
                span: DUMMY_SP,
                props: Vec::with_capacity(len.unwrap_or(0)),
            },
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Err(Error::Unsupported("struct variant"))
    }
}
