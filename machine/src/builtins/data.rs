//! Pair, list and Data builtins.

use dashu_int::IBig;
use uplc_common::{Constant, DefaultFunction, PlutusData, Type};

use super::{arguments, bool_result, data_value, integer, list, pair, unit};
use crate::error::BuiltinFailure;
use crate::value::Value;

const DATA_CONSTRUCTORS: [&str; 5] = ["constructor", "map", "list", "integer", "bytes"];

fn data_result(data: PlutusData) -> Value {
    Value::con(Constant::Data(data))
}

fn pair_data_type() -> Type {
    Type::pair(Type::Data, Type::Data)
}

fn data_pair(key: PlutusData, value: PlutusData) -> Constant {
    Constant::ProtoPair(
        Type::Data,
        Type::Data,
        Box::new(Constant::Data(key)),
        Box::new(Constant::Data(value)),
    )
}

fn unexpected(expected: &'static str, actual: &PlutusData) -> BuiltinFailure {
    BuiltinFailure::UnexpectedData {
        expected,
        actual: DATA_CONSTRUCTORS[actual.constructor_index()],
    }
}

fn element_mismatch(element: &Constant, list: &Type) -> BuiltinFailure {
    BuiltinFailure::ListElementMismatch {
        element: element.type_of(),
        list: list.clone(),
    }
}

/// Elements of a list of Data
fn data_items(value: &Value) -> Result<Vec<PlutusData>, BuiltinFailure> {
    let (element, items) = list(value)?;
    items
        .iter()
        .map(|item| match item {
            Constant::Data(d) => Ok(d.clone()),
            other => Err(element_mismatch(other, element)),
        })
        .collect()
}

pub(super) fn call(fun: DefaultFunction, args: &[Value]) -> Result<Value, BuiltinFailure> {
    use DefaultFunction::*;
    match fun {
        FstPair => {
            let [p] = arguments(args)?;
            Ok(Value::con(pair(p)?.0.clone()))
        }
        SndPair => {
            let [p] = arguments(args)?;
            Ok(Value::con(pair(p)?.1.clone()))
        }

        ChooseList => {
            let [l, if_empty, otherwise] = arguments(args)?;
            Ok(if list(l)?.1.is_empty() { if_empty } else { otherwise }.clone())
        }
        MkCons => {
            let [head, tail] = arguments(args)?;
            let (element, items) = list(tail)?;
            let head = head
                .as_constant()
                .ok_or_else(|| super::mismatch("constant", head))?;
            if head.type_of() != *element {
                return Err(element_mismatch(head, element));
            }
            let mut result = Vec::with_capacity(items.len() + 1);
            result.push(head.clone());
            result.extend_from_slice(items);
            Ok(Value::con(Constant::ProtoList(element.clone(), result)))
        }
        HeadList => {
            let [l] = arguments(args)?;
            let head = list(l)?.1.first().ok_or(BuiltinFailure::EmptyList("head"))?;
            Ok(Value::con(head.clone()))
        }
        TailList => {
            let [l] = arguments(args)?;
            let (element, items) = list(l)?;
            let tail = items.get(1..).ok_or(BuiltinFailure::EmptyList("tail"))?;
            Ok(Value::con(Constant::ProtoList(element.clone(), tail.to_vec())))
        }
        NullList => {
            let [l] = arguments(args)?;
            Ok(bool_result(list(l)?.1.is_empty()))
        }
        DropList => {
            let [count, l] = arguments(args)?;
            let (count, (element, items)) = (integer(count)?, list(l)?);
            let skip = if *count <= IBig::ZERO {
                0
            } else {
                usize::try_from(count).map_or(items.len(), |n| n.min(items.len()))
            };
            Ok(Value::con(Constant::ProtoList(element.clone(), items[skip..].to_vec())))
        }

        ChooseData => {
            let [d, constr, map, list, int, bytes] = arguments(args)?;
            let branch = match data_value(d)? {
                PlutusData::Constr(..) => constr,
                PlutusData::Map(_) => map,
                PlutusData::List(_) => list,
                PlutusData::Integer(_) => int,
                PlutusData::ByteString(_) => bytes,
            };
            Ok(branch.clone())
        }
        ConstrData => {
            let [tag, fields] = arguments(args)?;
            Ok(data_result(PlutusData::Constr(integer(tag)?.clone(), data_items(fields)?)))
        }
        MapData => {
            let [entries] = arguments(args)?;
            let (element, items) = list(entries)?;
            let entries = items
                .iter()
                .map(|item| match item {
                    Constant::ProtoPair(_, _, k, v) => match (k.as_ref(), v.as_ref()) {
                        (Constant::Data(k), Constant::Data(v)) => Ok((k.clone(), v.clone())),
                        _ => Err(element_mismatch(item, element)),
                    },
                    _ => Err(element_mismatch(item, element)),
                })
                .collect::<Result<_, _>>()?;
            Ok(data_result(PlutusData::Map(entries)))
        }
        ListData => {
            let [items] = arguments(args)?;
            Ok(data_result(PlutusData::List(data_items(items)?)))
        }
        IData => {
            let [i] = arguments(args)?;
            Ok(data_result(PlutusData::Integer(integer(i)?.clone())))
        }
        BData => {
            let [b] = arguments(args)?;
            Ok(data_result(PlutusData::ByteString(super::bytes(b)?.to_vec())))
        }

        UnConstrData => {
            let [d] = arguments(args)?;
            match data_value(d)? {
                PlutusData::Constr(tag, fields) => Ok(Value::con(Constant::ProtoPair(
                    Type::Integer,
                    Type::list(Type::Data),
                    Box::new(Constant::Integer(tag.clone())),
                    Box::new(Constant::data_list(fields.clone())),
                ))),
                other => Err(unexpected("constructor", other)),
            }
        }
        UnMapData => {
            let [d] = arguments(args)?;
            match data_value(d)? {
                PlutusData::Map(entries) => Ok(Value::con(Constant::ProtoList(
                    pair_data_type(),
                    entries
                        .iter()
                        .map(|(k, v)| data_pair(k.clone(), v.clone()))
                        .collect(),
                ))),
                other => Err(unexpected("map", other)),
            }
        }
        UnListData => {
            let [d] = arguments(args)?;
            match data_value(d)? {
                PlutusData::List(items) => Ok(Value::con(Constant::data_list(items.clone()))),
                other => Err(unexpected("list", other)),
            }
        }
        UnIData => {
            let [d] = arguments(args)?;
            match data_value(d)? {
                PlutusData::Integer(i) => Ok(Value::con(Constant::Integer(i.clone()))),
                other => Err(unexpected("integer", other)),
            }
        }
        UnBData => {
            let [d] = arguments(args)?;
            match data_value(d)? {
                PlutusData::ByteString(b) => Ok(Value::con(Constant::ByteString(b.clone()))),
                other => Err(unexpected("bytes", other)),
            }
        }
        EqualsData => {
            let [a, b] = arguments(args)?;
            Ok(bool_result(data_value(a)? == data_value(b)?))
        }
        MkPairData => {
            let [a, b] = arguments(args)?;
            Ok(Value::con(data_pair(data_value(a)?.clone(), data_value(b)?.clone())))
        }
        MkNilData => {
            let [u] = arguments(args)?;
            unit(u)?;
            Ok(Value::con(Constant::ProtoList(Type::Data, Vec::new())))
        }
        MkNilPairData => {
            let [u] = arguments(args)?;
            unit(u)?;
            Ok(Value::con(Constant::ProtoList(pair_data_type(), Vec::new())))
        }
        _ => Err(BuiltinFailure::UnsupportedPrimitive(fun)),
    }
}
