//! Multi-asset value builtins.

use uplc_common::{BuiltinValue, Constant, DefaultFunction};

use super::{arguments, bool_result, bytes, data_value, integer, integer_result, multi_asset};
use crate::error::BuiltinFailure;
use crate::value::Value;

fn value_result(value: BuiltinValue) -> Value {
    Value::con(Constant::Value(value))
}

pub(super) fn call(fun: DefaultFunction, args: &[Value]) -> Result<Value, BuiltinFailure> {
    use DefaultFunction::*;
    match fun {
        InsertCoin => {
            let [currency, token, amount, value] = arguments(args)?;
            let updated =
                multi_asset(value)?.insert_coin(bytes(currency)?, bytes(token)?, integer(amount)?)?;
            Ok(value_result(updated))
        }
        LookupCoin => {
            let [currency, token, value] = arguments(args)?;
            Ok(integer_result(multi_asset(value)?.lookup_coin(bytes(currency)?, bytes(token)?)))
        }
        UnionValue => {
            let [a, b] = arguments(args)?;
            Ok(value_result(multi_asset(a)?.union(multi_asset(b)?)?))
        }
        ValueContains => {
            let [a, b] = arguments(args)?;
            Ok(bool_result(multi_asset(a)?.contains(multi_asset(b)?)))
        }
        ScaleValue => {
            let [scalar, value] = arguments(args)?;
            Ok(value_result(multi_asset(value)?.scale(integer(scalar)?)?))
        }
        ValueData => {
            let [value] = arguments(args)?;
            Ok(Value::con(Constant::Data(multi_asset(value)?.to_data())))
        }
        UnValueData => {
            let [d] = arguments(args)?;
            Ok(value_result(BuiltinValue::from_data(data_value(d)?)?))
        }
        _ => Err(BuiltinFailure::UnsupportedPrimitive(fun)),
    }
}
