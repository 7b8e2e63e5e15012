//! Arbitrary precision integer builtins.

use dashu_int::fast_div::ConstDivisor;
use dashu_int::ops::UnsignedAbs;
use dashu_int::{IBig, UBig};
use uplc_common::DefaultFunction;

use super::{arguments, bool_result, integer, integer_result};
use crate::error::BuiltinFailure;
use crate::value::Value;

pub(super) fn call(fun: DefaultFunction, args: &[Value]) -> Result<Value, BuiltinFailure> {
    use DefaultFunction::*;

    if fun == ExpModInteger {
        let [base, exponent, modulus] = arguments(args)?;
        return exp_mod(integer(base)?, integer(exponent)?, integer(modulus)?).map(integer_result);
    }

    let [a, b] = arguments(args)?;
    let (a, b) = (integer(a)?, integer(b)?);
    Ok(match fun {
        AddInteger => integer_result(a + b),
        SubtractInteger => integer_result(a - b),
        MultiplyInteger => integer_result(a * b),
        DivideInteger => integer_result(floor_div(a, b)?),
        ModInteger => integer_result(floor_mod(a, b)?),
        QuotientInteger => integer_result(nonzero(b).map(|b| a / b)?),
        RemainderInteger => integer_result(nonzero(b).map(|b| a % b)?),
        EqualsInteger => bool_result(a == b),
        LessThanInteger => bool_result(a < b),
        LessThanEqualsInteger => bool_result(a <= b),
        _ => return Err(BuiltinFailure::UnsupportedPrimitive(fun)),
    })
}

fn nonzero(b: &IBig) -> Result<&IBig, BuiltinFailure> {
    if b.is_zero() {
        Err(BuiltinFailure::DivisionByZero)
    } else {
        Ok(b)
    }
}

/// Division rounding towards negative infinity
fn floor_div(a: &IBig, b: &IBig) -> Result<IBig, BuiltinFailure> {
    let b = nonzero(b)?;
    let quotient = a / b;
    let remainder = a % b;
    if !remainder.is_zero() && remainder.sign() != b.sign() {
        Ok(quotient - IBig::ONE)
    } else {
        Ok(quotient)
    }
}

/// Remainder taking the sign of the divisor
fn floor_mod(a: &IBig, b: &IBig) -> Result<IBig, BuiltinFailure> {
    let b = nonzero(b)?;
    let remainder = a % b;
    if !remainder.is_zero() && remainder.sign() != b.sign() {
        Ok(remainder + b)
    } else {
        Ok(remainder)
    }
}

/// `base ^ exponent mod modulus`. A negative exponent uses the modular
/// inverse of the base, which must exist.
fn exp_mod(base: &IBig, exponent: &IBig, modulus: &IBig) -> Result<IBig, BuiltinFailure> {
    if *modulus <= IBig::ZERO {
        return Err(BuiltinFailure::NonPositiveModulus(modulus.clone()));
    }
    if *modulus == IBig::ONE {
        return Ok(IBig::ZERO);
    }

    let ring = ConstDivisor::new(modulus.unsigned_abs());
    let reduced = ring.reduce(base.clone());
    let power: UBig = exponent.unsigned_abs();

    let result = if *exponent < IBig::ZERO {
        let inverse = reduced.inv().ok_or_else(|| BuiltinFailure::NotInvertible {
            base: base.clone(),
            modulus: modulus.clone(),
        })?;
        inverse.pow(&power)
    } else {
        reduced.pow(&power)
    };
    Ok(IBig::from(result.residue()))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use quickcheck_macros::quickcheck;
    use test_case::test_case;
    use uplc_common::Constant;

    #[test_case(DefaultFunction::DivideInteger, 7, 2, 3)]
    #[test_case(DefaultFunction::DivideInteger, -7, 2, -4)]
    #[test_case(DefaultFunction::DivideInteger, 7, -2, -4)]
    #[test_case(DefaultFunction::DivideInteger, -7, -2, 3)]
    #[test_case(DefaultFunction::ModInteger, -7, 2, 1)]
    #[test_case(DefaultFunction::ModInteger, 7, -2, -1)]
    #[test_case(DefaultFunction::ModInteger, -6, 3, 0)]
    #[test_case(DefaultFunction::QuotientInteger, -7, 2, -3)]
    #[test_case(DefaultFunction::RemainderInteger, -7, 2, -1)]
    #[test_case(DefaultFunction::RemainderInteger, 7, -2, 1)]
    #[test_case(DefaultFunction::SubtractInteger, 3, 10, -7)]
    fn arithmetic(fun: DefaultFunction, a: i64, b: i64, expected: i64) {
        assert_eq!(run(fun, vec![int(a), int(b)]), Ok(Constant::integer(expected)));
    }

    #[test_case(DefaultFunction::DivideInteger)]
    #[test_case(DefaultFunction::ModInteger)]
    #[test_case(DefaultFunction::QuotientInteger)]
    #[test_case(DefaultFunction::RemainderInteger)]
    fn division_by_zero(fun: DefaultFunction) {
        assert_eq!(run(fun, vec![int(1), int(0)]), Err(BuiltinFailure::DivisionByZero));
    }

    #[test]
    fn arithmetic_does_not_overflow() {
        let result = run(
            DefaultFunction::MultiplyInteger,
            vec![big("9223372036854775807"), big("9223372036854775807")],
        );
        assert_eq!(
            result,
            Ok(Constant::Integer("85070591730234615847396907784232501249".parse().unwrap()))
        );
    }

    #[test_case(2, 10, 1000, 24 ; "plain power")]
    #[test_case(3, -1, 7, 5 ; "inverse")]
    #[test_case(3, -2, 7, 4 ; "inverse squared")]
    #[test_case(-2, 3, 5, 2 ; "negative base")]
    #[test_case(5, 0, 7, 1 ; "zero exponent")]
    #[test_case(5, 3, 1, 0 ; "unit modulus")]
    fn exp_mod_integer(base: i64, exponent: i64, modulus: i64, expected: i64) {
        assert_eq!(
            run(DefaultFunction::ExpModInteger, vec![int(base), int(exponent), int(modulus)]),
            Ok(Constant::integer(expected))
        );
    }

    #[test]
    fn exp_mod_rejects_bad_moduli_and_missing_inverses() {
        assert_eq!(
            run(DefaultFunction::ExpModInteger, vec![int(2), int(2), int(0)]),
            Err(BuiltinFailure::NonPositiveModulus(IBig::ZERO))
        );
        assert_eq!(
            run(DefaultFunction::ExpModInteger, vec![int(2), int(-1), int(4)]),
            Err(BuiltinFailure::NotInvertible {
                base: IBig::from(2),
                modulus: IBig::from(4)
            })
        );
    }

    #[quickcheck]
    fn floor_division_identity(a: i64, b: i64) -> bool {
        if b == 0 {
            return true;
        }
        let (a, b) = (IBig::from(a), IBig::from(b));
        let (Ok(q), Ok(r)) = (floor_div(&a, &b), floor_mod(&a, &b)) else {
            return false;
        };
        q * &b + &r == a && (r.is_zero() || r.sign() == b.sign())
    }
}
