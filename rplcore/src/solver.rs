//! Numerical root finder.
//!
//! A derivative-free hybrid of secant steps and bisection. Two samples seed
//! the low and high brackets; each iteration then replaces the bracket whose
//! `|y|` is larger when the new sample improves on it. A step that improves on
//! neither bracket bisects the last sign change if one was seen, and jitters
//! away from the brackets otherwise.

use bigdecimal::BigDecimal;
use log::{debug, trace};
use num_traits::{One, Zero};

use crate::{
    arithmetic::decimal,
    command::Command,
    error::{RplError, RplResult},
    object::{Object, Symbol, Unit},
    runtime::Runtime,
    settings::Precision,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    SeedLow,
    SeedHigh,
    Iterate,
}

#[derive(Debug, Clone)]
struct Sample {
    x: BigDecimal,
    y: BigDecimal,
}

struct Solver<'r> {
    rt: &'r mut Runtime,
    target: Object,
    name: Symbol,
    unit: Option<Vec<Object>>,
    precision: Precision,
    sampling: Precision,
    working: u64,
}

/// Samples carry one tier more than the result so steep functions can still
/// reach the tolerance.
fn sampling_tier(precision: Precision) -> Precision {
    match precision {
        Precision::Decimal32 => Precision::Decimal64,
        _ => Precision::Decimal128,
    }
}

fn max_one(x: &BigDecimal) -> BigDecimal {
    let magnitude = x.abs();
    if magnitude < BigDecimal::one() {
        BigDecimal::one()
    } else {
        magnitude
    }
}

/// Step away from `x` by a multiple of `width` that varies with the iteration.
fn jitter(x: &BigDecimal, width: &BigDecimal, iteration: u32) -> BigDecimal {
    let multiplier = BigDecimal::from((iteration as u64 * 7919 % 97 + 3) as i64) / BigDecimal::from(16);
    let step = if width.is_zero() {
        max_one(x) / BigDecimal::from(1000)
    } else {
        width.abs()
    };
    let delta = step * multiplier;
    if iteration % 2 == 0 { x + delta } else { x - delta }
}

/// Numeric value and unit of a guess.
fn guess_value(guess: &Object) -> RplResult<(BigDecimal, Option<Vec<Object>>)> {
    match guess {
        Object::Unit(u) => {
            let value = decimal::to_bigdecimal(&u.value).ok_or(RplError::BadGuess)?;
            Ok((value, Some(u.unit.clone())))
        }
        other => Ok((decimal::to_bigdecimal(other).ok_or(RplError::BadGuess)?, None)),
    }
}

/// `l=r` is solved as `l-r`.
fn target_of(equation: &Object) -> RplResult<Object> {
    match equation {
        Object::Expression(items) => {
            let mut items = items.clone();
            if let Some(last) = items.last_mut() {
                if *last == Object::Command(Command::Equation) {
                    *last = Object::Command(Command::Sub);
                }
            }
            Ok(Object::Expression(items))
        }
        Object::Symbol(_) | Object::Polynomial(_) | Object::Program(_) => Ok(equation.clone()),
        _ => Err(RplError::InvalidFunction),
    }
}

impl Solver<'_> {
    fn wrap(&self, x: &BigDecimal, precision: Precision) -> Object {
        let value = Object::decimal(x.with_prec(precision.digits()), precision);
        match &self.unit {
            Some(unit) => Object::Unit(Unit {
                value: Box::new(value),
                unit: unit.clone(),
            }),
            None => value,
        }
    }

    fn sample(&mut self, x: &BigDecimal) -> RplResult<BigDecimal> {
        let value = self.wrap(x, self.sampling);
        self.rt.store(&self.name, &value)?;
        let result = match self.rt.evaluate_value(&self.target)? {
            Object::Unit(u) => *u.value,
            other => other,
        };
        if !result.is_real() {
            return Err(RplError::InvalidFunction);
        }
        decimal::to_bigdecimal(&result).ok_or(RplError::InvalidFunction)
    }

    /// Store `x` as the value of the variable and return it.
    fn finish(&mut self, x: &BigDecimal) -> RplResult<Object> {
        let value = self.wrap(x, self.precision);
        self.rt.store(&self.name, &value)?;
        Ok(value)
    }

    /// Store the best estimate, then report `error`.
    fn fail(&mut self, best: &Option<Sample>, error: RplError) -> RplResult<Object> {
        debug!("solver for '{}' failed: {error}", self.name);
        if let Some(best) = best {
            self.finish(&best.x)?;
        }
        Err(error)
    }

    fn run(&mut self, low: BigDecimal, high: BigDecimal) -> RplResult<Object> {
        let settings = self.rt.settings().clone();
        let digits = self.precision.digits();
        let exponent = digits.saturating_sub(settings.solver_imprecision as u64).max(1);
        let epsilon = BigDecimal::new(1.into(), exponent as i64);

        let (mut lo, mut hi) = (
            Sample { x: low, y: BigDecimal::zero() },
            Sample { x: high, y: BigDecimal::zero() },
        );
        if lo.x == hi.x {
            hi.x = jitter(&lo.x, &BigDecimal::zero(), 0);
        }
        let span = (&hi.x - &lo.x).abs();

        let mut phase = Phase::SeedLow;
        let mut x = lo.x.clone();
        let mut failures = 0;
        let mut constant = 0;
        let mut best: Option<Sample> = None;
        let mut seeded = BigDecimal::zero();
        let (mut negative, mut positive): (Option<BigDecimal>, Option<BigDecimal>) = (None, None);

        for iteration in 0..settings.solver_iterations {
            if self.rt.interrupted() {
                return self.fail(&best, RplError::Interrupted);
            }

            let y = match self.sample(&x) {
                Ok(y) => y,
                Err(error) if phase != Phase::Iterate && failures < 2 => {
                    trace!("solver: evaluation failed at {x}: {error}");
                    failures += 1;
                    x = jitter(&x, &(&hi.x - &lo.x), iteration + 1);
                    continue;
                }
                Err(error) => return self.fail(&best, error),
            };
            trace!("solver: iteration {iteration} x={x} y={y}");

            if y.is_zero() || y.abs() < epsilon {
                debug!("solver for '{}' converged after {} iterations", self.name, iteration + 1);
                return self.finish(&x);
            }
            if best.as_ref().is_none_or(|b| y.abs() < b.y.abs()) {
                best = Some(Sample { x: x.clone(), y: y.clone() });
            }
            if y < BigDecimal::zero() {
                negative = Some(x.clone());
            } else {
                positive = Some(x.clone());
            }

            // `flat` marks a sample equal to both brackets
            let (mut bad, mut flat) = (false, false);
            match phase {
                Phase::SeedLow => {
                    lo = Sample { x, y };
                    phase = Phase::SeedHigh;
                    x = hi.x.clone();
                    continue;
                }
                Phase::SeedHigh => {
                    flat = y == lo.y;
                    seeded = y.abs().min(lo.y.abs());
                    hi = Sample { x: x.clone(), y };
                    phase = Phase::Iterate;
                }
                Phase::Iterate => {
                    if y == lo.y && y == hi.y {
                        flat = true;
                    } else if y.abs() < lo.y.abs().max(hi.y.abs()) {
                        let sample = Sample { x: x.clone(), y };
                        if lo.y.abs() > hi.y.abs() {
                            lo = sample;
                        } else {
                            hi = sample;
                        }
                    } else {
                        bad = true;
                    }
                }
            }

            // Flat inside a narrow bracket is an extremum, not a constant
            if flat && (&hi.x - &lo.x).abs() * BigDecimal::from(2) < span {
                if negative.is_none() || positive.is_none() {
                    return self.fail(&best, RplError::NoSolution);
                }
                flat = false;
                bad = true;
            }
            if flat {
                constant += 1;
                if constant >= 3 {
                    return self.fail(&best, RplError::ConstantValue);
                }
                x = jitter(&hi.x, &(&hi.x - &lo.x), iteration);
                continue;
            }
            constant = 0;

            // Interval too small to make progress
            let (a, b) = match (&negative, &positive) {
                (Some(n), Some(p)) => (n.clone(), p.clone()),
                _ => (lo.x.clone(), hi.x.clone()),
            };
            let width = (&a - &b).abs();
            let midpoint = ((&a + &b) / BigDecimal::from(2)).abs();
            if width <= &epsilon * max_one(&midpoint) {
                if negative.is_none() || positive.is_none() {
                    return self.fail(&best, RplError::NoSolution);
                }
                // A continuous function shrinks towards the sign change
                if let Some(best) = &best {
                    let center = (&a + &b) / BigDecimal::from(2);
                    if best.y.abs() < seeded && (&best.x - &center).abs() <= width {
                        debug!("solver for '{}' closed in on a sign change", self.name);
                        let root = best.x.clone();
                        return self.finish(&root);
                    }
                }
                return self.fail(&best, RplError::SignReversal);
            }

            let next = if bad || lo.y == hi.y {
                match (&negative, &positive) {
                    (Some(n), Some(p)) => (n + p) / BigDecimal::from(2),
                    _ => jitter(&hi.x, &(&hi.x - &lo.x), iteration),
                }
            } else {
                let slope = (&hi.y - &lo.y) / (&hi.x - &lo.x);
                &hi.x - &hi.y / slope
            };
            x = next.with_prec(self.working);
        }
        self.fail(&best, RplError::NoSolution)
    }
}

/// Find a root of `equation` in `variable` starting from `guess`.
///
/// `equation` is an expression, a name or a program; an equation `l=r` is
/// solved as `l-r`. `variable` names the unknown, optionally with a unit
/// (`X_m`). `guess` is a number or a two-element list or array bracketing the
/// root. The root is stored in the variable and returned.
pub fn solve(rt: &mut Runtime, equation: &Object, variable: &Object, guess: &Object) -> RplResult<Object> {
    let target = target_of(equation)?;
    let (name, variable_unit) = match variable {
        Object::Unit(u) => (u.value.as_symbol().cloned(), Some(u.unit.clone())),
        other => (other.as_symbol().cloned(), None),
    };
    let name = name.ok_or(RplError::TypeError)?;

    let ((low, low_unit), (high, _)) = match guess {
        Object::List(items) | Object::Array(items) => match items.as_slice() {
            [a, b] => (guess_value(a)?, guess_value(b)?),
            _ => return Err(RplError::BadGuess),
        },
        single => {
            let value = guess_value(single)?;
            (value.clone(), value)
        }
    };

    let precision = rt.settings().precision;
    let sampling = sampling_tier(precision);
    let mut solver = Solver {
        rt,
        target,
        name,
        unit: variable_unit.or(low_unit),
        precision,
        sampling,
        working: decimal::working_digits(sampling),
    };
    debug!("solving for '{}' from [{low}, {high}]", solver.name);
    solver.run(low, high)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::settings::Settings;

    fn close_to(value: &Object, expected: &str) {
        let actual = decimal::to_bigdecimal(value).unwrap();
        let diff = (actual - BigDecimal::from_str(expected).unwrap()).abs();
        assert!(diff < BigDecimal::from_str("1E-10").unwrap(), "{value:?} is not {expected}");
    }

    fn solve_src(rt: &mut Runtime, eq: &str, guess: &str) -> RplResult<Object> {
        rt.run(&format!("{eq} 'X' {guess}"))?;
        let args = rt.args(3)?;
        solve(rt, &args[0], &args[1], &args[2])
    }

    #[test]
    fn linear_root() {
        let mut rt = Runtime::default();
        let root = solve_src(&mut rt, "'X-5'", "{ 0 10 }").unwrap();
        close_to(&root, "5");
        close_to(&rt.recall(&Symbol::new("X")).unwrap(), "5");
    }

    #[test]
    fn equation_and_single_guess() {
        let mut rt = Runtime::default();
        let root = solve_src(&mut rt, "'X^2=2'", "1").unwrap();
        close_to(&root, "1.41421356237309505");
    }

    #[test]
    fn constant_function() {
        let mut rt = Runtime::default();
        let result = solve_src(&mut rt, "'X-X+2'", "{ 0 1 }");
        assert!(matches!(result, Err(RplError::ConstantValue)));
    }

    #[test]
    fn no_real_root_terminates() {
        let mut rt = Runtime::new(Settings {
            solver_iterations: 200,
            ..Settings::default()
        });
        let result = solve_src(&mut rt, "'X^2+1'", "{ -10 10 }");
        assert!(matches!(result, Err(RplError::NoSolution)), "{result:?}");
    }

    #[test]
    fn flat_roots_stop_at_the_residual_tolerance() {
        let mut rt = Runtime::default();
        for (eq, guess, bound) in [("'X^2'", "{ -3 5 }", "1E-5"), ("'X^3'", "{ -1 2 }", "1E-4")] {
            let root = solve_src(&mut rt, eq, guess).unwrap();
            let value = decimal::to_bigdecimal(&root).unwrap();
            assert!(value.abs() < BigDecimal::from_str(bound).unwrap(), "{eq}: {root:?}");
        }
    }

    #[test]
    fn steep_roots_converge() {
        let mut rt = Runtime::default();
        let root = solve_src(&mut rt, "'X^2-169'", "{ -13.5 -12.5 }").unwrap();
        close_to(&root, "-13");
        let root = solve_src(&mut rt, "'(X+13)*(X+7)'", "{ -13.5 -12.5 }").unwrap();
        close_to(&root, "-13");
        let root = solve_src(&mut rt, "'1000000*X-3'", "{ 0 1 }").unwrap();
        close_to(&root, "0.000003");
    }

    #[test]
    fn roots_are_rounded_to_the_precision() {
        let mut rt = Runtime::default();
        let root = solve_src(&mut rt, "'X^2-2'", "{ 1 2 }").unwrap();
        let Object::Decimal(d) = &root else {
            panic!("expected a decimal, got {root:?}");
        };
        assert_eq!(d.precision, Precision::Decimal64);
        assert!(d.value.digits() <= Precision::Decimal64.digits());
    }

    #[test]
    fn discontinuity_is_a_sign_reversal() {
        let mut rt = Runtime::default();
        let result = solve_src(&mut rt, "'1/X'", "{ -1 1.5 }");
        assert!(matches!(result, Err(RplError::SignReversal)));
    }

    #[test]
    fn bad_guesses_and_targets() {
        let mut rt = Runtime::default();
        assert!(matches!(
            solve_src(&mut rt, "'X-1'", "{ 1 2 3 }"),
            Err(RplError::BadGuess)
        ));
        assert!(matches!(
            solve_src(&mut rt, "\"text\"", "1"),
            Err(RplError::InvalidFunction)
        ));
        assert!(matches!(
            solve_src(&mut rt, "'X+Y'", "{ 0 1 }"),
            Err(RplError::InvalidFunction)
        ));
    }

    #[test]
    fn units_are_rewrapped() {
        let mut rt = Runtime::default();
        let root = solve_src(&mut rt, "'X-3_m'", "{ 0_m 10_m }").unwrap();
        let Object::Unit(u) = root else {
            panic!("expected a unit, got {root:?}");
        };
        close_to(&u.value, "3");
        assert_eq!(u.unit, vec![Object::symbol("m")]);
    }

    #[test]
    fn interrupt_stops_the_solver() {
        let mut rt = Runtime::default();
        rt.interrupt_handle().store(true, std::sync::atomic::Ordering::Relaxed);
        let result = solve_src(&mut rt, "'X-5'", "{ 0 10 }");
        assert!(matches!(result, Err(RplError::Interrupted)));
    }
}
