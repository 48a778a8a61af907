use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rplcore::{Object, Runtime, render};

fn run_top(rt: &mut Runtime, src: &str) -> Object {
    rt.run(src).unwrap();
    rt.pop().unwrap()
}

#[test]
fn fraction_sums_cancel_exactly() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x5eed);
    let mut rt = Runtime::default();
    for _ in 0..200 {
        let (a, b) = (rng.random_range(-500..500i64), rng.random_range(1..500i64));
        let (c, d) = (rng.random_range(-500..500i64), rng.random_range(1..500i64));
        let expected = run_top(&mut rt, &format!("{a} {b} /"));
        let result = run_top(&mut rt, &format!("{a} {b} / {c} {d} / + {c} {d} / -"));
        assert_eq!(result, expected, "{a}/{b} + {c}/{d} - {c}/{d}");
        assert!(result.is_exact());
    }
    assert_eq!(rt.depth(), 0);
}

#[test]
fn reciprocal_products_are_one() {
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    let mut rt = Runtime::default();
    for _ in 0..100 {
        let (a, b) = (rng.random_range(1..10_000i64), rng.random_range(1..10_000i64));
        let product = run_top(&mut rt, &format!("{a} {b} / {b} {a} / *"));
        assert_eq!(product, Object::integer(1));
    }
}

#[test]
fn bignums_demote_when_they_fit() {
    let mut rt = Runtime::default();
    let big = run_top(&mut rt, "2 100 ^");
    assert!(matches!(big, Object::Bignum(_)));
    assert_eq!(render(&big, rt.settings()), "1267650600228229401496703205376");
    let one = run_top(&mut rt, "2 100 ^ 1 + 2 100 ^ -");
    assert_eq!(one, Object::integer(1));
}

#[test]
fn integer_division_stays_exact() {
    let mut rt = Runtime::default();
    assert_eq!(run_top(&mut rt, "12 4 /"), Object::integer(3));
    let third = run_top(&mut rt, "1 3 /");
    assert!(matches!(third, Object::Fraction(_)));
    assert_eq!(render(&third, rt.settings()), "1/3");
}

#[test]
fn native_overflow_escalates_to_bignums() {
    let settings = rplcore::Settings::default();
    let max = Object::from_u64(u64::MAX);
    let sum = rplcore::arithmetic::add(&max, &max, &settings).unwrap();
    assert!(matches!(sum, Object::Bignum(_)));
    assert_eq!(render(&sum, &settings), "36893488147419103230");
    let product = rplcore::arithmetic::mul(&max, &Object::integer(-2), &settings).unwrap();
    assert_eq!(render(&product, &settings), "-36893488147419103230");
}

#[test]
fn huge_decimal_exponents_are_rejected() {
    let mut rt = Runtime::default();
    assert!(matches!(rt.run("2 1E300000000 ^"), Err(rplcore::RplError::ValueError)));
    assert!(rt.run("1E300000000 7 mod").is_err());
    assert!(rt.run("1E300000000 sin").is_err());
    assert_eq!(rt.depth(), 0);
    assert!(matches!(run_top(&mut rt, "2 1E3 ^"), Object::Decimal(_)));
}
