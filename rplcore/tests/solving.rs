use num_traits::ToPrimitive;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rplcore::{Object, RplError, Runtime, Settings, arithmetic::real_value};

fn as_f64(object: &Object) -> f64 {
    real_value(object)
        .and_then(|v| v.to_f64())
        .unwrap_or_else(|| panic!("not a real number: {object:?}"))
}

#[test]
fn quadratics_converge_inside_their_bracket() {
    let mut rng = ChaCha20Rng::seed_from_u64(0xabc);
    let mut rt = Runtime::default();
    for _ in 0..25 {
        let r1 = rng.random_range(-20..20i64);
        let r2 = r1 + rng.random_range(2..10i64);
        let (low, high) = (r1 as f64 - 0.5, r1 as f64 + 0.5);
        let src = format!("'(X-({r1}))*(X-({r2}))' 'X' {{ {low:.1} {high:.1} }} root");
        rt.run(&src).unwrap();
        let root = as_f64(&rt.pop().unwrap());
        assert!((root - r1 as f64).abs() < 1e-9, "expected {r1}, got {root}");
    }
}

#[test]
fn solving_stores_the_root_in_the_variable() {
    let mut rt = Runtime::default();
    rt.run("'X^3-8' 'X' 1 root drop X").unwrap();
    assert!((as_f64(&rt.pop().unwrap()) - 2.0).abs() < 1e-9);
}

#[test]
fn solving_terminates_without_a_root() {
    let mut rt = Runtime::new(Settings {
        solver_iterations: 100,
        ..Settings::default()
    });
    let result = rt.run("'X^2+1' 'X' { -3 5 } root");
    assert!(matches!(result, Err(RplError::NoSolution)), "{result:?}");
    // The failed line leaves the stack as it was before the line
    assert_eq!(rt.depth(), 0);
}

#[test]
fn steep_roots_are_not_sign_reversals() {
    let mut rt = Runtime::default();
    for equation in ["'X^2-169'", "'(X+13)*(X+7)'", "'50*X^3+109850'"] {
        rt.run(&format!("{equation} 'X' {{ -13.5 -12.5 }} root")).unwrap();
        let root = rt.pop().unwrap();
        assert!((as_f64(&root) + 13.0).abs() < 1e-9, "{equation}: {root:?}");
    }
}

#[test]
fn poles_are_sign_reversals() {
    let mut rt = Runtime::default();
    let result = rt.run("'1/(X-2)' 'X' { 1 3.5 } root");
    assert!(matches!(result, Err(RplError::SignReversal)), "{result:?}");
}
