use calcpad_core::{evaluate, EvalContext, ResultKind, VariableMap};
use rust_decimal_macros::dec;

fn ctx(vars: &VariableMap) -> EvalContext<'_> {
    EvalContext::new(vars)
}

#[test]
fn basic_operators_match_decimal_arithmetic() {
    let vars = VariableMap::new();
    let ctx = ctx(&vars);

    assert_eq!(evaluate("5 + 3", &ctx).value(), dec!(8));
    assert_eq!(evaluate("10 - 4", &ctx).value(), dec!(6));
    assert_eq!(evaluate("6 * 7", &ctx).value(), dec!(42));
    assert_eq!(evaluate("15 / 4", &ctx).value(), dec!(3.75));
    assert_eq!(evaluate("2 ^ 10", &ctx).value(), dec!(1024));
}

#[test]
fn precedence_and_parentheses_are_respected() {
    let vars = VariableMap::new();
    let ctx = ctx(&vars);

    assert_eq!(evaluate("2 + 3 * 4", &ctx).value(), dec!(14));
    assert_eq!(evaluate("(2 + 3) * 4", &ctx).value(), dec!(20));
    assert_eq!(evaluate("2 + 3 * 4 - 1", &ctx).value(), dec!(13));
}

#[test]
fn decimal_arithmetic_avoids_binary_rounding() {
    let vars = VariableMap::new();
    let ctx = ctx(&vars);

    assert_eq!(evaluate("0.1 + 0.2", &ctx).value(), dec!(0.3));
    assert_eq!(evaluate("19.99 * 3", &ctx).value(), dec!(59.97));
}

#[test]
fn natural_language_matches_symbolic_operators() {
    let vars = VariableMap::new();
    let ctx = ctx(&vars);

    let pairs = [
        ("5 times 3", "5 * 3"),
        ("5 multiplied by 3", "5 * 3"),
        ("10 divided by 4", "10 / 4"),
        ("7 plus 2", "7 + 2"),
        ("7 and 2", "7 + 2"),
        ("9 minus 5", "9 - 5"),
        ("8 over 2", "8 / 2"),
        ("3 squared", "3 ^ 2"),
        ("2 cubed", "2 ^ 3"),
        ("2 to the power of 8", "2 ^ 8"),
        ("6 x 7", "6 * 7"),
    ];
    for (spoken, symbolic) in pairs {
        assert_eq!(
            evaluate(spoken, &ctx).value(),
            evaluate(symbolic, &ctx).value(),
            "spoken form: {spoken}"
        );
    }
}

#[test]
fn function_phrases_open_and_balance_parens() {
    let vars = VariableMap::new();
    let ctx = ctx(&vars);

    let root = evaluate("square root of 16", &ctx);
    assert!((root.value() - dec!(4)).abs() < dec!(0.000000000001));

    let cube = evaluate("cube root of 27", &ctx);
    assert!((cube.value() - dec!(3)).abs() < dec!(0.000000000001));
}

#[test]
fn degrees_feed_trig_in_radians() {
    let vars = VariableMap::new();
    let ctx = ctx(&vars);

    let result = evaluate("sin(30°)", &ctx);
    assert!((result.value() - dec!(0.5)).abs() < dec!(0.0000001));
}

#[test]
fn division_by_zero_reads_infinity() {
    let vars = VariableMap::new();
    let ctx = ctx(&vars);

    let positive = evaluate("5 / 0", &ctx);
    assert_eq!(positive.kind(), ResultKind::Number);
    assert_eq!(positive.formatted(), "Infinity");

    let negative = evaluate("-5 / 0", &ctx);
    assert_eq!(negative.formatted(), "-Infinity");
}

#[test]
fn malformed_input_becomes_an_error_result() {
    let vars = VariableMap::new();
    let ctx = ctx(&vars);

    let result = evaluate("2 +", &ctx);
    assert!(result.is_error());
    assert!(!result.is_silent());
}

#[test]
fn blank_and_comment_lines_stay_silent() {
    let vars = VariableMap::new();
    let ctx = ctx(&vars);

    for input in ["", "   ", "// groceries", "# groceries"] {
        let result = evaluate(input, &ctx);
        assert!(result.is_error(), "input: {input:?}");
        assert!(result.is_silent(), "input: {input:?}");
        assert_eq!(result.formatted(), "");
    }
}

#[test]
fn whole_numbers_format_without_decimals_and_group_thousands() {
    let vars = VariableMap::new();
    let ctx = ctx(&vars);

    assert_eq!(evaluate("2 + 2", &ctx).formatted(), "4");
    assert_eq!(evaluate("1.5 + 1", &ctx).formatted(), "2.50");
    assert_eq!(evaluate("1000 * 1000", &ctx).formatted(), "1,000,000");
}
