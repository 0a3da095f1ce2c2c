use calcpad_core::engine::units;
use calcpad_core::{evaluate, EvalContext, ResultKind, VariableMap};
use rust_decimal_macros::dec;

const EM: rust_decimal::Decimal = dec!(16);
const PPI: rust_decimal::Decimal = dec!(96);

#[test]
fn length_conversion_via_sentence_form() {
    let vars = VariableMap::new();
    let ctx = EvalContext::new(&vars);

    let result = evaluate("4 cm in inches", &ctx);
    assert_eq!(result.kind(), ResultKind::Unit);
    assert!((result.value() - dec!(1.5748)).abs() < dec!(0.001));
    assert_eq!(result.formatted(), "1.57 in");
}

#[test]
fn same_category_round_trips_stay_close() {
    let pairs = [
        ("km", "mi"),
        ("m", "ft"),
        ("l", "gal"),
        ("kg", "lb"),
        ("h", "min"),
        ("gb", "mb"),
    ];
    for (source, target) in pairs {
        let out = units::convert(dec!(5), source, target, EM, PPI).unwrap();
        let back = units::convert(out.value, target, source, EM, PPI).unwrap();
        assert!(
            (back.value - dec!(5)).abs() < dec!(0.0000001),
            "{source} -> {target} -> {source} drifted to {}",
            back.value
        );
    }
}

#[test]
fn expression_left_sides_convert_too() {
    let vars = VariableMap::new();
    let ctx = EvalContext::new(&vars);

    let result = evaluate("(2 + 3) km in m", &ctx);
    assert_eq!(result.value(), dec!(5000));
    assert_eq!(result.formatted(), "5,000 m");
}

#[test]
fn css_conversion_respects_the_em_base() {
    let vars = VariableMap::new();

    let default_base = EvalContext::new(&vars);
    let result = evaluate("16 px in em", &default_base);
    assert_eq!(result.kind(), ResultKind::Unit);
    assert_eq!(result.value(), dec!(1));
    assert_eq!(result.formatted(), "1 em");

    let narrow = EvalContext::new(&vars).with_em_base(dec!(14));
    let scaled = evaluate("16 px in em", &narrow);
    assert!((scaled.value() - dec!(1.142857)).abs() < dec!(0.0001));
}

#[test]
fn bare_number_converts_between_px_and_em() {
    let vars = VariableMap::new();
    let ctx = EvalContext::new(&vars);

    assert_eq!(evaluate("32 in em", &ctx).value(), dec!(2));
    assert_eq!(evaluate("2 in px", &ctx).value(), dec!(32));
}

#[test]
fn physical_length_chains_into_pixels() {
    let vars = VariableMap::new();
    let ctx = EvalContext::new(&vars);

    let result = evaluate("2 in in px", &ctx);
    assert_eq!(result.value(), dec!(192));

    let ppi_override = EvalContext::new(&vars).with_ppi_base(dec!(72));
    assert_eq!(evaluate("2 in in px", &ppi_override).value(), dec!(144));
}

#[test]
fn temperature_converts_nonlinearly() {
    let vars = VariableMap::new();
    let ctx = EvalContext::new(&vars);

    let boiling = evaluate("100 c in f", &ctx);
    assert_eq!(boiling.value(), dec!(212));
    assert_eq!(boiling.formatted(), "212 °F");

    let absolute = evaluate("0 k in c", &ctx);
    assert_eq!(absolute.value(), dec!(-273.15));
}

#[test]
fn data_units_use_powers_of_1024() {
    let vars = VariableMap::new();
    let ctx = EvalContext::new(&vars);

    let result = evaluate("2 kb in b", &ctx);
    assert_eq!(result.value(), dec!(2048));
    assert_eq!(result.formatted(), "2,048 b");
}

#[test]
fn display_labels_are_applied() {
    let vars = VariableMap::new();
    let ctx = EvalContext::new(&vars);

    let spoons = evaluate("1 tbsp in tsp", &ctx);
    assert_eq!(spoons.value(), dec!(3));
    assert_eq!(spoons.formatted(), "3 tsp.");

    let liters = evaluate("500 ml in l", &ctx);
    assert_eq!(liters.formatted(), "0.50 L");
}

#[test]
fn mismatched_categories_name_both_units() {
    let vars = VariableMap::new();
    let ctx = EvalContext::new(&vars);

    let result = evaluate("5 kg in km", &ctx);
    assert!(result.is_error());
    assert!(result.formatted().contains("kg"));
    assert!(result.formatted().contains("km"));
}

#[test]
fn currency_converts_through_usd_rates() {
    let vars = VariableMap::new();
    let ctx = EvalContext::new(&vars);

    let rubles = evaluate("$300 in rub", &ctx);
    assert_eq!(rubles.kind(), ResultKind::Currency);
    assert_eq!(rubles.value(), dec!(27600));
    assert_eq!(rubles.formatted(), "₽27,600.00");

    let word_form = evaluate("300 usd in rub", &ctx);
    assert_eq!(word_form.value(), dec!(27600));
}

#[test]
fn variables_carry_their_unit_into_conversions() {
    let mut vars = VariableMap::new();
    let stored = {
        let ctx = EvalContext::new(&vars);
        evaluate("9500 km in km", &ctx)
    };
    assert_eq!(stored.kind(), ResultKind::Unit);
    vars.set("flight_km", stored);

    let ctx = EvalContext::new(&vars);
    let miles = evaluate("flight_km in mi", &ctx);
    assert_eq!(miles.kind(), ResultKind::Unit);
    assert!((miles.value() - dec!(5903.0)).abs() < dec!(1));
}

#[test]
fn currency_variables_convert_back() {
    let mut vars = VariableMap::new();
    let stored = {
        let ctx = EvalContext::new(&vars);
        evaluate("wit = $300 in rub", &ctx)
    };
    assert_eq!(stored.kind(), ResultKind::Currency);
    vars.set("wit", stored);

    let ctx = EvalContext::new(&vars);
    let dollars = evaluate("wit in usd", &ctx);
    assert_eq!(dollars.kind(), ResultKind::Currency);
    assert_eq!(dollars.value(), dec!(300));
    assert_eq!(dollars.formatted(), "$300.00");
}
