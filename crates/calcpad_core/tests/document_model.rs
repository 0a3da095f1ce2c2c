use calcpad_core::{CalcResult, Document, LineCategory, VariableMap};
use rust_decimal_macros::dec;
use uuid::Uuid;

#[test]
fn document_always_keeps_at_least_one_line() {
    let mut doc = Document::new("budget");
    assert_eq!(doc.lines().len(), 1);

    let only = doc.lines()[0].id;
    doc.remove_line(only).unwrap();
    assert_eq!(doc.lines().len(), 1);
    assert!(doc.lines()[0].input.is_empty());
    assert_eq!(doc.lines()[0].order, 0);
}

#[test]
fn orders_stay_dense_after_any_removal() {
    let mut doc = Document::new("budget");
    let first = doc.lines()[0].id;
    let second = doc.append_line();
    let third = doc.append_line();
    let fourth = doc.append_line();

    doc.remove_line(second).unwrap();
    doc.remove_line(fourth).unwrap();

    let orders: Vec<usize> = doc.lines().iter().map(|line| line.order).collect();
    assert_eq!(orders, vec![0, 1]);
    assert_eq!(doc.lines()[0].id, first);
    assert_eq!(doc.lines()[1].id, third);
}

#[test]
fn insert_renumbers_following_lines() {
    let mut doc = Document::new("budget");
    doc.append_line();
    let inserted = doc.insert_line(1);

    assert_eq!(doc.lines()[1].id, inserted);
    let orders: Vec<usize> = doc.lines().iter().map(|line| line.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[test]
fn editing_bumps_updated_at() {
    let mut doc = Document::new("budget");
    let id = doc.lines()[0].id;
    let before = doc.updated_at;

    doc.set_line_input(id, "1 + 1").unwrap();
    assert!(doc.updated_at >= before);
    assert!(doc.lines()[0].result.is_none());
}

#[test]
fn document_round_trips_through_json() {
    let mut doc = Document::with_id(
        Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap(),
        "budget",
    );
    let id = doc.lines()[0].id;
    doc.set_line_input(id, "amount = 3").unwrap();
    doc.variables
        .set("amount", CalcResult::number(dec!(3), None));

    let json = serde_json::to_value(&doc).unwrap();
    assert_eq!(json["title"], "budget");
    // Variable maps serialize as an ordered list of (name, result) pairs.
    assert_eq!(json["variables"][0][0], "amount");
    assert_eq!(json["variables"][0][1]["kind"], "number");

    let decoded: Document = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, doc);
}

#[test]
fn results_serialize_with_kind_tags_and_iso_dates() {
    let currency = serde_json::to_value(CalcResult::currency(dec!(30), "usd", None)).unwrap();
    assert_eq!(currency["kind"], "currency");
    assert_eq!(currency["code"], "USD");
    assert_eq!(currency["formatted"], "$30.00");

    let date = serde_json::to_value(CalcResult::date(0)).unwrap();
    assert_eq!(date["kind"], "date");
    assert_eq!(date["date"], "1970-01-01");

    let silent = serde_json::to_value(CalcResult::silent()).unwrap();
    assert_eq!(silent["kind"], "error");
    assert_eq!(silent["message"], "");

    let unit = CalcResult::unit(dec!(1.5748), "in", None);
    let decoded: CalcResult = serde_json::from_value(serde_json::to_value(&unit).unwrap()).unwrap();
    assert_eq!(decoded, unit);
}

#[test]
fn line_categories_serialize_snake_case() {
    let json = serde_json::to_value(LineCategory::CssCalculations).unwrap();
    assert_eq!(json, "css_calculations");
}

#[test]
fn variable_map_serializes_in_insertion_order() {
    let mut vars = VariableMap::new();
    vars.set("b", CalcResult::number(dec!(2), None));
    vars.set("a", CalcResult::number(dec!(1), None));

    let json = serde_json::to_value(&vars).unwrap();
    assert_eq!(json[0][0], "b");
    assert_eq!(json[1][0], "a");

    let decoded: VariableMap = serde_json::from_value(json).unwrap();
    assert_eq!(decoded.get("a").unwrap().value(), dec!(1));
}
