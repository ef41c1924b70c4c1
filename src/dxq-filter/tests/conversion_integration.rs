use dxq_filter::{
    compile_filter, convert_filter, ConvertOptions, DataMap, FilterOptions, GridFilter,
    MissingAttribute,
};
use dxq_parser::LogicalOperator;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value as JsonValue};

fn sample_data() -> DataMap {
    DataMap::from_json(json!({
        "CoreEntity.CompanyGroupID": 42,
        "Employee.District": 0,
        "SaleInvoice.ContactID": 42,
        "WorkOrderLine.ApplicableUoms": "UOM1, UOM2,UOM3",
        "WorkOrder.CompanyID": 42,
        "Item": {"Data": [{"value": {"ID": 42, "AllowedItemGroupType": "1,2"}}]},
        "Transfer": {"DocDate": "2022-01-01", "RefBranchID": 42, "CompanyID": 7},
        "Lead": {"BranchID": 42, "CompanyID": 7},
        "Service": {"SourceID": 2},
        "Empty": {"Data": []},
        "X": {"Y": 5, "Null": null, "List": "a,b"}
    }))
    .unwrap()
}

fn run(input: &str) -> JsonValue {
    run_with(input, &FilterOptions::default())
}

fn run_with(input: &str, options: &FilterOptions) -> JsonValue {
    compile_filter(input, options)
        .unwrap()
        .convert_to_json(&sample_data())
        .unwrap()
}

#[test]
fn test_unsupported_shapes_give_no_filter() {
    assert_eq!(
        run("SELECT DISTINCT OP.DocID ID, OP.DocName FROM OpenDocuments OP WHERE OP.ID = 1"),
        JsonValue::Null
    );
    assert_eq!(run("A = 1 INNER JOIN B ON A.ID = B.ID"), JsonValue::Null);
}

#[test]
fn test_placeholder_equality() {
    let data = DataMap::from_json(json!({"X": {"Y": 5}})).unwrap();
    let filter = convert_filter("A = {X.Y}", &data, &FilterOptions::default())
        .unwrap()
        .unwrap();
    assert_eq!(filter.to_json().unwrap(), json!(["A", "=", 5]));
}

#[test]
fn test_in_and_not_in() {
    assert_eq!(run("A IN (1,2)"), json!([["A", "=", 1], "or", ["A", "=", 2]]));
    assert_eq!(
        run("A NOT IN (1,2)"),
        json!([["A", "!=", 1], "and", ["A", "!=", 2]])
    );
}

#[test]
fn test_between() {
    assert_eq!(
        run("A Between '1' AND '2'"),
        json!(["A", "between", ["1", "2"]])
    );
    assert_eq!(
        run("FromDate Between '10-10-2021' AND '10-10-2022'"),
        json!(["FromDate", "between", ["10-10-2021", "10-10-2022"]])
    );
}

#[test]
fn test_isnull_with_null_placeholder_collapses() {
    let data = DataMap::from_json(json!({"X": {"Y": null}})).unwrap();
    let result = convert_filter(
        "A = {X.Y} OR ISNULL({X.Y},0) = 0",
        &data,
        &FilterOptions::default(),
    )
    .unwrap();
    assert_eq!(result, None);
}

#[test]
fn test_flat_and_chain() {
    let result = run("A=1 AND B=2 AND C=3");
    assert_eq!(
        result,
        json!([["A", "=", 1], "and", ["B", "=", 2], "and", ["C", "=", 3]])
    );
    assert_eq!(result.as_array().map(Vec::len), Some(5));
}

#[test]
fn test_disabling_short_circuit_keeps_structure() {
    let options = FilterOptions {
        convert: ConvertOptions {
            short_circuit: false,
            ..ConvertOptions::default()
        },
        ..FilterOptions::default()
    };
    assert_eq!(
        run_with("CompanyID = {WorkOrder.CompanyID} OR {WorkOrder.CompanyID} = 0", &options),
        json!([["CompanyID", "=", 42], "or", [42, "=", 0]])
    );
    assert_eq!(
        run("CompanyID = {WorkOrder.CompanyID} OR {WorkOrder.CompanyID} = 0"),
        json!(["CompanyID", "=", 42])
    );
}

#[test]
fn test_isnull_on_both_sides_of_or() {
    assert_eq!(
        run("(ID = {CoreEntity.CompanyGroupID} OR ISNULL({CoreEntity.CompanyGroupID},0) = 0)"),
        json!(["ID", "=", 42])
    );
    assert_eq!(
        run("GroupNo = {Employee.District} OR ISNULL(GroupNo,0) = 0 OR {Employee.District} = 0"),
        JsonValue::Null
    );
}

#[test]
fn test_in_with_resolved_comma_list() {
    let options = FilterOptions {
        convert: ConvertOptions {
            expand_in: false,
            ..ConvertOptions::default()
        },
        ..FilterOptions::default()
    };
    assert_eq!(
        run_with(
            "ID IN ({WorkOrderLine.ApplicableUoms}) AND (CompanyID = {WorkOrder.CompanyID} OR {WorkOrder.CompanyID} = 0)",
            &options
        ),
        json!([["ID", "in", ["UOM1", "UOM2", "UOM3"]], "and", ["CompanyID", "=", 42]])
    );
    assert_eq!(
        run("(ID <> {Item.ID}) AND (ItemGroupType IN ({Item.AllowedItemGroupType}))"),
        json!([
            ["ID", "!=", 42],
            "and",
            [["ItemGroupType", "=", "1"], "or", ["ItemGroupType", "=", "2"]]
        ])
    );
}

#[test]
fn test_nested_groups_keep_their_connectives() {
    let input = "((FromDate <= '{Transfer.DocDate}' AND ToDate >= '{Transfer.DocDate}') OR ToDate is NULL) \
                 AND (BranchID = {Transfer.RefBranchID} OR RefBranchID is NULL) \
                 AND (CompanyID = {Transfer.CompanyID}  OR {Transfer.CompanyID} = 0 OR CompanyID is NULL)";
    assert_eq!(
        run(input),
        json!([
            [
                [["FromDate", "<=", "2022-01-01"], "and", ["ToDate", ">=", "2022-01-01"]],
                "or",
                ["ToDate", "=", null]
            ],
            "and",
            [["BranchID", "=", 42], "or", ["RefBranchID", "=", null]],
            "and",
            [["CompanyID", "=", 7], "or", ["CompanyID", "=", null]]
        ])
    );
}

#[test]
fn test_positional_bindings() {
    let input = "((ISNULL({0}, 0) = 0 AND CompanyID = {1}) OR CompanyID IS NULL) OR BranchID = {0} \
                 | [Lead.BranchID] | [Lead.CompanyID]";
    let compiled = compile_filter(input, &FilterOptions::default()).unwrap();
    assert_eq!(compiled.variables(), ["Lead.BranchID", "Lead.CompanyID"]);
    assert_eq!(
        compiled.convert_to_json(&sample_data()).unwrap(),
        json!([["CompanyID", "=", null], "or", ["BranchID", "=", 42]])
    );
}

#[test]
fn test_isnull_over_field_adds_null_branch() {
    assert_eq!(
        run("ISNULL(SourceID,0) = {Service.SourceID} OR ISNULL(SourceID,0) = 0"),
        json!([
            ["SourceID", "=", 2],
            "or",
            ["SourceID", "=", 0],
            "or",
            ["SourceID", "=", null]
        ])
    );
}

#[test]
fn test_empty_string_and_not_equal() {
    assert_eq!(
        run("(ID <> {Item.ID}) AND ( ItemGroupType = '')"),
        json!([["ID", "!=", 42], "and", ["ItemGroupType", "=", ""]])
    );
}

#[test]
fn test_unresolved_entities() {
    assert_eq!(run("A = {Empty.ID}"), json!(["A", "=", "{Empty.ID}"]));
    assert_eq!(run("A = {Nowhere.ID}"), json!(["A", "=", "{Nowhere.ID}"]));

    let strict = FilterOptions {
        convert: ConvertOptions {
            missing_attribute: MissingAttribute::Unresolved,
            ..ConvertOptions::default()
        },
        ..FilterOptions::default()
    };
    assert_eq!(run("A = {Lead.Missing}"), json!(["A", "=", 42]));
    assert_eq!(
        run_with("A = {Lead.Missing}", &strict),
        json!(["A", "=", "{Lead.Missing}"])
    );
}

#[test]
fn test_keyed_result_rows() {
    let data = DataMap::from_json(json!({
        "CoreEntity0022": {"Data": [{
            "key": "123",
            "EntityKey": "CoreEntity0022",
            "value": {"CompanyGroupID": 42, "BranchID": 7}
        }]},
        "Employee": {"Data": [{
            "key": "123",
            "EntityKey": "Employee",
            "value": {"District": 0, "BranchID": 7}
        }], "Total": 1}
    }))
    .unwrap();
    let filter = convert_filter(
        "ID = {CoreEntity0022.CompanyGroupID} AND District = {Employee.District}",
        &data,
        &FilterOptions::default(),
    )
    .unwrap()
    .unwrap();
    assert_eq!(
        filter.to_json().unwrap(),
        json!([["ID", "=", 42], "and", ["District", "=", 0]])
    );
}

#[test]
fn test_query_words_in_literals_still_filter() {
    assert_eq!(run("Notes LIKE 'join'"), json!(["Notes", "contains", "join"]));
    assert_eq!(
        run("Memo = 'select from list'"),
        json!(["Memo", "=", "select from list"])
    );
}

#[test]
fn test_long_or_chain_with_default_options() {
    let input = vec!["A = 1"; 300].join(" OR ");
    let result = run(&input);
    assert_eq!(result.as_array().map(Vec::len), Some(599));
    assert_eq!(result[598], json!(["A", "=", 1]));
}

fn comparison() -> impl Strategy<Value = String> {
    let field = prop::sample::select(vec!["A", "B", "C"]);
    let operand = prop::sample::select(vec![
        "1", "0", "NULL", "'x'", "{X.Y}", "{X.Null}", "{X.List}", "{Missing.Z}",
    ]);
    let operator = prop::sample::select(vec!["=", "<>", ">", "<=", "LIKE"]);
    prop_oneof![
        (field.clone(), operator, operand.clone()).prop_map(|(f, o, v)| format!("{f} {o} {v}")),
        (field.clone(), operand.clone(), operand.clone())
            .prop_map(|(f, a, b)| format!("{f} NOT IN ({a}, {b})")),
        (field, operand.clone(), operand.clone()).prop_map(|(f, a, b)| format!("{f} IN ({a}, {b})")),
        (operand.clone(), operand).prop_map(|(a, b)| format!("ISNULL({a}, 0) = {b}")),
    ]
}

fn filter_text() -> impl Strategy<Value = String> {
    comparison().prop_recursive(4, 32, 2, |inner| {
        (inner.clone(), prop::sample::select(vec!["AND", "OR"]), inner)
            .prop_map(|(l, o, r)| format!("({l}) {o} ({r})"))
    })
}

/// No boolean survives inside a group and no group directly contains a
/// group with the same connective.
fn assert_normalized(filter: &GridFilter, parent: Option<LogicalOperator>) {
    if let GridFilter::Group { operator, operands } = filter {
        assert!(operands.len() >= 2);
        assert_ne!(Some(*operator), parent);
        for operand in operands {
            assert!(operand.as_bool().is_none(), "boolean inside group: {filter}");
            assert_normalized(operand, Some(*operator));
        }
    }
}

proptest! {
    #[test]
    fn prop_conversion_is_idempotent(input in filter_text()) {
        let compiled = compile_filter(&input, &FilterOptions::default()).unwrap();
        let data = sample_data();
        let first = compiled.convert(&data);
        let second = compiled.convert(&data);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_output_is_folded_and_flat(input in filter_text()) {
        let compiled = compile_filter(&input, &FilterOptions::default()).unwrap();
        if let Some(filter) = compiled.convert(&sample_data()) {
            assert_normalized(&filter, None);
        }
    }

    #[test]
    fn prop_without_short_circuit_no_booleans(input in filter_text()) {
        let options = FilterOptions {
            convert: ConvertOptions { short_circuit: false, ..ConvertOptions::default() },
            ..FilterOptions::default()
        };
        let compiled = compile_filter(&input, &options).unwrap();
        let json = compiled.convert_to_json(&sample_data()).unwrap();
        prop_assert!(!json.to_string().contains("true"));
        prop_assert!(!json.to_string().contains("false"));
    }
}
