// Integration tests for snippet analysis

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use snipviz::{analyze, analyze_with_config, AnalysisResult, AnalyzerConfig};

fn analyze_json(source: &str) -> Value {
    serde_json::to_value(analyze(source)).expect("result serializes")
}

fn structure<'a>(result: &'a Value, name: &str) -> &'a Value {
    result["structures"]
        .as_array()
        .and_then(|entries| entries.iter().find(|entry| entry["name"] == name))
        .unwrap_or_else(|| panic!("no structure named {name}"))
}

#[test]
fn test_analysis_is_deterministic() {
    let source = "nums = [4, 2]\nfor n in nums:\n    print(n)\nnums.sort()\n";
    assert_eq!(analyze(source), analyze(source));
    assert_eq!(analyze_json(source), analyze_json(source));
}

#[test]
fn test_conditional_assignment() {
    let source = r#"
x = 10
y = 5
if x > y:
    result = "x is greater"
else:
    result = "y is greater"
"#;
    let result = analyze_json(source);

    assert_eq!(result["hasLoop"], json!(false));
    assert_eq!(
        result["structures"],
        json!([
            {"name": "x", "type": "variable", "data": 10},
            {"name": "y", "type": "variable", "data": 5},
            {"name": "result", "type": "variable", "data": "x is greater"},
        ])
    );
}

#[test]
fn test_builtin_aggregates() {
    let source = "nums = [1, 5, 3, 9, 2]\nlength = len(nums)\nmaximum = max(nums)\ntotal = sum(nums)\n";
    let result = analyze_json(source);

    assert_eq!(structure(&result, "nums")["type"], json!("array"));
    assert_eq!(structure(&result, "nums")["data"], json!([1, 5, 3, 9, 2]));
    assert_eq!(structure(&result, "length")["data"], json!(5));
    assert_eq!(structure(&result, "maximum")["data"], json!(9));
    assert_eq!(structure(&result, "total")["data"], json!(20));
}

#[test]
fn test_fizzbuzz_keeps_pre_loop_entry() {
    let source = r#"
result = []
for i in range(1, 6):
    if i % 15 == 0:
        result.append("FizzBuzz")
    elif i % 3 == 0:
        result.append("Fizz")
    elif i % 5 == 0:
        result.append("Buzz")
    else:
        result.append(str(i))
"#;
    let result = analyze_json(source);

    assert_eq!(result["hasLoop"], json!(true));
    assert_eq!(result["iterator"], json!("i"));
    assert_eq!(result["target"], json!("range(1, 6)"));
    assert_eq!(structure(&result, "result")["data"], json!([]));
    assert_eq!(structure(&result, "range(1, 6)")["data"], json!([1, 2, 3, 4, 5]));
    assert_eq!(
        result["iterationState"]["4"]["result"],
        json!(["1", "2", "Fizz", "4", "Buzz"])
    );
}

#[test]
fn test_two_sum_trace() {
    let source = r#"
pair_idx = {}
nums = [2, 7, 11, 15]
target = 9
for i, num in enumerate(nums):
    if target - num in pair_idx:
        print(i, pair_idx[target - num])
    pair_idx[num] = i
"#;
    let result = analyze_json(source);

    assert_eq!(result["iterator"], json!("num"));
    assert_eq!(result["target"], json!("nums"));
    assert_eq!(result["iterationOutputs"]["1"], json!(["1 0"]));
    assert_eq!(
        result["iterationState"]["0"]["pair_idx"],
        json!([{"key": "2", "value": "0"}])
    );
    assert_eq!(
        result["loopDependencies"][0],
        json!({"name": "i", "formula": "_index"})
    );
    // Subscripts inside the simulated body are not logged
    assert_eq!(result["indexOperations"], json!([]));
}

#[test]
fn test_slice_index_resolution() {
    let source = "nums = [1, 2, 3, 4]\ntail = nums[1:]\nhead = nums[0:2]\nfirst = nums[0]\n";
    let result = analyze_json(source);

    assert_eq!(
        result["indexOperations"],
        json!([
            {"type": "access", "varName": "nums", "indices": []},
            {"type": "access", "varName": "nums", "indices": [0, 1]},
            {"type": "access", "varName": "nums", "indices": [0]},
        ])
    );
    assert_eq!(structure(&result, "tail")["data"], json!([2, 3, 4]));
    assert_eq!(structure(&result, "head")["data"], json!([1, 2]));
}

#[test]
fn test_subscript_assign_to_unbound_name() {
    let result = analyze_json("ghost[0] = 5\n");

    assert_eq!(result["structures"], json!([]));
    assert_eq!(
        result["indexOperations"],
        json!([{"type": "assign", "varName": "ghost", "indices": [0], "newValue": 5}])
    );
}

#[test]
fn test_iteration_cap() {
    let source = "count = 0\nfor i in range(500):\n    count += 1\nprint(count)\n";
    let result = analyze(source);
    let analysis = result.analysis().expect("analysis completes");

    assert_eq!(analysis.iteration_state.len(), 100);
    assert_eq!(analysis.output, vec!["100"]);

    let capped = analyze_with_config(source, AnalyzerConfig { max_iterations: 3 });
    let capped = capped.analysis().expect("analysis completes");
    assert_eq!(capped.iteration_state.len(), 3);
    assert_eq!(capped.output, vec!["3"]);
}

#[test]
fn test_loop_output_is_kept_apart() {
    let source = "print('before')\nfor i in range(2):\n    print(i)\nprint('after')\n";
    let result = analyze_json(source);

    assert_eq!(result["output"], json!(["before", "after"]));
    assert_eq!(result["iterationOutputs"], json!({"0": ["0"], "1": ["1"]}));
}

#[test]
fn test_aliases_share_storage() {
    let source = "a = [1]\nb = a\nb.append(2)\nsize = len(a)\nc = b\nc += [3]\nlast = a[-1]\n";
    let result = analyze_json(source);

    assert_eq!(structure(&result, "size")["data"], json!(2));
    assert_eq!(structure(&result, "b")["data"], json!([1, 2]));
    assert_eq!(structure(&result, "last")["data"], json!(3));
}

#[test]
fn test_chained_comparison_short_circuits() {
    let source = "x = 5\ninside = 1 < x < 10\nskipped = 3 < 2 < missing\n";
    let result = analyze_json(source);

    assert_eq!(structure(&result, "inside")["data"], json!(true));
    assert_eq!(structure(&result, "skipped")["data"], json!(false));
    assert_eq!(result["output"], json!([]));
}

#[test]
fn test_string_methods() {
    let source = r#"
csv = "a,b,c"
parts = csv.split(",")
shout = csv.upper()
joined = "-".join(parts)
clean = "  hi  ".strip()
"#;
    let result = analyze_json(source);

    assert_eq!(structure(&result, "parts")["data"], json!(["a", "b", "c"]));
    assert_eq!(structure(&result, "shout")["data"], json!("A,B,C"));
    assert_eq!(structure(&result, "joined")["data"], json!("a-b-c"));
    assert_eq!(structure(&result, "clean")["data"], json!("hi"));
}

#[test]
fn test_evaluation_errors_become_output() {
    let source = "x = 1\ny = x / 0\nz = 2\n";
    let result = analyze_json(source);

    assert_eq!(result["output"].as_array().map(Vec::len), Some(1));
    let line = result["output"][0].as_str().unwrap_or_default();
    assert!(line.starts_with("Evaluation error for y:"), "{line}");
    assert_eq!(structure(&result, "z")["data"], json!(2));
}

#[test]
fn test_syntax_error() {
    let result = analyze("x = (1, 2\n");

    assert!(matches!(result, AnalysisResult::SyntaxError { .. }));
    assert!(result.error().is_some_and(|m| m.starts_with("Syntax Error")));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["structures"], json!([]));
    assert!(json.get("hasLoop").is_none());
}

#[test]
fn test_blank_input() {
    assert_eq!(analyze("   \n\t\n"), AnalysisResult::Blank);
    assert_eq!(
        analyze_json(""),
        json!({"structures": [], "hasLoop": false})
    );
}

#[test]
fn test_complete_result_field_shape() {
    let result = analyze_json("x = 1\n");
    let mut keys: Vec<&str> = result
        .as_object()
        .map(|object| object.keys().map(String::as_str).collect())
        .unwrap_or_default();
    keys.sort_unstable();

    assert_eq!(
        keys,
        vec![
            "hasLoop",
            "indexOperations",
            "iterationOutputs",
            "iterationState",
            "iterator",
            "loopDependencies",
            "output",
            "structures",
            "target",
        ]
    );
    assert_eq!(result["target"], Value::Null);
}

#[test]
fn test_subscript_read_evaluates_index_once() {
    let result = analyze_json("a = [5, 6, 7]\nb = [0, 1]\nv = a[b.pop()]\nn = len(b)\n");

    assert_eq!(structure(&result, "v")["data"], json!(6));
    assert_eq!(structure(&result, "n")["data"], json!(1));
    assert_eq!(
        result["indexOperations"],
        json!([{"type": "access", "varName": "a", "indices": [1]}])
    );
}

#[test]
fn test_subscript_write_evaluates_key_once() {
    let result = analyze_json("keys = ['x', 'y']\nd = {}\nd[keys.pop()] = 1\nm = len(keys)\nhit = d['y']\n");

    assert_eq!(structure(&result, "m")["data"], json!(1));
    assert_eq!(structure(&result, "hit")["data"], json!(1));
    assert_eq!(result["output"], json!([]));
}

#[test]
fn test_slices_with_extreme_steps() {
    let source = "a = [1, 2, 3]\nb = a[1::9223372036854775807]\nc = a[::-9223372036854775807]\nd = a[-1::-9223372036854775807 - 1]\nafter = 1\n";
    let result = analyze_json(source);

    assert_eq!(structure(&result, "b")["data"], json!([2]));
    assert_eq!(structure(&result, "c")["data"], json!([3]));
    assert_eq!(structure(&result, "d")["data"], json!([3]));
    assert_eq!(structure(&result, "after")["data"], json!(1));
    assert_eq!(result["output"], json!([]));
}
