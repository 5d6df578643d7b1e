use super::*;
use crate::error::TemplateError;
use crate::params;
use crate::source::MemorySource;

fn build(compiler: &Compiler) -> (String, Vec<Value>) {
    compiler.build().unwrap().into_parts()
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Int).collect()
}

fn count_markers(sql: &str) -> usize {
    sql.match_indices('$').count()
}

#[test]
fn named_params_become_positional() {
    let (sql, args) = build(
        template("SELECT * FROM t WHERE id = {{ id }} AND alias = {{alias}};")
            .add_params(params! { "id" => 123, "alias" => "alias" }),
    );

    assert_eq!(sql, "SELECT * FROM t WHERE id = $1 AND alias = $2;");
    assert_eq!(args, vec![Value::Int(123), Value::from("alias")]);
}

#[test]
fn repeated_placeholder_gets_one_marker_per_occurrence() {
    let (sql, args) = build(
        template("SELECT {{ a }}, {{ a }}, {{ b }}").add_params(params! { "a" => 1, "b" => 2 }),
    );

    assert_eq!(sql, "SELECT $1, $2, $3");
    assert_eq!(args, ints(&[1, 1, 2]));
}

#[test]
fn template_text_is_trimmed() {
    let compiler = template("\n   SELECT 1;  \n");
    assert_eq!(compiler.sql(), "SELECT 1;");
}

#[test]
fn fragments_are_inlined_before_binding() {
    let sql = "\n    SELECT\n      id,\n      ({{ #fragment_1 }}) AS f1,\n      ({{ #fragment_2 }}) AS f2\n    FROM videos\n    WHERE id = {{ id }} AND alias = {{alias}};\n";
    let (sql, args) = build(
        template(sql)
            .add_fragment(
                "fragment_1",
                "(SELECT * FROM STRING_TO_ARRAY('{{ fragment_value }}'::TEXT, ','))",
            )
            .add_fragment("fragment_2", "(SELECT * FROM STRING_TO_ARRAY('4,5,6'::TEXT, ','))")
            .add_params(params! { "id" => 123, "alias" => "alias", "fragment_value" => "1,2,3" }),
    );

    let expected = "SELECT\n      id,\n      ((SELECT * FROM STRING_TO_ARRAY('$1'::TEXT, ','))) AS f1,\n      ((SELECT * FROM STRING_TO_ARRAY('4,5,6'::TEXT, ','))) AS f2\n    FROM videos\n    WHERE id = $2 AND alias = $3;";
    assert_eq!(sql, expected);
    assert_eq!(
        args,
        vec![Value::from("1,2,3"), Value::Int(123), Value::from("alias")]
    );
}

#[test]
fn fragment_inlining_matches_manual_inlining() {
    let fragment = "status = {{ status }} AND deleted_at IS NULL";
    let params = params! { "status" => "active", "id" => 9 };

    let via_fragment = build(
        template("SELECT * FROM t WHERE id = {{ id }} AND {{# live }}")
            .add_fragment("live", fragment)
            .add_params(params.clone()),
    );
    let inlined = build(
        template(&format!("SELECT * FROM t WHERE id = {{{{ id }}}} AND {fragment}"))
            .add_params(params),
    );

    assert_eq!(via_fragment, inlined);
}

#[test]
fn loop_with_fragment_body() {
    let (sql, args) = build(
        template("SELECT id FROM videos WHERE {{#or_loop ids}} #condition_fragment {{/or_loop}};")
            .add_fragment("condition_fragment", "(id = {{ id }} AND alias = {{ alias }})")
            .add_params(params! { "ids" => vec![1, 2, 3], "alias" => "alias" }),
    );

    assert_eq!(
        sql,
        "SELECT id FROM videos WHERE (id = $1 AND alias = $2) OR (id = $3 AND alias = $4) OR (id = $5 AND alias = $6);"
    );
    let alias = Value::from("alias");
    assert_eq!(
        args,
        vec![
            Value::Int(1),
            alias.clone(),
            Value::Int(2),
            alias.clone(),
            Value::Int(3),
            alias
        ]
    );
}

#[test]
fn loop_with_literal_body() {
    let (sql, args) = build(
        template("{{#or_loop ids}} (id = {{ id }}) {{/or_loop}}")
            .add_params(params! { "ids" => vec![1, 2, 3] }),
    );

    assert_eq!(sql, "(id = $1) OR (id = $2) OR (id = $3)");
    assert_eq!(args, ints(&[1, 2, 3]));
}

#[test]
fn loop_tags_tolerate_whitespace_and_newlines() {
    let (sql, args) = build(
        template("WHERE {{ #or_loop ids }}\n  # by_id\n{{ /or_loop }}")
            .add_fragment("by_id", "id = {{id}}")
            .add_params(params! { "ids" => vec![7, 8] }),
    );

    assert_eq!(sql, "WHERE id = $1 OR id = $2");
    assert_eq!(args, ints(&[7, 8]));
}

#[test]
fn every_id_occurrence_gets_its_own_marker() {
    let (sql, args) = build(
        template("{{#or_loop ids}} (a = {{ id }} OR b = {{id}}) {{/or_loop}}")
            .add_params(params! { "ids" => vec![1, 2] }),
    );

    assert_eq!(sql, "(a = $1 OR b = $2) OR (a = $3 OR b = $4)");
    assert_eq!(args, ints(&[1, 1, 2, 2]));
}

#[test]
fn loop_cardinality() {
    let n = 5;
    let ids: Vec<i64> = (1..=n).collect();
    let query = template("SELECT * FROM t WHERE {{#or_loop ids}} (id = {{ id }} AND kind = {{ kind }}) {{/or_loop}}")
        .add_params(params! { "ids" => ids.clone(), "kind" => "k" })
        .build()
        .unwrap();

    let clause = query.sql().trim_start_matches("SELECT * FROM t WHERE ");
    assert_eq!(clause.split(" OR ").count(), n as usize);
    assert_eq!(query.args().len(), 2 * n as usize);
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(query.args()[2 * i], Value::Int(*id));
        assert_eq!(query.args()[2 * i + 1], Value::from("k"));
    }
}

#[test]
fn markers_match_args_in_order() {
    let query = template(
        "SELECT * FROM t WHERE {{# scope }} AND ({{#or_loop ids}} #by_id {{/or_loop}}) LIMIT {{ limit }}",
    )
    .add_fragment("scope", "tenant = {{ tenant }}")
    .add_fragment("by_id", "(id = {{ id }} AND tenant = {{ tenant }})")
    .add_params(params! { "ids" => vec![10, 20], "tenant" => "acme", "limit" => 50 })
    .build()
    .unwrap();

    assert_eq!(count_markers(query.sql()), query.args().len());
    assert_eq!(query.placeholder_count(), query.args().len());
    assert_eq!(
        query.sql(),
        "SELECT * FROM t WHERE tenant = $1 AND ((id = $2 AND tenant = $3) OR (id = $4 AND tenant = $5)) LIMIT $6"
    );
    assert_eq!(
        query.args(),
        &[
            Value::from("acme"),
            Value::Int(10),
            Value::from("acme"),
            Value::Int(20),
            Value::from("acme"),
            Value::Int(50),
        ]
    );
}

#[test]
fn empty_loop_without_fallback_is_tautology() {
    let (sql, args) = build(
        template("SELECT * FROM t WHERE {{#or_loop ids}} (id = {{ id }}) {{/or_loop}}")
            .add_params(params! { "ids" => Vec::<i64>::new() }),
    );

    assert_eq!(sql, format!("SELECT * FROM t WHERE {EMPTY_LOOP_SQL}"));
    assert!(args.is_empty());
}

#[test]
fn empty_loop_uses_registered_fallback() {
    let (sql, args) = build(
        template("SELECT * FROM t WHERE {{#or_loop ids}} #by_id {{/or_loop}}")
            .add_fragment_with_fallback("by_id", "id = {{ id }}", "  FALSE  ")
            .add_params(params! { "ids" => Vec::<i64>::new() }),
    );

    assert_eq!(sql, "SELECT * FROM t WHERE FALSE");
    assert!(args.is_empty());
}

#[test]
fn fallback_placeholders_bind_against_shared_params() {
    let (sql, args) = build(
        template("SELECT * FROM t WHERE {{#or_loop ids}} #by_id {{/or_loop}}")
            .add_fragment_with_fallback("by_id", "id = {{ id }}", "alias = {{ alias }}")
            .add_params(params! { "ids" => Vec::<i64>::new(), "alias" => "x" }),
    );

    assert_eq!(sql, "SELECT * FROM t WHERE alias = $1");
    assert_eq!(args, vec![Value::from("x")]);
}

#[test]
fn blank_fallback_keeps_tautology() {
    let (sql, args) = build(
        template("SELECT * FROM t WHERE {{#or_loop ids}} #by_id {{/or_loop}};")
            .add_fragment_with_fallback("by_id", "id = {{ id }}", "   ")
            .add_params(params! { "ids" => Vec::<i64>::new() }),
    );

    assert_eq!(sql, format!("SELECT * FROM t WHERE {EMPTY_LOOP_SQL};"));
    assert!(args.is_empty());
}

#[test]
fn blank_fallback_from_source_keeps_tautology() {
    let source = MemorySource::new()
        .with_template("by_ids", "SELECT * FROM t WHERE {{#or_loop ids}} #by_id {{/or_loop}}")
        .with_fragment("by_id", "id = {{ id }}")
        .with_fragment("by_id_fallback", "\n");

    let mut from_one = Compiler::from_source(&source, "by_ids").unwrap();
    from_one
        .add_fragment_from(&source, "by_id")
        .unwrap()
        .add_param("ids", Vec::<i64>::new());
    let mut from_all = Compiler::from_source(&source, "by_ids").unwrap();
    from_all
        .add_fragments_from(&source)
        .unwrap()
        .add_param("ids", Vec::<i64>::new());

    for compiler in [&from_one, &from_all] {
        assert_eq!(compiler.fallback_fragment_sql("by_id"), None);
        assert_eq!(build(compiler).0, format!("SELECT * FROM t WHERE {EMPTY_LOOP_SQL}"));
    }
}

#[test]
fn literal_body_ignores_fallbacks() {
    let (sql, _) = build(
        template("{{#or_loop ids}} (id = {{ id }}) {{/or_loop}}")
            .add_fallback_fragment("(id = {{ id }})", "FALSE")
            .add_params(params! { "ids" => Vec::<i64>::new() }),
    );

    assert_eq!(sql, EMPTY_LOOP_SQL);
}

#[test]
fn fragment_named_like_a_fallback_is_not_a_fallback() {
    let (sql, _) = build(
        template("{{#or_loop ids}} #by_id {{/or_loop}}")
            .add_fragment("by_id", "id = {{ id }}")
            .add_fragment("by_id_fallback", "FALSE")
            .add_params(params! { "ids" => Vec::<i64>::new() }),
    );

    assert_eq!(sql, EMPTY_LOOP_SQL);
}

#[test]
fn fragment_reference_inside_literal_loop_body_is_inlined_later() {
    let (sql, args) = build(
        template("{{#or_loop ids}} ({{# col }} = {{ id }}) {{/or_loop}}")
            .add_fragment("col", "lower(code)")
            .add_params(params! { "ids" => vec!["a", "b"] }),
    );

    assert_eq!(sql, "(lower(code) = $1) OR (lower(code) = $2)");
    assert_eq!(args, vec![Value::from("a"), Value::from("b")]);
}

#[test]
fn several_loops_number_markers_left_to_right() {
    let (sql, args) = build(
        template("{{#or_loop a}} x = {{ id }} {{/or_loop}} AND {{#or_loop b}} y = {{ id }} {{/or_loop}}")
            .add_params(params! { "a" => vec![1, 2], "b" => vec![3] }),
    );

    assert_eq!(sql, "x = $1 OR x = $2 AND y = $3");
    assert_eq!(args, ints(&[1, 2, 3]));
}

#[test]
fn add_params_merges() {
    let mut compiler = template("SELECT {{ a }}, {{ b }}, {{ c }}");
    compiler
        .add_params(params! { "a" => 1, "b" => 2 })
        .add_params(params! { "b" => 20, "c" => 30 });

    assert_eq!(compiler.param_value("a"), Some(&Value::Int(1)));
    assert_eq!(compiler.param_value("b"), Some(&Value::Int(20)));
    assert_eq!(build(&compiler).1, ints(&[1, 20, 30]));
}

#[test]
fn accessors_expose_registered_state() {
    let mut compiler = Compiler::new();
    compiler
        .set_sql("SELECT 1")
        .add_fragment(" f ", " a = 1 ")
        .add_fallback_fragment("f", " TRUE ")
        .add_param("p", 5);

    assert_eq!(compiler.fragment_sql("f"), Some("a = 1"));
    assert_eq!(compiler.fallback_fragment_sql("f"), Some("TRUE"));
    assert_eq!(compiler.fallback_fragment_sql("missing"), None);
    assert_eq!(compiler.param_value("p"), Some(&Value::Int(5)));
}

#[test]
fn build_is_repeatable() {
    let compiler = template("{{#or_loop ids}} id = {{ id }} {{/or_loop}}")
        .add_params(params! { "ids" => vec![1, 2] })
        .clone();

    let first = compiler.build().unwrap();
    let second = compiler.build().unwrap();
    assert_eq!(first, second);
    assert_eq!(compiler.param_value("ids-0"), None);
}

#[test]
fn missing_param_binds_null() {
    let (sql, args) = build(template("SELECT {{ missing }}, {{ present }}").add_param("present", 1));

    assert_eq!(sql, "SELECT $1, $2");
    assert_eq!(args, vec![Value::Null, Value::Int(1)]);
}

#[test]
fn strict_params_rejects_missing() {
    let err = template("SELECT {{ missing }}")
        .strict_params(true)
        .build()
        .unwrap_err();

    assert!(err.is_missing_parameter());
    assert!(err.to_string().contains("missing"));
}

#[test]
fn zero_like_values_are_not_missing() {
    let (sql, args) = build(
        template("SELECT {{ zero }}, {{ no }}, {{ empty }}, {{ null }}")
            .strict_params(true)
            .add_params(params! { "zero" => 0, "no" => false, "empty" => "", "null" => Value::Null }),
    );

    assert_eq!(sql, "SELECT $1, $2, $3, $4");
    assert_eq!(
        args,
        vec![Value::Int(0), Value::Bool(false), Value::from(""), Value::Null]
    );
}

#[test]
fn unknown_fragment_is_an_error_by_default() {
    let err = template("SELECT {{# nope }}").build().unwrap_err();
    assert!(matches!(err, TemplateError::UnknownFragment(ref name) if name == "nope"));
}

#[test]
fn unknown_loop_body_fragment_is_an_error() {
    let err = template("{{#or_loop ids}} #nope {{/or_loop}}")
        .add_params(params! { "ids" => vec![1] })
        .build()
        .unwrap_err();
    assert!(matches!(err, TemplateError::UnknownFragment(ref name) if name == "nope"));
}

#[test]
fn unknown_fragment_can_substitute_empty_text() {
    let (sql, _) = build(
        template("SELECT 1 {{# nope }}").missing_fragment(MissingFragment::Empty),
    );
    assert_eq!(sql, "SELECT 1 ");
}

#[test]
fn loop_array_must_exist() {
    let err = template("{{#or_loop ids}} id = {{ id }} {{/or_loop}}")
        .build()
        .unwrap_err();
    assert!(matches!(err, TemplateError::MissingParameter(ref name) if name == "ids"));
}

#[test]
fn loop_array_must_be_an_array() {
    let err = template("{{#or_loop ids}} id = {{ id }} {{/or_loop}}")
        .add_param("ids", 1)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        TemplateError::TypeMismatch { ref name, expected: "array", actual: "int" } if name == "ids"
    ));
}

#[test]
fn empty_names_are_rejected_with_raw_text() {
    let cases = [
        ("SELECT {{ }}", "{{ }}"),
        ("SELECT {{# }}", "{{# }}"),
        ("{{#or_loop }} x {{/or_loop}}", "{{#or_loop }} x {{/or_loop}}"),
        ("{{#or_loop ids}}   {{/or_loop}}", "{{#or_loop ids}}   {{/or_loop}}"),
        ("{{#or_loop ids}} # {{/or_loop}}", "{{#or_loop ids}} # {{/or_loop}}"),
        ("{{#or_loop ids}} x = {{  }} {{/or_loop}}", "{{  }}"),
    ];

    for (sql, snippet) in cases {
        let err = template(sql)
            .add_params(params! { "ids" => vec![1] })
            .build()
            .unwrap_err();
        match err {
            TemplateError::InvalidTemplate { snippet: got, .. } => {
                assert_eq!(got, snippet, "template: {sql}")
            }
            other => panic!("template {sql}: expected InvalidTemplate, got {other:?}"),
        }
    }
}

#[test]
fn unbalanced_loop_tags_are_rejected() {
    for sql in [
        "{{#or_loop ids}} id = {{ id }}",
        "id = {{ id }} {{/or_loop}}",
        "{{#or_loop ids}} {{#or_loop more}} x {{/or_loop}} {{/or_loop}}",
    ] {
        let err = template(sql)
            .add_params(params! { "ids" => vec![1], "more" => vec![2] })
            .build()
            .unwrap_err();
        assert!(err.is_invalid_template(), "template: {sql}");
    }
}

#[test]
fn from_source_loads_template_and_fragments() {
    let source = MemorySource::new()
        .with_template("by_ids", "  SELECT * FROM t WHERE {{#or_loop ids}} #by_id {{/or_loop}}\n")
        .with_fragment("by_id", "id = {{ id }}")
        .with_fragment("by_id_fallback", "FALSE");

    let mut compiler = Compiler::from_source(&source, "by_ids").unwrap();
    compiler.add_fragments_from(&source).unwrap();

    compiler.add_param("ids", Vec::<i64>::new());
    assert_eq!(compiler.build().unwrap().sql(), "SELECT * FROM t WHERE FALSE");

    compiler.add_param("ids", vec![4]);
    assert_eq!(compiler.build().unwrap().sql(), "SELECT * FROM t WHERE id = $1");
}

#[test]
fn add_fragment_from_picks_up_fallback() {
    let source = MemorySource::new()
        .with_fragment("by_id", "id = {{ id }}")
        .with_fragment("by_id_fallback", "FALSE");

    let mut compiler = Compiler::new();
    compiler.add_fragment_from(&source, "by_id").unwrap();

    assert_eq!(compiler.fragment_sql("by_id"), Some("id = {{ id }}"));
    assert_eq!(compiler.fallback_fragment_sql("by_id"), Some("FALSE"));
    assert!(
        Compiler::new()
            .add_fragment_from(&source, "unknown")
            .unwrap_err()
            .is_not_found()
    );
}

#[test]
fn tag_is_carried_to_compiled_query() {
    let query = template("SELECT 1").tag("health.ping").build().unwrap();
    assert_eq!(query.tag(), Some("health.ping"));
}
