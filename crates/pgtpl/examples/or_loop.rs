//! OR-loops, fragments and empty-array fallbacks without any files.
//!
//! Run with:
//!   cargo run --example or_loop -p pgtpl

use pgtpl::{CompileOptions, MissingFragment, TemplateResult, params, template};

fn main() -> TemplateResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter("pgtpl=debug")
        .init();

    let sql = "SELECT id FROM videos WHERE {{#or_loop ids}} #by_id {{/or_loop}} AND kind = {{ kind }}";

    let mut compiler = template(sql);
    compiler
        .add_fragment_with_fallback(
            "by_id",
            "(id = {{ id }} AND alias = {{ alias }})",
            "alias = {{ alias }}",
        )
        .add_params(params! { "ids" => vec![10, 20, 30], "alias" => "intro", "kind" => "clip" });

    println!("=== three ids ===");
    let query = compiler.build()?;
    println!("{}", query.sql());
    for (i, arg) in query.args().iter().enumerate() {
        println!("  ${} = {arg}", i + 1);
    }

    println!("\n=== no ids, fallback fragment ===");
    compiler.add_param("ids", Vec::<i64>::new());
    let query = compiler.build()?;
    println!("{}\n  args = {:?}", query.sql(), query.args());

    println!("\n=== inline body, no fallback ===");
    let query = template("SELECT id FROM videos WHERE {{#or_loop ids}} (id = {{ id }}) {{/or_loop}}")
        .add_param("ids", Vec::<i64>::new())
        .build()?;
    println!("{}", query.sql());

    println!("\n=== lenient compilation ===");
    let query = template("SELECT * FROM videos WHERE {{# missing }} TRUE AND alias = {{ alias }}")
        .options(CompileOptions {
            strict_params: false,
            missing_fragment: MissingFragment::Empty,
        })
        .build()?;
    println!("{}\n  args = {:?}", query.sql(), query.args());

    println!("\n=== strict compilation ===");
    let err = template("SELECT * FROM videos WHERE alias = {{ alias }}")
        .strict_params(true)
        .build()
        .unwrap_err();
    println!("error: {err}");

    Ok(())
}
