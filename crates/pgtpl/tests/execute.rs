use pgtpl::{MemorySource, Value, params, template};

async fn try_connect() -> Option<tokio_postgres::Client> {
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let (client, connection) = tokio_postgres::connect(&database_url, tokio_postgres::NoTls)
        .await
        .expect("Failed to connect to DATABASE_URL with NoTls");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("tokio-postgres connection error: {e}");
        }
    });
    Some(client)
}

const NUMBERS: &str = "SELECT n FROM (VALUES (1), (2), (3), (4)) AS t(n)";

#[tokio::test]
async fn or_loop_selects_matching_rows() {
    let Some(client) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let query = template(&format!(
        "{NUMBERS} WHERE {{{{#or_loop ns}}}} (n = {{{{ id }}}}) {{{{/or_loop}}}} ORDER BY n"
    ))
    .add_params(params! { "ns" => vec![2, 4] })
    .build()
    .unwrap();
    assert_eq!(query.args(), &[Value::Int(2), Value::Int(4)]);

    let rows = query.fetch_all(&client).await.unwrap();
    let ns: Vec<i32> = rows.iter().map(|r| r.get(0)).collect();
    assert_eq!(ns, vec![2, 4]);
}

#[tokio::test]
async fn empty_loop_matches_every_row() {
    let Some(client) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let rows = template(&format!(
        "{NUMBERS} WHERE {{{{#or_loop ns}}}} (n = {{{{ id }}}}) {{{{/or_loop}}}}"
    ))
    .add_params(params! { "ns" => Vec::<i32>::new() })
    .build()
    .unwrap()
    .fetch_all(&client)
    .await
    .unwrap();
    assert_eq!(rows.len(), 4);
}

#[tokio::test]
async fn fragment_fallback_runs_against_database() {
    let Some(client) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let source = MemorySource::new()
        .with_template(
            "numbers",
            &format!("{NUMBERS} WHERE {{{{#or_loop ns}}}} #pick {{{{/or_loop}}}} ORDER BY n"),
        )
        .with_fragment("pick", "(n = {{ id }})")
        .with_fragment("pick_fallback", "n > {{ floor }}");

    let mut compiler = pgtpl::Compiler::from_source(&source, "numbers").unwrap();
    compiler
        .add_fragments_from(&source)
        .unwrap()
        .add_params(params! { "ns" => Vec::<i32>::new(), "floor" => 2 });

    let rows = compiler.build().unwrap().fetch_all(&client).await.unwrap();
    let ns: Vec<i32> = rows.iter().map(|r| r.get(0)).collect();
    assert_eq!(ns, vec![3, 4]);
}

#[tokio::test]
async fn fetch_one_zero_rows_is_not_found() {
    let Some(client) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let err = template(&format!("{NUMBERS} WHERE n = {{{{ n }}}}"))
        .add_param("n", 99)
        .build()
        .unwrap()
        .fetch_one(&client)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn fetch_opt_and_execute() {
    let Some(client) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let row = template(&format!("{NUMBERS} WHERE n = {{{{ n }}}}"))
        .add_param("n", 3)
        .build()
        .unwrap()
        .fetch_opt(&client)
        .await
        .unwrap();
    assert_eq!(row.map(|r| r.get::<_, i32>(0)), Some(3));

    client
        .execute("CREATE TEMP TABLE pgtpl_videos (id INT, alias TEXT)", &[])
        .await
        .unwrap();
    let inserted = template("INSERT INTO pgtpl_videos (id, alias) VALUES ({{ id }}, {{ alias }}), ({{ id }}, NULL)")
        .add_params(params! { "id" => 7, "alias" => "intro" })
        .build()
        .unwrap()
        .execute(&client)
        .await
        .unwrap();
    assert_eq!(inserted, 2);
}

#[tokio::test]
async fn runs_inside_transaction() {
    let Some(mut client) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let tx = client.transaction().await.unwrap();
    let row = template("SELECT {{ a }}::BIGINT + {{ b }}::BIGINT")
        .add_params(params! { "a" => 40i64, "b" => 2i64 })
        .build()
        .unwrap()
        .fetch_one(&tx)
        .await
        .unwrap();
    assert_eq!(row.get::<_, i64>(0), 42);
    tx.rollback().await.unwrap();
}
