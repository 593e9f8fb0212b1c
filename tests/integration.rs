//! End-to-end scenarios driving the dispatcher the way a client
//! connection would: create schema, load rows, query, and (for the
//! persistence scenario) reopen the catalog from disk.

use columnar_engine::dispatcher::{dispatch, AggregateSource, Operator, Reply, SelectSource};
use columnar_engine::engine::comparator::Comparator;
use columnar_engine::session::SessionContext;
use columnar_engine::storage::Catalog;
use columnar_engine::types::{AggregateKind, ArithmeticKind, Clustering, IndexKind, JoinKind};
use tempfile::tempdir;

fn run(op: Operator, catalog: &mut Catalog, session: &mut SessionContext) -> Reply {
    dispatch(op, catalog, session, 10_000, 1024)
}

fn build_table(catalog: &mut Catalog, session: &mut SessionContext, rows: &[i32]) {
    assert!(matches!(run(Operator::CreateDb { name: "db1".into() }, catalog, session), Reply::Done));
    assert!(matches!(run(Operator::CreateTable { name: "t1".into() }, catalog, session), Reply::Done));
    assert!(matches!(run(Operator::CreateColumn { table: "t1".into(), name: "a".into() }, catalog, session), Reply::Done));
    for &v in rows {
        assert!(matches!(run(Operator::Insert { table: "t1".into(), values: vec![v] }, catalog, session), Reply::Done));
    }
}

#[test]
fn select_fetch_and_print_round_trip() {
    let dir = tempdir().unwrap();
    let mut catalog = Catalog::new(dir.path().join("disk"));
    let mut session = SessionContext::new();
    build_table(&mut catalog, &mut session, &[1, 5, 3, 9, 2]);

    run(
        Operator::Select {
            source: SelectSource::Column("db1.t1.a".into()),
            comparator: Comparator::range(2, 9),
            result_name: "p1".into(),
        },
        &mut catalog,
        &mut session,
    );
    run(Operator::Fetch { column: "db1.t1.a".into(), positions_handle: "p1".into(), result_name: "v1".into() }, &mut catalog, &mut session);

    let reply = run(Operator::Print { handles: vec!["v1".into()] }, &mut catalog, &mut session);
    match reply {
        Reply::Csv(csv) => assert_eq!(csv, "5\n3\n2"),
        other => panic!("expected csv, got {:?}", std::mem::discriminant(&other)),
    }
}

#[test]
fn clustered_index_reorders_sibling_columns() {
    let dir = tempdir().unwrap();
    let mut catalog = Catalog::new(dir.path().join("disk"));
    let mut session = SessionContext::new();
    build_table(&mut catalog, &mut session, &[30, 10, 20]);

    run(
        Operator::CreateIndex { table: "t1".into(), column: "a".into(), kind: IndexKind::Btree, clustering: Clustering::Clustered },
        &mut catalog,
        &mut session,
    );

    let col = catalog.get_column("db1.t1.a").unwrap();
    assert_eq!(col.as_slice(), &[10, 20, 30]);
}

#[test]
fn aggregates_widen_as_expected() {
    let dir = tempdir().unwrap();
    let mut catalog = Catalog::new(dir.path().join("disk"));
    let mut session = SessionContext::new();
    build_table(&mut catalog, &mut session, &[10, 20, 30]);

    run(
        Operator::Select { source: SelectSource::Column("db1.t1.a".into()), comparator: Comparator::at_least(0), result_name: "p".into() },
        &mut catalog,
        &mut session,
    );
    run(Operator::Fetch { column: "db1.t1.a".into(), positions_handle: "p".into(), result_name: "v".into() }, &mut catalog, &mut session);

    run(Operator::Aggregate { kind: AggregateKind::Sum, source: AggregateSource::Handle("v".into()), result_name: "s".into() }, &mut catalog, &mut session);
    run(Operator::Aggregate { kind: AggregateKind::Avg, source: AggregateSource::Handle("v".into()), result_name: "avg".into() }, &mut catalog, &mut session);

    let reply = run(Operator::Print { handles: vec!["s".into(), "avg".into()] }, &mut catalog, &mut session);
    match reply {
        Reply::Csv(csv) => assert_eq!(csv, "60,20.00"),
        other => panic!("expected csv, got {:?}", std::mem::discriminant(&other)),
    }
}

#[test]
fn arithmetic_combines_two_fetched_handles() {
    let dir = tempdir().unwrap();
    let mut catalog = Catalog::new(dir.path().join("disk"));
    let mut session = SessionContext::new();
    build_table(&mut catalog, &mut session, &[1, 2, 3]);

    run(
        Operator::Select { source: SelectSource::Column("db1.t1.a".into()), comparator: Comparator::at_least(0), result_name: "p".into() },
        &mut catalog,
        &mut session,
    );
    run(Operator::Fetch { column: "db1.t1.a".into(), positions_handle: "p".into(), result_name: "v".into() }, &mut catalog, &mut session);
    run(Operator::Arithmetic { kind: ArithmeticKind::Add, lhs_handle: "v".into(), rhs_handle: "v".into(), result_name: "doubled".into() }, &mut catalog, &mut session);

    let reply = run(Operator::Print { handles: vec!["doubled".into()] }, &mut catalog, &mut session);
    match reply {
        Reply::Csv(csv) => assert_eq!(csv, "2\n4\n6"),
        other => panic!("expected csv, got {:?}", std::mem::discriminant(&other)),
    }
}

#[test]
fn hash_and_nested_loop_join_produce_the_same_pair_count() {
    let dir = tempdir().unwrap();
    let mut catalog = Catalog::new(dir.path().join("disk"));
    let mut session = SessionContext::new();
    run(Operator::CreateDb { name: "db1".into() }, &mut catalog, &mut session);
    run(Operator::CreateTable { name: "left".into() }, &mut catalog, &mut session);
    run(Operator::CreateColumn { table: "left".into(), name: "v".into() }, &mut catalog, &mut session);
    run(Operator::CreateTable { name: "right".into() }, &mut catalog, &mut session);
    run(Operator::CreateColumn { table: "right".into(), name: "v".into() }, &mut catalog, &mut session);
    for v in [1, 2, 2, 3] {
        run(Operator::Insert { table: "left".into(), values: vec![v] }, &mut catalog, &mut session);
    }
    for v in [2, 2, 4, 1] {
        run(Operator::Insert { table: "right".into(), values: vec![v] }, &mut catalog, &mut session);
    }

    for (result_name, table) in [("lp", "left"), ("rp", "right")] {
        run(
            Operator::Select {
                source: SelectSource::Column(format!("db1.{table}.v")),
                comparator: Comparator::at_least(0),
                result_name: result_name.into(),
            },
            &mut catalog,
            &mut session,
        );
    }
    run(Operator::Fetch { column: "db1.left.v".into(), positions_handle: "lp".into(), result_name: "lv".into() }, &mut catalog, &mut session);
    run(Operator::Fetch { column: "db1.right.v".into(), positions_handle: "rp".into(), result_name: "rv".into() }, &mut catalog, &mut session);

    let run_join = |kind, catalog: &mut Catalog, session: &mut SessionContext| {
        run(
            Operator::Join {
                kind,
                left_pos_handle: "lp".into(),
                left_val_handle: "lv".into(),
                right_pos_handle: "rp".into(),
                right_val_handle: "rv".into(),
                result_left_name: "out_l".into(),
                result_right_name: "out_r".into(),
            },
            catalog,
            session,
        );
        let reply = run(Operator::Print { handles: vec!["out_l".into()] }, catalog, session);
        match reply {
            Reply::Csv(csv) if csv.is_empty() => 0,
            Reply::Csv(csv) => csv.lines().count(),
            other => panic!("expected csv, got {:?}", std::mem::discriminant(&other)),
        }
    };

    let nested = run_join(JoinKind::NestedLoop, &mut catalog, &mut session);
    let hashed = run_join(JoinKind::Hash, &mut catalog, &mut session);
    assert_eq!(nested, hashed);
    assert_eq!(nested, 5);
}

#[test]
fn catalog_persists_across_shutdown_and_reload() {
    let dir = tempdir().unwrap();
    let storage = dir.path().join("disk");
    {
        let mut catalog = Catalog::new(&storage);
        let mut session = SessionContext::new();
        build_table(&mut catalog, &mut session, &[7, 8, 9]);
        catalog.shutdown().unwrap();
    }

    let mut catalog = Catalog::load(&storage).unwrap();
    let mut session = SessionContext::new();
    run(
        Operator::Select { source: SelectSource::Column("db1.t1.a".into()), comparator: Comparator::at_least(0), result_name: "p".into() },
        &mut catalog,
        &mut session,
    );
    run(Operator::Fetch { column: "db1.t1.a".into(), positions_handle: "p".into(), result_name: "v".into() }, &mut catalog, &mut session);
    let reply = run(Operator::Print { handles: vec!["v".into()] }, &mut catalog, &mut session);
    match reply {
        Reply::Csv(csv) => assert_eq!(csv, "7\n8\n9"),
        other => panic!("expected csv, got {:?}", std::mem::discriminant(&other)),
    }
}

