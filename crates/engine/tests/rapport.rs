use engine::{EngineError, RapportLeaf};
use sea_orm::{ConnectionTrait, Statement};
use uuid::Uuid;

mod common;

use common::{Household, at, engine_with_db};

fn names(leaves: &[RapportLeaf]) -> Vec<&str> {
    leaves.iter().map(|l| l.category.name.as_str()).collect()
}

#[tokio::test]
async fn scoped_rapport_prunes_empty_categories() {
    let (engine, _db) = engine_with_db().await;
    let book = Household::create(&engine).await;
    let groceries = book.expense_matcher(&engine, "grocer", book.food).await;
    let tx_id = book.record(&engine, -500, "Grocer Lefèvre", at(2024, 4, 10)).await;
    let booking_id = book.match_with(&engine, tx_id, groceries).await;

    let tree = engine
        .build_rapport(
            "alice",
            book.ledger_id,
            at(2024, 4, 1),
            at(2024, 5, 1),
            &[book.expense],
        )
        .await
        .unwrap();

    assert_eq!(names(&tree), vec!["Expense"]);
    let expense = &tree[0];
    assert_eq!(expense.total_amount_minor, 500);
    assert!(expense.entries.is_empty());
    assert_eq!(names(&expense.children), vec!["Food"]);

    let food = &expense.children[0];
    assert_eq!(food.total_amount_minor, 500);
    assert!(food.children.is_empty());
    assert_eq!(food.entries.len(), 1);
    assert_eq!(food.entries[0].booking_id, booking_id);
    assert_eq!(food.entries[0].description.as_deref(), Some("Grocer Lefèvre"));
}

#[tokio::test]
async fn unscoped_rapport_covers_every_root() {
    let (engine, _db) = engine_with_db().await;
    let book = Household::create(&engine).await;
    let groceries = book.expense_matcher(&engine, "grocer", book.food).await;
    let train = book.expense_matcher(&engine, "rail", book.transport).await;
    for (amount, description, matcher) in [
        (-2_500, "GROCER 1", groceries),
        (-1_250, "GROCER 2", groceries),
        (-4_000, "RAIL PASS", train),
    ] {
        let tx_id = book.record(&engine, amount, description, at(2024, 4, 12)).await;
        book.match_with(&engine, tx_id, matcher).await;
    }

    let tree = engine
        .build_rapport("carol", book.ledger_id, at(2024, 1, 1), at(2025, 1, 1), &[])
        .await
        .unwrap();

    assert_eq!(names(&tree), vec!["Checking", "Expense"]);
    assert_eq!(tree[0].total_amount_minor, -7_750);
    assert_eq!(tree[0].entries.len(), 3);
    assert_eq!(tree[1].total_amount_minor, 7_750);
    assert_eq!(names(&tree[1].children), vec!["Food", "Transport"]);
    assert_eq!(tree[1].children[0].total_amount_minor, 3_750);
    assert_eq!(tree[1].children[1].total_amount_minor, 4_000);

    let grand_total: i64 = tree.iter().map(|l| l.total_amount_minor).sum();
    assert_eq!(grand_total, 0);
}

#[tokio::test]
async fn period_is_half_open() {
    let (engine, _db) = engine_with_db().await;
    let book = Household::create(&engine).await;
    let groceries = book.expense_matcher(&engine, "grocer", book.food).await;
    for day in [1, 15, 30] {
        let tx_id = book.record(&engine, -100, "GROCER", at(2024, 4, day)).await;
        book.match_with(&engine, tx_id, groceries).await;
    }

    let tree = engine
        .build_rapport(
            "alice",
            book.ledger_id,
            at(2024, 4, 1),
            at(2024, 4, 30),
            &[book.food],
        )
        .await
        .unwrap();
    // 1st and 15th inside, 30th at the exclusive end.
    assert_eq!(tree[0].total_amount_minor, 200);

    let empty = engine
        .build_rapport("alice", book.ledger_id, at(2023, 1, 1), at(2024, 1, 1), &[])
        .await
        .unwrap();
    assert!(empty.is_empty());

    let err = engine
        .build_rapport("alice", book.ledger_id, at(2024, 4, 1), at(2024, 4, 1), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn deleted_category_contributes_nothing() {
    let (engine, db) = engine_with_db().await;
    let book = Household::create(&engine).await;
    let groceries = book.expense_matcher(&engine, "grocer", book.food).await;
    let train = book.expense_matcher(&engine, "rail", book.transport).await;
    for (description, matcher) in [("GROCER", groceries), ("RAIL", train)] {
        let tx_id = book.record(&engine, -300, description, at(2024, 4, 12)).await;
        book.match_with(&engine, tx_id, matcher).await;
    }

    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "DELETE FROM categories WHERE id = ?",
        vec![book.transport.into()],
    ))
    .await
    .unwrap();

    let tree = engine
        .build_rapport(
            "alice",
            book.ledger_id,
            at(2024, 1, 1),
            at(2025, 1, 1),
            &[book.expense],
        )
        .await
        .unwrap();
    assert_eq!(names(&tree[0].children), vec!["Food"]);
    assert_eq!(tree[0].total_amount_minor, 300);

    // The booking itself is untouched.
    let bookings = engine
        .bookings_in_range("alice", book.ledger_id, at(2024, 1, 1), at(2025, 1, 1))
        .await
        .unwrap();
    assert!(bookings.iter().all(|b| b.total_minor() == Some(0)));
    assert_eq!(bookings.len(), 2);
}

#[tokio::test]
async fn read_access_is_required() {
    let (engine, _db) = engine_with_db().await;
    let book = Household::create(&engine).await;

    let err = engine
        .build_rapport("mallory", book.ledger_id, at(2024, 1, 1), at(2025, 1, 1), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .build_rapport("alice", Uuid::new_v4(), at(2024, 1, 1), at(2025, 1, 1), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn descendant_ids_resolve_inside_the_ledger() {
    let (engine, _db) = engine_with_db().await;
    let book = Household::create(&engine).await;
    let other = Household::create_for(&engine, "Holiday").await;

    let ids = engine
        .category_descendant_ids("alice", book.ledger_id, &[book.expense, other.expense])
        .await
        .unwrap();
    assert_eq!(ids.len(), 3);
    assert!(ids.contains(&book.expense));
    assert!(ids.contains(&book.food));
    assert!(ids.contains(&book.transport));

    let all = engine
        .category_descendant_ids("carol", book.ledger_id, &[])
        .await
        .unwrap();
    assert_eq!(all.len(), 5);
}
