//! 组卷主流程：选题、校验、提交
mod common;

use std::collections::BTreeSet;

use common::*;
use test_composer::error::{ComposeError, Violation};
use test_composer::models::{CandidateItem, Tier};
use test_composer::services::{QueryOutcome, SelectionEvent};
use test_composer::workflow::{ComposeSession, EditorState};
use tokio_test::{assert_err, assert_ok};

fn visible(session: &ComposeSession, id: &str) -> CandidateItem {
    session
        .browser()
        .items()
        .iter()
        .find(|item| item.id == id)
        .cloned()
        .unwrap_or_else(|| panic!("当前页没有题目 {}", id))
}

fn ids(session: &ComposeSession) -> BTreeSet<String> {
    session
        .selection()
        .ids()
        .into_iter()
        .map(str::to_string)
        .collect()
}

async fn open_on_first_page(fx: &Fixture) -> ComposeSession {
    let (mut session, _events) = ComposeSession::new(&fx.collaborators, spec_5_221(), 20);
    assert_ok!(session.open().await);
    assert!(matches!(
        assert_ok!(session.refresh().await),
        QueryOutcome::Applied
    ));
    session
}

fn select(session: &mut ComposeSession, list: &[&str]) {
    for id in list {
        let item = visible(session, id);
        assert!(assert_ok!(session.toggle(&item, true)));
    }
}

#[tokio::test]
async fn accepts_exact_mix_and_commits() {
    let fx = fixture(MemoryStore::new(standard_catalog()).with_assigned(TEST, vec![]));
    let mut session = open_on_first_page(&fx).await;

    select(&mut session, &["E1", "E2", "M1", "M2", "H1"]);

    let receipt = assert_ok!(session.submit().await);
    assert_eq!(receipt.delta.to_add, vec!["E1", "E2", "H1", "M1", "M2"]);
    assert!(receipt.delta.to_remove.is_empty());
    assert_eq!(session.state(), EditorState::Closed);
    assert!(session.selection().is_empty());

    assert_eq!(
        fx.store.assigned_ids(TEST),
        BTreeSet::from(["E1", "E2", "M1", "M2", "H1"].map(String::from))
    );
}

#[tokio::test]
async fn reports_every_violation_in_one_pass() {
    let fx = fixture(MemoryStore::new(standard_catalog()).with_assigned(TEST, vec![]));
    let mut session = open_on_first_page(&fx).await;

    select(&mut session, &["E1", "E2", "M1", "M2", "H1"]);
    let e2 = visible(&session, "E2");
    assert_ok!(session.toggle(&e2, false));

    let err = assert_err!(session.submit().await);
    match err {
        ComposeError::Validation(report) => assert_eq!(
            report.violations,
            vec![
                Violation::Tier {
                    tier: Tier::Easy,
                    expected: 2,
                    actual: 1
                },
                Violation::Total {
                    expected: 5,
                    actual: 4
                },
            ]
        ),
        other => panic!("应为校验错误: {:?}", other),
    }

    // 校验失败不提交，会话回到浏览，选题原样保留
    assert_eq!(session.state(), EditorState::Browsing);
    assert_eq!(session.violations().len(), 2);
    assert_eq!(session.selection().size(), 4);
    assert_eq!(fx.store.write_count(), 0);
}

#[tokio::test]
async fn right_total_wrong_mix_is_rejected() {
    let fx = fixture(MemoryStore::new(standard_catalog()).with_assigned(TEST, vec![]));
    let mut session = open_on_first_page(&fx).await;

    select(&mut session, &["E1", "E2", "E3", "M1", "H1"]);

    let err = assert_err!(session.submit().await);
    assert!(matches!(err, ComposeError::Validation(_)));
    assert!(session
        .violations()
        .iter()
        .all(|v| matches!(v, Violation::Tier { .. })));
    assert_eq!(session.violations().len(), 2);
}

#[tokio::test]
async fn stale_catalog_response_is_discarded() {
    let fx = fixture(MemoryStore::new(standard_catalog()).with_assigned(TEST, vec![]));
    let (mut session, _events) = ComposeSession::new(&fx.collaborators, spec_5_221(), 10);
    assert_ok!(session.open().await);

    assert_ok!(session.set_text(Some("E1".to_string())));
    let first = assert_ok!(session.begin_query());
    assert_ok!(session.set_text(Some("H2".to_string())));
    let second = assert_ok!(session.begin_query());
    assert!(second.token > first.token);

    let fetcher = session.catalog_fetcher();
    let (first_page, second_page) =
        tokio::join!(fetcher.fetch(&first.query), fetcher.fetch(&second.query));

    // 第二个请求先返回
    assert!(matches!(
        session.apply_page(second.token, second_page),
        QueryOutcome::Applied
    ));
    assert!(matches!(
        session.apply_page(first.token, first_page),
        QueryOutcome::Stale
    ));

    let shown: Vec<&str> = session
        .browser()
        .items()
        .iter()
        .map(|item| item.id.as_str())
        .collect();
    assert_eq!(shown, vec!["H2"]);
    assert!(!session.browser().is_loading());
}

#[tokio::test]
async fn bulk_toggle_keeps_seeded_items() {
    let catalog = vec![
        item("Q1", Tier::Easy),
        item("Q2", Tier::Easy),
        item("Q3", Tier::Medium),
        item("Q4", Tier::Hard),
    ];
    let fx = fixture(MemoryStore::new(catalog).with_assigned(TEST, vec![entry("Q1", Tier::Easy)]));
    let (mut session, _events) = ComposeSession::new(&fx.collaborators, spec_5_221(), 10);
    assert_ok!(session.open().await);
    assert_eq!(ids(&session), BTreeSet::from(["Q1".to_string()]));

    // 只显示 Q2..Q4 的一页
    let page: Vec<CandidateItem> = ["Q2", "Q3", "Q4"]
        .iter()
        .map(|id| {
            let tier = match *id {
                "Q2" => Tier::Easy,
                "Q3" => Tier::Medium,
                _ => Tier::Hard,
            };
            item(id, tier)
        })
        .collect();
    let changed = assert_ok!(session.bulk_toggle(&page, true));
    assert_eq!(changed, 3);

    assert_eq!(
        ids(&session),
        BTreeSet::from(["Q1", "Q2", "Q3", "Q4"].map(String::from))
    );
}

#[tokio::test]
async fn selection_survives_filter_and_page_changes() {
    let fx = fixture(MemoryStore::new(standard_catalog()).with_assigned(TEST, vec![]));
    let (mut session, _events) = ComposeSession::new(&fx.collaborators, spec_5_221(), 3);
    assert_ok!(session.open().await);
    assert_ok!(session.refresh().await);

    select(&mut session, &["E1", "E2"]);

    assert_ok!(session.set_tier(Some(Tier::Hard)));
    assert_ok!(session.refresh().await);
    assert!(session.browser().items().iter().all(|i| i.tier == Tier::Hard));

    // 整页取消只影响当前页，其他页的已选题目不动
    assert_ok!(session.toggle_visible(true));
    assert_ok!(session.toggle_visible(false));
    assert_eq!(ids(&session), BTreeSet::from(["E1", "E2"].map(String::from)));

    assert_ok!(session.set_tier(None));
    assert_ok!(session.set_page(1));
    assert_ok!(session.refresh().await);
    assert_eq!(session.browser().page(), 1);
    assert_eq!(session.selection().size(), 2);
}

#[tokio::test]
async fn commit_writes_replacement_with_delta() {
    let fx = fixture(MemoryStore::new(standard_catalog()).with_assigned(
        TEST,
        vec![entry("Q1", Tier::Easy), entry("Q2", Tier::Easy)],
    ));
    let mut spec = spec_5_221();
    spec.total = 2;
    spec.tier_counts = test_composer::models::TierCounts::new(2, 0, 0);

    let (mut session, _events) = ComposeSession::new(&fx.collaborators, spec, 10);
    assert_ok!(session.open().await);
    assert_ok!(session.dispatch(SelectionEvent::Remove {
        ids: vec!["Q1".to_string()],
    }));
    assert_ok!(session.toggle(&item("Q3", Tier::Easy), true));

    let receipt = assert_ok!(session.submit().await);
    assert_eq!(receipt.delta.to_add, vec!["Q3"]);
    assert_eq!(receipt.delta.to_remove, vec!["Q1"]);
    assert_eq!(receipt.delta.unchanged, vec!["Q2"]);

    let writes = fx.store.writes.lock().unwrap().clone();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].question_ids, vec!["Q2", "Q3"]);
    assert_eq!(
        fx.store.assigned_ids(TEST),
        BTreeSet::from(["Q2", "Q3"].map(String::from))
    );
}

#[tokio::test]
async fn repeating_the_same_commit_is_idempotent() {
    let fx = fixture(MemoryStore::new(standard_catalog()).with_assigned(TEST, vec![]));
    let mut session = open_on_first_page(&fx).await;
    select(&mut session, &["E1", "E2", "M1", "M2", "H1"]);

    let selection = session.selection().clone();
    let snapshot = session.snapshot().cloned().unwrap_or_default();
    let coordinator = &fx.collaborators.coordinator;

    assert_ok!(coordinator.commit(TEST, &selection, &snapshot).await);
    let after_first = fx.store.assigned_ids(TEST);
    assert_ok!(coordinator.commit(TEST, &selection, &snapshot).await);

    assert_eq!(fx.store.assigned_ids(TEST), after_first);
    assert_eq!(fx.store.write_count(), 2);

    // 两次写入的最终成员一致，差量仍按打开时的快照计算
    let writes = fx.store.writes.lock().unwrap().clone();
    assert_eq!(writes[0].question_ids, writes[1].question_ids);
    assert_eq!(writes[1].add, writes[0].add);
    assert!(!coordinator.is_in_flight(TEST));
}
