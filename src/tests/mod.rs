
use std::time::Duration;

use crate::alarms::{AlarmField, AlarmSet};
use crate::app::watch;
use crate::output::OutputFormat;
use crate::api::types::{AlarmValues, ScheduleParams};
use crate::api::Identifier;
use crate::batch::{self, BatchError, SerialRange};
use crate::runner::{Dashboard, DashboardError, ListView, Outcome};

use mock::{Call, MockBackend, ScriptedOperator};

fn dashboard(backend: MockBackend, page_size: u32) -> Dashboard<MockBackend, ScriptedOperator> {
    Dashboard::new(backend, ScriptedOperator::accepting(), page_size)
}

#[tokio::test]
async fn resolver_walks_every_page_once_in_order() {
    let backend = MockBackend::with_serials(1..=45);
    let range = SerialRange::new(Some(10), Some(42)).unwrap();

    let ids = batch::resolve_serial_range(&backend, range, 20).await.unwrap();

    assert_eq!(backend.list_calls(), vec![(1, 20), (2, 20), (3, 20)]);
    let expected: Vec<String> = (10..=42).map(|s| format!("r{s}")).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn resolver_stops_when_pagination_is_missing() {
    let mut backend = MockBackend::with_serials(1..=45);
    backend.omit_pagination = true;
    let range = SerialRange::new(Some(1), Some(45)).unwrap();

    let ids = batch::resolve_serial_range(&backend, range, 20).await.unwrap();

    assert_eq!(backend.list_calls(), vec![(1, 20)]);
    assert_eq!(ids.len(), 20);
}

#[tokio::test]
async fn resolver_reports_no_matches_distinctly() {
    let backend = MockBackend::with_serials(1..=5);
    let range = SerialRange::new(Some(100), Some(200)).unwrap();

    let err = batch::resolve_serial_range(&backend, range, 10)
        .await
        .unwrap_err();

    assert!(matches!(err, BatchError::NoMatches { start: 100, end: 200 }));
    assert_eq!(backend.list_calls().len(), 1);
}

#[tokio::test]
async fn inverted_range_is_rejected_before_any_request() {
    let mut dash = dashboard(MockBackend::with_serials(1..=5), 20);

    let err = dash.batch_delete(Some(5), Some(3)).await.unwrap_err();

    assert!(matches!(
        err,
        DashboardError::Batch(BatchError::InvertedRange { start: 5, end: 3 })
    ));
    assert!(dash.backend().calls().is_empty());
    assert!(dash.operator().prompts.borrow().is_empty());
}

#[tokio::test]
async fn batch_delete_resolves_at_current_page_size_and_sends_one_request() {
    let mut dash = dashboard(MockBackend::with_serials(1..=25), 10);

    let outcome = dash.batch_delete(Some(8), Some(12)).await.unwrap();

    let ack = outcome.completed().unwrap();
    assert_eq!(ack.count, 5);
    let calls = dash.backend().calls();
    assert_eq!(
        &calls[..4],
        &[
            Call::List { page: 1, page_size: 10 },
            Call::List { page: 2, page_size: 10 },
            Call::List { page: 3, page_size: 10 },
            Call::BatchDelete(vec![
                "r8".to_string(),
                "r9".to_string(),
                "r10".to_string(),
                "r11".to_string(),
                "r12".to_string(),
            ]),
        ]
    );
    // refresh of the current page afterwards
    assert_eq!(calls[4], Call::List { page: 1, page_size: 10 });
    assert_eq!(dash.pagination().page_size(), 10);
    assert_eq!(dash.operator().loading.get(), 0);
}

#[tokio::test]
async fn batch_delete_hides_loading_on_failure() {
    let mut dash = dashboard(MockBackend::with_serials(1..=3), 20);

    let err = dash.batch_delete(Some(50), Some(60)).await.unwrap_err();

    assert!(matches!(err, DashboardError::Batch(BatchError::NoMatches { .. })));
    assert_eq!(dash.operator().shown.get(), 1);
    assert_eq!(dash.operator().loading.get(), 0);
    assert!(!dash
        .backend()
        .calls()
        .iter()
        .any(|c| matches!(c, Call::BatchDelete(_))));
}

#[tokio::test]
async fn empty_listing_yields_empty_view_without_controls() {
    let mut dash = dashboard(MockBackend::default(), 20);

    let view = dash.load_robots().await.unwrap().clone();

    assert!(matches!(view, ListView::Empty { .. }));
    assert!(dash.pagination().controls().is_empty());
    assert_eq!(dash.pagination().total_count(), 0);
}

#[tokio::test]
async fn listing_without_pagination_block_is_an_error() {
    let mut backend = MockBackend::with_serials(1..=3);
    backend.omit_pagination = true;
    let mut dash = dashboard(backend, 20);

    let err = dash.load_robots().await.unwrap_err();

    assert!(matches!(err, DashboardError::MissingPagination));
    assert_eq!(dash.operator().loading.get(), 0);
}

#[tokio::test]
async fn listing_pages_follow_navigation() {
    let mut dash = dashboard(MockBackend::with_serials(1..=95), 10);

    let view = dash.go_to_page(5).await.unwrap().clone();
    match view {
        ListView::Page {
            robots,
            controls,
            footer,
            total_pages,
            ..
        } => {
            assert_eq!(robots.first().map(|r| r.serial_number), Some(41));
            assert_eq!(total_pages, 10);
            assert!(!controls.is_empty());
            assert!(footer.contains("[5]"));
        }
        other => panic!("unexpected view {other:?}"),
    }

    dash.change_page_size(50).await.unwrap();
    assert_eq!(dash.pagination().current_page(), 1);
    assert_eq!(dash.backend().list_calls().last(), Some(&(1, 50)));

    assert!(matches!(
        dash.change_page_size(30).await,
        Err(DashboardError::Invalid(_))
    ));
}

#[tokio::test]
async fn toggle_sends_one_patch_with_negated_state_then_refreshes() {
    let mut dash = dashboard(MockBackend::with_serials(1..=3), 20);

    let outcome = dash.toggle_status("r1", true).await.unwrap();

    assert!(matches!(outcome, Outcome::Completed(_)));
    assert_eq!(
        dash.backend().calls(),
        vec![
            Call::SetEnabled {
                robot_id: "r1".to_string(),
                enabled: false
            },
            Call::List { page: 1, page_size: 20 },
        ]
    );
}

#[tokio::test]
async fn rejected_toggle_surfaces_error_and_skips_refresh() {
    let mut dash = dashboard(MockBackend::with_serials(1..=3).rejecting("not found"), 20);

    let err = dash.toggle_status("r1", true).await.unwrap_err();

    assert!(err.is_rejection());
    assert_eq!(err.to_string(), "not found");
    assert_eq!(
        dash.backend().calls(),
        vec![Call::SetEnabled {
            robot_id: "r1".to_string(),
            enabled: false
        }]
    );
    assert_eq!(dash.operator().loading.get(), 0);
}

#[tokio::test]
async fn declined_confirmation_sends_nothing() {
    let mut dash = Dashboard::new(
        MockBackend::with_serials(1..=3),
        ScriptedOperator::declining(),
        20,
    );

    assert!(matches!(
        dash.toggle_status("r2", false).await.unwrap(),
        Outcome::Cancelled
    ));
    assert!(matches!(
        dash.delete_robot("r2").await.unwrap(),
        Outcome::Cancelled
    ));
    let target = Identifier::Serial(2);
    assert!(matches!(dash.start(&target).await.unwrap(), Outcome::Cancelled));
    assert!(dash.backend().calls().is_empty());
    assert_eq!(dash.operator().prompts.borrow().len(), 3);
}

#[tokio::test]
async fn add_robot_validates_before_sending() {
    let mut dash = dashboard(MockBackend::default(), 20);

    assert!(matches!(
        dash.add_robot("Robot 0", 0).await,
        Err(DashboardError::Invalid(_))
    ));
    assert!(dash.backend().calls().is_empty());

    dash.add_robot(" Robot 4 ", 4).await.unwrap();
    assert_eq!(
        dash.backend().calls()[0],
        Call::Add {
            name: "Robot 4".to_string(),
            serial: 4
        }
    );
    assert!(dash.operator().prompts.borrow().is_empty());
}

#[tokio::test]
async fn add_robot_accepts_blank_name() {
    let mut dash = dashboard(MockBackend::default(), 20);

    dash.add_robot("", 4).await.unwrap();
    dash.add_robot("   ", 5).await.unwrap();

    let calls = dash.backend().calls();
    assert_eq!(
        calls[0],
        Call::Add {
            name: String::new(),
            serial: 4
        }
    );
    assert_eq!(calls[1], Call::List { page: 1, page_size: 20 });
    assert_eq!(
        calls[2],
        Call::Add {
            name: String::new(),
            serial: 5
        }
    );
}

#[tokio::test]
async fn batch_add_builds_prefixed_enabled_robots() {
    let mut dash = dashboard(MockBackend::default(), 20);

    let ack = dash
        .batch_add(Some(7), Some(9), "Unit-")
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(ack.count, 3);
    match &dash.backend().calls()[0] {
        Call::BatchAdd(robots) => {
            let names: Vec<_> = robots.iter().map(|r| r.robot_name.as_str()).collect();
            assert_eq!(names, vec!["Unit-7", "Unit-8", "Unit-9"]);
            assert!(robots.iter().all(|r| r.enabled));
        }
        other => panic!("unexpected call {other:?}"),
    }
    assert!(dash.operator().prompts.borrow()[0].contains("add 3 robots"));
}

#[tokio::test]
async fn schedule_out_of_range_is_rejected_locally() {
    let dash = dashboard(MockBackend::default(), 20);
    let params = ScheduleParams {
        schedule_id: 1,
        weekday: 7,
        hour: 8,
        minute: 0,
        run_count: 1,
    };

    let err = dash
        .schedule_start(&Identifier::Serial(3), &params)
        .await
        .unwrap_err();

    assert!(matches!(err, DashboardError::Invalid(_)));
    assert!(dash.backend().calls().is_empty());
}

#[tokio::test]
async fn schedule_and_commands_address_the_target() {
    let dash = dashboard(MockBackend::default(), 20);
    let target = Identifier::Id("r5".to_string());
    let params = ScheduleParams {
        schedule_id: 2,
        weekday: 0,
        hour: 6,
        minute: 30,
        run_count: 3,
    };

    dash.schedule_start(&target, &params).await.unwrap();
    dash.start(&target).await.unwrap();
    dash.time_sync(&target).await.unwrap();

    assert_eq!(
        dash.backend().calls(),
        vec![
            Call::Schedule(target.clone(), params),
            Call::Start(target.clone()),
            Call::TimeSync(target.clone()),
        ]
    );
}

#[tokio::test]
async fn alarms_load_and_save_roundtrip() {
    let values = AlarmValues {
        alarm_fa: (1 << 26) | 0b101,
        alarm_fb: 0b100_0000_0001,
        alarm_fc: 1 << 30,
        alarm_fd: 0b10,
    };
    let mut backend = MockBackend::default();
    backend.alarms = values;
    let dash = dashboard(backend, 20);
    let target = Identifier::Serial(12);

    let mut set = dash.load_alarms(&target).await.unwrap();
    assert!(set.bits(AlarmField::Fa).contains(&26));
    dash.set_alarms(&target, &set).await.unwrap();

    set.bits_mut(AlarmField::Fd).insert(4);
    dash.set_alarms(&target, &set).await.unwrap();

    let calls = dash.backend().calls();
    assert_eq!(calls[1], Call::SetAlarms(target.clone(), values));
    match &calls[2] {
        Call::SetAlarms(_, sent) => assert_eq!(sent.alarm_fd, 0b10010),
        other => panic!("unexpected call {other:?}"),
    }
    assert!(dash.operator().prompts.borrow()[0].contains("update alarm settings"));
}

#[tokio::test]
async fn clearing_all_alarms_asks_distinct_confirmation() {
    let dash = dashboard(MockBackend::default(), 20);
    let target = Identifier::Id("r1".to_string());

    dash.set_alarms(&target, &AlarmSet::default()).await.unwrap();

    assert!(dash.operator().prompts.borrow()[0].contains("clear all alarms"));
    assert_eq!(
        dash.backend().calls(),
        vec![Call::SetAlarms(target, AlarmValues::default())]
    );
}

#[tokio::test(start_paused = true)]
async fn watch_keeps_refreshing_after_a_failed_reload() {
    let mut backend = MockBackend::with_serials(1..=30);
    backend.failing_lists = vec![2];
    let mut dash = dashboard(backend, 20);

    // ticks at 0s, 10s and 20s, stop at 25s
    let stop = tokio::time::sleep(Duration::from_secs(25));
    watch(&mut dash, OutputFormat::Json, 10, stop).await.unwrap();

    assert_eq!(dash.backend().list_calls(), vec![(1, 20), (1, 20), (1, 20)]);
    assert!(matches!(
        dash.view(),
        Some(ListView::Page { total_count: 30, .. })
    ));
    assert_eq!(dash.operator().loading.get(), 0);
}

#[tokio::test(start_paused = true)]
async fn watch_honours_stop_raised_during_a_reload() {
    let mut backend = MockBackend::with_serials(1..=3);
    backend.list_delay = Some(Duration::from_secs(5));
    let mut dash = dashboard(backend, 20);

    // fires at 2s, while the first reload is still waiting on the backend
    let stop = tokio::time::sleep(Duration::from_secs(2));
    watch(&mut dash, OutputFormat::Text, 10, stop).await.unwrap();

    assert_eq!(dash.backend().list_calls(), vec![(1, 20)]);
    assert!(dash.view().is_some());
}

#[tokio::test]
async fn view_robot_returns_snapshot() {
    let dash = dashboard(MockBackend::default(), 20);

    let snapshot = dash.view_robot("r3").await.unwrap();

    assert_eq!(snapshot.robot_id.as_deref(), Some("r3"));
    assert!(snapshot.is_running());
    assert_eq!(dash.operator().loading.get(), 0);
}
