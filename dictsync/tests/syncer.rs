use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use dictsync::error::ErrorKind;
use dictsync::sink::base::WordState;
use dictsync::sync_error;
use dictsync::syncer::{DictionarySyncer, PassOutcome, PassReport};
use dictsync::test_utils::sink::{RecordingSink, SinkCall};
use dictsync::test_utils::source::{TestChangeSource, test_fetcher};
use dictsync::types::{ChangeRow, DictionaryKind, SENTINEL_WATERMARK};
use dictsync::watermark::WatermarkStore;
use dictsync_telemetry::init_test_tracing;

const MAIN: DictionaryKind = DictionaryKind::MainDictionary;
const STOP: DictionaryKind = DictionaryKind::StopWordDictionary;

fn timestamp(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn build_syncer(source: &TestChangeSource) -> DictionarySyncer<TestChangeSource, RecordingSink> {
    DictionarySyncer::new(
        source.clone(),
        RecordingSink::new(),
        test_fetcher(),
        WatermarkStore::new(),
    )
}

fn expect_completed(outcome: PassOutcome) -> PassReport {
    match outcome {
        PassOutcome::Completed(report) => report,
        other => panic!("expected a completed pass, got {other:?}"),
    }
}

fn expect_failed(outcome: PassOutcome) -> ErrorKind {
    match outcome {
        PassOutcome::Failed(err) => err.kind(),
        other => panic!("expected a failed pass, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn pass_applies_changes_and_advances_the_watermark() {
    init_test_tracing();

    let t1 = timestamp(10, 0);
    let t2 = timestamp(10, 5);
    let t3 = timestamp(10, 10);
    let source = TestChangeSource::new();
    source
        .push_rows(
            MAIN,
            vec![
                ChangeRow::new("hello", false, t1),
                ChangeRow::new("", false, t2),
                ChangeRow::new("oldword", true, t3),
            ],
        )
        .await;
    let syncer = build_syncer(&source);
    assert_eq!(
        syncer.watermarks().get(MAIN).to_string(),
        "2020-01-01 00:00:00"
    );

    let report = expect_completed(syncer.run_pass(MAIN).await);

    let dictionary = syncer.sink().dictionary();
    assert_eq!(dictionary.state(MAIN, "hello"), Some(WordState::Active));
    assert_eq!(dictionary.state(MAIN, "oldword"), Some(WordState::Disabled));
    assert_eq!(syncer.watermarks().get(MAIN), t3);
    assert_eq!(report.added, 1);
    assert_eq!(report.disabled, 1);
    assert_eq!(report.skipped_empty, 1);
    assert_eq!(report.watermark_before, SENTINEL_WATERMARK);
    assert_eq!(report.watermark_after, t3);
    assert_eq!(syncer.watermarks().get(STOP), SENTINEL_WATERMARK);
}

#[tokio::test(flavor = "multi_thread")]
async fn blank_words_never_reach_the_sink() {
    init_test_tracing();

    let source = TestChangeSource::new();
    source
        .push_rows(
            STOP,
            vec![
                ChangeRow::new(" \t ", false, timestamp(9, 0)),
                ChangeRow::new("", true, timestamp(9, 30)),
            ],
        )
        .await;
    let syncer = build_syncer(&source);

    let report = expect_completed(syncer.run_pass(STOP).await);

    assert!(syncer.sink().calls().is_empty());
    assert_eq!(report.applied(), 0);
    assert_eq!(report.skipped_empty, 2);
    assert_eq!(syncer.watermarks().get(STOP), SENTINEL_WATERMARK);
}

#[tokio::test(flavor = "multi_thread")]
async fn words_are_trimmed_before_being_applied() {
    init_test_tracing();

    let source = TestChangeSource::new();
    source
        .push_rows(MAIN, vec![ChangeRow::new("  padded\n", false, timestamp(8, 0))])
        .await;
    let syncer = build_syncer(&source);

    syncer.run_pass(MAIN).await;

    assert_eq!(
        syncer.sink().calls(),
        vec![SinkCall::Add(MAIN, "padded".to_string())]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn decode_error_mid_batch_keeps_the_watermark() {
    init_test_tracing();

    let source = TestChangeSource::new();
    source
        .push_fetch(
            MAIN,
            vec![
                Ok(ChangeRow::new("one", false, timestamp(11, 1))),
                Ok(ChangeRow::new("two", false, timestamp(11, 2))),
                Err(sync_error!(
                    ErrorKind::DecodeFailed,
                    "Change row could not be decoded",
                    "no column found for name: is_deleted"
                )),
                Ok(ChangeRow::new("four", false, timestamp(11, 4))),
                Ok(ChangeRow::new("five", false, timestamp(11, 5))),
            ],
        )
        .await;
    let syncer = build_syncer(&source);

    let kind = expect_failed(syncer.run_pass(MAIN).await);

    assert_eq!(kind, ErrorKind::DecodeFailed);
    assert_eq!(syncer.watermarks().get(MAIN), SENTINEL_WATERMARK);
    // Rows before the failure stay applied, rows after it are never reached.
    let dictionary = syncer.sink().dictionary();
    assert!(dictionary.is_active(MAIN, "one"));
    assert!(dictionary.is_active(MAIN, "two"));
    assert_eq!(dictionary.state(MAIN, "four"), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_batch_is_replayed_from_the_same_watermark() {
    init_test_tracing();

    let source = TestChangeSource::new();
    source
        .push_fetch(
            STOP,
            vec![
                Ok(ChangeRow::new("the", false, timestamp(12, 0))),
                Err(sync_error!(
                    ErrorKind::QueryFailed,
                    "Change query failed",
                    "connection reset by peer"
                )),
            ],
        )
        .await;
    source
        .push_rows(
            STOP,
            vec![
                ChangeRow::new("the", false, timestamp(12, 0)),
                ChangeRow::new("an", true, timestamp(12, 1)),
            ],
        )
        .await;
    let syncer = build_syncer(&source);

    assert_eq!(
        expect_failed(syncer.run_pass(STOP).await),
        ErrorKind::QueryFailed
    );
    let report = expect_completed(syncer.run_pass(STOP).await);

    assert_eq!(
        source.fetch_params(STOP).await,
        vec![SENTINEL_WATERMARK, SENTINEL_WATERMARK]
    );
    assert_eq!(report.added, 1);
    assert_eq!(report.disabled, 1);
    assert_eq!(syncer.watermarks().get(STOP), timestamp(12, 1));
    let dictionary = syncer.sink().dictionary();
    assert!(dictionary.is_active(STOP, "the"));
    assert_eq!(dictionary.state(STOP, "an"), Some(WordState::Disabled));
}

#[tokio::test(flavor = "multi_thread")]
async fn replaying_a_batch_leaves_the_dictionary_unchanged() {
    init_test_tracing();

    let rows = vec![
        ChangeRow::new("keep", false, timestamp(7, 0)),
        ChangeRow::new("drop", true, timestamp(7, 1)),
    ];
    let source = TestChangeSource::new();
    source.push_rows(MAIN, rows.clone()).await;
    source.push_rows(MAIN, rows).await;
    let syncer = build_syncer(&source);

    syncer.run_pass(MAIN).await;
    let once = syncer.sink().dictionary().active_words(MAIN);
    syncer.run_pass(MAIN).await;
    let twice = syncer.sink().dictionary().active_words(MAIN);

    assert_eq!(once, twice);
    assert_eq!(
        syncer.sink().dictionary().state(MAIN, "drop"),
        Some(WordState::Disabled)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn watermark_never_decreases_across_passes() {
    init_test_tracing();

    let source = TestChangeSource::new();
    source
        .push_rows(MAIN, vec![ChangeRow::new("late", false, timestamp(15, 0))])
        .await;
    // A source returning rows older than the watermark must not pull it back.
    source
        .push_rows(MAIN, vec![ChangeRow::new("early", false, timestamp(14, 0))])
        .await;
    source.push_rows(MAIN, vec![]).await;
    source
        .push_rows(MAIN, vec![ChangeRow::new("later", false, timestamp(16, 0))])
        .await;
    let syncer = build_syncer(&source);

    let mut previous = syncer.watermarks().get(MAIN);
    for _ in 0..4 {
        syncer.run_pass(MAIN).await;
        let current = syncer.watermarks().get(MAIN);
        assert!(current >= previous);
        previous = current;
    }

    assert_eq!(previous, timestamp(16, 0));
}

#[tokio::test(flavor = "multi_thread")]
async fn connection_is_released_once_on_every_path() {
    init_test_tracing();

    let source = TestChangeSource::new();
    source
        .push_rows(MAIN, vec![ChangeRow::new("ok", false, timestamp(1, 0))])
        .await;
    source
        .push_fetch(
            MAIN,
            vec![Err(sync_error!(ErrorKind::QueryFailed, "Change query failed"))],
        )
        .await;
    source
        .push_fetch(
            MAIN,
            vec![
                Ok(ChangeRow::new("partial", false, timestamp(2, 0))),
                Err(sync_error!(
                    ErrorKind::DecodeFailed,
                    "Change row could not be decoded"
                )),
            ],
        )
        .await;
    let syncer = build_syncer(&source);

    expect_completed(syncer.run_pass(MAIN).await);
    assert_eq!((source.acquired(), source.released()), (1, 1));

    assert_eq!(
        expect_failed(syncer.run_pass(MAIN).await),
        ErrorKind::QueryFailed
    );
    assert_eq!((source.acquired(), source.released()), (2, 2));

    assert_eq!(
        expect_failed(syncer.run_pass(MAIN).await),
        ErrorKind::DecodeFailed
    );
    assert_eq!((source.acquired(), source.released()), (3, 3));
}

#[tokio::test(flavor = "multi_thread")]
async fn overlapping_pass_of_the_same_kind_is_dropped() {
    init_test_tracing();

    let source = TestChangeSource::new();
    source
        .push_rows(MAIN, vec![ChangeRow::new("slow", false, timestamp(3, 0))])
        .await;
    source
        .push_rows(STOP, vec![ChangeRow::new("of", false, timestamp(3, 1))])
        .await;
    let gate = source.gate_fetches(MAIN).await;
    let syncer = build_syncer(&source);

    let first = tokio::spawn({
        let syncer = syncer.clone();
        async move { syncer.run_pass(MAIN).await }
    });
    gate.entered().await;
    assert!(syncer.is_running(MAIN));

    assert_eq!(syncer.run_pass(MAIN).await, PassOutcome::Skipped);
    let stop_report = expect_completed(syncer.run_pass(STOP).await);
    assert_eq!(stop_report.added, 1);

    gate.release();
    let first_report = expect_completed(first.await.unwrap());

    assert_eq!(first_report.added, 1);
    assert!(!syncer.is_running(MAIN));
    assert_eq!(source.fetch_params(MAIN).await.len(), 1);
    assert_eq!(syncer.watermarks().get(MAIN), timestamp(3, 0));
}

#[tokio::test(flavor = "multi_thread")]
async fn tick_syncs_both_kinds_and_survives_failures() {
    init_test_tracing();

    let source = TestChangeSource::new();
    source
        .fail_next_acquire(sync_error!(
            ErrorKind::AcquisitionFailed,
            "Failed to acquire a source connection",
            "pool timed out while waiting for an open connection"
        ))
        .await;
    source
        .push_rows(MAIN, vec![ChangeRow::new("word", false, timestamp(5, 0))])
        .await;
    source
        .push_rows(STOP, vec![ChangeRow::new("and", false, timestamp(5, 0))])
        .await;
    let syncer = build_syncer(&source);

    // One of the two passes of the first tick fails to acquire a connection.
    syncer.run_tick().await;
    syncer.run_tick().await;

    let dictionary = syncer.sink().dictionary();
    assert!(dictionary.is_active(MAIN, "word"));
    assert!(dictionary.is_active(STOP, "and"));
    assert_eq!(syncer.watermarks().get(MAIN), timestamp(5, 0));
    assert_eq!(syncer.watermarks().get(STOP), timestamp(5, 0));
    assert_eq!(source.acquired(), 3);
    assert_eq!(source.released(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn watermarks_survive_across_syncers_sharing_a_store() {
    init_test_tracing();

    let watermarks = WatermarkStore::new();
    let advanced = SENTINEL_WATERMARK + TimeDelta::days(30);
    watermarks.advance(MAIN, advanced);
    let source = TestChangeSource::new();
    let syncer = DictionarySyncer::new(
        source.clone(),
        RecordingSink::new(),
        test_fetcher(),
        watermarks,
    );

    syncer.run_pass(MAIN).await;

    assert_eq!(source.fetch_params(MAIN).await, vec![advanced]);
}
