use std::{sync::Arc, time::Duration};

use alloy_primitives::U256;
use rng_relayer::{
    config::Config,
    network::NetworkSnapshot,
    relayer::{Relayer, RelayerState},
    subsystems::{
        queue::Category,
        submission::{RandomValue, Submission},
    },
    test_utils::{
        mock_events::{mock_event, mock_unknown_event, MockEventSource},
        mock_generator::MockValueGenerator,
        mock_submission::MockChainClient,
        request, wait_until,
    },
};
use utils::context::AppContext;

struct TestRelayer {
    relayer: Arc<Relayer>,
    generator: Arc<MockValueGenerator>,
    chain: Arc<MockChainClient>,
}

impl TestRelayer {
    fn new(config: Config, generator: MockValueGenerator) -> Self {
        utils::init_tracing_tests();

        let generator = Arc::new(generator);
        let chain = Arc::new(MockChainClient::new());
        let relayer = Relayer::new(
            &config,
            RelayerState::new(NetworkSnapshot::default()),
            generator.clone(),
            chain.clone(),
        );

        Self {
            relayer: Arc::new(relayer),
            generator,
            chain,
        }
    }

    fn with_chunk_size(chunk_size: usize) -> Self {
        Self::new(
            Config {
                chunk_size,
                ..Default::default()
            },
            MockValueGenerator::new(),
        )
    }

    fn ingest(&self, category: Category, id: u64) {
        self.relayer.router().route(&mock_event(category, id));
    }

    async fn cycle(&self) -> usize {
        self.relayer.scheduler().run_cycle().await.total()
    }

    fn submissions(&self) -> Vec<Submission> {
        self.chain.submissions()
    }
}

fn batch_values(submission: &Submission) -> &[U256] {
    match &submission.value {
        RandomValue::Batch(values) => values,
        RandomValue::Single(_) => panic!("expected a batch value for {}", submission.category),
    }
}

fn last_two_digits(value: U256) -> u64 {
    (value % U256::from(100)).to::<u64>()
}

#[tokio::test]
async fn five_requests_drain_over_two_cycles() {
    let test = TestRelayer::with_chunk_size(3);

    for id in 1..=5 {
        test.ingest(Category::H13, id);
    }

    assert_eq!(test.cycle().await, 3);
    assert_eq!(test.relayer.state().queues.len(Category::H13), 2);
    let ids: Vec<U256> = test.submissions().iter().map(|s| s.request_id).collect();
    assert_eq!(ids, (1..=3u64).map(U256::from).collect::<Vec<_>>());

    assert_eq!(test.cycle().await, 2);
    assert!(test.relayer.state().queues.is_empty());
    let ids: Vec<U256> = test.submissions().iter().map(|s| s.request_id).collect();
    assert_eq!(ids, (1..=5u64).map(U256::from).collect::<Vec<_>>());
}

#[tokio::test]
async fn every_category_drains_in_ceil_n_over_chunk_cycles() {
    let chunk_size = 3;
    let test = TestRelayer::with_chunk_size(chunk_size);
    let n = 7u64;

    for category in Category::DISPATCH_ORDER {
        for id in 0..n {
            test.ingest(category, id);
        }
    }

    let cycles = (n as usize).div_ceil(chunk_size);
    for _ in 0..cycles {
        test.cycle().await;
    }
    assert!(test.relayer.state().queues.is_empty());

    let submissions = test.submissions();
    assert_eq!(submissions.len(), n as usize * Category::COUNT);

    // arrival order holds within each category
    for category in Category::DISPATCH_ORDER {
        let ids: Vec<U256> = submissions
            .iter()
            .filter(|s| s.category == category)
            .map(|s| s.request_id)
            .collect();
        assert_eq!(ids, (0..n).map(U256::from).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn earlier_request_is_submitted_first() {
    let test = TestRelayer::with_chunk_size(3);

    test.ingest(Category::G35, 20);
    test.ingest(Category::G35, 10);
    test.cycle().await;

    let submissions = test.submissions();
    assert_eq!(submissions[0].request_id, U256::from(20));
    assert_eq!(submissions[0].caller, request(20).caller);
    assert_eq!(submissions[1].request_id, U256::from(10));
}

#[tokio::test]
async fn persistent_generation_failure_submits_sentinel() {
    let test = TestRelayer::new(
        Config {
            max_retries: 5,
            ..Default::default()
        },
        MockValueGenerator::always_failing(),
    );

    test.ingest(Category::H13, 1);
    test.cycle().await;

    assert_eq!(test.generator.calls(), 5);
    let submissions = test.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].value, RandomValue::Single(U256::ZERO));
    assert!(submissions[0].fallback);

    test.ingest(Category::H35Batch, 2);
    test.cycle().await;

    assert_eq!(test.generator.calls(), 10);
    assert_eq!(
        test.submissions()[1].value,
        RandomValue::Batch(vec![U256::ZERO])
    );
}

#[tokio::test]
async fn exactly_one_submission_per_request() {
    let test = TestRelayer::with_chunk_size(3);

    for (i, category) in Category::DISPATCH_ORDER.into_iter().enumerate() {
        test.ingest(category, i as u64);
    }
    test.cycle().await;
    test.cycle().await;

    let submissions = test.submissions();
    assert_eq!(submissions.len(), Category::COUNT);
    for (i, category) in Category::DISPATCH_ORDER.into_iter().enumerate() {
        let matching = submissions
            .iter()
            .filter(|s| s.category == category && s.request_id == U256::from(i))
            .count();
        assert_eq!(matching, 1, "{category}");
    }
}

#[tokio::test]
async fn unknown_event_changes_nothing() {
    let test = TestRelayer::with_chunk_size(3);

    assert_eq!(test.relayer.router().route(&mock_unknown_event()), None);
    assert!(test.relayer.state().queues.is_empty());
    assert_eq!(test.cycle().await, 0);
    assert!(test.submissions().is_empty());
}

#[tokio::test]
async fn duplicate_events_are_both_submitted() {
    let test = TestRelayer::with_chunk_size(3);

    test.ingest(Category::DL, 4);
    test.ingest(Category::DL, 4);
    test.cycle().await;

    let submissions = test.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].request_id, submissions[1].request_id);
}

#[tokio::test]
async fn bonus_value_placement() {
    // generator hands out 1, 2, 3, ... so positions are easy to check
    let test = TestRelayer::with_chunk_size(3);
    test.ingest(Category::G35Batch, 1);
    test.cycle().await;

    let submissions = test.submissions();
    let values = batch_values(&submissions[0]);
    assert_eq!(values.len(), 10);
    let bonus = last_two_digits(values[0]);
    assert!((80..=97).contains(&bonus), "bonus {bonus}");
    assert_eq!(values[0] / U256::from(100), U256::from(1));
    assert_eq!(&values[1..], &(2..=10u64).map(U256::from).collect::<Vec<_>>()[..]);

    for (category, range) in [
        (Category::H13Batch, 95..=99),
        (Category::H35Batch, 80..=97),
        (Category::G13Batch, 90..=94),
    ] {
        let test = TestRelayer::with_chunk_size(3);
        test.ingest(category, 1);
        test.cycle().await;

        let submissions = test.submissions();
        let values = batch_values(&submissions[0]);
        assert_eq!(values.len(), 10);
        assert_eq!(&values[..9], &(1..=9u64).map(U256::from).collect::<Vec<_>>()[..]);
        assert_eq!(values[9] / U256::from(100), U256::from(10));
        let bonus = last_two_digits(values[9]);
        assert!(range.contains(&bonus), "{category} bonus {bonus}");
    }
}

#[tokio::test]
async fn bonus_draws_span_the_range() {
    for (category, bonus_at, min, max) in [
        (Category::H13Batch, 9, 95, 99),
        (Category::H35Batch, 9, 80, 97),
        (Category::G13Batch, 9, 90, 94),
        (Category::G35Batch, 0, 80, 97),
    ] {
        let test = TestRelayer::with_chunk_size(300);
        for id in 0..300 {
            test.ingest(category, id);
        }
        assert_eq!(test.cycle().await, 300);

        let bonuses: Vec<u64> = test
            .submissions()
            .iter()
            .map(|submission| last_two_digits(batch_values(submission)[bonus_at]))
            .collect();

        assert!(
            bonuses.iter().all(|bonus| (min..=max).contains(bonus)),
            "{category} bonus outside {min}..={max}"
        );
        assert!(bonuses.contains(&min), "{category} never drew {min}");
        assert!(bonuses.contains(&max), "{category} never drew {max}");
    }
}

#[tokio::test]
async fn runs_events_through_to_submissions() {
    let test = TestRelayer::new(
        Config {
            sleep_interval_ms: 10,
            ..Default::default()
        },
        MockValueGenerator::new(),
    );
    let ctx = AppContext::from_current();
    let source = Arc::new(MockEventSource::new(vec![
        mock_event(Category::H13, 1),
        mock_unknown_event(),
        mock_event(Category::G13Batch, 2),
    ]));

    let handle = tokio::spawn({
        let relayer = test.relayer.clone();
        let ctx = ctx.clone();
        let source = source.clone();
        async move { relayer.run(ctx, source).await }
    });

    wait_until(None, || test.chain.submission_count() == 2)
        .await
        .unwrap();

    // events keep flowing while the scheduler runs
    assert!(source.send(mock_event(Category::DL, 3)));
    wait_until(None, || test.chain.submission_count() == 3)
        .await
        .unwrap();

    ctx.kill();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    let categories: Vec<Category> = test.submissions().iter().map(|s| s.category).collect();
    assert_eq!(
        categories,
        vec![Category::H13, Category::G13Batch, Category::DL]
    );
}

#[tokio::test]
async fn failed_event_source_does_not_stop_the_relayer() {
    let test = TestRelayer::new(
        Config {
            sleep_interval_ms: 10,
            ..Default::default()
        },
        MockValueGenerator::new(),
    );
    let ctx = AppContext::from_current();

    // requests that were already queued still get answered
    test.ingest(Category::H35, 1);

    let handle = tokio::spawn({
        let relayer = test.relayer.clone();
        let ctx = ctx.clone();
        async move { relayer.run(ctx, Arc::new(MockEventSource::failing())).await }
    });

    wait_until(None, || test.chain.submission_count() == 1)
        .await
        .unwrap();

    ctx.kill();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn shutdown_drops_pending_requests() {
    let test = TestRelayer::new(
        Config {
            // long enough that no cycle runs during the test
            sleep_interval_ms: 60 * 60 * 1000,
            ..Default::default()
        },
        MockValueGenerator::new(),
    );
    let ctx = AppContext::from_current();
    let source = Arc::new(MockEventSource::new(vec![
        mock_event(Category::H13, 1),
        mock_event(Category::G35Batch, 2),
    ]));

    let handle = tokio::spawn({
        let relayer = test.relayer.clone();
        let ctx = ctx.clone();
        let source = source.clone();
        async move { relayer.run(ctx, source).await }
    });

    wait_until(None, || test.relayer.state().queues.total_len() == 2)
        .await
        .unwrap();

    ctx.kill();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    assert!(test.relayer.state().queues.is_empty());
    assert!(test.submissions().is_empty());
}

#[tokio::test]
async fn submission_failures_are_swallowed() {
    let generator = Arc::new(MockValueGenerator::new());
    let chain = Arc::new(MockChainClient::failing());
    let relayer = Relayer::new(
        &Config::default(),
        RelayerState::new(NetworkSnapshot::default()),
        generator.clone(),
        chain.clone(),
    );

    relayer.router().route(&mock_event(Category::G13, 1));
    relayer.router().route(&mock_event(Category::G13, 2));

    let summary = relayer.scheduler().run_cycle().await;
    assert_eq!(summary.total(), 2);
    assert_eq!(summary.failed, 2);

    // not retried, not re-queued
    assert_eq!(chain.submission_count(), 2);
    assert!(relayer.state().queues.is_empty());
    assert_eq!(relayer.scheduler().run_cycle().await.total(), 0);
    assert_eq!(chain.submission_count(), 2);
}
