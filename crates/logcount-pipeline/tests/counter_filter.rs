//! LogCounterFilter lifecycle and counting behaviour.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use logcount_core::clock::FixedClock;
use logcount_core::error::ErrorCode;
use logcount_core::message::Message;
use logcount_pipeline::filters::{CounterFilterConfig, LogCounterFilter};
use logcount_pipeline::plugin::{Filter, FilterRunner};

use common::{settings, strip_ts, svc_settings, RecordingRunner};

fn ready(runner: &Arc<RecordingRunner>) -> LogCounterFilter {
    let f = LogCounterFilter::with_clock(Arc::new(FixedClock::new(1_000)));
    f.configure(&svc_settings()).unwrap();
    f.prepare(Arc::clone(runner) as Arc<dyn FilterRunner>).unwrap();
    f
}

fn observe_n(f: &LogCounterFilter, n: usize) {
    let msg = Message::new("line", "x");
    for _ in 0..n {
        f.observe(&msg).unwrap();
    }
}

#[test]
fn defaults() {
    let c = CounterFilterConfig::default();
    assert_eq!(c.ticker_interval, 5);
    assert_eq!(c.payload_name, "local_report");
    assert!(c.influx_measurement.is_empty());
    assert!(c.influx_vip.is_empty());
    assert!(c.validate().is_err());
}

#[test]
fn configure_requires_measurement_ip_topic() {
    let cases = [
        "influx_ip: a\ninflux_topic: b\n",
        "influx_measurement: m\ninflux_topic: b\n",
        "influx_measurement: m\ninflux_ip: a\n",
        "influx_measurement: \"\"\ninflux_ip: a\ninflux_topic: b\ninflux_vip: v\n",
        "{}",
    ];
    for yaml in cases {
        let f = LogCounterFilter::new();
        let err = f.configure(&settings(yaml)).expect_err(yaml);
        assert_eq!(err.code(), ErrorCode::Configuration, "settings={yaml}");
        assert!(!f.is_configured());
    }
}

#[test]
fn configure_accepts_with_or_without_vip() {
    let f = LogCounterFilter::new();
    f.configure(&svc_settings()).unwrap();
    assert_eq!(f.prefix().unwrap().as_str(), "svc,ip=1.2.3.4,topic=events");

    let f = LogCounterFilter::new();
    f.configure(&settings(
        "influx_measurement: m\ninflux_vip: v\ninflux_ip: 10.0.0.1\ninflux_topic: t\n",
    ))
    .unwrap();
    assert_eq!(f.prefix().unwrap().as_str(), "m,vip=v,ip=10.0.0.1,topic=t");
}

#[test]
fn unknown_setting_is_configuration_error() {
    let f = LogCounterFilter::new();
    let mut s = svc_settings();
    s.insert("influx_topc".into(), "typo".into());
    let err = f.configure(&s).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Configuration);
}

#[test]
fn ticker_interval_from_settings() {
    let f = LogCounterFilter::new();
    assert!(f.ticker_interval().is_none());

    f.configure(&svc_settings()).unwrap();
    assert_eq!(f.ticker_interval(), Some(Duration::from_secs(5)));

    let mut s = svc_settings();
    s.insert("ticker_interval".into(), 0.into());
    f.configure(&s).unwrap();
    assert!(f.ticker_interval().is_none());
}

#[test]
fn n_observations_then_tick_reports_n() {
    let runner = RecordingRunner::new(4);
    let f = ready(&runner);

    observe_n(&f, 42);
    f.on_tick().unwrap();

    assert_eq!(f.count(), 0);
    let m = runner.last();
    assert_eq!(m.msg_type, "txt");
    assert_eq!(m.payload, "svc,ip=1.2.3.4,topic=events size=42,value=1 1000\n");
    let field = m.field("payload_name").unwrap();
    assert_eq!(field.value, "local_report");
    assert_eq!(field.representation, "Payload name for match");
}

#[test]
fn empty_ticks_report_zero() {
    let runner = RecordingRunner::new(4);
    let f = ready(&runner);

    f.on_tick().unwrap();
    f.on_tick().unwrap();

    let payloads = runner.payloads();
    assert_eq!(payloads.len(), 2);
    for p in &payloads {
        assert_eq!(strip_ts(p), "svc,ip=1.2.3.4,topic=events size=0,value=1");
    }
}

#[test]
fn exhausted_pool_keeps_count_for_next_tick() {
    let runner = RecordingRunner::new(1);
    let f = ready(&runner);

    observe_n(&f, 4);
    let held = runner.pool.acquire().unwrap();

    let err = f.on_tick().unwrap_err();
    assert_eq!(err.code(), ErrorCode::ResourceUnavailable);
    assert_eq!(f.count(), 4);
    assert_eq!(runner.errors.lock().as_slice(), &[ErrorCode::ResourceUnavailable]);
    assert!(runner.payloads().is_empty());

    drop(held);
    observe_n(&f, 3);
    f.on_tick().unwrap();

    assert_eq!(f.count(), 0);
    assert_eq!(strip_ts(&runner.last().payload), "svc,ip=1.2.3.4,topic=events size=7,value=1");
}

#[test]
fn refused_injection_keeps_count() {
    let runner = RecordingRunner::new(4);
    let f = ready(&runner);

    observe_n(&f, 2);
    runner.refuse_inject.store(true, Ordering::SeqCst);
    assert!(f.on_tick().is_err());
    assert_eq!(f.count(), 2);

    runner.refuse_inject.store(false, Ordering::SeqCst);
    observe_n(&f, 1);
    f.on_tick().unwrap();
    assert_eq!(strip_ts(&runner.last().payload), "svc,ip=1.2.3.4,topic=events size=3,value=1");
}

#[test]
fn restart_requires_reconfigure() {
    let runner = RecordingRunner::new(4);
    let f = ready(&runner);

    observe_n(&f, 7);
    f.cleanup_for_restart();

    assert_eq!(f.count(), 0);
    assert!(!f.is_configured());
    assert!(f.prefix().is_none());
    assert_eq!(
        f.observe(&Message::default()).unwrap_err().code(),
        ErrorCode::NotConfigured
    );
    assert_eq!(f.on_tick().unwrap_err().code(), ErrorCode::NotConfigured);
    assert_eq!(
        f.prepare(Arc::clone(&runner) as Arc<dyn FilterRunner>)
            .unwrap_err()
            .code(),
        ErrorCode::NotConfigured
    );

    f.configure(&svc_settings()).unwrap();
    f.prepare(Arc::clone(&runner) as Arc<dyn FilterRunner>).unwrap();
    observe_n(&f, 2);
    f.on_tick().unwrap();
    assert_eq!(strip_ts(&runner.last().payload), "svc,ip=1.2.3.4,topic=events size=2,value=1");
}

#[test]
fn tick_before_prepare_fails_without_reset() {
    let f = LogCounterFilter::new();
    f.configure(&svc_settings()).unwrap();
    observe_n(&f, 3);
    assert_eq!(f.on_tick().unwrap_err().code(), ErrorCode::Internal);
    assert_eq!(f.count(), 3);
}

#[test]
fn clean_up_is_terminal() {
    let runner = RecordingRunner::new(4);
    let f = ready(&runner);
    observe_n(&f, 5);

    f.clean_up();
    assert_eq!(f.count(), 0);
    assert!(!f.is_configured());
    assert!(f.configure(&svc_settings()).is_err());
}

#[test]
fn restart_after_clean_up_stays_terminated() {
    let runner = RecordingRunner::new(4);
    let f = ready(&runner);
    observe_n(&f, 2);

    f.clean_up();
    f.cleanup_for_restart();

    assert_eq!(f.count(), 0);
    assert!(!f.is_configured());
    assert!(f.configure(&svc_settings()).is_err());
    assert_eq!(
        f.observe(&Message::default()).unwrap_err().code(),
        ErrorCode::NotConfigured
    );
}

#[test]
fn unquoted_numeric_labels() {
    let f = LogCounterFilter::with_clock(Arc::new(FixedClock::new(9)));
    f.configure(&settings(
        "influx_measurement: svc\ninflux_vip: 7\ninflux_ip: 10\ninflux_topic: 2024\npayload_name: 1.5\n",
    ))
    .unwrap();
    assert_eq!(f.prefix().unwrap().as_str(), "svc,vip=7,ip=10,topic=2024");

    let runner = RecordingRunner::new(1);
    f.prepare(Arc::clone(&runner) as Arc<dyn FilterRunner>).unwrap();
    f.on_tick().unwrap();
    assert_eq!(runner.last().field("payload_name").unwrap().value, "1.5");
}

#[test]
fn non_scalar_label_is_configuration_error() {
    let f = LogCounterFilter::new();
    let err = f
        .configure(&settings(
            "influx_measurement: [a, b]\ninflux_ip: h\ninflux_topic: t\n",
        ))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Configuration);
}

#[test]
fn concurrent_observe_and_tick_lose_nothing() {
    let runner = RecordingRunner::new(1024);
    let f = Arc::new(ready(&runner));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let f = Arc::clone(&f);
            thread::spawn(move || observe_n(&f, 10_000))
        })
        .collect();

    let ticker = {
        let f = Arc::clone(&f);
        thread::spawn(move || {
            for _ in 0..50 {
                f.on_tick().unwrap();
                thread::yield_now();
            }
        })
    };

    for w in workers {
        w.join().unwrap();
    }
    ticker.join().unwrap();
    f.on_tick().unwrap();

    let total: u64 = runner
        .payloads()
        .iter()
        .map(|p| {
            let size = strip_ts(p)
                .split_once(" size=")
                .and_then(|(_, rest)| rest.split_once(','))
                .map(|(n, _)| n)
                .unwrap();
            size.parse::<u64>().unwrap()
        })
        .sum();
    assert_eq!(total, 40_000);
    assert_eq!(f.count(), 0);
}
