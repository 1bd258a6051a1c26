//! End-to-end behavior of both bindings against the public API.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::{Request, Response, StatusCode};
use tower::{Layer, ServiceExt, service_fn};
use tsu_timing::{ClientAddr, Config, LogLevel, Logger, Timing, TimingLayer};

type Lines = Arc<Mutex<Vec<(LogLevel, String)>>>;

fn capture(config: Config) -> (Config, Lines) {
    let seen: Lines = Arc::default();
    let sink = Arc::clone(&seen);
    let config = Config {
        color: false,
        logger: Logger::from_fn(move |level, line: &str| {
            sink.lock().unwrap().push((level, line.to_owned()));
        }),
        ..config
    };
    (config, seen)
}

fn scenario_config() -> Config {
    Config {
        warning_threshold: Duration::from_millis(200),
        error_threshold: Duration::from_millis(1000),
        log_all_requests: true,
        ..Config::default()
    }
}

fn levels(seen: &Lines) -> Vec<LogLevel> {
    seen.lock().unwrap().iter().map(|(level, _)| *level).collect()
}

async fn sleepy(req: Request<()>) -> Response<String> {
    let ms: u64 = req.uri().path().trim_start_matches('/').parse().unwrap_or(0);
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Response::new(format!("slept {ms}"))
}

fn get(path: &str) -> Request<()> {
    Request::builder().uri(path).body(()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn thresholds_scenario() {
    let (config, seen) = capture(scenario_config());
    let handler = Timing::new(config).wrap(sleepy);

    for path in ["/0", "/600", "/2100"] {
        handler.call(get(path)).await;
    }

    assert_eq!(levels(&seen), vec![LogLevel::Info, LogLevel::Warn, LogLevel::Error]);
}

#[tokio::test(start_paused = true)]
async fn default_config_stays_quiet_for_fast_requests() {
    let (config, seen) = capture(Config::default());
    let handler = Timing::new(config).wrap(sleepy);

    let res = handler.call(get("/0")).await;

    assert_eq!(res.body(), "slept 0");
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn disabled_never_logs() {
    let (config, seen) = capture(Config { enabled: false, ..scenario_config() });
    let handler = Timing::new(config).wrap(sleepy);

    for path in ["/0", "/600", "/2100"] {
        let res = handler.call(get(path)).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn disable_then_enable_resumes_logging() {
    let (config, seen) = capture(scenario_config());
    let timing = Timing::new(config);
    let handler = timing.wrap(sleepy);

    timing.disable();
    handler.call(get("/600")).await;
    timing.enable();
    handler.call(get("/600")).await;

    assert!(timing.config().enabled);
    assert_eq!(levels(&seen), vec![LogLevel::Warn]);
}

#[tokio::test(start_paused = true)]
async fn skip_paths_apply_to_the_tower_binding_too() {
    let (mut config, seen) = capture(scenario_config());
    config.add_skip_path("/2100");
    let svc = TimingLayer::new(config).layer(service_fn(|req: Request<()>| async move {
        Ok::<_, Infallible>(sleepy(req).await)
    }));

    let res = svc.clone().oneshot(get("/2100")).await.unwrap();
    assert_eq!(res.body(), "slept 2100");
    assert!(seen.lock().unwrap().is_empty());

    svc.oneshot(get("/600")).await.unwrap();
    assert_eq!(levels(&seen), vec![LogLevel::Warn]);
}

#[tokio::test]
async fn one_line_per_request_under_concurrency() {
    let (config, seen) = capture(scenario_config());
    let handler = Timing::new(config).wrap(sleepy);

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..16 {
        let handler = handler.clone();
        tasks.spawn(async move { handler.call(get("/0")).await });
    }
    while let Some(res) = tasks.join_next().await {
        assert_eq!(res.unwrap().status(), StatusCode::OK);
    }

    assert_eq!(seen.lock().unwrap().len(), 16);
}

#[tokio::test]
async fn status_is_read_after_completion() {
    let (config, seen) = capture(scenario_config());
    let handler = Timing::new(config).wrap(|_req: Request<()>| async {
        tokio::task::yield_now().await;
        let mut res = Response::new(());
        *res.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
        res
    });

    let mut req = get("/ready");
    req.extensions_mut().insert(ClientAddr("10.1.2.3:40000".parse().unwrap()));
    let res = handler.call(req).await;

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let seen = seen.lock().unwrap();
    let line = &seen[0].1;
    assert!(line.starts_with("[INFO] "));
    assert!(line.contains("| 503 |"));
    assert!(line.contains("|        10.1.2.3 |"));
    assert!(line.ends_with("GET     /ready"));
}

#[tokio::test]
async fn panicking_logger_does_not_lose_the_response() {
    let config = Config {
        log_all_requests: true,
        logger: Logger::from_fn(|_, _: &str| panic!("log sink down")),
        ..Config::default()
    };
    let handler = Timing::new(config).wrap(sleepy);

    let res = handler.call(get("/0")).await;
    assert_eq!(res.body(), "slept 0");
}
