#![cfg(unix)]

use station::{
    listener::{DecoderCommand, WeatherStationListener},
    shutdown, snapshot,
};
use std::time::Duration;

fn sh(script: &str) -> DecoderCommand {
    DecoderCommand {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
    }
}

#[tokio::test]
async fn last_good_event_wins() {
    let (writer, reader) = snapshot::shared();
    let (_trigger, signal) = shutdown::channel();

    let script = r#"printf '%s\n' '{"temperature_C": 18.4, "humidity": 72}' 'not json' '' '{"temperature_C": 19.0, "light_lux": 1000}' '{"temperature_C": 1'"#;
    let listener = WeatherStationListener::new(sh(script), Duration::ZERO, writer);

    tokio::time::timeout(Duration::from_secs(5), listener.spawn(signal))
        .await
        .expect("listener did not finish after decoder exit")
        .unwrap();

    let latest = reader.latest().unwrap();
    assert_eq!(latest.temperature_c, Some(19.0));
    assert!((latest.solar_radiation.unwrap() - 7.9).abs() < 1e-9);
    assert_eq!(latest.humidity, None);
}

#[tokio::test]
async fn missing_decoder_leaves_no_snapshot() {
    let (writer, reader) = snapshot::shared();
    let (_trigger, signal) = shutdown::channel();

    let command = DecoderCommand {
        program: "definitely-not-an-rf-decoder".to_string(),
        args: vec![],
    };

    WeatherStationListener::new(command, Duration::ZERO, writer)
        .spawn(signal)
        .await
        .unwrap();

    assert!(reader.latest().is_none());
}

#[tokio::test]
async fn shutdown_stops_silent_decoder() {
    let (writer, reader) = snapshot::shared();
    let (trigger, signal) = shutdown::channel();

    let task = WeatherStationListener::new(sh("sleep 30"), Duration::ZERO, writer).spawn(signal);
    tokio::time::sleep(Duration::from_millis(100)).await;
    trigger.trigger();

    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("listener ignored shutdown")
        .unwrap();
    assert!(reader.latest().is_none());
}

#[tokio::test]
async fn shutdown_interrupts_refresh_wait() {
    let (writer, reader) = snapshot::shared();
    let (trigger, signal) = shutdown::channel();

    let script = r#"printf '%s\n' '{"temperature_C": 18.4}'; sleep 30"#;
    let task =
        WeatherStationListener::new(sh(script), Duration::from_secs(3600), writer).spawn(signal);

    tokio::time::timeout(Duration::from_secs(5), async {
        while reader.latest().is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("no event arrived");

    trigger.trigger();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("listener ignored shutdown")
        .unwrap();

    assert_eq!(reader.latest().unwrap().temperature_c, Some(18.4));
}
