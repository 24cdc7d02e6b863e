//! Periodic time broadcast.
//!
//! Every 10 seconds the server pushes a `time` event with the current UTC
//! timestamp to all connected clients. The broadcast runs regardless of
//! connection count; with zero connections it simply delivers nothing.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use crate::{
    common::time::{Clock, to_json_timestamp},
    protocol::ServerEvent,
};

use super::registry::ConnectionRegistry;

/// Fixed period of the time broadcast.
pub const TIME_BROADCAST_INTERVAL: Duration = Duration::from_millis(10_000);

/// Build the `time` event payload for the clock's current instant.
pub fn time_event_json(clock: &dyn Clock) -> String {
    ServerEvent::Time {
        time: to_json_timestamp(clock.now_utc()),
    }
    .to_json()
}

/// Spawn the background task that broadcasts the current time every `period`.
///
/// The first broadcast happens one full period after spawning, like a
/// plain repeating timer. The task runs until aborted.
pub fn spawn_time_broadcaster(
    registry: Arc<ConnectionRegistry>,
    clock: Arc<dyn Clock>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick of `interval` completes immediately; skip it so the
        // first broadcast happens after one full period.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let payload = time_event_json(clock.as_ref());
            let delivered = registry.broadcast(&payload, None).await;
            tracing::info!("Broadcasted time event to {} connection(s)", delivered);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::time::FixedClock;
    use chrono::{TimeZone, Utc};
    use tokio::sync::mpsc;

    #[test]
    fn test_time_event_json_format() {
        // テスト項目: time イベントのペイロードが ISO-8601 (UTC, ミリ秒) 形式になる
        // given (前提条件):
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());

        // when (操作):
        let json = time_event_json(&clock);

        // then (期待する結果):
        assert_eq!(
            json,
            r#"{"event":"time","data":{"time":"2023-01-01T00:00:00.000Z"}}"#
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_is_broadcast_to_all_connections() {
        // テスト項目: タイマー発火ごとに全接続へ time イベントが届く
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        ));
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        registry.register(tx_a).await;
        registry.register(tx_b).await;

        let handle = spawn_time_broadcaster(registry.clone(), clock, TIME_BROADCAST_INTERVAL);

        // when (操作): 1 周期分だけ時間を進める
        tokio::time::sleep(TIME_BROADCAST_INTERVAL + Duration::from_millis(10)).await;

        // then (期待する結果):
        let expected = r#"{"event":"time","data":{"time":"2023-01-01T00:00:00.000Z"}}"#;
        assert_eq!(rx_a.recv().await.as_deref(), Some(expected));
        assert_eq!(rx_b.recv().await.as_deref(), Some(expected));

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_broadcast_waits_one_full_period() {
        // テスト項目: 最初のブロードキャストは起動直後ではなく 1 周期後に行われる
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        ));
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.register(tx).await;

        let handle = spawn_time_broadcaster(registry.clone(), clock, TIME_BROADCAST_INTERVAL);

        // when (操作): 半周期だけ時間を進める
        tokio::time::sleep(TIME_BROADCAST_INTERVAL / 2).await;

        // then (期待する結果):
        assert!(rx.try_recv().is_err());

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_with_no_connections_does_not_fault() {
        // テスト項目: 接続ゼロの状態でタイマーが発火しても異常が起きない
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        ));

        let handle = spawn_time_broadcaster(registry.clone(), clock, TIME_BROADCAST_INTERVAL);

        // when (操作): 3 周期分だけ時間を進める
        tokio::time::sleep(TIME_BROADCAST_INTERVAL * 3 + Duration::from_millis(10)).await;

        // then (期待する結果): タスクは生きたまま
        assert!(!handle.is_finished());

        handle.abort();
    }
}
