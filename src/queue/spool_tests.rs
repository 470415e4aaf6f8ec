//! Tests for spool-backed persistence.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use crate::queue::{DelayQueue, LocalQueue};
use crate::test_fixtures::MockClock;

const LEASE: Duration = Duration::from_secs(120);
const TTL: Duration = Duration::from_secs(3600);

fn spool_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

mod persistence {
    use super::*;

    #[tokio::test]
    async fn open_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("spool");

        let queue = LocalQueue::open(&dir, LEASE).unwrap();

        assert!(dir.is_dir());
        assert_eq!(queue.spool_dir(), Some(dir.as_path()));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn enqueue_writes_one_file_per_message() {
        let temp = TempDir::new().unwrap();
        let queue = LocalQueue::open(temp.path(), LEASE).unwrap();

        queue.enqueue(b"a".to_vec(), TTL, Duration::ZERO).await.unwrap();
        queue.enqueue(b"b".to_vec(), TTL, Duration::ZERO).await.unwrap();

        assert_eq!(
            spool_files(temp.path()),
            vec!["00000000000000000001.json", "00000000000000000002.json"]
        );
    }

    #[tokio::test]
    async fn pending_messages_survive_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let queue = LocalQueue::open(temp.path(), LEASE).unwrap();
            queue
                .enqueue(b"kept".to_vec(), TTL, Duration::ZERO)
                .await
                .unwrap();
        }

        let reopened = LocalQueue::open(temp.path(), LEASE).unwrap();
        let delivery = reopened.try_receive().await.unwrap();

        assert_eq!(delivery.payload, b"kept");
        assert_eq!(delivery.delivery_count, 1);
    }

    #[tokio::test]
    async fn ids_continue_after_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let queue = LocalQueue::open(temp.path(), LEASE).unwrap();
            queue.enqueue(b"a".to_vec(), TTL, Duration::ZERO).await.unwrap();
            queue.enqueue(b"b".to_vec(), TTL, Duration::ZERO).await.unwrap();
        }

        let reopened = LocalQueue::open(temp.path(), LEASE).unwrap();
        reopened.enqueue(b"c".to_vec(), TTL, Duration::ZERO).await.unwrap();

        assert_eq!(reopened.len(), 3);
        assert!(spool_files(temp.path()).contains(&"00000000000000000003.json".to_string()));
    }

    #[tokio::test]
    async fn ack_deletes_the_file() {
        let temp = TempDir::new().unwrap();
        let queue = LocalQueue::open(temp.path(), LEASE).unwrap();
        queue.enqueue(b"m".to_vec(), TTL, Duration::ZERO).await.unwrap();

        let delivery = queue.try_receive().await.unwrap();
        queue.ack(delivery.id).await.unwrap();

        assert!(spool_files(temp.path()).is_empty());
    }

    #[tokio::test]
    async fn expired_message_file_is_deleted() {
        let temp = TempDir::new().unwrap();
        let clock = Arc::new(MockClock::new(1_000_000));
        let queue = LocalQueue::open(temp.path(), LEASE)
            .unwrap()
            .with_clock(Arc::clone(&clock));
        queue
            .enqueue(b"m".to_vec(), Duration::from_secs(10), Duration::ZERO)
            .await
            .unwrap();

        clock.advance(Duration::from_secs(10));

        assert!(queue.try_receive().await.is_none());
        assert!(spool_files(temp.path()).is_empty());
    }

    #[tokio::test]
    async fn purging_expired_file_still_delivers_live_message() {
        let temp = TempDir::new().unwrap();
        let clock = Arc::new(MockClock::new(1_000_000));
        let queue = LocalQueue::open(temp.path(), LEASE)
            .unwrap()
            .with_clock(Arc::clone(&clock));
        queue
            .enqueue(b"short".to_vec(), Duration::from_secs(10), Duration::ZERO)
            .await
            .unwrap();
        queue
            .enqueue(b"long".to_vec(), TTL, Duration::from_secs(5))
            .await
            .unwrap();

        clock.advance(Duration::from_secs(10));

        let delivery = queue.try_receive().await.unwrap();
        assert_eq!(delivery.payload, b"long");
        assert_eq!(queue.len(), 1);
        assert_eq!(spool_files(temp.path()), vec!["00000000000000000002.json"]);
    }
}

mod recovery {
    use super::*;

    #[tokio::test]
    async fn skips_corrupt_and_temporary_files() {
        let temp = TempDir::new().unwrap();
        {
            let queue = LocalQueue::open(temp.path(), LEASE).unwrap();
            queue.enqueue(b"good".to_vec(), TTL, Duration::ZERO).await.unwrap();
        }
        std::fs::write(temp.path().join("00000000000000000007.json"), "not json").unwrap();
        std::fs::write(temp.path().join("00000000000000000008.json.tmp"), "partial").unwrap();
        std::fs::write(temp.path().join("README"), "ignored").unwrap();

        let queue = LocalQueue::open(temp.path(), LEASE).unwrap();

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.try_receive().await.unwrap().payload, b"good");
    }

    #[tokio::test]
    async fn skips_files_with_other_version() {
        let temp = TempDir::new().unwrap();
        let content = r#"{"version":99,"message":{"id":4,"payload":[1],"visible_at_ms":0,"expires_at_ms":18446744073709551615}}"#;
        std::fs::write(temp.path().join("00000000000000000004.json"), content).unwrap();

        let queue = LocalQueue::open(temp.path(), LEASE).unwrap();

        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn hand_written_file_without_delivery_count_loads() {
        let temp = TempDir::new().unwrap();
        let content = r#"{"version":1,"message":{"id":4,"payload":[104,105],"visible_at_ms":0,"expires_at_ms":18446744073709551615}}"#;
        std::fs::write(temp.path().join("00000000000000000004.json"), content).unwrap();

        let queue = LocalQueue::open(temp.path(), LEASE).unwrap();
        let delivery = queue.try_receive().await.unwrap();

        assert_eq!(delivery.id, 4);
        assert_eq!(delivery.payload, b"hi");
        assert_eq!(delivery.delivery_count, 1);
    }
}
