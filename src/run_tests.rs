//! Tests for the run module.

use super::*;

mod run_error {
    use super::*;

    #[test]
    fn bind_displays_address_and_source() {
        let error = RunError::Bind {
            addr: "127.0.0.1:8080".parse().unwrap(),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };

        let message = error.to_string();
        assert!(message.starts_with("Failed to bind 127.0.0.1:8080"));
    }

    #[test]
    fn spool_displays_source() {
        let error = RunError::Spool(QueueError::Spool(io::Error::other("denied")));
        assert!(error.to_string().contains("Failed to open spool directory"));
    }

    #[test]
    fn debug_format_works() {
        let error = RunError::Serve(io::Error::other("boom"));
        let debug_str = format!("{error:?}");
        assert!(debug_str.contains("Serve"));
    }
}

mod queue_setup {
    use super::*;
    use retry_relay::config::Cli;
    use tempfile::TempDir;

    fn config(args: &[&str]) -> ValidatedConfig {
        let mut full_args = vec!["retry-relay"];
        full_args.extend(args);
        ValidatedConfig::from_raw(&Cli::parse_from_iter(full_args), None).unwrap()
    }

    #[test]
    fn without_spool_dir_queue_is_in_memory() {
        let queue = open_queue(&config(&[])).unwrap();

        assert!(queue.spool_dir().is_none());
        assert_eq!(queue.lease(), std::time::Duration::from_secs(120));
    }

    #[test]
    fn spool_dir_is_created_and_used() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("spool");

        let queue = open_queue(&config(&["--spool-dir", dir.to_str().unwrap()])).unwrap();

        assert_eq!(queue.spool_dir(), Some(dir.as_path()));
        assert!(dir.is_dir());
    }

    #[test]
    fn unusable_spool_dir_is_spool_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not-a-dir");
        std::fs::write(&file, "occupied").unwrap();

        let result = open_queue(&config(&["--spool-dir", file.to_str().unwrap()]));

        assert!(matches!(result, Err(RunError::Spool(_))));
    }
}

mod schedule_description {
    use super::*;
    use std::time::Duration;

    #[test]
    fn lists_every_delay() {
        let policy = RetryPolicy::new()
            .with_initial_retry_delay(Duration::from_secs(10))
            .with_max_retry_delay(Duration::from_secs(100));

        assert_eq!(
            describe_schedule(&policy),
            "10s, 20s, 40s, 80s (up to 4 retries, abandoned at 100s)"
        );
    }

    #[test]
    fn default_policy_has_ten_delays() {
        let description = describe_schedule(&RetryPolicy::default());

        assert!(description.starts_with("300s, 600s"));
        assert!(description.contains("153600s"));
        assert!(description.contains("up to 10 retries"));
    }
}
