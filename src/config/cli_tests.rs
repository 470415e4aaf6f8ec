//! Tests for CLI argument parsing.

use std::path::PathBuf;

use super::cli::{Cli, Command};

mod parsing {
    use super::*;

    #[test]
    fn parse_no_args() {
        let cli = Cli::parse_from_iter(["retry-relay"]);

        assert!(cli.command.is_none());
        assert!(cli.listen.is_none());
        assert!(cli.prefix.is_none());
        assert!(cli.spool_dir.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_server_options() {
        let cli = Cli::parse_from_iter([
            "retry-relay",
            "--listen",
            "0.0.0.0:9000",
            "--prefix",
            "/relay/",
        ]);

        assert_eq!(cli.listen.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(cli.prefix.as_deref(), Some("/relay/"));
    }

    #[test]
    fn parse_relay_options() {
        let cli = Cli::parse_from_iter([
            "retry-relay",
            "--initial-timeout",
            "10",
            "--retry-timeout",
            "20",
            "--retry-delay",
            "60",
            "--max-retry-delay",
            "3600",
        ]);

        assert_eq!(cli.initial_timeout, Some(10));
        assert_eq!(cli.retry_timeout, Some(20));
        assert_eq!(cli.retry_delay, Some(60));
        assert_eq!(cli.max_retry_delay, Some(3600));
    }

    #[test]
    fn parse_paths() {
        let cli = Cli::parse_from_iter([
            "retry-relay",
            "--spool-dir",
            "/var/lib/retry-relay",
            "-c",
            "relay.toml",
        ]);

        assert_eq!(cli.spool_dir, Some(PathBuf::from("/var/lib/retry-relay")));
        assert_eq!(cli.config, Some(PathBuf::from("relay.toml")));
    }

    #[test]
    fn parse_verbose_short_and_long() {
        assert!(Cli::parse_from_iter(["retry-relay", "-v"]).verbose);
        assert!(Cli::parse_from_iter(["retry-relay", "--verbose"]).verbose);
    }

    #[test]
    fn rejects_non_numeric_delay() {
        let result = <Cli as clap::Parser>::try_parse_from(["retry-relay", "--retry-delay", "soon"]);
        assert!(result.is_err());
    }
}

mod init_command {
    use super::*;

    #[test]
    fn init_uses_default_output() {
        let cli = Cli::parse_from_iter(["retry-relay", "init"]);

        assert!(cli.is_init());
        match cli.command {
            Some(Command::Init { output }) => {
                assert_eq!(output, PathBuf::from("retry-relay.toml"));
            }
            None => panic!("expected init command"),
        }
    }

    #[test]
    fn init_accepts_custom_output() {
        let cli = Cli::parse_from_iter(["retry-relay", "init", "-o", "custom.toml"]);

        match cli.command {
            Some(Command::Init { output }) => assert_eq!(output, PathBuf::from("custom.toml")),
            None => panic!("expected init command"),
        }
    }

    #[test]
    fn run_mode_is_not_init() {
        let cli = Cli::parse_from_iter(["retry-relay", "--listen", "127.0.0.1:1"]);
        assert!(!cli.is_init());
    }
}
