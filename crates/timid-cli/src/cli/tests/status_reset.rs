//! Tests for status and reset.

use super::parse;
use crate::cli::{ClassArg, CliCommand};
use std::path::PathBuf;

#[test]
fn cli_parse_status() {
    match parse(&["timid", "status", "http://example.com/list"]) {
        CliCommand::Status {
            manifest_url,
            state_dir,
        } => {
            assert_eq!(manifest_url, "http://example.com/list");
            assert!(state_dir.is_none());
        }
        _ => panic!("expected Status"),
    }
}

#[test]
fn cli_parse_status_with_state_dir() {
    match parse(&["timid", "status", "http://x/list", "--state-dir", "s"]) {
        CliCommand::Status { state_dir, .. } => {
            assert_eq!(state_dir, Some(PathBuf::from("s")));
        }
        _ => panic!("expected Status with --state-dir"),
    }
}

#[test]
fn cli_parse_reset_both_classes() {
    match parse(&["timid", "reset", "http://x/list"]) {
        CliCommand::Reset { only, .. } => assert!(only.is_none()),
        _ => panic!("expected Reset"),
    }
}

#[test]
fn cli_parse_reset_only_image() {
    match parse(&["timid", "reset", "http://x/list", "--only", "image"]) {
        CliCommand::Reset {
            manifest_url, only, ..
        } => {
            assert_eq!(manifest_url, "http://x/list");
            assert_eq!(only, Some(ClassArg::Image));
        }
        _ => panic!("expected Reset with --only"),
    }
}
