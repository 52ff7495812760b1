//! Integration tests for the line-streaming process runner
//!
//! These run real `sh` child processes.

use std::sync::Arc;
use std::time::Duration;
use tailtray_core::error::ProcessError;
use tailtray_core::process::{CommandRunner, Invocation, SystemRunner};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

fn sh(script: &str) -> Invocation {
    Invocation::new(["sh", "-c", script]).unwrap().quiet()
}

#[tokio::test]
async fn test_lines_arrive_in_order_including_partial_last_line() {
    let result = SystemRunner::new()
        .run(&sh("printf 'one\\ntwo\\nthree'"))
        .await
        .unwrap();

    assert_eq!(result.lines, vec!["one", "two", "three"]);
    assert_eq!(result.exit_code, 0);
    assert!(result.success());
}

#[tokio::test]
async fn test_stderr_is_merged_into_the_same_stream() {
    let result = SystemRunner::new()
        .run(&sh("echo out1; echo err1 >&2; echo out2; echo err2 >&2"))
        .await
        .unwrap();

    assert_eq!(result.lines, vec!["out1", "err1", "out2", "err2"]);
}

#[tokio::test]
async fn test_blank_lines_and_crlf() {
    let result = SystemRunner::new()
        .run(&sh("printf 'a\\r\\n\\nb\\r\\n'"))
        .await
        .unwrap();

    assert_eq!(result.lines, vec!["a", "", "b"]);
}

#[tokio::test]
async fn test_non_zero_exit_is_not_an_error() {
    let result = SystemRunner::new()
        .run(&sh("echo failing; exit 3"))
        .await
        .unwrap();

    assert_eq!(result.lines, vec!["failing"]);
    assert_eq!(result.exit_code, 3);
    assert!(!result.success());
}

#[tokio::test]
async fn test_signal_exit_reports_negated_signal() {
    let result = SystemRunner::new().run(&sh("kill -9 $$")).await.unwrap();
    assert_eq!(result.exit_code, -9);
}

#[tokio::test]
async fn test_missing_program_is_a_launch_error() {
    let invocation = Invocation::new(["/nonexistent/definitely-missing-tool", "status"]).unwrap();
    let err = SystemRunner::new().run(&invocation).await.unwrap_err();

    match err {
        ProcessError::LaunchFailed { program, .. } => {
            assert_eq!(program, "/nonexistent/definitely-missing-tool");
        }
        other => panic!("Expected LaunchFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_callback_receives_lines_and_exit_code_is_returned() {
    let mut seen = Vec::new();
    let code = SystemRunner::new()
        .run_streaming(&sh("echo first; echo second; exit 4"), &mut |line: &str| {
            seen.push(line.to_uppercase())
        })
        .await
        .unwrap();

    assert_eq!(seen, vec!["FIRST", "SECOND"]);
    assert_eq!(code, 4);
}

#[tokio::test]
async fn test_lines_are_delivered_before_the_process_exits() {
    let runner = Arc::new(SystemRunner::new());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let task = tokio::spawn({
        let runner = Arc::clone(&runner);
        async move {
            let invocation = sh("echo first; sleep 3; echo second");
            runner
                .run_streaming(&invocation, &mut |line: &str| {
                    let _ = tx.send(line.to_string());
                })
                .await
        }
    });

    let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("first line was not streamed while the process ran");
    assert_eq!(first.as_deref(), Some("first"));
    assert!(!task.is_finished());

    assert_eq!(task.await.unwrap().unwrap(), 0);
    assert_eq!(rx.recv().await.as_deref(), Some("second"));
}

#[tokio::test]
async fn test_runs_in_working_directory() {
    let temp_dir = tempdir().unwrap();
    let invocation = sh("pwd").in_dir(temp_dir.path());

    let result = SystemRunner::new().run(&invocation).await.unwrap();

    assert_eq!(result.lines.len(), 1);
    assert_eq!(
        std::fs::canonicalize(&result.lines[0]).unwrap(),
        std::fs::canonicalize(temp_dir.path()).unwrap()
    );
}

#[tokio::test]
async fn test_shutdown_cancels_running_process() {
    let shutdown = CancellationToken::new();
    let runner = SystemRunner::with_shutdown(shutdown.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), runner.run(&sh("sleep 30")))
        .await
        .expect("cancelled process was not abandoned");

    assert!(matches!(result, Err(ProcessError::Cancelled { .. })));
    canceller.await.unwrap();
}
