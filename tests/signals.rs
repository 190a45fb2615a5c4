//! Termination signals cancel the shutdown token.

#![cfg(unix)]

use std::process::Command;
use std::time::Duration;

use cardgate::cancel_on_signal;
use tokio_util::sync::CancellationToken;

fn raise(signal: &str) {
    let status = Command::new("kill")
        .args([signal, &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());
}

#[tokio::test]
async fn signal_sent_right_after_install_cancels() {
    let token = CancellationToken::new();
    let _task = cancel_on_signal(token.clone()).unwrap();

    // No yield between installing and raising: the handler must already be live.
    raise("-TERM");

    tokio::time::timeout(Duration::from_secs(2), token.cancelled())
        .await
        .expect("SIGTERM did not cancel the token");
}

#[tokio::test]
async fn interrupt_cancels() {
    let token = CancellationToken::new();
    let task = cancel_on_signal(token.clone()).unwrap();

    raise("-INT");

    tokio::time::timeout(Duration::from_secs(2), token.cancelled())
        .await
        .expect("SIGINT did not cancel the token");
    task.await.unwrap();
}
