mod common;

use std::time::Duration;

use common::TestEnv;
use tokio::time::Instant;

const CLIENT: &str = "127.0.0.1:50002";

#[tokio::test]
async fn test_multi_exec_replays_in_order() {
    let env = TestEnv::new();

    assert_eq!(env.exec(CLIENT, &["MULTI"]).await, "+OK\r\n");
    assert_eq!(env.exec(CLIENT, &["SET", "a", "1"]).await, "+QUEUED\r\n");
    assert_eq!(env.exec(CLIENT, &["INCR", "a"]).await, "+QUEUED\r\n");

    // Nothing ran while queuing.
    assert_eq!(env.exec("other-client", &["GET", "a"]).await, "$-1\r\n");

    assert_eq!(env.exec(CLIENT, &["EXEC"]).await, "*2\r\n+OK\r\n:2\r\n");
    assert_eq!(env.exec(CLIENT, &["GET", "a"]).await, "$1\r\n2\r\n");
}

#[tokio::test]
async fn test_exec_without_multi() {
    let env = TestEnv::new();

    assert_eq!(
        env.exec(CLIENT, &["EXEC"]).await,
        "-ERR EXEC without MULTI\r\n"
    );
}

#[tokio::test]
async fn test_discard() {
    let env = TestEnv::new();

    env.exec(CLIENT, &["MULTI"]).await;
    env.exec(CLIENT, &["SET", "a", "1"]).await;

    assert_eq!(env.exec(CLIENT, &["DISCARD"]).await, "+OK\r\n");
    assert_eq!(env.exec(CLIENT, &["GET", "a"]).await, "$-1\r\n");

    assert_eq!(
        env.exec(CLIENT, &["DISCARD"]).await,
        "-ERR DISCARD without MULTI\r\n"
    );
}

#[tokio::test]
async fn test_nested_multi_is_rejected() {
    let env = TestEnv::new();

    env.exec(CLIENT, &["MULTI"]).await;
    assert_eq!(
        env.exec(CLIENT, &["MULTI"]).await,
        "-ERR MULTI calls can not be nested\r\n"
    );

    // The original transaction is still open.
    assert_eq!(env.exec(CLIENT, &["PING"]).await, "+QUEUED\r\n");
    assert_eq!(env.exec(CLIENT, &["EXEC"]).await, "*1\r\n+PONG\r\n");
}

#[tokio::test]
async fn test_exec_of_empty_transaction() {
    let env = TestEnv::new();

    env.exec(CLIENT, &["MULTI"]).await;
    assert_eq!(env.exec(CLIENT, &["EXEC"]).await, "*0\r\n");
}

#[tokio::test]
async fn test_failed_command_is_reported_inline() {
    let env = TestEnv::new();

    env.exec(CLIENT, &["SET", "word", "pear"]).await;

    env.exec(CLIENT, &["MULTI"]).await;
    env.exec(CLIENT, &["INCR", "word"]).await;
    env.exec(CLIENT, &["SET", "b", "2"]).await;

    assert_eq!(
        env.exec(CLIENT, &["EXEC"]).await,
        "*2\r\n-ERR value is not an integer or out of range\r\n+OK\r\n"
    );
    assert_eq!(env.exec(CLIENT, &["GET", "b"]).await, "$1\r\n2\r\n");
}

#[tokio::test]
async fn test_invalid_command_is_rejected_at_queue_time() {
    let env = TestEnv::new();

    env.exec(CLIENT, &["MULTI"]).await;

    assert_eq!(
        env.exec(CLIENT, &["GET"]).await,
        "-ERR wrong number of arguments for 'get' command\r\n"
    );

    // The bad command was never queued.
    assert_eq!(env.exec(CLIENT, &["EXEC"]).await, "*0\r\n");
}

#[tokio::test]
async fn test_blpop_inside_transaction_does_not_block() {
    let env = TestEnv::new();

    env.exec(CLIENT, &["MULTI"]).await;
    env.exec(CLIENT, &["BLPOP", "missing", "0"]).await;

    let started = Instant::now();
    assert_eq!(env.exec(CLIENT, &["EXEC"]).await, "*1\r\n*-1\r\n");
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[tokio::test]
async fn test_blpop_inside_transaction_pops_available_data() {
    let env = TestEnv::new();

    env.exec(CLIENT, &["RPUSH", "fruits", "pear"]).await;

    env.exec(CLIENT, &["MULTI"]).await;
    env.exec(CLIENT, &["BLPOP", "fruits", "0"]).await;

    assert_eq!(
        env.exec(CLIENT, &["EXEC"]).await,
        "*1\r\n*2\r\n$6\r\nfruits\r\n$4\r\npear\r\n"
    );
}

#[tokio::test]
async fn test_xread_inside_transaction_does_not_block() {
    let env = TestEnv::new();

    env.exec(CLIENT, &["MULTI"]).await;
    env.exec(
        CLIENT,
        &["XREAD", "BLOCK", "0", "STREAMS", "missing", "$"],
    )
    .await;

    let started = Instant::now();
    assert_eq!(env.exec(CLIENT, &["EXEC"]).await, "*1\r\n*-1\r\n");
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[tokio::test]
async fn test_transactions_are_per_connection() {
    let env = TestEnv::new();

    env.exec("client-a", &["MULTI"]).await;
    assert_eq!(env.exec("client-a", &["SET", "a", "1"]).await, "+QUEUED\r\n");

    // A different connection is unaffected by the open transaction.
    assert_eq!(env.exec("client-b", &["SET", "b", "2"]).await, "+OK\r\n");
    assert_eq!(
        env.exec("client-b", &["EXEC"]).await,
        "-ERR EXEC without MULTI\r\n"
    );
}
