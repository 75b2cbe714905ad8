use std::time::Duration;

use futures::{SinkExt, StreamExt};
use redis_lite::{connection::MAX_PENDING_REQUESTS, resp::RespValue};
use tokio::{io::AsyncWriteExt, net::TcpStream};

use crate::test_utils::TestUtils;

fn bulk_array(items: &[&str]) -> RespValue {
    RespValue::array_of_bulk_strings(items.iter().copied())
}

#[tokio::test]
async fn test_basic_commands_over_tcp() {
    let address = TestUtils::run_server().await;
    let mut client = TestUtils::connect(&address).await;

    let test_cases = vec![
        (TestUtils::ping_command(), RespValue::SimpleString("PONG".into())),
        (
            TestUtils::echo_command("hello world"),
            RespValue::BulkString("hello world".into()),
        ),
        (
            TestUtils::set_command("a", "1"),
            RespValue::SimpleString("OK".into()),
        ),
        (
            TestUtils::lrange_command("a", 0, -1),
            RespValue::Error(
                "WRONGTYPE Operation against a key holding the wrong kind of value".into(),
            ),
        ),
        (
            TestUtils::rpush_command("list", &["a", "b", "c"]),
            RespValue::Integer(3),
        ),
        (
            TestUtils::lpop_command_multiple_items("list", 2),
            bulk_array(&["a", "b"]),
        ),
        (TestUtils::llen_command("list"), RespValue::Integer(1)),
        (
            TestUtils::command("HELLO", &["3"]),
            RespValue::Error("ERR unknown command 'HELLO'".into()),
        ),
        (
            TestUtils::command("GET", &[]),
            RespValue::Error("ERR wrong number of arguments for 'get' command".into()),
        ),
    ];

    for (command, expected_response) in test_cases {
        TestUtils::send_command_and_receive(&mut client, command, expected_response).await;
    }
}

#[tokio::test]
async fn test_blpop_is_woken_by_another_client() {
    let address = TestUtils::run_server().await;
    let mut consumer = TestUtils::connect(&address).await;
    let mut producer = TestUtils::connect(&address).await;

    consumer
        .send(TestUtils::blpop_command("mylist", "0"))
        .await
        .unwrap();

    // Let the consumer register before the push.
    TestUtils::sleep_ms(100).await;

    TestUtils::send_command_and_receive(
        &mut producer,
        TestUtils::rpush_command("mylist", &["x"]),
        RespValue::Integer(1),
    )
    .await;

    assert_eq!(
        TestUtils::receive(&mut consumer).await,
        bulk_array(&["mylist", "x"])
    );
}

#[tokio::test]
async fn test_blpop_times_out_over_tcp() {
    let address = TestUtils::run_server().await;
    let mut client = TestUtils::connect(&address).await;

    let started = tokio::time::Instant::now();

    TestUtils::send_command_and_receive(
        &mut client,
        TestUtils::blpop_command("mylist", "0.1"),
        RespValue::Null,
    )
    .await;

    assert!(started.elapsed() >= Duration::from_millis(100));

    // The expired wait does not swallow a later push.
    TestUtils::send_command_and_receive(
        &mut client,
        TestUtils::rpush_command("mylist", &["x"]),
        RespValue::Integer(1),
    )
    .await;
    TestUtils::send_command_and_receive(
        &mut client,
        TestUtils::llen_command("mylist"),
        RespValue::Integer(1),
    )
    .await;
}

#[tokio::test]
async fn test_pipelined_requests_after_blpop_run_in_order() {
    let address = TestUtils::run_server().await;
    let mut consumer = TestUtils::connect(&address).await;
    let mut producer = TestUtils::connect(&address).await;

    consumer
        .send(TestUtils::blpop_command("jobs", "0"))
        .await
        .unwrap();
    consumer.send(TestUtils::ping_command()).await.unwrap();
    consumer
        .send(TestUtils::echo_command("after"))
        .await
        .unwrap();

    TestUtils::sleep_ms(100).await;

    TestUtils::send_command_and_receive(
        &mut producer,
        TestUtils::rpush_command("jobs", &["job1"]),
        RespValue::Integer(1),
    )
    .await;

    assert_eq!(
        TestUtils::receive(&mut consumer).await,
        bulk_array(&["jobs", "job1"])
    );
    assert_eq!(
        TestUtils::receive(&mut consumer).await,
        RespValue::SimpleString("PONG".into())
    );
    assert_eq!(
        TestUtils::receive(&mut consumer).await,
        RespValue::BulkString("after".into())
    );
}

#[tokio::test]
async fn test_disconnected_blpop_client_is_skipped() {
    let address = TestUtils::run_server().await;
    let mut leaving = TestUtils::connect(&address).await;
    let mut staying = TestUtils::connect(&address).await;
    let mut producer = TestUtils::connect(&address).await;

    leaving
        .send(TestUtils::blpop_command("tasks", "0"))
        .await
        .unwrap();
    TestUtils::sleep_ms(100).await;

    staying
        .send(TestUtils::blpop_command("tasks", "0"))
        .await
        .unwrap();
    TestUtils::sleep_ms(100).await;

    drop(leaving);
    TestUtils::sleep_ms(100).await;

    TestUtils::send_command_and_receive(
        &mut producer,
        TestUtils::rpush_command("tasks", &["t1"]),
        RespValue::Integer(1),
    )
    .await;

    assert_eq!(
        TestUtils::receive(&mut staying).await,
        bulk_array(&["tasks", "t1"])
    );
}

#[tokio::test]
async fn test_invalid_frame_keeps_connection_open() {
    let address = TestUtils::run_server().await;
    let mut client = TestUtils::connect(&address).await;

    TestUtils::send_command_and_receive(
        &mut client,
        RespValue::SimpleString("PING".into()),
        RespValue::Error("ERR invalid command".into()),
    )
    .await;

    TestUtils::send_command_and_receive(
        &mut client,
        TestUtils::ping_command(),
        RespValue::SimpleString("PONG".into()),
    )
    .await;
}

#[tokio::test]
async fn test_protocol_error_closes_connection() {
    let address = TestUtils::run_server().await;
    let mut stream = TcpStream::connect(&address).await.unwrap();

    stream.write_all(b"!oops\r\n").await.unwrap();

    let mut client = tokio_util::codec::Framed::new(stream, redis_lite::codec::RespCodec::default());

    match TestUtils::receive(&mut client).await {
        RespValue::Error(message) => assert!(message.starts_with("ERR Protocol error")),
        other => panic!("expected a protocol error, got {:?}", other),
    }

    let closed = tokio::time::timeout(Duration::from_secs(2), client.next())
        .await
        .expect("server should close the connection");
    assert!(closed.is_none());
}

#[tokio::test]
async fn test_deeply_nested_request_closes_connection() {
    let address = TestUtils::run_server().await;
    let mut stream = TcpStream::connect(&address).await.unwrap();

    let nested = format!("{}:1\r\n", "*1\r\n".repeat(64));
    stream.write_all(nested.as_bytes()).await.unwrap();

    let mut client = tokio_util::codec::Framed::new(stream, redis_lite::codec::RespCodec::default());

    match TestUtils::receive(&mut client).await {
        RespValue::Error(message) => assert!(message.starts_with("ERR Protocol error")),
        other => panic!("expected a protocol error, got {:?}", other),
    }

    let closed = tokio::time::timeout(Duration::from_secs(2), client.next())
        .await
        .expect("server should close the connection");
    assert!(closed.is_none());
}

#[tokio::test]
async fn test_requests_beyond_pending_limit_wait_for_blpop() {
    let address = TestUtils::run_server().await;
    let mut consumer = TestUtils::connect(&address).await;
    let mut producer = TestUtils::connect(&address).await;

    let pipelined = MAX_PENDING_REQUESTS + 50;

    consumer
        .feed(TestUtils::blpop_command("queue", "0"))
        .await
        .unwrap();
    for _ in 0..pipelined {
        consumer.feed(TestUtils::ping_command()).await.unwrap();
    }
    consumer.flush().await.unwrap();

    TestUtils::sleep_ms(200).await;

    TestUtils::send_command_and_receive(
        &mut producer,
        TestUtils::rpush_command("queue", &["item"]),
        RespValue::Integer(1),
    )
    .await;

    assert_eq!(
        TestUtils::receive(&mut consumer).await,
        bulk_array(&["queue", "item"])
    );
    for _ in 0..pipelined {
        assert_eq!(
            TestUtils::receive(&mut consumer).await,
            RespValue::SimpleString("PONG".into())
        );
    }

    TestUtils::send_command_and_receive(
        &mut consumer,
        TestUtils::echo_command("still here"),
        RespValue::BulkString("still here".into()),
    )
    .await;
}
