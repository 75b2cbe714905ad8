use std::time::Duration;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_blpop_concurrent_clients_simple_blocking() {
    let env = TestEnv::new();

    // Client tries to BLPOP from empty list (should block)
    let client_task =
        TestUtils::spawn_blpop_task(&env, "test_list", "0", &TestUtils::client_address(12345));

    TestUtils::wait_for_blocked_clients(&env, "test_list", 1).await;

    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("test_list", &["item1"]),
        &TestUtils::client_address(12347),
        &TestUtils::expected_integer(1),
    )
    .await;

    let client_result = TestUtils::wait_for_completion(client_task, Duration::from_secs(3)).await;

    assert_eq!(
        client_result,
        Ok(TestUtils::expected_bulk_string_array(&["test_list", "item1"]))
    );
    assert_eq!(env.registry.blocked_clients("test_list"), 0);
    assert_eq!(env.store.list_len("test_list"), Ok(0));
}

#[tokio::test]
async fn test_blpop_wakes_clients_in_fifo_order() {
    let env = TestEnv::new();

    let first = TestUtils::spawn_blpop_task(&env, "queue", "0", &TestUtils::client_address(1));
    TestUtils::wait_for_blocked_clients(&env, "queue", 1).await;

    let second = TestUtils::spawn_blpop_task(&env, "queue", "0", &TestUtils::client_address(2));
    TestUtils::wait_for_blocked_clients(&env, "queue", 2).await;

    let third = TestUtils::spawn_blpop_task(&env, "queue", "0", &TestUtils::client_address(3));
    TestUtils::wait_for_blocked_clients(&env, "queue", 3).await;

    for (item, remaining) in [("job1", 2), ("job2", 1), ("job3", 0)] {
        env.exec_command_immediate_success_response(
            TestUtils::rpush_command("queue", &[item]),
            &TestUtils::client_address(9),
            &TestUtils::expected_integer(1),
        )
        .await;

        assert_eq!(env.registry.blocked_clients("queue"), remaining);
    }

    let expected = [("job1", first), ("job2", second), ("job3", third)];

    for (item, task) in expected {
        assert_eq!(
            TestUtils::wait_for_completion(task, Duration::from_secs(3)).await,
            Ok(TestUtils::expected_bulk_string_array(&["queue", item]))
        );
    }
}

#[tokio::test]
async fn test_one_push_wakes_one_client() {
    let env = TestEnv::new();

    let first = TestUtils::spawn_blpop_task(&env, "queue", "0", &TestUtils::client_address(1));
    TestUtils::wait_for_blocked_clients(&env, "queue", 1).await;

    let second = TestUtils::spawn_blpop_task(&env, "queue", "0.3", &TestUtils::client_address(2));
    TestUtils::wait_for_blocked_clients(&env, "queue", 2).await;

    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("queue", &["a", "b"]),
        &TestUtils::client_address(9),
        &TestUtils::expected_integer(2),
    )
    .await;

    assert_eq!(
        TestUtils::wait_for_completion(first, Duration::from_secs(3)).await,
        Ok(TestUtils::expected_bulk_string_array(&["queue", "a"]))
    );

    // The second element stays in the list and the other client times out.
    assert_eq!(
        TestUtils::wait_for_completion(second, Duration::from_secs(3)).await,
        Ok(TestUtils::expected_null())
    );

    env.exec_command_immediate_success_response(
        TestUtils::lrange_command("queue", 0, -1),
        &TestUtils::client_address(9),
        &TestUtils::expected_bulk_string_array(&["b"]),
    )
    .await;
}

#[tokio::test]
async fn test_blpop_timeout_leaves_no_registration() {
    let env = TestEnv::new();

    let client_task =
        TestUtils::spawn_blpop_task(&env, "quiet", "0.1", &TestUtils::client_address(1));

    assert_eq!(
        TestUtils::wait_for_completion(client_task, Duration::from_secs(2)).await,
        Ok(TestUtils::expected_null())
    );
    assert_eq!(env.registry.blocked_clients("quiet"), 0);

    // A later push is not consumed by the expired client.
    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("quiet", &["late"]),
        &TestUtils::client_address(9),
        &TestUtils::expected_integer(1),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::llen_command("quiet"),
        &TestUtils::client_address(9),
        &TestUtils::expected_integer(1),
    )
    .await;
}

#[tokio::test]
async fn test_blpop_blocks_on_first_key_only() {
    let env = TestEnv::new();

    let client_task = TestUtils::spawn_blpop_task(&env, "first", "0.2", &TestUtils::client_address(1));
    TestUtils::wait_for_blocked_clients(&env, "first", 1).await;

    assert_eq!(env.registry.blocked_clients("second"), 0);

    let client_task_multi = {
        let (store, registry) = env.clone_env();
        tokio::spawn(async move {
            let handler = redis_lite::commands::CommandHandler::new(TestUtils::command(
                "BLPOP",
                &["primary", "fallback", "0.2"],
            ))?;

            handler
                .handle_command(&TestUtils::client_address(2), store, registry)
                .await
        })
    };
    TestUtils::wait_for_blocked_clients(&env, "primary", 1).await;

    // Pushing to a later candidate key does not wake the client.
    env.exec_command(TestUtils::rpush_command("fallback", &["x"]), &TestUtils::client_address(9))
        .await
        .unwrap();

    assert_eq!(
        TestUtils::wait_for_completion(client_task_multi, Duration::from_secs(2)).await,
        Ok(TestUtils::expected_null())
    );
    assert_eq!(env.store.list_len("fallback"), Ok(1));

    assert_eq!(
        TestUtils::wait_for_completion(client_task, Duration::from_secs(2)).await,
        Ok(TestUtils::expected_null())
    );
}

#[tokio::test]
async fn test_aborted_blpop_is_deregistered() {
    let env = TestEnv::new();

    let client_task = TestUtils::spawn_blpop_task(&env, "jobs", "0", &TestUtils::client_address(1));
    TestUtils::wait_for_blocked_clients(&env, "jobs", 1).await;

    client_task.abort();
    let _ = client_task.await;

    assert_eq!(env.registry.blocked_clients("jobs"), 0);

    env.exec_command(TestUtils::rpush_command("jobs", &["kept"]), &TestUtils::client_address(9))
        .await
        .unwrap();

    assert_eq!(env.store.list_len("jobs"), Ok(1));
}

#[tokio::test]
async fn test_many_producers_and_consumers_lose_nothing() {
    let env = TestEnv::new();

    let consumers = (0..10)
        .map(|i| TestUtils::spawn_blpop_task(&env, "work", "5", &TestUtils::client_address(i)))
        .collect::<Vec<_>>();

    TestUtils::wait_for_blocked_clients(&env, "work", 10).await;

    let producers = (0..10)
        .map(|i| {
            let (store, registry) = env.clone_env();
            tokio::spawn(async move {
                let handler = redis_lite::commands::CommandHandler::new(
                    TestUtils::rpush_command("work", &[&format!("item{}", i)]),
                )
                .unwrap();

                handler
                    .handle_command(&TestUtils::client_address(100 + i), store, registry)
                    .await
                    .unwrap();
            })
        })
        .collect::<Vec<_>>();

    for producer in producers {
        producer.await.unwrap();
    }

    let mut received = Vec::new();
    for consumer in consumers {
        received.push(
            TestUtils::wait_for_completion(consumer, Duration::from_secs(6))
                .await
                .unwrap(),
        );
    }

    received.sort();
    received.dedup();

    assert_eq!(received.len(), 10);
    assert!(received.iter().all(|reply| reply.contains("item")));
    assert_eq!(env.registry.blocked_clients("work"), 0);
    assert_eq!(env.store.list_len("work"), Ok(0));
}
