//! Integration tests for the resource adapters using wiremock
//!
//! These tests drive full lifecycles against a mocked management API,
//! checking request paths and bodies as well as the resulting state.

use rmqform::config::ProviderConfig;
use rmqform::error::ProviderError;
use rmqform::rabbitmq::client::ManagementClient;
use rmqform::resource::{dispatch, ResourceData};
use serde_json::{json, Map, Value};
use wiremock::matchers::{basic_auth, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ManagementClient {
    ManagementClient::new(&ProviderConfig {
        endpoint: server.uri(),
        ..Default::default()
    })
    .expect("client should build")
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

/// Exchange lifecycle tests
mod exchange_tests {
    use super::*;

    fn exchange_report() -> Value {
        json!({
            "name": "test",
            "vhost": "/",
            "type": "fanout",
            "durable": true,
            "auto_delete": false,
            "internal": false,
            "arguments": {}
        })
    }

    /// Create declares the exchange, then refreshes it into state
    #[tokio::test]
    async fn test_create_sets_id_and_state() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/exchanges/%2F/test"))
            .and(basic_auth("guest", "guest"))
            .and(body_json(json!({"type": "fanout", "durable": true, "auto_delete": false})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/exchanges/%2F/test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(exchange_report()))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new(
            "rabbitmq_exchange",
            object(json!({"name": "test", "settings": [{"type": "fanout", "durable": true}]})),
        );

        dispatch::create(&client, &mut data).await.expect("create should succeed");

        assert_eq!(data.id(), "test@/");
        assert_eq!(data.get("vhost"), Some(&json!("/")));
        assert_eq!(data.get("settings.0.durable"), Some(&json!(true)));
        assert_eq!(data.get("settings.0.auto_delete"), Some(&json!(false)));
    }

    /// `arguments_json` is what gets transmitted when set
    #[tokio::test]
    async fn test_arguments_json_is_transmitted() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/exchanges/%2F/delayed"))
            .and(body_json(json!({
                "type": "x-delayed-message",
                "durable": false,
                "auto_delete": false,
                "arguments": {"x-delayed-type": "direct"}
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/exchanges/%2F/delayed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "delayed",
                "vhost": "/",
                "type": "x-delayed-message",
                "arguments": {"x-delayed-type": "direct"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new(
            "rabbitmq_exchange",
            object(json!({
                "name": "delayed",
                "settings": [{
                    "type": "x-delayed-message",
                    "arguments_json": "{\"x-delayed-type\": \"direct\"}"
                }]
            })),
        );

        dispatch::create(&client, &mut data).await.expect("create should succeed");

        assert_eq!(
            data.get("settings.0.arguments_json"),
            Some(&json!("{\"x-delayed-type\":\"direct\"}"))
        );
        assert_eq!(data.get("settings.0.arguments"), Some(&json!({})));
    }

    /// A 404 on refresh means the exchange is gone, not an error
    #[tokio::test]
    async fn test_read_missing_clears_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/exchanges/%2F/test"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": "Object Not Found",
                "reason": "Not Found"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new("rabbitmq_exchange", Map::new());
        data.set_id("test@/");

        dispatch::read(&client, &mut data).await.expect("read should succeed");
        assert_eq!(data.id(), "");
    }

    /// Deleting twice succeeds both times
    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/exchanges/%2F/test"))
            .respond_with(ResponseTemplate::new(204))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/api/exchanges/%2F/test"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        for _ in 0..2 {
            let mut data = ResourceData::new("rabbitmq_exchange", Map::new());
            data.set_id("test@/");
            dispatch::delete(&client, &mut data).await.expect("delete should succeed");
            assert_eq!(data.id(), "");
        }
    }

    /// Other failures on delete are reported
    #[tokio::test]
    async fn test_delete_server_error_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/exchanges/%2F/test"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new("rabbitmq_exchange", Map::new());
        data.set_id("test@/");

        let err = dispatch::delete(&client, &mut data).await.unwrap_err();
        assert!(matches!(err, ProviderError::RemoteRejected { .. }));
        assert_eq!(err.to_string(), "Error deleting RabbitMQ exchange: 500 Internal Server Error");
        assert_eq!(data.id(), "test@/");
    }

    /// A refused declaration fails create without a refresh
    #[tokio::test]
    async fn test_create_bad_request_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/exchanges/%2F/test"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "bad_request",
                "reason": "invalid exchange type"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new(
            "rabbitmq_exchange",
            object(json!({"name": "test", "settings": [{"type": "nonsense"}]})),
        );

        let err = dispatch::create(&client, &mut data).await.unwrap_err();
        assert_eq!(err.to_string(), "Error declaring RabbitMQ exchange: 400 Bad Request");
        assert_eq!(data.id(), "");
    }

    /// Authentication failures on GET propagate instead of looking like deletion
    #[tokio::test]
    async fn test_read_unauthorized_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/exchanges/%2F/test"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new("rabbitmq_exchange", Map::new());
        data.set_id("test@/");

        let err = dispatch::read(&client, &mut data).await.unwrap_err();
        assert!(matches!(err, ProviderError::RemoteRejected { ref status, .. } if status == "401 Unauthorized"));
        assert_eq!(data.id(), "test@/");
    }

    /// The exchange data source reports the settings block
    #[tokio::test]
    async fn test_data_source_reads_exchange() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/exchanges/%2F/test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(exchange_report()))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new("rabbitmq_exchange", object(json!({"name": "test"})));

        dispatch::read_data_source(&client, &mut data).await.expect("lookup should succeed");
        assert_eq!(data.id(), "test@/");
        assert_eq!(data.get("settings.0.type"), Some(&json!("fanout")));
    }
}

/// Binding lifecycle tests
mod binding_tests {
    use super::*;

    /// The properties key comes from the Location header and ends up in the id
    #[tokio::test]
    async fn test_create_uses_location_properties_key() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/bindings/%2F/e/ex1/q/q1"))
            .and(body_json(json!({"routing_key": "routingkey"})))
            .respond_with(
                ResponseTemplate::new(201).insert_header("Location", "/api/bindings/%2F/e/ex1/q/q1/routingkey"),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/bindings/%2F/e/ex1/q/q1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "source": "ex1",
                    "vhost": "/",
                    "destination": "q1",
                    "destination_type": "queue",
                    "routing_key": "other",
                    "arguments": {},
                    "properties_key": "other"
                },
                {
                    "source": "ex1",
                    "vhost": "/",
                    "destination": "q1",
                    "destination_type": "queue",
                    "routing_key": "routingkey",
                    "arguments": {},
                    "properties_key": "routingkey"
                }
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new(
            "rabbitmq_binding",
            object(json!({
                "source": "ex1",
                "vhost": "/",
                "destination": "q1",
                "destination_type": "queue",
                "routing_key": "routingkey"
            })),
        );

        dispatch::create(&client, &mut data).await.expect("create should succeed");

        assert_eq!(data.id(), "%2F/ex1/q1/queue/routingkey");
        assert_eq!(data.get("properties_key"), Some(&json!("routingkey")));
        assert_eq!(data.get("routing_key"), Some(&json!("routingkey")));
    }

    /// A binding no longer listed is gone
    #[tokio::test]
    async fn test_read_unlisted_binding_clears_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/bindings/%2F/e/ex1/q/q1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new("rabbitmq_binding", Map::new());
        data.set_id("%2F/ex1/q1/queue/routingkey");

        dispatch::read(&client, &mut data).await.expect("read should succeed");
        assert_eq!(data.id(), "");
    }

    /// Delete addresses the binding by its properties key
    #[tokio::test]
    async fn test_delete_targets_properties_key() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/bindings/%2F/e/ex1/e/ex2/~"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new("rabbitmq_binding", Map::new());
        data.set_id("%2F/ex1/ex2/exchange/~");

        dispatch::delete(&client, &mut data).await.expect("delete should succeed");
    }

    /// Deleting a binding the server no longer knows still succeeds
    #[tokio::test]
    async fn test_delete_missing_binding_succeeds() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/bindings/%2F/e/ex1/q/q1/routingkey"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new("rabbitmq_binding", Map::new());
        data.set_id("%2F/ex1/q1/queue/routingkey");

        dispatch::delete(&client, &mut data).await.expect("delete should succeed");
        assert_eq!(data.id(), "");
    }

    /// A malformed identifier never reaches the server
    #[tokio::test]
    async fn test_malformed_id_is_rejected() {
        let server = MockServer::start().await;
        let client = client_for(&server);

        let mut data = ResourceData::new("rabbitmq_binding", Map::new());
        data.set_id("%2F/ex1/q1");

        let err = dispatch::read(&client, &mut data).await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedInput(_)));
    }
}

/// User lifecycle tests
mod user_tests {
    use super::*;

    /// Tags are sent comma-joined and read back without empty entries
    #[tokio::test]
    async fn test_create_filters_tags() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/users/alice"))
            .and(body_json(json!({"password": "s3cret", "tags": "administrator,management"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/users/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "alice",
                "password_hash": "xyz",
                "tags": ["administrator", "", "management"]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new(
            "rabbitmq_user",
            object(json!({"name": "alice", "password": "s3cret", "tags": ["administrator", "", "management"]})),
        );

        dispatch::create(&client, &mut data).await.expect("create should succeed");

        assert_eq!(data.id(), "alice");
        assert_eq!(data.get("tags"), Some(&json!(["administrator", "management"])));
        assert_eq!(data.get("password"), Some(&json!("s3cret")));
    }

    fn user(password: &str, tags: &[&str]) -> Value {
        json!({"name": "alice", "password": password, "tags": tags})
    }

    fn mount_user_report(tags: &[&str]) -> Mock {
        Mock::given(method("GET"))
            .and(path("/api/users/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "alice",
                "password_hash": "xyz",
                "tags": tags
            })))
    }

    /// A new password is sent in place
    #[tokio::test]
    async fn test_update_sends_changed_password() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/users/alice"))
            .and(body_json(json!({"password": "rotated", "tags": "management"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        mount_user_report(&["management"]).mount(&server).await;

        let client = client_for(&server);
        let mut data = ResourceData::new("rabbitmq_user", object(user("rotated", &["management"])))
            .with_prior("alice", object(user("s3cret", &["management"])));

        dispatch::update(&client, &mut data).await.expect("update should succeed");
        assert_eq!(data.id(), "alice");
        assert_eq!(data.get("password"), Some(&json!("rotated")));
    }

    /// Changed tags are sent in place
    #[tokio::test]
    async fn test_update_sends_changed_tags() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/users/alice"))
            .and(body_json(json!({"password": "s3cret", "tags": "management,monitoring"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        mount_user_report(&["management", "monitoring"]).mount(&server).await;

        let client = client_for(&server);
        let mut data = ResourceData::new("rabbitmq_user", object(user("s3cret", &["management", "monitoring"])))
            .with_prior("alice", object(user("s3cret", &["management"])));

        dispatch::update(&client, &mut data).await.expect("update should succeed");
        assert_eq!(data.get("tags"), Some(&json!(["management", "monitoring"])));
    }

    /// Nothing is sent when only empty tags differ
    #[tokio::test]
    async fn test_update_skips_unchanged_user() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/users/alice"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        mount_user_report(&["management"]).expect(1).mount(&server).await;

        let client = client_for(&server);
        let mut data = ResourceData::new("rabbitmq_user", object(user("s3cret", &["management", ""])))
            .with_prior("alice", object(user("s3cret", &["management"])));

        dispatch::update(&client, &mut data).await.expect("update should succeed");
        assert_eq!(data.get("tags"), Some(&json!(["management"])));
    }

    /// The user data source reports filtered tags
    #[tokio::test]
    async fn test_data_source_reads_user() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/users/bob"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "bob",
                "tags": "monitoring,"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new("rabbitmq_user", object(json!({"name": "bob"})));

        dispatch::read_data_source(&client, &mut data).await.expect("lookup should succeed");
        assert_eq!(data.id(), "bob");
        assert_eq!(data.get("tags"), Some(&json!(["monitoring"])));
    }
}

/// Permissions tests
mod permissions_tests {
    use super::*;

    fn permissions(configure: &str) -> Value {
        json!({
            "user": "app",
            "vhost": "/",
            "permissions": [{"configure": configure, "write": ".*", "read": ".*"}]
        })
    }

    /// An unchanged permissions block is not re-sent
    #[tokio::test]
    async fn test_update_skips_unchanged_block() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/permissions/%2F/app"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/permissions/%2F/app"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": "app",
                "vhost": "/",
                "configure": ".*",
                "write": ".*",
                "read": ".*"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new("rabbitmq_permissions", object(permissions(".*")))
            .with_prior("app@/", object(permissions(".*")));

        dispatch::update(&client, &mut data).await.expect("update should succeed");
        assert_eq!(data.id(), "app@/");
    }

    /// A changed block is sent in place
    #[tokio::test]
    async fn test_update_sends_changed_block() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/permissions/%2F/app"))
            .and(body_json(json!({"configure": "^app-.*", "write": ".*", "read": ".*"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/permissions/%2F/app"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": "app",
                "vhost": "/",
                "configure": "^app-.*",
                "write": ".*",
                "read": ".*"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new("rabbitmq_permissions", object(permissions("^app-.*")))
            .with_prior("app@/", object(permissions(".*")));

        dispatch::update(&client, &mut data).await.expect("update should succeed");
        assert_eq!(data.get("permissions.0.configure"), Some(&json!("^app-.*")));
    }
}

/// Runtime parameter tests
mod parameter_tests {
    use super::*;

    /// Omitted definition attributes are sent with their defaults
    #[tokio::test]
    async fn test_federation_upstream_defaults_are_sent() {
        let server = MockServer::start().await;

        let definition = json!({
            "uri": ["amqp://server-1"],
            "max-hops": 1,
            "prefetch-count": 1000,
            "reconnect-delay": 5,
            "ack-mode": "on-confirm",
            "trust-user-id": false
        });

        Mock::given(method("PUT"))
            .and(path("/api/parameters/federation-upstream/%2F/origin"))
            .and(body_json(json!({"value": definition})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/parameters/federation-upstream/%2F/origin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "origin",
                "vhost": "/",
                "component": "federation-upstream",
                "value": definition
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new(
            "rabbitmq_federation_upstream",
            object(json!({
                "name": "origin",
                "vhost": "/",
                "definition": [{"uri": "amqp://server-1"}]
            })),
        );

        dispatch::create(&client, &mut data).await.expect("create should succeed");

        assert_eq!(data.id(), "origin@/");
        assert_eq!(data.get("component"), Some(&json!("federation-upstream")));
        assert_eq!(data.get("definition.0.uri"), Some(&json!("amqp://server-1")));
        assert_eq!(data.get("definition.0.prefetch_count"), Some(&json!(1000)));
    }

    /// Shovel delete-after travels as a number when numeric
    #[tokio::test]
    async fn test_shovel_create_wire_format() {
        let server = MockServer::start().await;

        let value = json!({
            "ack-mode": "on-confirm",
            "dest-add-timestamp-header": false,
            "dest-protocol": "amqp091",
            "dest-queue": "archive",
            "dest-uri": ["amqp://b"],
            "reconnect-delay": 1,
            "src-delete-after": 1000,
            "src-protocol": "amqp091",
            "src-queue": "orders",
            "src-uri": ["amqp://a"]
        });

        Mock::given(method("PUT"))
            .and(path("/api/parameters/shovel/%2F/move"))
            .and(body_json(json!({"value": value})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/parameters/shovel/%2F/move"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "move",
                "vhost": "/",
                "component": "shovel",
                "value": value
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new(
            "rabbitmq_shovel",
            object(json!({
                "name": "move",
                "vhost": "/",
                "info": [{
                    "source_uri": "amqp://a",
                    "source_queue": "orders",
                    "source_delete_after": "1000",
                    "destination_uri": "amqp://b",
                    "destination_queue": "archive"
                }]
            })),
        );

        dispatch::create(&client, &mut data).await.expect("create should succeed");

        assert_eq!(data.id(), "move@/");
        assert_eq!(data.get("info.0.source_delete_after"), Some(&json!("1000")));
        assert_eq!(data.get("info.0.reconnect_delay"), Some(&json!(1)));
    }

    fn upstream_definition(uri: &str) -> Value {
        json!({
            "uri": [uri],
            "max-hops": 1,
            "prefetch-count": 1000,
            "reconnect-delay": 5,
            "ack-mode": "on-confirm",
            "trust-user-id": false
        })
    }

    fn upstream(uri: &str) -> Value {
        json!({
            "name": "origin",
            "vhost": "/",
            "definition": [{"uri": uri}]
        })
    }

    /// A changed definition is re-declared under the same name
    #[tokio::test]
    async fn test_federation_upstream_update_sends_definition() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/parameters/federation-upstream/%2F/origin"))
            .and(body_json(json!({"value": upstream_definition("amqp://server-2")})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/parameters/federation-upstream/%2F/origin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "origin",
                "vhost": "/",
                "component": "federation-upstream",
                "value": upstream_definition("amqp://server-2")
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new("rabbitmq_federation_upstream", object(upstream("amqp://server-2")))
            .with_prior("origin@/", object(upstream("amqp://server-1")));

        dispatch::update(&client, &mut data).await.expect("update should succeed");
        assert_eq!(data.id(), "origin@/");
        assert_eq!(data.get("definition.0.uri"), Some(&json!("amqp://server-2")));
    }

    /// A missing upstream clears the identifier
    #[tokio::test]
    async fn test_federation_upstream_read_404_clears_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/parameters/federation-upstream/%2F/origin"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new("rabbitmq_federation_upstream", Map::new());
        data.set_id("origin@/");

        dispatch::read(&client, &mut data).await.expect("read should succeed");
        assert_eq!(data.id(), "");
    }

    /// A missing shovel clears the identifier
    #[tokio::test]
    async fn test_shovel_read_404_clears_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/parameters/shovel/%2F/move"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut data = ResourceData::new("rabbitmq_shovel", Map::new());
        data.set_id("move@/");

        dispatch::read(&client, &mut data).await.expect("read should succeed");
        assert_eq!(data.id(), "");
    }

    /// Shovel delete succeeds whether or not the server still has it
    #[tokio::test]
    async fn test_shovel_delete_is_idempotent() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/parameters/shovel/%2F/move"))
            .respond_with(ResponseTemplate::new(204))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/api/parameters/shovel/%2F/move"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        for _ in 0..2 {
            let mut data = ResourceData::new("rabbitmq_shovel", Map::new());
            data.set_id("move@/");

            dispatch::delete(&client, &mut data).await.expect("delete should succeed");
            assert_eq!(data.id(), "");
        }
    }
}
