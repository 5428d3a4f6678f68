//! Client integration tests for melos-sdk
//!
//! Tests script execution, transaction submission and status waiting
//! against the mock transport.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use melos_sdk::{
    Address, BaseSdk, Interaction, KeySigner, MelosClient, Method, MockTransport, NetworkConfig,
    Response, SdkError, TxStatus, TxWait,
};
use serde_json::{json, Value};
use std::collections::HashMap;

const KEY: &str = "4a9b8c1d2e3f405162738495a6b7c8d9e0f1a2b3c4d5e6f708192a3b4c5d6e7f";
const TX_ID: &str = "a7b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f90";
const SERVICE: &str = "f8d6e0586b0a20c7";

const LIST_NFT: &str = "import MelosMarketplace from 0xMARKET\n\
    transaction(nftId: UInt64, price: UFix64) {\n\
        prepare(seller: AuthAccount) {}\n\
    }";

fn service() -> Address {
    Address::from_hex(SERVICE).unwrap()
}

fn test_config() -> NetworkConfig {
    NetworkConfig {
        poll_interval_ms: 0,
        ..NetworkConfig::default()
    }
}

fn client(transport: &MockTransport) -> MelosClient {
    MelosClient::with_transport(transport.clone(), test_config())
}

fn b64_json(value: Value) -> String {
    BASE64.encode(value.to_string())
}

fn account_response(sequence_number: u64, revoked: bool) -> Value {
    json!({
        "address": SERVICE,
        "balance": "100000",
        "keys": [{
            "index": "0",
            "public_key": "00",
            "signing_algorithm": "ECDSA_P256",
            "hashing_algorithm": "SHA3_256",
            "sequence_number": sequence_number.to_string(),
            "weight": "1000",
            "revoked": revoked
        }]
    })
}

fn result_response(status: &str, events: Vec<Value>) -> Value {
    json!({
        "block_id": "",
        "status": status,
        "status_code": 0,
        "error_message": "",
        "computation_used": "10",
        "events": events
    })
}

fn event(event_type: &str, listing_id: &str) -> Value {
    json!({
        "type": event_type,
        "transaction_id": TX_ID,
        "transaction_index": "0",
        "event_index": "0",
        "payload": b64_json(json!({
            "type": "Event",
            "value": {
                "id": event_type,
                "fields": [{"name": "listingId", "value": {"type": "UInt64", "value": listing_id}}]
            }
        }))
    })
}

fn mock_transaction_flow(transport: &MockTransport) {
    transport.set_response(
        Method::Get,
        &format!("/v1/accounts/{}?expand=keys", SERVICE),
        account_response(5, false),
    );
    transport.set_response(Method::Post, "/v1/transactions", json!({"id": TX_ID}));
    let result_path = format!("/v1/transaction_results/{}", TX_ID);
    transport.push_response(Method::Get, &result_path, result_response("Pending", vec![]));
    transport.push_response(Method::Get, &result_path, result_response("Executed", vec![]));
    transport.set_response(
        Method::Get,
        &result_path,
        result_response(
            "Sealed",
            vec![
                event("A.f8d6e0586b0a20c7.MelosMarketplace.ListingCreated", "7"),
                event("A.f8d6e0586b0a20c7.MelosMarketplace.ListingUpdated", "8"),
            ],
        ),
    );
}

// ==================== Script Tests ====================

#[tokio::test]
async fn test_script_without_arguments_returns_node_value() {
    let transport = MockTransport::new();
    transport.set_response(
        Method::Post,
        "/v1/scripts?block_height=sealed",
        json!(b64_json(json!({"type": "UFix64", "value": "100.00000000"}))),
    );

    let value = client(&transport)
        .execute_script("pub fun main(): UFix64 { return 100.0 }", Vec::<Value>::new())
        .await
        .unwrap();
    assert_eq!(value, json!("100.00000000"));

    let requests = transport.requests();
    let body = requests[0].body.as_ref().unwrap();
    assert_eq!(body["arguments"], json!([]));
    let script = BASE64.decode(body["script"].as_str().unwrap()).unwrap();
    assert_eq!(script, b"pub fun main(): UFix64 { return 100.0 }");
}

#[tokio::test]
async fn test_script_arguments_and_import_rewriting() {
    let transport = MockTransport::new();
    transport.set_response(
        Method::Post,
        "/v1/scripts?block_height=sealed",
        json!(b64_json(json!({"type": "Optional", "value": null}))),
    );

    let value = client(&transport)
        .execute_script(
            "import FungibleToken from 0xFUNGIBLETOKEN\npub fun main(owner: Address, amount: UFix64): UFix64? { return nil }",
            vec![json!("f8d6e0586b0a20c7"), json!(3)],
        )
        .await
        .unwrap();
    assert_eq!(value, Value::Null);

    let requests = transport.requests();
    let body = requests[0].body.as_ref().unwrap();
    let script = String::from_utf8(BASE64.decode(body["script"].as_str().unwrap()).unwrap()).unwrap();
    assert!(script.starts_with("import FungibleToken from 0xee82856bf20e2aa6"));

    let args: Vec<Value> = body["arguments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| serde_json::from_slice(&BASE64.decode(a.as_str().unwrap()).unwrap()).unwrap())
        .collect();
    assert_eq!(args[0], json!({"type": "Address", "value": "0xf8d6e0586b0a20c7"}));
    assert_eq!(args[1], json!({"type": "UFix64", "value": "3.00000000"}));
}

#[tokio::test]
async fn test_script_resolution_error_is_returned_not_sent() {
    let transport = MockTransport::new();
    let err = client(&transport)
        .execute_script("pub fun main(a: UInt8, b: UInt8) {}", vec![json!(1)])
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Cadence(_)));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_script_node_error() {
    let transport = MockTransport::new();
    transport.set_error(Method::Post, "/v1/scripts?block_height=sealed", 400, "cannot find declaration");
    let err = client(&transport)
        .execute_script("pub fun main() {}", Vec::<Value>::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Rpc { code: 400, .. }));
}

// ==================== Transaction Tests ====================

#[tokio::test]
async fn test_transaction_sealed_with_events() {
    let transport = MockTransport::new();
    mock_transaction_flow(&transport);

    let signer = KeySigner::from_hex(service(), KEY, 0).unwrap();
    let result = client(&transport)
        .send_transaction(
            Interaction::new(LIST_NFT)
                .args(vec![json!(1), json!("12.5")])
                .payer(signer),
        )
        .await
        .unwrap();

    assert_eq!(result.status, TxStatus::Sealed);
    assert_eq!(result.status.code(), 4);
    assert!(result.is_success());
    assert_eq!(result.tx_id.to_hex(), TX_ID);
    assert_eq!(result.events.len(), 2);
    assert_eq!(result.events[0].event_type, "A.f8d6e0586b0a20c7.MelosMarketplace.ListingCreated");
    assert_eq!(result.events[0].data, json!({"listingId": "7"}));
    assert_eq!(result.events[1].data, json!({"listingId": "8"}));
}

#[tokio::test]
async fn test_transaction_request_shape() {
    let transport = MockTransport::new();
    mock_transaction_flow(&transport);

    let signer = KeySigner::from_hex(service(), KEY, 0).unwrap();
    client(&transport)
        .send_transaction(
            Interaction::new(LIST_NFT)
                .args(vec![json!(1), json!(2)])
                .payer(signer)
                .limit(120),
        )
        .await
        .unwrap();

    let requests = transport.requests();
    let submit = requests
        .iter()
        .find(|r| r.method == Method::Post && r.path == "/v1/transactions")
        .unwrap();
    let body = submit.body.as_ref().unwrap();

    assert_eq!(body["gas_limit"], json!("120"));
    assert_eq!(body["payer"], json!(SERVICE));
    assert_eq!(body["authorizers"], json!([SERVICE]));
    assert_eq!(body["proposal_key"]["sequence_number"], json!("5"));
    assert_eq!(body["reference_block_id"], json!(melos_sdk::MOCK_SEALED_BLOCK_ID));
    // proposer and authorizer are the payer: only the envelope is signed
    assert_eq!(body["payload_signatures"], json!([]));
    assert_eq!(body["envelope_signatures"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_wait_for_executed_stops_early() {
    let transport = MockTransport::new();
    mock_transaction_flow(&transport);

    let signer = KeySigner::from_hex(service(), KEY, 0).unwrap();
    let result = client(&transport)
        .send_transaction(
            Interaction::new(LIST_NFT)
                .args(vec![json!(1), json!(2)])
                .payer(signer)
                .wait_for("EXEC"),
        )
        .await
        .unwrap();
    assert_eq!(result.status, TxStatus::Executed);

    let polls = transport
        .requests()
        .iter()
        .filter(|r| r.path.starts_with("/v1/transaction_results/"))
        .count();
    assert_eq!(polls, 2);
}

#[tokio::test]
async fn test_reverted_transaction_is_not_an_error() {
    let transport = MockTransport::new();
    let result_path = format!("/v1/transaction_results/{}", TX_ID);
    transport.set_response(
        Method::Get,
        &format!("/v1/accounts/{}?expand=keys", SERVICE),
        account_response(0, false),
    );
    transport.set_response(Method::Post, "/v1/transactions", json!({"id": TX_ID}));
    transport.set_response(
        Method::Get,
        &result_path,
        json!({
            "status": "Sealed",
            "status_code": 1,
            "error_message": "pre-condition failed: listing does not exist",
            "events": []
        }),
    );

    let signer = KeySigner::from_hex(service(), KEY, 0).unwrap();
    let result = client(&transport)
        .send_transaction(Interaction::new(LIST_NFT).args(vec![json!(1), json!(2)]).payer(signer))
        .await
        .unwrap();

    assert_eq!(result.status, TxStatus::Sealed);
    assert_eq!(result.status_code, 1);
    assert!(!result.is_success());
    assert!(result.error_message.contains("listing does not exist"));
}

#[tokio::test]
async fn test_undecodable_event_keeps_sealed_result() {
    let transport = MockTransport::new();
    mock_transaction_flow(&transport);

    let range_event = json!({
        "type": "A.f8d6e0586b0a20c7.MelosMarketplace.RoyaltyTiers",
        "payload": b64_json(json!({
            "type": "Event",
            "value": {
                "id": "A.f8d6e0586b0a20c7.MelosMarketplace.RoyaltyTiers",
                "fields": [{"name": "tiers", "value": {"type": "InclusiveRange", "value": {
                    "start": {"type": "UInt8", "value": "1"},
                    "end": {"type": "UInt8", "value": "5"},
                    "step": {"type": "UInt8", "value": "1"}
                }}}]
            }
        }))
    });
    let unknown = json!({"type": "Event", "value": {
        "id": "A.f8d6e0586b0a20c7.MelosMarketplace.Future",
        "fields": [{"name": "x", "value": {"type": "SomeFutureKind", "value": 1}}]
    }});
    let unknown_event = json!({
        "type": "A.f8d6e0586b0a20c7.MelosMarketplace.Future",
        "payload": b64_json(unknown.clone())
    });
    transport.set_response(
        Method::Get,
        &format!("/v1/transaction_results/{}", TX_ID),
        result_response(
            "Sealed",
            vec![
                range_event,
                unknown_event,
                json!({"type": "A.f8d6e0586b0a20c7.MelosMarketplace.Garbled", "payload": "%%%"}),
            ],
        ),
    );

    let signer = KeySigner::from_hex(service(), KEY, 0).unwrap();
    let result = client(&transport)
        .send_transaction(Interaction::new(LIST_NFT).args(vec![json!(1), json!(2)]).payer(signer))
        .await
        .unwrap();

    assert_eq!(result.status, TxStatus::Sealed);
    assert_eq!(result.events.len(), 3);
    assert_eq!(result.events[0].data, json!({"tiers": {"start": 1, "end": 5, "step": 1}}));
    // kept as the node sent it
    assert_eq!(result.events[1].event_type, "A.f8d6e0586b0a20c7.MelosMarketplace.Future");
    assert_eq!(result.events[1].data, unknown);
    assert_eq!(result.events[2].data, json!("%%%"));
}

#[tokio::test]
async fn test_expired_transaction_ends_wait() {
    let transport = MockTransport::new();
    mock_transaction_flow(&transport);
    transport.set_response(
        Method::Get,
        &format!("/v1/transaction_results/{}", TX_ID),
        result_response("Expired", vec![]),
    );

    let signer = KeySigner::from_hex(service(), KEY, 0).unwrap();
    let result = client(&transport)
        .send_transaction(Interaction::new(LIST_NFT).args(vec![json!(1), json!(2)]).payer(signer))
        .await
        .unwrap();
    assert_eq!(result.status, TxStatus::Expired);
}

#[tokio::test]
async fn test_revoked_key_is_rejected() {
    let transport = MockTransport::new();
    mock_transaction_flow(&transport);
    transport.set_response(
        Method::Get,
        &format!("/v1/accounts/{}?expand=keys", SERVICE),
        account_response(0, true),
    );

    let signer = KeySigner::from_hex(service(), KEY, 0).unwrap();
    let err = client(&transport)
        .send_transaction(Interaction::new(LIST_NFT).args(vec![json!(1), json!(2)]).payer(signer))
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Account(_)));
}

#[tokio::test]
async fn test_send_envelope_dispatches_on_kind() {
    let transport = MockTransport::new();
    transport.set_response(
        Method::Post,
        "/v1/scripts?block_height=sealed",
        json!(b64_json(json!({"type": "Bool", "value": true}))),
    );
    let client = client(&transport);
    let envelope = client.build(Interaction::new("pub fun main(): Bool { return true }")).unwrap();

    assert_eq!(client.send(&envelope).await.unwrap(), Response::Value(json!(true)));
}

#[tokio::test]
async fn test_wait_for_polls_until_sealed() {
    let transport = MockTransport::new();
    mock_transaction_flow(&transport);
    let tx_id = melos_sdk::Identifier::from_hex(TX_ID).unwrap();

    let result = client(&transport).wait_for(&tx_id, TxWait::Sealed).await.unwrap();
    assert_eq!(result.status, TxStatus::Sealed);
    assert_eq!(transport.requests().len(), 3);
}

// ==================== BaseSdk Tests ====================

#[tokio::test]
async fn test_base_sdk_templates_before_sending() {
    let transport = MockTransport::new();
    mock_transaction_flow(&transport);
    let sdk = BaseSdk::new(client(&transport));

    let signer = KeySigner::from_hex(service(), KEY, 0).unwrap();
    let interaction = Interaction::new(
        "import %NFT_NAME% from %NFT_ADDRESS%\ntransaction(id: UInt64) { prepare(a: AuthAccount) { a.borrow<&%NFT_NAME%.Collection>(from: %NFT_STORAGE_PATH%) } }",
    )
    .args(vec![json!(3)])
    .payer(signer);

    sdk.send_transaction(interaction, &HashMap::from([("NFT_STORAGE_PATH", "/storage/custom")]))
        .await
        .unwrap();

    let requests = transport.requests();
    let submit = requests.iter().find(|r| r.path == "/v1/transactions").unwrap();
    let script = BASE64
        .decode(submit.body.as_ref().unwrap()["script"].as_str().unwrap())
        .unwrap();
    let script = String::from_utf8(script).unwrap();
    assert!(script.starts_with("import MelosNFT from 0xf8d6e0586b0a20c7"));
    assert!(script.contains("&MelosNFT.Collection"));
    assert!(script.contains("from: /storage/custom"));
}

#[tokio::test]
async fn test_base_sdk_returns_errors() {
    let sdk = BaseSdk::new(MelosClient::new_mock());
    let err = sdk
        .execute_script("pub fun main(a: Address) {}", &HashMap::<String, String>::new(), vec![json!("zz")])
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Cadence(_)));
}

#[tokio::test]
async fn test_base_sdk_call_addresses_override_config() {
    let transport = MockTransport::new();
    transport.set_response(
        Method::Post,
        "/v1/scripts?block_height=sealed",
        json!(b64_json(json!({"type": "Bool", "value": true}))),
    );
    let sdk = BaseSdk::new(client(&transport));

    let interaction = Interaction::new(
        "import FungibleToken from 0xFUNGIBLETOKEN\nimport %NFT_NAME% from 0xNFT\npub fun main(): Bool { return true }",
    )
    .address("MelosNFT", "0x01cf0e2f2f715450");
    let value = sdk
        .query(interaction, &HashMap::<String, String>::new())
        .await
        .unwrap();
    assert_eq!(value, json!(true));

    let requests = transport.requests();
    let script = BASE64
        .decode(requests[0].body.as_ref().unwrap()["script"].as_str().unwrap())
        .unwrap();
    assert_eq!(
        String::from_utf8(script).unwrap(),
        // config default for FungibleToken, call-level address for MelosNFT
        "import FungibleToken from 0xee82856bf20e2aa6\nimport MelosNFT from 0x01cf0e2f2f715450\npub fun main(): Bool { return true }"
    );
}

#[tokio::test]
async fn test_query_rejects_transaction_template() {
    let transport = MockTransport::new();
    let err = client(&transport)
        .query(
            Interaction::new(LIST_NFT)
                .args(vec![json!(1), json!(2)])
                .payer(KeySigner::from_hex(service(), KEY, 0).unwrap()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Cadence(_)));
    assert!(transport.requests().is_empty());
}
