//! End-to-end provisioning over SOAP against a mock AXL server.

use axl_client::{AxlClient, TlsMode};
use provisioning::{
    DestinationSpec, DeviceType, Lookup, PhoneSpec, ProvisionError, ProvisioningDefaults,
    ProvisioningService,
};
use secrecy::SecretString;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body>{}</soapenv:Body></soapenv:Envelope>"#,
        body
    )
}

fn not_found(kind: &str) -> String {
    envelope(&format!(
        "<soapenv:Fault><faultcode>soapenv:Client</faultcode><faultstring>Item not valid: The specified {kind} was not found</faultstring><detail><axlError><axlcode>5007</axlcode><axlmessage>Item not valid: The specified {kind} was not found</axlmessage></axlError></detail></soapenv:Fault>"
    ))
}

fn soap_action(operation: &str) -> String {
    format!("\"CUCM:DB ver=11.5 {}\"", operation)
}

fn test_service(mock_server: &MockServer) -> ProvisioningService<AxlClient> {
    let client = AxlClient::new(
        format!("{}/axl/", mock_server.uri()),
        "admin",
        SecretString::new("secret".into()),
        &TlsMode::Insecure,
        Duration::from_secs(5),
    )
    .unwrap();
    ProvisioningService::new(client)
}

#[tokio::test]
async fn test_line_add_over_soap() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/axl/"))
        .and(header("SOAPAction", soap_action("getLine").as_str()))
        .respond_with(ResponseTemplate::new(500).set_body_string(not_found("Line")))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/axl/"))
        .and(header("SOAPAction", soap_action("addLine").as_str()))
        .and(body_string_contains(
            "<ns:addLine><line><pattern>5551212</pattern><description>Jane Doe</description><usage>Device</usage><routePartitionName>Internal PAR</routePartitionName>",
        ))
        .and(body_string_contains(
            "<callForwardNotRegisteredInt><forwardToVoiceMail>true</forwardToVoiceMail><callingSearchSpaceName/></callForwardNotRegisteredInt>",
        ))
        .and(body_string_contains(
            "<voiceMailProfileName>&lt;None&gt;</voiceMailProfileName>",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(envelope(
            r#"<ns:addLineResponse xmlns:ns="http://www.cisco.com/AXL/API/11.5"><return>{LINE-UUID}</return></ns:addLineResponse>"#,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = test_service(&mock_server);
    let spec = ProvisioningDefaults::default().line_spec("5551212", "Jane", "Doe");
    let added = service.line_add(&spec).await.unwrap();

    assert_eq!(added.uuid, "{LINE-UUID}");
}

#[tokio::test]
async fn test_existing_line_over_soap() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("SOAPAction", soap_action("getLine").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(envelope(
            r#"<ns:getLineResponse xmlns:ns="http://www.cisco.com/AXL/API/11.5"><return><line uuid="{L1}"><pattern>5551212</pattern></line></return></ns:getLineResponse>"#,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(header("SOAPAction", soap_action("addLine").as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = test_service(&mock_server);
    let spec = ProvisioningDefaults::default().line_spec("5551212", "Jane", "Doe");
    let result = service.line_add(&spec).await;

    assert!(matches!(result, Err(ProvisionError::AlreadyExists { .. })));
}

#[tokio::test]
async fn test_remote_destination_over_soap() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("SOAPAction", soap_action("getRemoteDestinationProfile").as_str()))
        .and(body_string_contains("<name>RDPjdoe</name>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(envelope(
            r#"<ns:getRemoteDestinationProfileResponse xmlns:ns="http://www.cisco.com/AXL/API/11.5"><return><remoteDestinationProfile uuid="{RDP1}"><name>RDPjdoe</name></remoteDestinationProfile></return></ns:getRemoteDestinationProfileResponse>"#,
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(header("SOAPAction", soap_action("getRemoteDestination").as_str()))
        .respond_with(ResponseTemplate::new(500).set_body_string(not_found("Remote Destination")))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(header("SOAPAction", soap_action("addRemoteDestination").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(envelope(
            r#"<ns:addRemoteDestinationResponse xmlns:ns="http://www.cisco.com/AXL/API/11.5"><return>{RD-UUID}</return></ns:addRemoteDestinationResponse>"#,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = test_service(&mock_server);
    let spec = DestinationSpec {
        destination: "13125550100".into(),
        userid: "jdoe".into(),
    };
    let added = service.rdest_add(&spec).await.unwrap();
    assert_eq!(added.uuid, "{RD-UUID}");

    let requests = mock_server.received_requests().await.unwrap();
    let add = requests
        .iter()
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .find(|body| body.contains("<ns:addRemoteDestination>"))
        .unwrap();
    assert!(add.contains(
        "<remoteDestinationProfileName>RDPjdoe</remoteDestinationProfileName>"
    ));
    assert!(add.contains("<answerTooSoonTimer>1500</answerTooSoonTimer>"));
    assert!(!add.contains("dualModeDeviceName"));
}

#[tokio::test]
async fn test_overloaded_server_is_not_absence() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/axl/"))
        .and(header("SOAPAction", soap_action("getPhone").as_str()))
        .respond_with(ResponseTemplate::new(503).set_body_string(envelope(
            "<soapenv:Fault><faultcode>soapenv:Server</faultcode><faultstring>Maximum AXL Memory Allocation Consumed</faultstring></soapenv:Fault>",
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/axl/"))
        .and(header("SOAPAction", soap_action("addPhone").as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = test_service(&mock_server);

    let lookup = service.device_get("CSFJDOE").await;
    assert!(matches!(lookup, Lookup::TransportFailed(_)));
    assert!(!service.device_exists("CSFJDOE").await);

    let line = ProvisioningDefaults::default().line_key("5551212");
    let spec = PhoneSpec {
        username: "jdoe".into(),
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        device_type: DeviceType::Csf,
        line,
        extension: "1212".into(),
        device_pool: "DP-Chicago".into(),
        calling_search_space: "CSS-Chicago".into(),
    };
    let result = service.device_add(&spec).await;
    assert!(matches!(result, Err(ProvisionError::Transport(_))));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_failure() {
    let client = AxlClient::new(
        "https://127.0.0.1:1/axl/",
        "admin",
        SecretString::new("secret".into()),
        &TlsMode::Insecure,
        Duration::from_secs(2),
    )
    .unwrap();
    let service = ProvisioningService::new(client);

    let spec = ProvisioningDefaults::default().line_spec("5551212", "Jane", "Doe");
    let result = service.line_add(&spec).await;

    assert!(matches!(result, Err(ProvisionError::Transport(_))));
    assert!(!service.line_delete(&spec.key).await);
}
