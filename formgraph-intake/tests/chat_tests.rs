use formgraph_intake::chat::{ChatCard, Notifier, WebhookNotifier};
use formgraph_intake::error::IntakeError;
use serde_json::{Value, json};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

fn card() -> ChatCard {
    ChatCard {
        title: "New Chromebook Ticket #4 - Priority Urgent".to_string(),
        subtitle: "student@example.org".to_string(),
        sections: vec![
            "Name: Test Student".to_string(),
            "<b>Problem:</b> wet\n<b>Description:</b> Spilled water".to_string(),
        ],
        image_url: Some(
            "https://github.com/thinkle-iacs/chromebook-ticket-system/blob/main/icons/wet.png?raw=true"
                .to_string(),
        ),
    }
}

fn notifier(server: &MockServer) -> WebhookNotifier {
    let url = Url::parse(&format!("{}/hook", server.uri())).unwrap();
    WebhookNotifier::new(url, 5).unwrap()
}

#[tokio::test]
async fn test_webhook_receives_card_payload() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&mock_server)
        .await;

    notifier(&mock_server).send_card(&card()).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(
        body,
        json!({
            "cards": [{
                "header": {
                    "title": "New Chromebook Ticket #4 - Priority Urgent",
                    "subtitle": "student@example.org",
                    "imageUrl": "https://github.com/thinkle-iacs/chromebook-ticket-system/blob/main/icons/wet.png?raw=true",
                    "imageStyle": "IMAGE"
                },
                "sections": [
                    { "widgets": [{ "textParagraph": { "text": "Name: Test Student" } }] },
                    { "widgets": [{ "textParagraph": { "text": "<b>Problem:</b> wet\n<b>Description:</b> Spilled water" } }] }
                ]
            }]
        })
    );
}

#[tokio::test]
async fn test_webhook_error_status_is_reported() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&mock_server)
        .await;

    let err = notifier(&mock_server).send_card(&card()).await.unwrap_err();
    match err {
        IntakeError::Webhook { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "forbidden");
        }
        other => panic!("unexpected error: {}", other),
    }
}
