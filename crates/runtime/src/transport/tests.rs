use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use url::Url;

use super::*;
use crate::credentials::Credentials;
use crate::tls::TransportSecurity;

fn forward(tx: &mpsc::UnboundedSender<(String, Value)>, tag: &str) -> EventCallback {
	let tx = tx.clone();
	let tag = tag.to_string();
	Arc::new(move |payload: &Value| {
		let _ = tx.send((tag.clone(), payload.clone()));
	})
}

fn close_recorder(log: &Arc<Mutex<Vec<CloseReason>>>) -> CloseCallback {
	let log = Arc::clone(log);
	Box::new(move |reason| log.lock().push(reason))
}

async fn wait_until(mut check: impl FnMut() -> bool) {
	for _ in 0..200 {
		if check() {
			return;
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
	panic!("condition not reached");
}

#[tokio::test]
async fn client_transport_subscribes_and_dispatches_events() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let port = listener.local_addr().unwrap().port();
	let (auth_tx, auth_rx) = oneshot::channel::<Option<String>>();
	let (go_tx, go_rx) = oneshot::channel::<()>();
	let (first_frame_tx, first_frame_rx) = oneshot::channel::<String>();

	let server = tokio::spawn(async move {
		let (tcp, _) = listener.accept().await.unwrap();
		let mut ws = tokio_tungstenite::accept_hdr_async(tcp, move |req: &Request, resp: Response| {
			let auth = req
				.headers()
				.get("authorization")
				.and_then(|v| v.to_str().ok())
				.map(str::to_owned);
			let _ = auth_tx.send(auth);
			Ok(resp)
		})
		.await
		.unwrap();

		if let Some(Ok(Message::Text(text))) = ws.next().await {
			let _ = first_frame_tx.send(text);
		}
		go_rx.await.unwrap();
		ws.send(Message::Text(String::new())).await.unwrap();
		let event = json!([8, "OnJsonApiEvent", {"uri": "/lol-lobby/v2/lobby", "eventType": "Update", "data": {"partyId": "x"}}]);
		ws.send(Message::Text(event.to_string())).await.unwrap();
		let event = json!([8, "OnJsonApiEvent", {"uri": "/lol-gameflow/v1/gameflow-phase", "eventType": "Update", "data": "ChampSelect"}]);
		ws.send(Message::Text(event.to_string())).await.unwrap();
		// Drain until the client closes.
		while let Some(Ok(msg)) = ws.next().await {
			if msg.is_close() {
				break;
			}
		}
	});

	let creds = Credentials::new(port, "token").with_security(TransportSecurity::Plain);
	let transport = ClientTransport::connect(creds).await.unwrap();
	assert_eq!(auth_rx.await.unwrap().as_deref(), Some("Basic cmlvdDp0b2tlbg=="));
	let first: Value = serde_json::from_str(&first_frame_rx.await.unwrap()).unwrap();
	assert_eq!(first, json!([5, "OnJsonApiEvent"]));

	let (tx, mut rx) = mpsc::unbounded_channel();
	transport.subscribe(lcu_protocol::GAMEFLOW_PHASE_PATH, forward(&tx, "first"));
	transport.subscribe(lcu_protocol::GAMEFLOW_PHASE_PATH, forward(&tx, "second"));
	assert_eq!(transport.subscription_count(), 2);
	go_tx.send(()).unwrap();

	assert_eq!(rx.recv().await.unwrap(), ("first".to_string(), json!("ChampSelect")));
	assert_eq!(rx.recv().await.unwrap(), ("second".to_string(), json!("ChampSelect")));

	let closes = Arc::new(Mutex::new(Vec::new()));
	transport.on_close(close_recorder(&closes));
	transport.close();
	transport.close();
	assert_eq!(*closes.lock(), vec![CloseReason::Local]);
	assert!(transport.is_closed());
	assert_eq!(transport.subscription_count(), 0);

	let err = transport.request(Method::GET, "/lol-summoner/v1/current-summoner", None).await.unwrap_err();
	assert!(matches!(err, crate::Error::TransportClosed));
	server.await.unwrap();
}

#[tokio::test]
async fn lobby_transport_routes_by_uri_and_reports_remote_close() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let (path_tx, path_rx) = oneshot::channel::<String>();
	let (select_tx, select_rx) = oneshot::channel::<Value>();
	let (go_tx, go_rx) = oneshot::channel::<()>();

	let server = tokio::spawn(async move {
		let (tcp, _) = listener.accept().await.unwrap();
		let mut ws = tokio_tungstenite::accept_hdr_async(tcp, move |req: &Request, resp: Response| {
			let _ = path_tx.send(req.uri().path().to_string());
			Ok(resp)
		})
		.await
		.unwrap();

		if let Some(Ok(Message::Text(text))) = ws.next().await {
			let _ = select_tx.send(serde_json::from_str(&text).unwrap());
		}
		go_rx.await.unwrap();
		let leave = json!({"user": "someone", "action": "leave"});
		ws.send(Message::Text(leave.to_string())).await.unwrap();
		let push = json!({"uri": "/ChampSelect", "data": {"team_champs": [1, 2], "team_members": {"p1": [1, 2]}}});
		ws.send(Message::Text(push.to_string())).await.unwrap();
		ws.close(None).await.unwrap();
	});

	let base = Url::parse(&format!("http://{addr}")).unwrap();
	let transport = LobbyTransport::connect(&base, "p1").await.unwrap();
	assert_eq!(path_rx.await.unwrap(), "/ws/p1");
	assert_eq!(transport.kind(), TransportKind::Lobby);

	transport
		.select_champions(lcu_protocol::ChampSelectRequest {
			party_id: "party".into(),
			my_team: 100,
			my_champs: vec![1, 2, 3],
		})
		.unwrap();
	let select = select_rx.await.unwrap();
	assert_eq!(select["type"], "select");
	assert_eq!(select["datas"]["my_champs"], json!([1, 2, 3]));

	let (tx, mut rx) = mpsc::unbounded_channel();
	transport.subscribe(lcu_protocol::LOBBY_CHAMP_SELECT_PATH, forward(&tx, "champ"));
	let closes = Arc::new(Mutex::new(Vec::new()));
	transport.on_close(close_recorder(&closes));
	go_tx.send(()).unwrap();

	let (tag, data) = rx.recv().await.unwrap();
	assert_eq!(tag, "champ");
	assert_eq!(data["team_members"]["p1"], json!([1, 2]));

	wait_until(|| !closes.lock().is_empty()).await;
	assert_eq!(*closes.lock(), vec![CloseReason::Remote]);
	assert_eq!(transport.subscription_count(), 0);
	assert!(transport.select_champions(lcu_protocol::ChampSelectRequest {
		party_id: "party".into(),
		my_team: 100,
		my_champs: vec![],
	})
	.is_err());
	server.await.unwrap();
}

#[tokio::test]
async fn connect_to_nothing_fails() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let port = listener.local_addr().unwrap().port();
	drop(listener);

	let creds = Credentials::new(port, "token").with_security(TransportSecurity::Plain);
	assert!(ClientTransport::connect(creds).await.is_err());
}

#[test]
fn lobby_socket_url_maps_scheme_and_appends_identity() {
	let base = Url::parse("https://lobby.example.com/").unwrap();
	assert_eq!(lobby::socket_url(&base, "abc").unwrap().as_str(), "wss://lobby.example.com/ws/abc");

	let base = Url::parse("http://127.0.0.1:8000/api").unwrap();
	assert_eq!(lobby::socket_url(&base, "abc").unwrap().as_str(), "ws://127.0.0.1:8000/api/ws/abc");

	assert!(lobby::socket_url(&base, "").is_err());
	assert!(lobby::socket_url(&Url::parse("ftp://x").unwrap(), "abc").is_err());
}
