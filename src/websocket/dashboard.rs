use crate::middleware::AdminSession;
use crate::models::ReportStatus;
use crate::services::{Dashboard, DashboardFeed, DashboardView, RefreshSource, ReportStore, Tab};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        WebSocketUpgrade,
    },
    response::IntoResponse,
    Extension,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};

/// Commands a connected dashboard may send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum DashboardCommand {
    SetTab { tab: String },
    SetStatus { id: String, status: String },
    Delete { id: String },
    Refresh,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Snapshot { data: DashboardView },
    Error { message: String },
}

/// Apply one command to a mounted dashboard and describe the result.
///
/// Unknown ids are not an error: the snapshot simply shows nothing changed.
pub fn apply_command(dashboard: &mut Dashboard, command: DashboardCommand) -> ServerMessage {
    let outcome = match command {
        DashboardCommand::SetTab { tab } => tab.parse::<Tab>().map(|tab| dashboard.set_tab(tab)),
        DashboardCommand::SetStatus { id, status } => match status.parse::<ReportStatus>() {
            Ok(status) => dashboard
                .set_status(&id, status)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            Err(e) => Err(e),
        },
        DashboardCommand::Delete { id } => dashboard
            .delete(&id)
            .map(|_| ())
            .map_err(|e| e.to_string()),
        DashboardCommand::Refresh => dashboard.refresh().map_err(|e| e.to_string()),
    };

    match outcome {
        Ok(()) => snapshot(dashboard),
        Err(message) => ServerMessage::Error { message },
    }
}

fn snapshot(dashboard: &Dashboard) -> ServerMessage {
    ServerMessage::Snapshot {
        data: dashboard.view(),
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    session: AdminSession,
    Extension(store): Extension<ReportStore>,
    Extension(feed): Extension<DashboardFeed>,
) -> impl IntoResponse {
    let username = session.0.username;
    ws.on_upgrade(move |socket| handle_socket(socket, username, store, feed.source()))
}

async fn handle_socket(
    socket: WebSocket,
    username: String,
    store: ReportStore,
    mut source: RefreshSource,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let mut dashboard = match Dashboard::mount(store) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            tracing::error!("Failed to mount dashboard: {}", e);
            let message = ServerMessage::Error {
                message: "Failed to load reports".to_string(),
            };
            let _ = send(&mut ws_sender, &message).await;
            return;
        }
    };

    tracing::info!("Dashboard connected for {}", username);

    if send(&mut ws_sender, &snapshot(&dashboard)).await.is_err() {
        return;
    }

    loop {
        let message = tokio::select! {
            changed = source.changed() => {
                if !changed {
                    break;
                }
                match dashboard.refresh() {
                    Ok(()) => snapshot(&dashboard),
                    Err(e) => ServerMessage::Error { message: e.to_string() },
                }
            }
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<DashboardCommand>(text.as_str()) {
                        Ok(command) => apply_command(&mut dashboard, command),
                        Err(e) => ServerMessage::Error {
                            message: format!("Invalid command: {}", e),
                        },
                    }
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            },
        };

        if send(&mut ws_sender, &message).await.is_err() {
            break;
        }
    }

    tracing::info!("Dashboard disconnected for {}", username);
}

async fn send(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to encode dashboard message: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(json.into())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Report;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn mounted() -> (ReportStore, Dashboard) {
        let store = ReportStore::new(Arc::new(MemoryStore::new()));
        for (id, day) in [("a", 1), ("b", 2)] {
            store
                .append(Report {
                    id: id.to_string(),
                    image: None,
                    audio: None,
                    kind: "طرق".to_string(),
                    location: None,
                    created_at: format!("2024-03-0{}T08:00:00Z", day),
                    status: ReportStatus::New,
                })
                .unwrap();
        }
        let dashboard = Dashboard::mount(store.clone()).unwrap();
        (store, dashboard)
    }

    #[test]
    fn parse_commands() {
        let cmd: DashboardCommand =
            serde_json::from_str(r#"{"cmd":"set_status","id":"a","status":"resolved"}"#).unwrap();
        assert_eq!(
            cmd,
            DashboardCommand::SetStatus {
                id: "a".to_string(),
                status: "resolved".to_string()
            }
        );
        let cmd: DashboardCommand = serde_json::from_str(r#"{"cmd":"refresh"}"#).unwrap();
        assert_eq!(cmd, DashboardCommand::Refresh);
    }

    #[test]
    fn set_status_persists_and_snapshots() {
        let (store, mut dashboard) = mounted();
        let reply = apply_command(
            &mut dashboard,
            DashboardCommand::SetStatus {
                id: "a".to_string(),
                status: "in_progress".to_string(),
            },
        );

        let ServerMessage::Snapshot { data } = reply else {
            panic!("expected snapshot");
        };
        assert_eq!(data.stats.in_progress, 1);
        assert_eq!(
            store.find("a").unwrap().unwrap().status,
            ReportStatus::InProgress
        );
    }

    #[test]
    fn tab_filters_snapshot() {
        let (_store, mut dashboard) = mounted();
        apply_command(
            &mut dashboard,
            DashboardCommand::Delete {
                id: "b".to_string(),
            },
        );
        let reply = apply_command(
            &mut dashboard,
            DashboardCommand::SetTab {
                tab: "resolved".to_string(),
            },
        );
        let ServerMessage::Snapshot { data } = reply else {
            panic!("expected snapshot");
        };
        assert!(data.reports.is_empty());
        assert_eq!(data.stats.total, 1);
    }

    #[test]
    fn bad_input_reports_error() {
        let (_store, mut dashboard) = mounted();
        let reply = apply_command(
            &mut dashboard,
            DashboardCommand::SetStatus {
                id: "a".to_string(),
                status: "archived".to_string(),
            },
        );
        assert!(matches!(reply, ServerMessage::Error { .. }));
        assert_eq!(dashboard.tab(), Tab::All);
    }

    #[test]
    fn snapshot_wire_shape() {
        let (_store, dashboard) = mounted();
        let value = serde_json::to_value(snapshot(&dashboard)).unwrap();
        assert_eq!(value["type"], "snapshot");
        assert_eq!(value["data"]["reports"][0]["id"], "b");
    }
}
