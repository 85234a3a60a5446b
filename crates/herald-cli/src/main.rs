use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use herald_core::domain::{
    Client, ClientId, CompanyId, CustomerId, Message, MessageId, Pager, ProjectId, RoomTarget,
};
use herald_core::impls::{InMemoryClientRepository, InMemoryMessageRepository, LocalResourceSigner};
use herald_core::observability::init_tracing;
use herald_core::ports::SystemClock;
use herald_core::{AppBuilder, CancelToken, FeedConfig, FetchMode};
use tracing::{error, info};

/// デモ用のデータを投入する（3 room のうち 1 つは空）
async fn seed(
    clients: &InMemoryClientRepository,
    messages: &InMemoryMessageRepository,
) -> Result<(Client, Vec<RoomTarget>), Box<dyn std::error::Error>> {
    let me = Client::new(ClientId::generate(), CompanyId::generate(), "demo-operator");
    clients.insert(me.clone()).await;

    let rooms: Vec<RoomTarget> = (0..3)
        .map(|_| RoomTarget::new(ProjectId::generate(), CustomerId::generate()))
        .collect();

    let now = Utc::now();
    for (i, room) in rooms.iter().take(2).enumerate() {
        let room_id = room.scoped(me.company_id);
        for n in 0..3i64 {
            let mut message = Message::new(
                MessageId::generate(),
                room_id,
                me.id,
                format!("room {i} message {n}"),
                now + chrono::Duration::seconds(n),
            );
            if n == 2 {
                message = message
                    .with_image(format!("gs://herald-images/{i}/{n}.png").parse()?)
                    .with_file(format!("gs://herald-files/{i}/{n}.pdf").parse()?);
            }
            messages.insert(message).await;
        }
    }
    Ok((me, rooms))
}

async fn run(config: FeedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let clients = Arc::new(InMemoryClientRepository::new());
    let messages = Arc::new(InMemoryMessageRepository::new().with_latency_ms(5..=40));
    let signer = Arc::new(LocalResourceSigner::new(
        config.signer_base_url.clone(),
        config.signed_url_ttl(),
        Arc::new(SystemClock),
    ));

    let (me, rooms) = seed(&clients, &messages).await?;
    let app = AppBuilder::new(me.id)
        .clients(clients)
        .messages(messages)
        .signer(signer)
        .build()?;

    let cancel = CancelToken::never().with_timeout(Duration::from_secs(5));

    let newest = app.list(&rooms, FetchMode::Newest, &cancel).await?;
    info!(count = newest.len(), "newest messages by room");
    println!("{}", serde_json::to_string_pretty(&newest)?);

    let page = app
        .list(&rooms[..1], FetchMode::Paged(Pager::new(1, 2)?), &cancel)
        .await?;
    info!(count = page.len(), "first page of room 0");
    println!("{}", serde_json::to_string_pretty(&page)?);

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = match FeedConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("config error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_tracing(&config) {
        eprintln!("tracing init failed: {e}");
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "demo failed");
            ExitCode::FAILURE
        }
    }
}
