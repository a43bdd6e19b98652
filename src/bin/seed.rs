//! Seeds a PRIVATE conversation between two users with alternating messages.
//!
//! Run with: `cargo run --bin chat-seed -- --count 200`

use chat_service::AppBuilder;
use chat_service::adapters::database::init_pool;
use chat_service::config::{Config, DatabaseConfig};
use chat_service::domain::conversation::{ConversationType, NewConversation};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(version, about = "Seed a private conversation with sample messages", long_about = None)]
struct SeedArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    /// Member who sends the even-numbered messages
    #[arg(long, default_value = "00000000-0000-0000-0000-000000000001")]
    first_user: String,

    /// Member who sends the odd-numbered messages
    #[arg(long, default_value = "00000000-0000-0000-0000-000000000002")]
    second_user: String,

    /// Number of messages to append
    #[arg(long, default_value_t = 200)]
    count: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info,sqlx=warn").init();

    let args = SeedArgs::parse();
    let pool = init_pool(&args.database).await?;
    chat_service::run_migrations(&pool).await?;

    let mut config = Config::try_parse_from(["chat-seed"])?;
    config.database = args.database;
    let app = AppBuilder::new(config).with_database(pool).build();
    let service = app.services.conversation_service;

    let detail = service
        .create_conversation(NewConversation {
            owner_id: Some(args.first_user.clone()),
            name: None,
            conversation_type: ConversationType::Private,
            member_ids: vec![args.first_user.clone(), args.second_user.clone()],
        })
        .await?;
    let conversation_id = detail.conversation.id;
    tracing::info!(%conversation_id, "Seeding conversation");

    for i in 1..=args.count {
        let sender = if i % 2 == 0 { &args.first_user } else { &args.second_user };
        service.create_message(conversation_id, sender.clone(), format!("Hi {i}")).await?;
    }

    tracing::info!(%conversation_id, messages = args.count, "Seeding complete");
    Ok(())
}
