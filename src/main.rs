// region:    --- Imports
use axum::extract::DefaultBodyLimit;
use foundation_service::config::Config;
use foundation_service::database::DatabaseManager;
use foundation_service::directory::PgUserDirectory;
use foundation_service::handlers;
use foundation_service::message_broker::KafkaManager;
use foundation_service::notification::{KafkaNotifier, LogNotifier, Notifier};
use foundation_service::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 설정 로드
    let config = Config::from_env()?;
    info!("{:<12} --> 설정 로드 완료: listen={}", "Main", config.listen_addr);

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::connect(&config).await?);

    // 데이터베이스 초기화
    if config.database_init_schema {
        if let Err(e) = db_manager.initialize_database().await {
            error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
            return Err(e.into());
        }
        info!("{:<12} --> 데이터베이스 초기화 성공", "Main");
    }

    // 알림 발송기 (브로커가 없으면 로그 전용)
    let notifier: Arc<dyn Notifier> = match &config.kafka_brokers {
        Some(brokers) => {
            let kafka_manager = KafkaManager::new(brokers)?;
            if let Err(e) = kafka_manager
                .create_topic(&config.notification_topic, 3, 1)
                .await
            {
                warn!("{:<12} --> 알림 토픽 생성 실패 (계속 진행): {}", "Main", e);
            }
            info!("{:<12} --> Kafka 알림 사용: {}", "Main", brokers);
            Arc::new(KafkaNotifier::new(
                kafka_manager.get_producer(),
                config.notification_topic.clone(),
            ))
        }
        None => {
            info!("{:<12} --> KAFKA_BROKERS 미설정, 로그 알림 사용", "Main");
            Arc::new(LogNotifier)
        }
    };

    let state = AppState {
        directory: Arc::new(PgUserDirectory::new(db_manager.get_pool())),
        db_manager,
        notifier,
        booking_policy: config.booking,
        auction_policy: config.auction,
    };

    // 모바일/웹 클라이언트용 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = handlers::routes(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024));

    // 리스너 생성
    let listener = TcpListener::bind(config.listen_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
