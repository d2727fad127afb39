use actix_web::{App, HttpServer, middleware::Logger, web};
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use chrono::Local;  // timestamp in log lines

use scratch_rewards_backend::{
    config::Config,
    handlers,
    middlewares::{AdminKeyMiddleware, create_cors},
    services::*,
    storage,
    swagger::swagger_config,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建存储 (数据库后端会在这里执行迁移)
    let storage = storage::build(&config)
        .await
        .expect("Failed to initialize storage backend");

    if config.admin.api_key.is_none() {
        log::warn!("ADMIN_API_KEY not set; admin routes are open");
    }

    // 创建服务
    let draw_service = DrawService::new(
        storage.inventory.clone(),
        storage.audit.clone(),
        &config.draw,
    );
    let prize_service = PrizeService::new(storage.inventory.clone());
    let admin_key = config.admin.api_key.clone();

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(AdminKeyMiddleware::new(admin_key.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(draw_service.clone()))
            .app_data(web::Data::new(prize_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::draw_config)
                    .configure(handlers::prize_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
