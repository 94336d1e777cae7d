//src/main.rs

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod common;
mod config;
mod db;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_middleware;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    seed_dev_host(&app_state).await;

    // Rotas públicas de autenticação
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    // Tudo abaixo exige Bearer token válido
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/validate", get(handlers::auth::validate));

    let catalog_routes = Router::new()
        .route(
            "/products",
            get(handlers::products::list).post(handlers::products::create),
        )
        .route(
            "/products/{id}",
            put(handlers::products::update).delete(handlers::products::delete),
        )
        .route(
            "/pools",
            get(handlers::pools::list).post(handlers::pools::create),
        )
        .route(
            "/pools/{id}",
            put(handlers::pools::update).delete(handlers::pools::delete),
        )
        .route(
            "/brands",
            get(handlers::brands::list).post(handlers::brands::create),
        )
        .route(
            "/brands/{id}",
            put(handlers::brands::update).delete(handlers::brands::delete),
        )
        .route(
            "/pool-brands",
            get(handlers::brands::list_pool_brands).post(handlers::brands::create_pool_brand),
        )
        .route(
            "/pool-brands/{id}",
            put(handlers::brands::update_pool_brand).delete(handlers::brands::delete_pool_brand),
        )
        .route(
            "/installers",
            get(handlers::installers::list).post(handlers::installers::create),
        )
        .route(
            "/installers/{id}",
            put(handlers::installers::update).delete(handlers::installers::delete),
        );

    let account_routes = Router::new()
        .route(
            "/owners",
            get(handlers::owners::list).post(handlers::owners::create),
        )
        .route(
            "/owners/{id}",
            get(handlers::owners::get)
                .put(handlers::owners::update)
                .delete(handlers::owners::delete),
        )
        .route(
            "/sellers",
            get(handlers::sellers::list).post(handlers::sellers::create),
        )
        .route(
            "/sellers/by-owner/{owner_id}",
            get(handlers::sellers::by_owner),
        )
        .route(
            "/sellers/{id}",
            put(handlers::sellers::update).delete(handlers::sellers::delete),
        )
        .route("/sellers-config", get(handlers::sellers::display_list));

    let sale_routes = Router::new()
        .route("/", get(handlers::sales::list).post(handlers::sales::create))
        .route("/stats/summary", get(handlers::sales::stats))
        .route("/{id}/items", get(handlers::sales::items))
        .route("/{id}", put(handlers::sales::register_payment))
        .route("/{id}/cancel", put(handlers::sales::cancel))
        .route(
            "/{id}/delivered-products",
            put(handlers::sales::update_delivered_products),
        );

    let pool_sale_routes = Router::new()
        .route(
            "/",
            get(handlers::pool_sales::list).post(handlers::pool_sales::create),
        )
        .route("/stats/summary", get(handlers::pool_sales::stats))
        .route(
            "/{id}",
            get(handlers::pool_sales::get).put(handlers::pool_sales::update),
        )
        .route("/{id}/status", put(handlers::pool_sales::set_status))
        .route("/{id}/cancel", put(handlers::pool_sales::cancel))
        .route(
            "/{id}/delivered-products",
            get(handlers::pool_sales::delivered_products)
                .put(handlers::pool_sales::update_delivered_products),
        );

    let protected_routes = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api", catalog_routes.merge(account_routes))
        .nest("/sales", sale_routes)
        .nest("/pool-sales", pool_sale_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/auth", auth_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "5000".to_string());
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}

/// Garante uma conta host em ambiente de desenvolvimento. Em produção a
/// conta deve ser provisionada fora da aplicação.
async fn seed_dev_host(app_state: &AppState) {
    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        return;
    }

    let exists = app_state
        .user_repo
        .host_exists()
        .await
        .expect("Falha ao consultar a conta host.");
    if exists {
        return;
    }

    let hash = services::auth::hash_password("123456".to_string())
        .await
        .expect("Falha ao gerar o hash da senha do host.");
    app_state
        .user_repo
        .create_host("host", &hash)
        .await
        .expect("Falha ao criar a conta host de desenvolvimento.");
    tracing::warn!("Conta host de desenvolvimento criada (usuário 'host').");
}
