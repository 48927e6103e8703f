use crate::{
    auth::{router as auth_router, user::Backend},
    config::Config,
    error::AppError,
    routes::{admin, api},
    util::asset_loader::AssetLoader,
};
use axum::{
    Router,
    response::{Html, Redirect},
    routing::{get, get_service, post},
};
use axum_login::{
    AuthManagerLayerBuilder,
    tower_sessions::{
        Expiry, SessionManagerLayer, SessionStore,
        cookie::{SameSite, time},
    },
};
use minijinja::Environment;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tokio::{signal, task::AbortHandle};
use tower_http::{services::ServeDir, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub templates: Arc<Environment<'static>>,
}

impl AppState {
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<Html<String>, AppError> {
        let tmpl = self.templates.get_template(name)?;
        Ok(Html(tmpl.render(ctx)?))
    }
}

pub async fn create_router<S>(
    db: DatabaseConnection,
    config: &Config,
    session_store: S,
) -> anyhow::Result<Router>
where
    S: SessionStore + Clone,
{
    let templates = setup_templates(config);

    let state = AppState {
        db: db.clone(),
        templates: Arc::new(templates),
    };

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.secure_cookie)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(1)));

    // Auth service.
    //
    // This combines the session layer with our backend to establish the auth
    // service which will provide the auth session as a request extension.
    let backend = Backend::new(db);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    let app = Router::new()
        .route("/api/affiliations_list/", get(api::affiliations_list))
        .route("/api/affiliation_detail/", get(api::affiliation_detail))
        .route(
            "/api/affiliations/",
            get(api::list_affiliations).post(api::create_affiliation),
        )
        .route(
            "/api/affiliations/{id}/",
            get(api::get_affiliation)
                .put(api::update_affiliation)
                .delete(api::delete_affiliation),
        )
        .route("/admin/affiliations", get(admin::list))
        .route("/admin/affiliations/new", get(admin::new_form).post(admin::create))
        .route("/admin/affiliations/{id}", get(admin::edit_form).post(admin::update))
        .route("/admin/affiliations/{id}/delete", post(admin::delete))
        .route("/", get(index))
        .merge(auth_router::router())
        .with_state(state)
        .nest_service(
            "/static",
            get_service(ServeDir::new(config.static_dir.clone())),
        )
        .layer(auth_layer)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

fn setup_templates(config: &Config) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(minijinja::path_loader(config.template_dir.clone()));
    let asset_loader = AssetLoader::new(config.static_dir.clone());
    asset_loader.register(&mut env);
    env
}

async fn index() -> Redirect {
    Redirect::to("/admin/affiliations")
}

pub async fn shutdown_signal(deletion_task_abort_handle: AbortHandle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { deletion_task_abort_handle.abort() },
        _ = terminate => { deletion_task_abort_handle.abort() },
    }
}
