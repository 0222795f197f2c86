mod database;
mod error;
mod export;
mod handlers;
mod import;
mod middleware;
mod models;
mod repositories;
mod services;
mod utils;

use axum::{
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
    Router,
};
use std::env;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use dotenvy::dotenv;

use database::{create_database_pool, run_migrations, Database};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    let database_url = env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set");

    let db = create_database_pool(&database_url).await
        .expect("Failed to connect to database");

    run_migrations(&db).await
        .expect("Failed to run schema migrations");
    services::roles::ensure_default_roles(&db).await
        .expect("Failed to seed default roles");
    services::accounts::ensure_default_admin(&db).await
        .expect("Failed to seed default administrator");

    // Build the application router
    let app = create_router(db);

    // Get port from environment or use default
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{}", port);

    log::info!("CoverCRM server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

fn create_router(db: Database) -> Router {
    Router::new()
        // Public routes (no authentication required)
        .route("/", get(|| async { Redirect::permanent("/Account/Login") }))
        .route("/Account/Login", get(handlers::account::login_page))
        .route("/Account/Login", post(handlers::account::login))
        .route("/Account/Logout", post(handlers::account::logout))
        .route("/Account/AccessDenied", get(handlers::account::access_denied))

        // Dashboard
        .route("/Home/Index", get(handlers::home::dashboard))

        // Customers
        .route("/Customer/Index", get(handlers::customer::index))
        .route("/Customer/Add", get(handlers::customer::add_form))
        .route("/Customer/Add", post(handlers::customer::add))
        .route("/Customer/Edit/:id", get(handlers::customer::edit_form))
        .route("/Customer/Edit/:id", post(handlers::customer::edit))
        .route("/Customer/Delete/:id", post(handlers::customer::delete))
        .route("/Customer/Assign/:id", get(handlers::customer::assign_form))
        .route("/Customer/Assign/:id", post(handlers::customer::assign))
        .route("/Customer/BulkAssign", get(handlers::customer::bulk_assign_form))
        .route("/Customer/BulkAssign", post(handlers::customer::bulk_assign))
        .route("/Customer/BulkUpload", post(handlers::customer::bulk_upload))
        .route("/Customer/Export", get(handlers::customer::export_customers))
        .route("/Customer/DownloadTemplate", get(handlers::customer::download_template))

        // Follow-ups
        .route("/FollowUp/Add/:customer_id", get(handlers::follow_up::add_form))
        .route("/FollowUp/Add", post(handlers::follow_up::add))
        .route("/FollowUp/Edit/:id", get(handlers::follow_up::edit_form))
        .route("/FollowUp/Edit", post(handlers::follow_up::edit))
        .route("/FollowUp/History/:customer_id", get(handlers::follow_up::history))

        // Reminders (polled from the layout)
        .route("/Reminder/GetDueReminders", get(handlers::reminder::get_due_reminders))
        .route("/Reminder/MarkAsShown", post(handlers::reminder::mark_as_shown))

        // Products and documents
        .route("/Product/Index", get(handlers::product::index))
        .route("/Product/Create", get(handlers::product::create_form))
        .route("/Product/Create", post(handlers::product::create))
        .route("/Product/Edit/:id", get(handlers::product::edit_form))
        .route("/Product/Edit/:id", post(handlers::product::edit))
        .route("/Product/Delete/:id", post(handlers::product::delete))
        .route("/Product/PreviewDocument/:id", get(handlers::product::preview_document))
        .route("/Product/DeleteDocument/:id", post(handlers::product::delete_document))

        // Sales report
        .route("/SoldProductDetail/Index", get(handlers::sold_product::index))

        // Administration
        .route("/Admin/Users", get(handlers::admin::users_page))
        .route("/Admin/Users", post(handlers::admin::create_user))
        .route("/Admin/EditUser/:id", get(handlers::admin::edit_user_form))
        .route("/Admin/EditUser/:id", post(handlers::admin::edit_user))
        .route("/Admin/SetUserActive/:id", post(handlers::admin::set_user_active))
        .route("/Admin/ManageRoles", get(handlers::admin::roles_page))
        .route("/Admin/ManageRoles", post(handlers::admin::create_role))
        .route("/Admin/UpdateRole/:id", post(handlers::admin::update_role))
        .route("/Admin/DeleteRole/:id", post(handlers::admin::delete_role))
        .route("/Admin/UpdateUserRole", post(handlers::admin::update_user_role))
        .route("/Admin/ExportUsers", get(handlers::admin::export_users))

        // Static files
        .nest_service("/static", ServeDir::new("static"))

        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CookieManagerLayer::new())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(25 * 1024 * 1024)) // room for 20MB documents
        )
        .with_state(db)
}
