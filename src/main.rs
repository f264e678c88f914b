mod api;
mod auth;
mod config;
mod images;
mod models;
mod store;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;

use api::AppState;
use config::Config;
use images::ImagePipeline;
use store::ItemStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Load environment variables
    dotenvy::dotenv().ok();

    // All env access happens here; everything downstream gets the Config.
    let config = Arc::new(Config::from_env());

    let store = Arc::new(
        ItemStore::new(config.document_path()).expect("Failed to initialize item store"),
    );
    let images = Arc::new(
        ImagePipeline::new(config.images_dir(), config.max_image_dimension)
            .expect("Failed to prepare images directory"),
    );

    log::info!("Item document: {}", config.document_path().display());
    log::info!("Images: {}", config.images_dir().display());
    if config.pin.is_none() {
        log::warn!("PIN not set, wishlist mutations are unrestricted");
    }

    let port = config.port;
    let public_dir = config.public_dir.clone();

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let app = App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                images: images.clone(),
                config: config.clone(),
            }))
            // Increase payload size limit for image uploads (50MB)
            .app_data(web::PayloadConfig::new(50 * 1024 * 1024))
            .configure(api::configure_routes);

        // Serve the bundled frontend when present
        if public_dir.is_dir() {
            app.service(Files::new("/", &public_dir).index_file("index.html"))
        } else {
            app
        }
    });

    log::info!("Starting wantlist server on port {}", port);
    server.bind(("0.0.0.0", port))?.run().await
}
