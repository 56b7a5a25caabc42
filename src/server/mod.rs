pub mod handlers;
pub mod state;

use actix_web::http::StatusCode;
use actix_web::{middleware, web, App, HttpResponse, HttpServer, ResponseError};
use serde_json::json;

use crate::config::AppConfig;
use crate::utils::error::{ErrorCategory, GrabError};
use state::AppState;

fn category_label(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Network => "network",
        ErrorCategory::Automation => "automation",
        ErrorCategory::Data => "data",
        ErrorCategory::Configuration => "configuration",
        ErrorCategory::System => "system",
    }
}

impl ResponseError for GrabError {
    fn status_code(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::Configuration => StatusCode::BAD_REQUEST,
            ErrorCategory::Data => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.user_friendly_message(),
            "category": category_label(self.category()),
            "suggestion": self.recovery_suggestion(),
        }))
    }
}

/// Runs the HTTP front end until shutdown.
pub async fn run(config: AppConfig) -> std::io::Result<()> {
    if config.env.gather_usage_stats {
        // An anonymous startup ping in the logs only; no network call is made.
        tracing::info!(
            "usage ping: newsgrab server starting (set NEWSGRAB_GATHER_USAGE_STATS=false to disable)"
        );
    }
    tracing::info!("Listening on {}:{}", config.address, config.port);

    let bind_target = (config.address.clone(), config.port);
    let state = web::Data::new(AppState::new(config));

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(handlers::health)
            .service(handlers::routers())
    })
    .bind(bind_target)?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_map_to_client_status() {
        let error = GrabError::ValidationError {
            message: "bad input".to_string(),
        };
        assert!(error.status_code().is_client_error());

        let error = GrabError::MissingConfigError {
            field: "query".to_string(),
        };
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }
}
