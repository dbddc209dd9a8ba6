//! Server construction: port wiring, middleware, and route registration.

mod config;

pub use config::{AppConfig, ConfigError, GatewayEndpoint};

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetricsBuilder;
use tracing::info;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::domain::billing::{BillingConfig, NotificationSigner};
use crate::domain::ports::{
    FixtureAppointmentRepository, FixtureFavouriteRepository, FixtureListingRepository,
    FixtureMembershipRepository, FixturePaymentGateway, FixtureQuestionRepository,
    FixtureUserRepository, PaymentGateway,
};
use crate::domain::TokenIssuer;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::inbound::http::{appointments, billing, favourites, listings, questions, users};
use crate::middleware::Trace;
use crate::outbound::gateway::HttpPaymentGateway;
use crate::outbound::persistence::{
    DbPool, DieselAppointmentRepository, DieselFavouriteRepository, DieselListingRepository,
    DieselMembershipRepository, DieselQuestionRepository, DieselUserRepository, PoolConfig,
    run_pending_migrations,
};

fn build_gateway(config: &AppConfig) -> std::io::Result<Arc<dyn PaymentGateway>> {
    match &config.gateway {
        Some(gateway) => {
            let adapter = HttpPaymentGateway::new(gateway.endpoint.clone(), gateway.timeout)
                .map_err(std::io::Error::other)?;
            Ok(Arc::new(adapter))
        }
        None => Ok(Arc::new(FixturePaymentGateway)),
    }
}

async fn build_ports(config: &AppConfig) -> std::io::Result<HttpStatePorts> {
    let gateway = build_gateway(config)?;
    match &config.database_url {
        Some(url) => {
            run_pending_migrations(url)
                .await
                .map_err(std::io::Error::other)?;
            let pool = DbPool::new(PoolConfig::new(url, config.db_pool_size))
                .await
                .map_err(std::io::Error::other)?;
            Ok(HttpStatePorts {
                users: Arc::new(DieselUserRepository::new(pool.clone())),
                listings: Arc::new(DieselListingRepository::new(pool.clone())),
                favourites: Arc::new(DieselFavouriteRepository::new(pool.clone())),
                appointments: Arc::new(DieselAppointmentRepository::new(pool.clone())),
                questions: Arc::new(DieselQuestionRepository::new(pool.clone())),
                memberships: Arc::new(DieselMembershipRepository::new(pool)),
                gateway,
            })
        }
        None => Ok(HttpStatePorts {
            users: Arc::new(FixtureUserRepository::default()),
            listings: Arc::new(FixtureListingRepository::default()),
            favourites: Arc::new(FixtureFavouriteRepository::default()),
            appointments: Arc::new(FixtureAppointmentRepository::default()),
            questions: Arc::new(FixtureQuestionRepository::default()),
            memberships: Arc::new(FixtureMembershipRepository::default()),
            gateway,
        }),
    }
}

#[cfg(feature = "metrics")]
fn make_metrics() -> std::io::Result<actix_web_prom::PrometheusMetrics> {
    PrometheusMetricsBuilder::new("marketstall")
        .endpoint("/metrics")
        .build()
        .map_err(|err| std::io::Error::other(format!("configure Prometheus metrics: {err}")))
}

/// Wire state from configuration and serve until shutdown.
///
/// # Errors
///
/// Returns [`std::io::Error`] when the pool, migrations, gateway client,
/// or socket binding fail.
pub async fn run(config: AppConfig) -> std::io::Result<()> {
    let ports = build_ports(&config).await?;
    let state = web::Data::new(HttpState::new(
        ports,
        TokenIssuer::new(config.jwt_secret.as_slice(), config.jwt_ttl),
        NotificationSigner::new(config.gateway_secret.to_vec()),
        BillingConfig {
            merchant_id: config.merchant_id.clone(),
            price: config.premium_price,
            currency: config.premium_currency.clone(),
        },
    ));
    let health_state = web::Data::new(HealthState::new());

    // Clones for the server factory so the probes stay reachable here.
    let factory_state = state.clone();
    let factory_health = health_state.clone();
    #[cfg(feature = "metrics")]
    let prometheus = make_metrics()?;

    let server = HttpServer::new(move || {
        let api = web::scope("/api/v1")
            .service(users::register)
            .service(users::login)
            .service(users::current_user)
            .service(listings::search_listings)
            .service(listings::create_listing)
            .service(listings::my_listings)
            .service(listings::review_queue)
            .service(listings::approve_listing)
            .service(listings::reject_listing)
            .service(favourites::toggle_favourite)
            .service(favourites::my_favourites)
            .service(questions::list_questions)
            .service(questions::ask_question)
            .service(questions::answer_question)
            .service(listings::get_listing)
            .service(listings::update_listing)
            .service(listings::delete_listing)
            .service(appointments::book_appointment)
            .service(appointments::list_appointments)
            .service(appointments::set_appointment_status)
            .service(appointments::withdraw_appointment)
            .service(billing::start_checkout)
            .service(billing::gateway_notify)
            .service(billing::membership_state);

        let app = App::new()
            .app_data(factory_state.clone())
            .app_data(factory_health.clone())
            .wrap(Trace)
            .service(api)
            .service(ready)
            .service(live);

        #[cfg(debug_assertions)]
        let app =
            app.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));

        #[cfg(feature = "metrics")]
        let app = app.wrap(prometheus.clone());

        app
    })
    .bind(config.bind_addr)?;

    info!(addr = %config.bind_addr, "marketstall backend listening");
    health_state.mark_ready();
    server.run().await
}
