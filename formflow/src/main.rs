use actix_web::middleware::Logger;
use actix_web::{web, App as ActixWebApp, HttpServer};
use formflow::api::*;
use formflow::app::App;
use formflow::utils::logger::log_success;

#[tokio::main]
async fn main() {
    let app = App::new().await;
    let port = app.port();

    app.init();

    let app_web_data = web::Data::new(app);
    let engine_web_data = web::Data::from(app_web_data.engine.clone());

    log_success(format!("formflow listening on port {}", port));

    HttpServer::new(move || {
        ActixWebApp::new()
            .wrap(Logger::new("%a %r %s %b %{Referer}i %{User-Agent}i %T"))
            .wrap(app_web_data.cors())
            .app_data(app_web_data.json_config())
            .app_data(app_web_data.clone())
            .app_data(engine_web_data.clone())
            .service(
                web::scope("/forms")
                    .service(create_form)
                    .service(get_form)
                    .service(delete_form)
                    .service(publish_form)
                    .service(set_accepting_responses)
                    .service(update_flow)
                    .service(get_flow)
                    .service(get_responses)
                    .service(get_response),
            )
            .service(
                web::scope("/f")
                    .service(get_public_form)
                    .service(submit_responses),
            )
    })
    .bind(("0.0.0.0", port))
    .unwrap_or_else(|e| panic!("Could not bind to port {}.\n{}", port, e))
    .run()
    .await
    .unwrap_or_else(|e| panic!("Could not run server to port {}.\n{}", port, e));
}
