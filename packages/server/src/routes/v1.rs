use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/achievements", achievement_routes())
        .nest("/reports", report_routes())
        .nest("/users", user_routes())
        .nest("/students", student_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::refresh))
        .routes(routes!(handlers::auth::profile))
        .routes(routes!(handlers::auth::logout))
}

fn achievement_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::achievement::list_achievements,
            handlers::achievement::create_achievement
        ))
        .routes(routes!(
            handlers::achievement::get_achievement,
            handlers::achievement::update_achievement,
            handlers::achievement::delete_achievement
        ))
        .routes(routes!(handlers::achievement::submit_achievement))
        .routes(routes!(handlers::achievement::verify_achievement))
        .routes(routes!(handlers::achievement::add_attachment))
}

fn report_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::report::statistics))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::user::list_users,
            handlers::user::create_user
        ))
        .routes(routes!(
            handlers::user::get_user,
            handlers::user::update_user,
            handlers::user::delete_user
        ))
}

fn student_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::user::set_advisor))
}
