/// HTTP handlers for mood-feed-service
///
/// - Feed: mood-ranked feed, plus the legacy `/posts/mood/{mood}` route
/// - Posts: create, read, delete, like and unlike
/// - Users: mood updates for the caller
pub mod feed;
pub mod posts;
pub mod users;

use actix_web::web;

use crate::middleware::{JwtAuthMiddleware, MetricsMiddleware};

pub use feed::{get_feed, get_feed_by_mood, FeedHandlerState};
pub use posts::{
    create_post, delete_post, get_post, get_user_posts, like_post, unlike_post, PostHandlerState,
};
pub use users::{update_mood, UserHandlerState};

/// Registers the authenticated `/api/v1` scope.
///
/// Routes registered on the `App` before this scope (health checks) stay
/// public.
pub fn configure(auth: JwtAuthMiddleware) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(
            web::scope("/api/v1")
                .wrap(auth)
                .wrap(MetricsMiddleware)
                .service(web::resource("/feed").route(web::get().to(get_feed)))
                .service(
                    web::scope("/posts")
                        .service(web::resource("").route(web::post().to(create_post)))
                        .service(
                            web::resource("/mood/{mood}").route(web::get().to(get_feed_by_mood)),
                        )
                        .service(
                            web::resource("/user/{user_id}").route(web::get().to(get_user_posts)),
                        )
                        .service(web::resource("/like/{post_id}").route(web::post().to(like_post)))
                        .service(
                            web::resource("/unlike/{post_id}").route(web::post().to(unlike_post)),
                        )
                        .service(
                            web::resource("/{post_id}")
                                .route(web::get().to(get_post))
                                .route(web::delete().to(delete_post)),
                        ),
                )
                .service(web::resource("/users/me/mood").route(web::put().to(update_mood))),
        );
    }
}
