//! Account endpoints. Every identity failure is logged with its cause and
//! answered with the same generic message.

use crate::handlers::{bearer, signed_in_user, AppState, ErrorBody};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use bingo_core::AuthError;
use serde::Deserialize;

pub const GENERIC_AUTH_ERROR: &str = "Something went wrong. Check your details and try again.";

#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailForm {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetConfirmForm {
    pub token: String,
    pub password: String,
}

fn auth_failure(action: &str, err: AuthError) -> HttpResponse {
    match &err {
        AuthError::Backend(_) => log::error!("{} failed: {}", action, err),
        _ => log::warn!("{} rejected: {}", action, err),
    }
    HttpResponse::BadRequest().json(ErrorBody {
        error: GENERIC_AUTH_ERROR.into(),
    })
}

fn no_session() -> HttpResponse {
    HttpResponse::Unauthorized().json(ErrorBody {
        error: "not signed in".into(),
    })
}

pub async fn sign_up(data: web::Data<AppState>, form: web::Json<SignUpForm>) -> impl Responder {
    match data.auth.create_account(&form.username, &form.email, &form.password).await {
        Ok(session) => HttpResponse::Ok().json(session),
        Err(err) => auth_failure("sign up", err),
    }
}

pub async fn sign_in(data: web::Data<AppState>, form: web::Json<SignInForm>) -> impl Responder {
    match data.auth.sign_in(&form.email, &form.password).await {
        Ok(session) => HttpResponse::Ok().json(session),
        Err(err) => auth_failure("sign in", err),
    }
}

pub async fn sign_out(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let Some(token) = bearer(&req) else {
        return no_session();
    };
    match data.auth.sign_out(token).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => auth_failure("sign out", err),
    }
}

pub async fn me(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    match signed_in_user(&data, &req).await {
        Some(user) => HttpResponse::Ok().json(user),
        None => no_session(),
    }
}

/// Always accepted, so the response does not reveal which emails exist.
pub async fn request_reset(data: web::Data<AppState>, form: web::Json<EmailForm>) -> impl Responder {
    if let Err(err) = data.auth.send_password_reset(&form.email).await {
        return auth_failure("password reset", err);
    }
    HttpResponse::Accepted().finish()
}

pub async fn confirm_reset(data: web::Data<AppState>, form: web::Json<ResetConfirmForm>) -> impl Responder {
    match data.auth.confirm_password_reset(&form.token, &form.password).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => auth_failure("password reset confirm", err),
    }
}

pub async fn update_email(data: web::Data<AppState>, req: HttpRequest, form: web::Json<EmailForm>) -> impl Responder {
    let Some(token) = bearer(&req) else {
        return no_session();
    };
    match data.auth.update_email(token, &form.email).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => auth_failure("email update", err),
    }
}

pub async fn update_password(data: web::Data<AppState>, req: HttpRequest, form: web::Json<PasswordForm>) -> impl Responder {
    let Some(token) = bearer(&req) else {
        return no_session();
    };
    match data.auth.update_password(token, &form.password).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => auth_failure("password update", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configure_routes;
    use crate::handlers::tests::{identity, state, user};
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use bingo_core::traits::AuthSession;
    use serde_json::json;

    #[actix_web::test]
    async fn test_sign_in_returns_session() {
        let mut auth = identity();
        auth.expect_sign_in().returning(|email, password| {
            if email == "lydia@example.com" && password == "hunter2" {
                Ok(AuthSession {
                    token: "lydlbutton-token".into(),
                    user: user("lydlbutton"),
                })
            } else {
                Err(AuthError::InvalidCredentials)
            }
        });
        let app = test::init_service(App::new().app_data(state(auth).await).configure(configure_routes)).await;

        let ok = test::TestRequest::post()
            .uri("/auth/signin")
            .set_json(json!({ "email": "lydia@example.com", "password": "hunter2" }))
            .to_request();
        let session: AuthSession = test::call_and_read_body_json(&app, ok).await;
        assert_eq!(session.user.display_name, "lydlbutton");

        let bad = test::TestRequest::post()
            .uri("/auth/signin")
            .set_json(json!({ "email": "lydia@example.com", "password": "nope" }))
            .to_request();
        let resp = test::call_service(&app, bad).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error, GENERIC_AUTH_ERROR);
    }

    #[actix_web::test]
    async fn test_sign_up_failures_are_generic() {
        let mut auth = identity();
        auth.expect_create_account()
            .returning(|_, _, _| Err(AuthError::EmailTaken));
        let app = test::init_service(App::new().app_data(state(auth).await).configure(configure_routes)).await;

        let req = test::TestRequest::post()
            .uri("/auth/signup")
            .set_json(json!({ "username": "coco", "email": "coco@example.com", "password": "pw" }))
            .to_request();
        let body: ErrorBody = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.error, GENERIC_AUTH_ERROR);
    }

    #[actix_web::test]
    async fn test_me_and_sign_out() {
        let mut auth = identity();
        auth.expect_sign_out()
            .withf(|token| token.eq_ignore_ascii_case("coco-token"))
            .times(1)
            .returning(|_| Ok(()));
        let app = test::init_service(App::new().app_data(state(auth).await).configure(configure_routes)).await;

        let anonymous = test::TestRequest::get().uri("/auth/me").to_request();
        assert_eq!(test::call_service(&app, anonymous).await.status(), StatusCode::UNAUTHORIZED);

        let me = test::TestRequest::get()
            .uri("/auth/me")
            .insert_header((header::AUTHORIZATION, "Bearer coco-token"))
            .to_request();
        let current: bingo_core::traits::AuthUser = test::call_and_read_body_json(&app, me).await;
        assert_eq!(current.display_name, "coco");

        let out = test::TestRequest::post()
            .uri("/auth/signout")
            .insert_header((header::AUTHORIZATION, "Bearer coco-token"))
            .to_request();
        assert_eq!(test::call_service(&app, out).await.status(), StatusCode::NO_CONTENT);
    }

    #[actix_web::test]
    async fn test_reset_request_is_accepted() {
        let mut auth = identity();
        auth.expect_send_password_reset().returning(|_| Ok(()));
        let app = test::init_service(App::new().app_data(state(auth).await).configure(configure_routes)).await;

        let req = test::TestRequest::post()
            .uri("/auth/reset")
            .set_json(json!({ "email": "nobody@example.com" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::ACCEPTED);
    }
}
