use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, products, sales, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(products::router())
        .merge(sales::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::Json;

    use crate::auth::handlers::authenticate;
    use crate::auth::dto::LoginRequest;
    use crate::auth::password::verify_password;
    use crate::error::ApiError;
    use crate::sales::dto::CreateSaleRequest;
    use crate::sales::handlers::create_sale;
    use crate::state::AppState;
    use crate::users::dto::CreateUserRequest;
    use crate::users::handlers::create_user;
    use crate::users::repo::User;

    async fn authorize(state: &AppState, email: &str, password: &str) -> crate::auth::extractors::AuthUser {
        use axum::extract::{FromRef, FromRequestParts};
        use axum::http::Request;

        let token = {
            let Json(body) = authenticate(
                State(state.clone()),
                Json(LoginRequest {
                    email: email.into(),
                    password: password.into(),
                }),
            )
            .await
            .expect("login");
            body.token
        };
        let keys = crate::auth::jwt::JwtKeys::from_ref(state);
        keys.verify(&token).expect("token verifies");

        let mut parts = Request::builder()
            .uri("/sales")
            .header(axum::http::header::AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .expect("request")
            .into_parts()
            .0;
        crate::auth::extractors::AuthUser::from_request_parts(&mut parts, state)
            .await
            .expect("guard passes")
    }

    // End-to-end path over the handlers: signup, login, then a sale create
    // where no product id resolves must 404 and persist nothing.
    #[tokio::test]
    async fn signup_login_and_unresolvable_sale() {
        let state = AppState::for_tests().await;

        let (status, Json(user)) = create_user(
            State(state.clone()),
            Json(CreateUserRequest {
                name: "a".into(),
                email: "a@x.com".into(),
                password: "12345678".into(),
            }),
        )
        .await
        .expect("create user");
        assert_eq!(status, StatusCode::CREATED);

        let stored = User::find_by_id(&state.db, user.id).await.expect("stored");
        assert!(verify_password("12345678", &stored.password_hash).expect("verify"));

        let auth = authorize(&state, "a@x.com", "12345678").await;
        let err = create_sale(
            State(state.clone()),
            auth,
            Json(CreateSaleRequest {
                user: user.id.to_string(),
                products: vec!["999".into()],
            }),
        )
        .await
        .err()
        .expect("sale must fail");
        assert!(matches!(err, ApiError::NotFound(_)));

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sales")
            .fetch_one(&state.db)
            .await
            .expect("count");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn authorized_sale_create_and_list_roundtrip() {
        let state = AppState::for_tests().await;

        let (_, Json(user)) = create_user(
            State(state.clone()),
            Json(CreateUserRequest {
                name: "a".into(),
                email: "a@x.com".into(),
                password: "12345678".into(),
            }),
        )
        .await
        .expect("create user");
        let product = crate::products::repo::Product::create(&state.db, "SKU-1", "item", 5.0)
            .await
            .expect("product");

        let auth = authorize(&state, "a@x.com", "12345678").await;
        let (status, Json(sale)) = create_sale(
            State(state.clone()),
            auth,
            Json(CreateSaleRequest {
                user: user.id.to_string(),
                products: vec![product.id.to_string()],
            }),
        )
        .await
        .expect("create sale");
        assert_eq!(status, StatusCode::CREATED);

        let auth = authorize(&state, "a@x.com", "12345678").await;
        let Json(listed) = crate::sales::handlers::list_sales(
            State(state.clone()),
            auth,
            Query(crate::sales::dto::ListSalesQuery::default()),
        )
        .await
        .expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, sale.id);

        let auth = authorize(&state, "a@x.com", "12345678").await;
        let Json(fetched) =
            crate::sales::handlers::get_sale(State(state.clone()), auth, Path(sale.id))
                .await
                .expect("get");
        assert_eq!(fetched.products.len(), 1);
        assert_eq!(fetched.user.as_ref().map(|u| u.id), Some(user.id));
    }
}
