#[cfg(test)]
use crate::features::auth::model::AuthenticatedUser;

#[cfg(test)]
use axum::{extract::Request, middleware::Next, response::Response, Router};

#[cfg(test)]
pub fn create_provider_user(provider_id: &str) -> AuthenticatedUser {
    AuthenticatedUser {
        account_id: provider_id.to_string(),
        sub: provider_id.to_string(),
        roles: vec!["provider".to_string()],
    }
}

#[cfg(test)]
#[allow(dead_code)]
pub fn create_client_user(account_id: &str) -> AuthenticatedUser {
    AuthenticatedUser {
        account_id: account_id.to_string(),
        sub: account_id.to_string(),
        roles: vec!["client".to_string()],
    }
}

#[cfg(test)]
async fn inject_provider_middleware(mut request: Request, next: Next) -> Response {
    request
        .extensions_mut()
        .insert(create_provider_user("test-provider"));
    next.run(request).await
}

#[cfg(test)]
pub fn with_provider_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_provider_middleware))
}
