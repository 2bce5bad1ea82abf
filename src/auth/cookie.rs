use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::config::AppConfig;

pub const SESSION_COOKIE: &str = "jwt";

/// Build the HTTP-only session cookie. Production deployments sit behind a
/// different origin than the client, so they need `SameSite=None` + `Secure`;
/// local development keeps `Strict`.
pub fn session_cookie(config: &AppConfig, token: String) -> Cookie<'static> {
    let production = config.environment.is_production();
    let mut builder = Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .max_age(Duration::days(config.jwt.ttl_days))
        .secure(production)
        .same_site(if production {
            SameSite::None
        } else {
            SameSite::Strict
        });
    if let Some(domain) = &config.cookie_domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}

/// An immediately expiring cookie that overwrites the session on logout.
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::state::AppState;

    #[tokio::test]
    async fn development_cookie_is_strict_and_not_secure() {
        let state = AppState::fake();
        let cookie = session_cookie(&state.config, "token".into());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_ne!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(Duration::days(15)));
    }

    #[tokio::test]
    async fn production_cookie_is_cross_site_and_secure() {
        let state = AppState::fake();
        let mut config = (*state.config).clone();
        config.environment = Environment::Production;
        config.cookie_domain = Some("chirp.example".into());
        let cookie = session_cookie(&config, "token".into());
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.domain(), Some("chirp.example"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
