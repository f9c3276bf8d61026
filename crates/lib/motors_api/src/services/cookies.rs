//! Cookie builders for the identity token and the session id.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Cookie carrying the signed identity token.
pub const JWT_COOKIE: &str = "jwt";
/// Cookie carrying the server-side session id.
pub const SESSION_COOKIE: &str = "motors_sid";

fn base(name: &str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .build()
}

/// httpOnly cookie for the identity token; lives as long as the token.
pub fn jwt_cookie(token: &str, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    let mut cookie = base(JWT_COOKIE, token.to_string(), secure);
    cookie.set_max_age(Duration::seconds(max_age_secs));
    cookie
}

/// Expired identity cookie, used on logout.
pub fn clear_jwt_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = base(JWT_COOKIE, String::new(), secure);
    cookie.set_max_age(Duration::ZERO);
    cookie
}

/// Browser-session cookie for the session id.
pub fn session_cookie(id: &str, secure: bool) -> Cookie<'static> {
    base(SESSION_COOKIE, id.to_string(), secure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_cookie_attributes() {
        let c = jwt_cookie("abc", 3600, true);
        assert_eq!(c.name(), "jwt");
        assert_eq!(c.value(), "abc");
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.secure(), Some(true));
        assert_eq!(c.same_site(), Some(SameSite::Lax));
        assert_eq!(c.path(), Some("/"));
        assert_eq!(c.max_age(), Some(Duration::seconds(3600)));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let c = clear_jwt_cookie(false);
        assert_eq!(c.value(), "");
        assert_eq!(c.max_age(), Some(Duration::ZERO));
        assert_eq!(c.secure(), Some(false));
    }

    #[test]
    fn session_cookie_has_no_max_age() {
        let c = session_cookie("sid", false);
        assert_eq!(c.name(), SESSION_COOKIE);
        assert!(c.max_age().is_none());
    }
}
