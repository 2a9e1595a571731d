use axum::http::{header, HeaderMap, HeaderValue};

pub const SESSION_COOKIE: &str = "sessionid";
pub const FLASH_COOKIE: &str = "messages";

/// Value of the first cookie called `name`, across every `Cookie` header.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

pub fn set_cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name, value, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

pub fn clear_cookie(name: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_cookie_from_several_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; sessionid=abc123"));
        headers.append(header::COOKIE, HeaderValue::from_static("messages=xyz"));

        assert_eq!(read_cookie(&headers, SESSION_COOKIE), Some("abc123"));
        assert_eq!(read_cookie(&headers, FLASH_COOKIE), Some("xyz"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_set_cookie_attributes() {
        let value = set_cookie(SESSION_COOKIE, "tok", 60, true).unwrap();
        let value = value.to_str().unwrap();
        assert!(value.starts_with("sessionid=tok;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Max-Age=60"));
        assert!(value.ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let value = clear_cookie(SESSION_COOKIE).unwrap();
        assert!(value.to_str().unwrap().starts_with("sessionid=;"));
        assert!(value.to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn test_clear_cookie_refuses_invalid_name() {
        assert!(clear_cookie("bad\nname").is_none());
    }
}
