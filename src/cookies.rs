//! Minimal cookie helpers for the session cookie.

use crate::session::SESSION_COOKIE;

// ---

/// Find `name` in a `Cookie:` header value and percent-decode it.
pub fn get_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix(name)?.strip_prefix('='))
        .map(percent_decode)
}

/// Decode `%XX` escapes. Malformed escapes are kept verbatim.
pub fn percent_decode(raw: &str) -> String {
    // ---
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let escaped = (bytes[i] == b'%')
            .then(|| bytes.get(i + 1..i + 3))
            .flatten()
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());

        match escaped {
            Some(byte) => {
                out.push(byte);
                i += 3;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Attributes shared by the session cookie and its expiring counterpart.
#[derive(Debug, Clone, Default)]
pub struct CookieOptions<'a> {
    pub secure: bool,
    pub domain: Option<&'a str>,
}

impl CookieOptions<'_> {
    fn suffix(&self) -> String {
        let same_site = if self.secure { "None" } else { "Lax" };
        let mut suffix = format!("Path=/; SameSite={same_site}");
        if self.secure {
            suffix.push_str("; Secure");
        }
        if let Some(domain) = self.domain {
            suffix.push_str("; Domain=");
            suffix.push_str(domain);
        }
        suffix
    }
}

/// `Set-Cookie` value establishing the session.
pub fn session_cookie(id: &str, options: &CookieOptions<'_>) -> String {
    format!("{SESSION_COOKIE}={id}; HttpOnly; {}", options.suffix())
}

/// `Set-Cookie` value clearing the session.
pub fn expired_session_cookie(options: &CookieOptions<'_>) -> String {
    format!("{SESSION_COOKIE}=deleted; Max-Age=0; {}", options.suffix())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn finds_named_cookie() {
        // ---
        assert_eq!(get_cookie("a=1; ws_session=xyz; b=2", "ws_session").as_deref(), Some("xyz"));
        assert_eq!(get_cookie("ws_session_old=1", "ws_session"), None);
        assert_eq!(get_cookie("", "ws_session"), None);
    }

    #[test]
    fn decodes_escapes() {
        // ---
        assert_eq!(percent_decode("a%20b%2Fc"), "a b/c");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz1"), "%zz1");
    }

    #[test]
    fn lax_cookie_for_plain_http() {
        // ---
        let cookie = session_cookie("abc", &CookieOptions::default());
        assert_eq!(cookie, "ws_session=abc; HttpOnly; Path=/; SameSite=Lax");
    }

    #[test]
    fn secure_cookie_with_domain() {
        // ---
        let options = CookieOptions {
            secure: true,
            domain: Some(".example.org"),
        };
        assert_eq!(
            session_cookie("abc", &options),
            "ws_session=abc; HttpOnly; Path=/; SameSite=None; Secure; Domain=.example.org"
        );
        assert_eq!(
            expired_session_cookie(&options),
            "ws_session=deleted; Max-Age=0; Path=/; SameSite=None; Secure; Domain=.example.org"
        );
    }
}
