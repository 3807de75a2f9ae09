use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Article bodies arrive from the admin panel as HTML fragments. This employs
/// a whitelist-based sanitization strategy: it preserves safe tags (like <b>,
/// <p>) while stripping dangerous tags (like <script>, <iframe>) and
/// malicious attributes (like onclick), so a compromised admin session cannot
/// plant stored XSS in the public read API.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
