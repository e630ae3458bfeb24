use askama::Template;

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeEmail<'a> {
    name: &'a str,
}

/// Admin-authored HTML body wrapped in the broadcast layout
#[derive(Template)]
#[template(path = "email/broadcast.html")]
struct BroadcastEmail<'a> {
    message: &'a str,
}

/// Welcome email greeting `display_name`, which is HTML-escaped
pub fn welcome_html(display_name: &str) -> askama::Result<String> {
    WelcomeEmail { name: display_name }.render()
}

/// The body is inserted as-is
pub fn broadcast_html(message_html: &str) -> askama::Result<String> {
    BroadcastEmail {
        message: message_html,
    }
    .render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_escapes_name() {
        let html = welcome_html("<script>alert(1)</script>").unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_welcome_greets_by_name() {
        let html = welcome_html("Ada").unwrap();
        assert!(html.contains("Welcome, Ada!"));
    }

    #[test]
    fn test_broadcast_keeps_raw_html() {
        let html = broadcast_html("<p><b>Launch</b> day</p>").unwrap();
        assert!(html.contains("<p><b>Launch</b> day</p>"));
        assert!(html.contains("signed up for early access"));
    }
}
