use crate::models::User;
use std::fmt::Write;

static HEAD: &'static str = r#"<!doctype html>
<html>
<head>
    <meta charset="utf-8">
    <title>Sign up</title>
</head>
<body>
    <h2>Registration</h2>
    <form method="POST">
        Username: <input type="text" name="username" maxlength="50" required><br><br>
        Email: <input type="email" name="email" maxlength="100" required><br><br>
        <input type="submit" value="Register">
    </form>
    <hr>
    <h3>Registered users:</h3>
    <ul>
"#;

static TAIL: &'static str = r#"    </ul>
</body>
</html>
"#;

/// Escape the characters that are significant in HTML text and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// The registration form followed by one `username - email` entry per user.
pub fn page(users: &[User]) -> String {
    let mut html = String::from(HEAD);
    for user in users {
        // writing into a String cannot fail
        let _ = writeln!(
            html,
            "        <li>{} - {}</li>",
            escape_html(&user.username),
            escape_html(&user.email)
        );
    }
    html.push_str(TAIL);
    html
}
