//! Static landing page served on `/`.

use axum::response::Html;

const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Rewrite Proxy</title>
</head>
<body style="font-family: sans-serif; text-align: center; margin-top: 50px;">
    <h1>Rewrite Proxy</h1>
    <form onsubmit="
        const url = document.getElementById('url').value;
        const download = document.getElementById('download').checked;
        window.location.href = '/' + url + (download ? '?download=true' : '');
        return false;
    ">
        <input type="text" id="url" placeholder="https://example.com" style="padding: 10px; width: 300px;">
        <button style="padding: 10px; cursor: pointer;">Go</button>
        <div style="margin-top: 15px;">
            <label><input type="checkbox" id="download"> Force Download</label>
        </div>
    </form>
</body>
</html>
"#;

pub fn landing_page() -> Html<&'static str> {
    Html(LANDING_PAGE)
}
