use async_trait::async_trait;

use crate::handler::Handler;
use crate::http::mime::HTML_UTF8;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::pages::escape_html;

/// Greeting page that echoes back the request path and host.
pub struct HelloHandler;

#[async_trait]
impl Handler for HelloHandler {
    async fn handle(&self, request: &Request, response: &mut Response) -> anyhow::Result<()> {
        response.set_content_type(HTML_UTF8);
        let page = format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <title>Hello</title>
    <style>
        body {{ font-family: Arial, sans-serif; text-align: center; margin-top: 50px; background-color: #f0f0f0; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; background-color: white; border-radius: 10px; }}
        .info {{ color: #888; font-size: 0.9em; margin-top: 30px; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Hello from {host}!</h1>
        <div class="info">
            <p>Request path: {path}</p>
            <p>Host: {host}</p>
        </div>
    </div>
</body>
</html>
"#,
            host = escape_html(&request.host),
            path = escape_html(&request.path),
        );
        response.write_str(&page).await?;
        Ok(())
    }
}
