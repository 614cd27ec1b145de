use std::time::SystemTime;

use async_trait::async_trait;
use tracing::info;

use crate::handler::Handler;
use crate::http::mime::HTML_UTF8;
use crate::http::request::Request;
use crate::http::response::Response;

/// Shows the current server time.
///
/// A query string containing `error=true` makes the handler fail on purpose,
/// which is handy for checking the 500 page of a host.
pub struct TimeHandler;

#[async_trait]
impl Handler for TimeHandler {
    async fn handle(&self, request: &Request, response: &mut Response) -> anyhow::Result<()> {
        if request
            .query_string()
            .is_some_and(|q| q.contains("error=true"))
        {
            anyhow::bail!("simulated failure requested by client");
        }

        let time = httpdate::fmt_http_date(SystemTime::now());
        response.set_content_type(HTML_UTF8);
        response.write_str(&render(&time)).await?;

        info!(%time, "Time response sent");
        Ok(())
    }
}

fn render(time: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Current Time</title>
    <style>
        body {{ font-family: Arial, sans-serif; text-align: center; margin-top: 50px; }}
        h1 {{ color: #333; }}
        .time {{ color: #666; font-size: 24px; margin: 20px; }}
    </style>
</head>
<body>
    <h1>Current Time</h1>
    <div class="time">{time}</div>
</body>
</html>
"#
    )
}
