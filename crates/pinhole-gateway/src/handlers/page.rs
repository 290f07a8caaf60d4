use crate::error::{AppError, Result};
use crate::model::ShortenForm;
use crate::state::AppState;
use axum::extract::State;
use axum::response::Html;
use axum::Form;
use html_escape::encode_double_quoted_attribute;

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>pinhole</title></head>
<body>
<h1>Shorten a URL</h1>
<form action="/shorten/" method="post">
<input type="text" name="body" placeholder="https://" autofocus>
<input type="submit" value="Shorten">
</form>
</body>
</html>
"#;

pub async fn index_page_handler() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

pub async fn shorten_form_handler(
    State(state): State<AppState>,
    Form(form): Form<ShortenForm>,
) -> Result<Html<String>> {
    if form.body.is_empty() {
        return Err(AppError::BadRequest("no URL to shorten".to_string()));
    }

    let code = state.shortener().shorten(&form.body).await?;
    Ok(Html(render_confirmation(&state.short_url(&code), &form.body)))
}

fn render_confirmation(short_url: &str, long_url: &str) -> String {
    // both values land inside double-quoted href attributes
    let short_url = encode_double_quoted_attribute(short_url);
    let long_url = encode_double_quoted_attribute(long_url);
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>pinhole</title></head>
<body>
<p>Short URL: <a href="{short_url}">{short_url}</a></p>
<p>Long URL: <a href="{long_url}">{long_url}</a></p>
<p><a href="/">Shorten another</a></p>
</body>
</html>
"#
    )
}
