use axum::response::Html;

/// GET /
/// Browser entry point: upload form for the one-shot pipeline plus an endpoint list.
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>AI-Powered Resume Customizer</title>
    <meta charset="utf-8">
    <style>
        body { font-family: Arial, sans-serif; margin: 40px; max-width: 760px; }
        label { display: block; margin-top: 16px; font-weight: bold; }
        textarea, input[type=text] { width: 100%; box-sizing: border-box; }
        button { margin-top: 20px; padding: 8px 16px; }
        .info-box { background-color: #f0f8ff; padding: 20px; border-radius: 8px; margin: 20px 0; }
        .endpoint { background-color: #f5f5f5; padding: 10px; margin: 10px 0; border-radius: 4px; font-family: monospace; }
    </style>
</head>
<body>
    <h1>AI-Powered Resume Customizer</h1>

    <div class="info-box">
        <p>Upload resume and enter job description to get started</p>
    </div>

    <form action="/api/v1/resumes/generate" method="post" enctype="multipart/form-data">
        <label for="resume">Upload Resume (PDF)</label>
        <input id="resume" name="resume" type="file" accept="application/pdf">

        <label for="job_description">Job Description</label>
        <textarea id="job_description" name="job_description" rows="14"></textarea>

        <label for="notes">Custom Instructions</label>
        <input id="notes" name="notes" type="text">

        <label for="edited_html">Modify HTML (optional, replaces the customized resume)</label>
        <textarea id="edited_html" name="edited_html" rows="8"></textarea>

        <button type="submit">Generate Custom Resume</button>
    </form>

    <h2>Available Endpoints:</h2>
    <div class="endpoint">GET /health - Health check</div>
    <div class="endpoint">POST /api/v1/resumes/customize - Customized HTML preview (multipart)</div>
    <div class="endpoint">POST /api/v1/resumes/render - Edited HTML to PDF (JSON)</div>
    <div class="endpoint">POST /api/v1/resumes/generate - Whole pipeline to PDF (multipart)</div>
</body>
</html>
"#;
