use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::error::AnalyzeError;
use crate::prompts::PRESET_PROMPTS;
use crate::session::Session;
use crate::upload::UploadedImage;

#[derive(Serialize)]
struct AnalyzeResponse {
    analysis: String,
    model: String,
    elapsed_ms: u128,
}

pub fn router(session: Arc<Session>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/prompts", get(list_prompts))
        .route("/api/analyze", post(analyze))
        .route("/api/export", get(export))
        .layer(CorsLayer::permissive())
        .with_state(session)
}

async fn list_prompts() -> Json<&'static [&'static str]> {
    Json(PRESET_PROMPTS)
}

async fn analyze(
    State(session): State<Arc<Session>>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AnalyzeError> {
    let mut image: Option<UploadedImage> = None;
    let mut prompt = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AnalyzeError::Input(format!("bad upload: {e}")))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("image") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(|ct| ct.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AnalyzeError::Input(format!("bad upload: {e}")))?;
                image = Some(UploadedImage::new(bytes.to_vec(), file_name, content_type)?);
            }
            Some("prompt") => {
                prompt = field
                    .text()
                    .await
                    .map_err(|e| AnalyzeError::Input(format!("bad upload: {e}")))?;
            }
            _ => {}
        }
    }

    let result = session.analyze(image, &prompt).await?;
    tracing::info!(file = %result.file_name, elapsed_ms = result.elapsed_ms, "analysis complete");

    Ok(Json(AnalyzeResponse {
        analysis: result.text,
        model: result.model,
        elapsed_ms: result.elapsed_ms,
    }))
}

async fn export(State(session): State<Arc<Session>>) -> Response {
    match session.export() {
        Some(file) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                file.file_name.replace('"', "_")
            );
            (
                [
                    (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                file.contents,
            )
                .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "nothing analyzed yet" })),
        )
            .into_response(),
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>AI Image Analyzer</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: linear-gradient(160deg, #0f0f23 0%, #16213e 100%);
            min-height: 100vh;
            display: flex;
            justify-content: center;
            padding: 40px 20px;
            color: #e8ecf5;
        }

        .container {
            max-width: 900px;
            width: 100%;
        }

        h1 { font-size: 2em; margin-bottom: 6px; }
        .subtitle { color: #9aa7c7; margin-bottom: 28px; }

        .panel {
            background: rgba(255, 255, 255, 0.04);
            border: 1px solid rgba(255, 255, 255, 0.08);
            border-radius: 14px;
            padding: 24px;
            margin-bottom: 20px;
        }

        .drop-zone {
            border: 2px dashed #4a6bd6;
            border-radius: 10px;
            padding: 40px 20px;
            text-align: center;
            cursor: pointer;
            color: #9aa7c7;
        }
        .drop-zone:hover, .drop-zone.dragover { border-color: #7a9bff; color: #c9d4ee; }

        input[type="file"] { display: none; }

        .preview { max-width: 100%; max-height: 320px; border-radius: 8px; margin-top: 16px; }

        label { display: block; margin: 14px 0 6px; color: #9aa7c7; font-size: 0.9em; }

        select, textarea {
            width: 100%;
            background: #101830;
            color: #e8ecf5;
            border: 1px solid rgba(255, 255, 255, 0.12);
            border-radius: 8px;
            padding: 10px;
            font-size: 0.95em;
        }
        textarea { min-height: 80px; resize: vertical; }

        button {
            margin-top: 18px;
            background: #4a6bd6;
            color: white;
            border: none;
            border-radius: 8px;
            padding: 12px 24px;
            font-size: 1em;
            font-weight: 600;
            cursor: pointer;
        }
        button:hover { background: #5d7de4; }
        button:disabled { background: #2a3552; cursor: wait; }
        button.secondary { background: transparent; border: 1px solid #4a6bd6; }

        .error {
            display: none;
            background: rgba(220, 60, 60, 0.12);
            border: 1px solid rgba(220, 60, 60, 0.5);
            color: #ff9c9c;
            border-radius: 8px;
            padding: 14px;
            margin-top: 16px;
            white-space: pre-wrap;
        }

        .result { display: none; }
        .result-text { line-height: 1.6; white-space: pre-wrap; }
        .meta { margin-top: 14px; padding-top: 14px; border-top: 1px solid rgba(255,255,255,0.08);
                color: #9aa7c7; font-size: 0.85em; display: flex; justify-content: space-between; }
    </style>
</head>
<body>
    <div class="container">
        <h1>AI Image Analyzer</h1>
        <p class="subtitle">Upload an image and ask questions about it</p>

        <div class="panel">
            <div class="drop-zone" id="dropZone">
                Click or drag an image here<br>
                <small>JPEG, PNG, WebP, GIF, TIFF, RAW and more</small>
                <input type="file" id="fileInput">
            </div>
            <img id="preview" class="preview" style="display:none" alt="Preview">

            <label for="presetSelect">Prompt</label>
            <select id="presetSelect">
                <option value="">Custom prompt...</option>
            </select>
            <textarea id="promptText" placeholder="Ask anything about the image..."></textarea>

            <button id="analyzeBtn">Analyze Image</button>
            <div class="error" id="errorBox"></div>
        </div>

        <div class="panel result" id="resultPanel">
            <div class="result-text" id="resultText"></div>
            <div class="meta">
                <span>Model: <span id="modelName"></span></span>
                <span><span id="elapsed"></span> ms</span>
            </div>
            <button class="secondary" onclick="location.href='/api/export'">Download Analysis</button>
        </div>
    </div>

    <script>
        const dropZone = document.getElementById('dropZone');
        const fileInput = document.getElementById('fileInput');
        const preview = document.getElementById('preview');
        const presetSelect = document.getElementById('presetSelect');
        const promptText = document.getElementById('promptText');
        const analyzeBtn = document.getElementById('analyzeBtn');
        const errorBox = document.getElementById('errorBox');
        const resultPanel = document.getElementById('resultPanel');

        let selectedFile = null;

        fetch('/api/prompts')
            .then(r => r.json())
            .then(prompts => {
                for (const p of prompts) {
                    const opt = document.createElement('option');
                    opt.value = p;
                    opt.textContent = p;
                    presetSelect.appendChild(opt);
                }
            });

        presetSelect.addEventListener('change', () => {
            promptText.value = presetSelect.value;
        });

        dropZone.addEventListener('click', () => fileInput.click());
        dropZone.addEventListener('dragover', e => {
            e.preventDefault();
            dropZone.classList.add('dragover');
        });
        dropZone.addEventListener('dragleave', () => dropZone.classList.remove('dragover'));
        dropZone.addEventListener('drop', e => {
            e.preventDefault();
            dropZone.classList.remove('dragover');
            if (e.dataTransfer.files[0]) setFile(e.dataTransfer.files[0]);
        });
        fileInput.addEventListener('change', e => {
            if (e.target.files[0]) setFile(e.target.files[0]);
        });

        function setFile(file) {
            selectedFile = file;
            const reader = new FileReader();
            reader.onload = e => {
                preview.src = e.target.result;
                preview.style.display = 'block';
            };
            reader.readAsDataURL(file);
        }

        analyzeBtn.addEventListener('click', async () => {
            errorBox.style.display = 'none';
            resultPanel.style.display = 'none';

            const form = new FormData();
            if (selectedFile) form.append('image', selectedFile);
            form.append('prompt', promptText.value);

            analyzeBtn.disabled = true;
            analyzeBtn.textContent = 'Analyzing...';
            try {
                const response = await fetch('/api/analyze', { method: 'POST', body: form });
                const body = await response.json();
                if (!response.ok) throw new Error(body.error || 'analysis failed');

                document.getElementById('resultText').textContent = body.analysis;
                document.getElementById('modelName').textContent = body.model;
                document.getElementById('elapsed').textContent = body.elapsed_ms;
                resultPanel.style.display = 'block';
            } catch (err) {
                errorBox.textContent = err.message;
                errorBox.style.display = 'block';
            } finally {
                analyzeBtn.disabled = false;
                analyzeBtn.textContent = 'Analyze Image';
            }
        });
    </script>
</body>
</html>
"#;
