//! HTTP endpoint handlers
//!
//! Each handler decodes the multipart form the client sends, parses the
//! CSV upload into a `Dataset`, delegates to one analyzer and serializes
//! the outcome. Analyzer failures are surfaced to the client as a single
//! `{"error": message}` object, matching what the UI expects.

use axum::extract::Multipart;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use statlab_core::{Dataset, StatError, StatResult, Transform};
use statlab_stats::{
    cleaning, compare as model_compare, describe, diagnostics, distribution, hypothesis, logistic,
    power, regression,
};
use std::collections::HashMap;

const DEFAULT_BINS: usize = 20;
const DEFAULT_FOLDS: usize = 5;

/// Decoded multipart form: the CSV upload plus repeated scalar fields.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<Vec<u8>>,
    fields: HashMap<String, Vec<String>>,
}

impl UploadForm {
    fn field(&self, name: &str) -> &str {
        self.fields
            .get(name)
            .and_then(|v| v.first())
            .map(String::as_str)
            .unwrap_or("")
    }

    fn repeated(&self, name: &str) -> Vec<String> {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    fn flag(&self, name: &str) -> bool {
        self.field(name) == "true"
    }

    fn dataset(&self) -> StatResult<Dataset> {
        let bytes = self
            .file
            .as_deref()
            .ok_or_else(|| StatError::MissingParameter("file upload is required".into()))?;
        Dataset::from_csv(bytes)
    }
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, Response> {
    let mut form = UploadForm::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(bad_request(&format!("malformed multipart body: {}", e))),
        };
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            match field.bytes().await {
                Ok(bytes) => form.file = Some(bytes.to_vec()),
                Err(e) => return Err(bad_request(&format!("failed to read upload: {}", e))),
            }
        } else {
            match field.text().await {
                Ok(text) => form.fields.entry(name).or_default().push(text),
                Err(e) => return Err(bad_request(&format!("failed to read field: {}", e))),
            }
        }
    }
    Ok(form)
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

/// Analyzer outcomes always come back with HTTP 200; failures carry the
/// structured error object the client renders inline.
fn respond<T: serde::Serialize>(result: StatResult<T>) -> Response {
    match result {
        Ok(value) => Json(json!(value)).into_response(),
        Err(e) => {
            tracing::debug!(code = e.code(), "analysis failed: {}", e);
            Json(json!({ "error": e.to_string() })).into_response()
        }
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn analyze(multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };
    respond(form.dataset().and_then(|ds| describe::describe(&ds)))
}

pub async fn get_data(multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    let result = form.dataset().map(|ds| {
        let page: usize = form.field("page").parse().unwrap_or(0);
        let page_size: i64 = form.field("page_size").parse().unwrap_or(-1);

        let total_rows = ds.rows();
        let (start, end) = if page_size < 0 {
            (0, total_rows)
        } else {
            let size = page_size as usize;
            let start = (page * size).min(total_rows);
            (start, (start + size).min(total_rows))
        };

        let data: Vec<Vec<String>> = (start..end)
            .map(|row| {
                ds.columns()
                    .iter()
                    .map(|c| c.cell(row).unwrap_or("").to_string())
                    .collect()
            })
            .collect();

        json!({
            "columns": ds.column_names(),
            "data": data,
            "page": page,
            "page_size": page_size,
            "total_rows": total_rows,
        })
    });
    respond(result)
}

pub async fn clean(multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    let options = cleaning::CleanOptions {
        drop_na: form.flag("drop_na"),
        fill_mean: form.flag("fill_mean"),
        fill_median: form.flag("fill_median"),
        drop_high_missing: form.flag("drop_high_missing"),
        missing_threshold: form.field("missing_threshold").parse().unwrap_or(50.0),
        remove_outliers_iqr: form.flag("remove_outliers_iqr"),
        remove_outliers_zscore: form.flag("remove_outliers_zscore"),
        drop_duplicates: form.flag("drop_duplicates"),
    };

    match form.dataset().and_then(|ds| cleaning::clean(&ds, &options)) {
        Ok(outcome) => {
            let operations = if outcome.operations.is_empty() {
                "No operations applied".to_string()
            } else {
                outcome.operations.join("; ")
            };
            let headers = [
                (header::CONTENT_TYPE.as_str(), "text/csv".to_string()),
                ("X-Operations", operations),
                (
                    "X-Original-Shape",
                    format!("{}x{}", outcome.original_shape.0, outcome.original_shape.1),
                ),
                (
                    "X-New-Shape",
                    format!("{}x{}", outcome.new_shape.0, outcome.new_shape.1),
                ),
            ];
            (headers, outcome.dataset.to_csv()).into_response()
        }
        Err(e) => Json(json!({ "error": e.to_string() })).into_response(),
    }
}

pub async fn regress(multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };
    let x_cols = form.repeated("x_cols");
    let y_col = form.field("y_col").to_string();
    respond(
        form.dataset()
            .and_then(|ds| regression::fit(&ds, &x_cols, &y_col)),
    )
}

pub async fn logistic(multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };
    let x_cols = form.repeated("x_cols");
    let y_col = form.field("y_col").to_string();
    respond(
        form.dataset()
            .and_then(|ds| logistic::fit(&ds, &x_cols, &y_col)),
    )
}

pub async fn hypothesis(multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };
    respond(form.dataset().and_then(|ds| {
        hypothesis::run(
            &ds,
            form.field("test_type"),
            form.field("column_a"),
            form.field("column_b"),
            form.field("group_col"),
        )
    }))
}

pub async fn distribution(multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };
    let bins: usize = form.field("bins").parse().unwrap_or(DEFAULT_BINS);
    respond(
        form.dataset()
            .and_then(|ds| distribution::describe(&ds, form.field("column"), bins)),
    )
}

pub async fn transform(multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };
    let bins: usize = form.field("bins").parse().unwrap_or(DEFAULT_BINS);
    respond(form.dataset().and_then(|ds| {
        let kind = distribution::TransformKind::parse(form.field("transform"))?;
        distribution::transform(&ds, form.field("column"), kind, bins)
    }))
}

pub async fn diagnostics(multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };
    respond(form.dataset().and_then(|ds| {
        let intent = diagnostics::Intent::parse(
            form.field("intent_type"),
            form.field("outcome"),
            &form.repeated("predictors"),
            form.field("group"),
            form.field("var_a"),
            form.field("var_b"),
        )?;
        let transform = Transform::parse(form.field("transform"))?;
        let outlier_mode = diagnostics::OutlierMode::parse(form.field("outlier_mode"))?;
        diagnostics::run(&ds, &intent, transform, outlier_mode)
    }))
}

pub async fn compare(multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };
    respond(form.dataset().and_then(|ds| {
        let models: Vec<model_compare::ModelSpec> =
            serde_json::from_str(form.field("models")).map_err(|e| {
                StatError::InvalidInput(format!("models must be a JSON list: {}", e))
            })?;
        let folds: usize = form.field("folds").parse().unwrap_or(DEFAULT_FOLDS);
        model_compare::compare(&ds, &models, form.field("y_col"), folds)
    }))
}

pub async fn power(multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };
    respond(power::solve(
        form.field("test_type"),
        form.field("mode"),
        form.field("effect_size"),
        form.field("alpha"),
        form.field("power"),
        form.field("n"),
        form.field("groups"),
    ))
}
