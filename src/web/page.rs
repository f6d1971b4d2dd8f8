//! Server-rendered HTML for the upload form.

use crate::app::predictor::prediction_chart;
use crate::charts::Chart;
use crate::domain::columns::{NORMALIZED_PROB, TEAM, WIN_PROBABILITY};
use crate::domain::model::Table;
use crate::utils::error::Result;

const STYLE: &str = "body{font-family:sans-serif;max-width:1040px;margin:2em auto;color:#222}\
table{border-collapse:collapse;margin:1em 0}\
th,td{border:1px solid #ccc;padding:4px 10px;text-align:right}\
th:first-child,td:first-child{text-align:left}\
.error{color:#b00020}";

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Premier League Winner Predictor</title>\n<style>{}</style>\n</head>\n<body>\n\
         <h1>Premier League Winner Predictor</h1>\n{}\n</body>\n</html>\n",
        STYLE, body
    )
}

pub fn upload_form() -> &'static str {
    "<form action=\"/predict\" method=\"post\" enctype=\"multipart/form-data\">\n\
     <p>Upload a CSV with one row per team (Team, points, Goals_For or GF, Goals_Against or GA, ...).</p>\n\
     <input type=\"file\" name=\"file\" accept=\".csv\" required>\n\
     <button type=\"submit\">Predict</button>\n\
     </form>"
}

/// Probability table followed by the bar chart as inline SVG.
pub fn predictions_section(heading: &str, predictions: &Table) -> Result<String> {
    predictions.require_columns(&[TEAM, WIN_PROBABILITY, NORMALIZED_PROB])?;

    let mut rows = String::new();
    for record in &predictions.records {
        let normalized = record.number(NORMALIZED_PROB).unwrap_or(0.0);
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{:.4}</td><td>{:.4}</td><td>{:.1}%</td></tr>\n",
            escape(&record.display(TEAM)),
            record.number(WIN_PROBABILITY).unwrap_or(0.0),
            normalized,
            normalized * 100.0
        ));
    }

    let svg = prediction_chart(predictions)?.to_svg()?;
    Ok(format!(
        "<h2>{}</h2>\n<table>\n<tr><th>{}</th><th>{}</th><th>{}</th><th>Share</th></tr>\n{}</table>\n\
         <div class=\"chart\">{}</div>",
        escape(heading),
        TEAM,
        WIN_PROBABILITY,
        NORMALIZED_PROB,
        rows,
        svg
    ))
}

pub fn error_section(message: &str) -> String {
    format!("<p class=\"error\">{}</p>", escape(message))
}
