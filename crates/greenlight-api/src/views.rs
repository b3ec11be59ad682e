//! HTML pages for the upload workflow.

use greenlight_models::{CountSummary, TimingResult};

/// Why an upload was bounced back to the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRejection {
    NoFile,
    EmptyFilename,
    EmptyFile,
    UnsupportedType,
}

impl UploadRejection {
    /// Code carried in the `?error=` query of the redirect.
    pub fn code(&self) -> &'static str {
        match self {
            UploadRejection::NoFile => "no_file",
            UploadRejection::EmptyFilename => "empty_filename",
            UploadRejection::EmptyFile => "empty_file",
            UploadRejection::UnsupportedType => "unsupported_type",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "no_file" => Some(UploadRejection::NoFile),
            "empty_filename" => Some(UploadRejection::EmptyFilename),
            "empty_file" => Some(UploadRejection::EmptyFile),
            "unsupported_type" => Some(UploadRejection::UnsupportedType),
            _ => None,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            UploadRejection::NoFile => "Please choose an image to upload.",
            UploadRejection::EmptyFilename => "No file was selected.",
            UploadRejection::EmptyFile => "The uploaded file is empty.",
            UploadRejection::UnsupportedType => "Only PNG and JPEG images are supported.",
        }
    }
}

/// Data shown on the result page.
pub struct ResultView<'a> {
    pub counts: &'a CountSummary,
    /// Already rounded for display
    pub timing: &'a TimingResult,
    pub uploaded_filename: &'a str,
    pub result_filename: &'a str,
}

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem}\
.error{color:#b00020}\
.images{display:flex;gap:1rem;flex-wrap:wrap}\
.images figure{flex:1;min-width:300px;margin:0}\
.images img{max-width:100%}\
table{border-collapse:collapse}td,th{padding:.25rem .75rem;text-align:left}";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

/// Upload form, optionally with a rejection message.
pub fn upload_form(rejection: Option<UploadRejection>) -> String {
    let error = rejection
        .map(|r| format!("<p class=\"error\">{}</p>\n", escape_html(r.message())))
        .unwrap_or_default();

    page(
        "Traffic Light Timing",
        &format!(
            "<h1>Traffic Light Timing</h1>\n\
             <p>Upload a traffic-camera image to count vehicles and get a suggested green-light duration.</p>\n\
             {error}\
             <form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\n\
             <input type=\"file\" name=\"file\" accept=\".png,.jpg,.jpeg\">\n\
             <button type=\"submit\">Analyze</button>\n\
             </form>"
        ),
    )
}

/// Result page with counts, timing and both images.
pub fn result_page(view: &ResultView<'_>) -> String {
    let counts = view.counts;
    let timing = view.timing;
    let uploaded = escape_html(view.uploaded_filename);
    let result = escape_html(view.result_filename);

    page(
        "Detection Result",
        &format!(
            "<h1>Detection Result</h1>\n\
             <table>\n\
             <tr><th>Cars</th><td>{cars}</td></tr>\n\
             <tr><th>Motorcycles</th><td>{motorcycles}</td></tr>\n\
             <tr><th>Total vehicles</th><td>{total}</td></tr>\n\
             <tr><th>Suggested green time</th><td>{green} s</td></tr>\n\
             <tr><th>Time saved vs. baseline</th><td>{saved:.1} s</td></tr>\n\
             <tr><th>Improvement</th><td>{pct:.2} %</td></tr>\n\
             </table>\n\
             <div class=\"images\">\n\
             <figure><img src=\"/uploads/{uploaded}\" alt=\"Original image\"><figcaption>Original</figcaption></figure>\n\
             <figure><img src=\"/results/{result}\" alt=\"Annotated image\"><figcaption>Detections</figcaption></figure>\n\
             </div>\n\
             <p><a href=\"/\">Analyze another image</a></p>",
            cars = counts.cars,
            motorcycles = counts.motorcycles,
            total = counts.total(),
            green = timing.green_time,
            saved = timing.improvement_time,
            pct = timing.improvement_pct,
        ),
    )
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
