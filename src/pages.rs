//! Server-rendered HTML for every page of the site.

use std::fmt::Write;

use crate::{flash::Flash, result::ResultView};

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

const NAV: [(&str, &str); 5] = [
    ("/", "Home"),
    ("/upload", "Diagnose"),
    ("/about", "About"),
    ("/community", "Community"),
    ("/contact", "Contact"),
];

fn layout(title: &str, body: &str) -> String {
    let mut nav = String::new();
    for (href, label) in NAV {
        let _ = write!(nav, r#"<a class="nav-link" href="{href}">{label}</a>"#);
    }
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | CropCare AI</title>
</head>
<body>
<nav class="navbar">{nav}</nav>
<main class="container">
{body}
</main>
<footer class="footer">CropCare AI &middot; cocoa disease diagnosis</footer>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn list(items: &[String]) -> String {
    let mut out = String::from("<ul>");
    for item in items {
        let _ = write!(out, "<li>{}</li>", escape(item));
    }
    out.push_str("</ul>");
    out
}

pub fn index() -> String {
    layout(
        "Home",
        r#"<section class="hero">
<h1>Diagnose cocoa diseases from a photo</h1>
<p>Upload a picture of a cocoa pod or leaf and get an instant diagnosis with treatment advice.</p>
<a class="btn btn-primary" href="/upload">Start diagnosis</a>
</section>"#,
    )
}

pub fn about() -> String {
    layout(
        "About",
        r#"<h1>About CropCare AI</h1>
<p>CropCare AI helps cocoa farmers spot diseases early and act on them with practical treatment and prevention steps.</p>"#,
    )
}

pub fn upload(flashes: &[Flash]) -> String {
    let mut body = String::new();
    for flash in flashes {
        let _ = writeln!(
            body,
            r#"<div class="alert alert-{}" role="alert">{}</div>"#,
            flash.category.as_str(),
            escape(&flash.message)
        );
    }
    body.push_str(
        r#"<h1>Upload a crop image</h1>
<form action="/analyze" method="post" enctype="multipart/form-data">
<input type="file" name="crop_image" accept=".png,.jpg,.jpeg,.gif" required>
<p class="form-text">PNG, JPG, JPEG or GIF, up to 16 MB.</p>
<button type="submit" class="btn btn-primary">Analyze</button>
</form>"#,
    );
    layout("Diagnose", &body)
}

pub fn result(view: &ResultView) -> String {
    let mut body = String::new();
    let _ = write!(
        body,
        r#"<h1>Analysis result</h1>
<img class="result-image" src="/static/{image}" alt="Uploaded crop image">
<h2>{disease}</h2>"#,
        image = escape(&view.image_path),
        disease = escape(&view.disease),
    );
    if !view.scientific_name.is_empty() {
        let _ = write!(body, "<p><em>{}</em></p>", escape(&view.scientific_name));
    }
    let _ = write!(
        body,
        r#"<p>Confidence: <strong>{confidence:.1}%</strong></p>
<p>Severity: <span class="severity">{severity}</span></p>
<p>{description}</p>"#,
        confidence = view.confidence,
        severity = escape(&view.severity),
        description = escape(&view.description),
    );

    for (heading, items) in [
        ("Symptoms", &view.symptoms),
        ("Treatment", &view.treatment),
        ("Prevention", &view.prevention),
    ] {
        if !items.is_empty() {
            let _ = write!(body, "<h3>{heading}</h3>{}", list(items));
        }
    }

    if !view.chemicals.is_empty() {
        body.push_str(
            "<h3>Recommended chemicals</h3><table class=\"table\">\
             <tr><th>Product</th><th>Dosage</th><th>Application</th></tr>",
        );
        for chemical in &view.chemicals {
            let _ = write!(
                body,
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&chemical.name),
                escape(&chemical.dosage),
                escape(&chemical.application)
            );
        }
        body.push_str("</table>");
    }

    let _ = write!(
        body,
        r#"<p class="text-muted">Analyzed on {}</p>
<a class="btn" href="/upload">Analyze another image</a>"#,
        escape(&view.timestamp)
    );
    layout("Result", &body)
}

pub fn community() -> String {
    layout(
        "Community",
        r#"<h1>Community</h1>
<p>Share experiences with other cocoa farmers and extension officers.</p>"#,
    )
}

pub fn contact() -> String {
    layout(
        "Contact",
        r#"<h1>Contact</h1>
<p>Questions or feedback? Reach the CropCare AI team through your local extension office.</p>"#,
    )
}
